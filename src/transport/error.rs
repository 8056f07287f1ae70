//! Error types reported by a transport.
//!
//! The controller only cares about the *kind* of a transport failure; the
//! message is carried along for diagnostics.

use std::fmt;

use thiserror::Error;

/// Classification of a transport or protocol failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS resolution failed or the TCP connection could not be established.
    Connect,
    /// The server certificate failed validation (unknown issuer, expired, ...).
    InvalidCertificate,
    /// The server certificate is valid but was not issued for the requested host.
    CertificateNameMismatch,
    /// Anything else: protocol errors, resets mid-body, read timeouts.
    Other,
}

impl TransportErrorKind {
    /// Returns the one-line description used in diagnostics.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Connect => "Connection failed",
            Self::InvalidCertificate => "Invalid SSL certificate",
            Self::CertificateNameMismatch => "Server hostname does not match SSL certificate",
            Self::Other => "Unknown error",
        }
    }

    /// Returns true for the two certificate-related kinds.
    #[must_use]
    pub fn is_certificate(self) -> bool {
        matches!(self, Self::InvalidCertificate | Self::CertificateNameMismatch)
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A failure reported by the transport, delivered to the controller as an event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    /// Creates a transport error of the given kind.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a connection failure.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    /// Creates an unclassified failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Other, message)
    }

    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Returns the underlying detail message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Markers found in TLS stack error chains when the certificate names another host.
const NAME_MISMATCH_MARKERS: &[&str] = &[
    "notvalidforname",
    "not valid for name",
    "hostname mismatch",
    "does not match",
];

/// Markers found in TLS stack error chains for any other certificate rejection.
const CERTIFICATE_MARKERS: &[&str] = &["certificate", "unknownissuer", "unknown issuer"];

/// Classifies a failure from its rendered error chain.
///
/// Certificate problems surface from the connector, so they are checked
/// before the connect flag.
pub(crate) fn classify_failure(detail: &str, is_connect: bool) -> TransportErrorKind {
    let lower = detail.to_ascii_lowercase();
    if NAME_MISMATCH_MARKERS.iter().any(|m| lower.contains(m)) {
        TransportErrorKind::CertificateNameMismatch
    } else if CERTIFICATE_MARKERS.iter().any(|m| lower.contains(m)) {
        TransportErrorKind::InvalidCertificate
    } else if is_connect {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    }
}

/// Renders an error and all of its sources as `outer: inner: ...`.
pub(crate) fn render_error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
