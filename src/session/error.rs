//! Session failure classifications and the process exit-code contract.

use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;
use url::Url;

use crate::transport::{TransportError, TransportErrorKind};

/// Process exit status reported by a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitStatus {
    /// Download completed, or a certificate error was ignored.
    #[default]
    Success,
    /// Unclassified transport error or bad usage.
    Failure,
    /// The output sink could not be opened or written.
    SinkUnavailable,
    /// The connection could not be established.
    ConnectFailed,
    /// Certificate validation or hostname check failed and was not ignored.
    CertificateRejected,
    /// The final response status was not a success.
    HttpStatus,
}

impl ExitStatus {
    /// Numeric process exit code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::SinkUnavailable => 3,
            Self::ConnectFailed => 4,
            Self::CertificateRejected => 5,
            Self::HttpStatus => 8,
        }
    }

    /// Returns true for [`ExitStatus::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Fatal outcomes of a download session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The connection to the server failed.
    #[error("Connection error: Connection failed for {url}: {message}")]
    Connect {
        /// URL being fetched.
        url: String,
        /// Transport detail.
        message: String,
    },

    /// The server certificate failed validation.
    #[error("Connection error: Invalid SSL certificate for {url}: {message}")]
    InvalidCertificate {
        /// URL being fetched.
        url: String,
        /// Transport detail.
        message: String,
    },

    /// The server certificate does not name the requested host.
    #[error("Connection error: Server hostname does not match SSL certificate for {url}: {message}")]
    CertificateNameMismatch {
        /// URL being fetched.
        url: String,
        /// Transport detail.
        message: String,
    },

    /// Any other transport failure.
    #[error("Connection error: Unknown error for {url}: {message}")]
    Transport {
        /// URL being fetched.
        url: String,
        /// Transport detail.
        message: String,
    },

    /// A redirect pointed somewhere this client cannot follow.
    #[error("cannot follow redirect to {url}: {reason}")]
    UnfollowableRedirect {
        /// Redirect target.
        url: String,
        /// Why the redirect cannot be followed.
        reason: &'static str,
    },

    /// The final response was not a success status.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The output destination could not be opened.
    #[error("Cannot open output file {path}: {source}")]
    SinkOpen {
        /// Destination path (`-` for standard output).
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing body bytes to the destination failed.
    #[error("Cannot write output file {path}: {source}")]
    SinkWrite {
        /// Destination path (`-` for standard output).
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Classifies a transport failure for the given URL.
    pub fn from_transport(url: &Url, error: &TransportError) -> Self {
        let url = url.to_string();
        let message = error.message().to_string();
        match error.kind() {
            TransportErrorKind::Connect => Self::Connect { url, message },
            TransportErrorKind::InvalidCertificate => Self::InvalidCertificate { url, message },
            TransportErrorKind::CertificateNameMismatch => {
                Self::CertificateNameMismatch { url, message }
            }
            TransportErrorKind::Other => Self::Transport { url, message },
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: &Url, status: u16) -> Self {
        Self::HttpStatus {
            url: url.to_string(),
            status,
        }
    }

    /// Creates a sink-open error.
    pub fn sink_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SinkOpen {
            path: path.into(),
            source,
        }
    }

    /// Creates a sink-write error.
    pub fn sink_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SinkWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates an unfollowable-redirect error.
    pub fn unfollowable_redirect(url: &Url, reason: &'static str) -> Self {
        Self::UnfollowableRedirect {
            url: url.to_string(),
            reason,
        }
    }

    /// Maps the failure onto the exit-code contract.
    #[must_use]
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Connect { .. } => ExitStatus::ConnectFailed,
            Self::InvalidCertificate { .. } | Self::CertificateNameMismatch { .. } => {
                ExitStatus::CertificateRejected
            }
            Self::Transport { .. } | Self::UnfollowableRedirect { .. } => ExitStatus::Failure,
            Self::HttpStatus { .. } => ExitStatus::HttpStatus,
            Self::SinkOpen { .. } | Self::SinkWrite { .. } => ExitStatus::SinkUnavailable,
        }
    }
}

/// Problems detected before a session exists. All map to exit code 1.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The URL could not be parsed.
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        /// The raw URL argument.
        url: String,
        /// The parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The URL scheme is neither `http` nor `https`.
    #[error("unsupported URL scheme: {scheme}")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// An `https` URL was given to a build without secure transport.
    #[error("SSL support not available for {url}, rebuild with the `tls` feature")]
    SecureTransportUnavailable {
        /// The rejected URL.
        url: String,
    },

    /// The transport could not be constructed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SetupError {
    /// Setup failures are usage-style failures.
    #[must_use]
    pub fn exit_status(&self) -> ExitStatus {
        ExitStatus::Failure
    }
}
