//! Secure-transport capability and CA bundle loading.

use std::path::PathBuf;
#[cfg(feature = "tls")]
use std::path::Path;

use reqwest::ClientBuilder;
#[cfg(feature = "tls")]
use reqwest::Certificate;
use thiserror::Error;
use tracing::debug;
#[cfg(feature = "tls")]
use tracing::warn;

use crate::session::TrustPolicy;

/// Errors loading a trusted CA source.
#[derive(Debug, Error)]
pub enum CaSourceError {
    /// The CA file could not be read.
    #[error("cannot read CA certificate file {path}: {source}")]
    Read {
        /// The CA file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The CA file is not a PEM bundle the TLS stack accepts.
    #[error("cannot parse CA certificate file {path}: {source}")]
    Parse {
        /// The CA file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: reqwest::Error,
    },

    /// The CA file parsed but held no certificates.
    #[error("no certificates found in {path}")]
    Empty {
        /// The CA file path.
        path: PathBuf,
    },
}

/// Capability to speak `https`.
///
/// Its presence is decided once at startup by [`detect`](Self::detect).
/// Sessions that are handed `None` reject encrypted URLs before connecting.
#[derive(Debug, Clone, Default)]
pub struct SecureTransportProvider {
    _private: (),
}

impl SecureTransportProvider {
    /// Returns the provider when this build carries secure-transport support.
    #[must_use]
    pub fn detect() -> Option<Self> {
        if cfg!(feature = "tls") {
            Some(Self::default())
        } else {
            None
        }
    }

    /// Applies the trust policy to a client builder.
    ///
    /// CA sources are loaded additively; a source that cannot be loaded is
    /// reported and skipped. With validation disabled, certificate failures
    /// are accepted by the TLS stack so the connection stays usable.
    #[cfg(feature = "tls")]
    #[must_use]
    pub fn configure(&self, mut builder: ClientBuilder, trust: &TrustPolicy) -> ClientBuilder {
        for source in trust.ca_sources() {
            match load_ca_bundle(source) {
                Ok(certificates) => {
                    debug!(path = %source.display(), count = certificates.len(), "loaded CA certificates");
                    for certificate in certificates {
                        builder = builder.add_root_certificate(certificate);
                    }
                }
                Err(error) => warn!(%error, "skipping CA certificate source"),
            }
        }

        if !trust.verify_certificates() {
            debug!("certificate validation disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
    }

    /// Without a TLS stack there is nothing to configure.
    #[cfg(not(feature = "tls"))]
    #[must_use]
    pub fn configure(&self, builder: ClientBuilder, trust: &TrustPolicy) -> ClientBuilder {
        debug!(
            ca_sources = trust.ca_sources().count(),
            "built without TLS support, trust policy has no effect"
        );
        builder
    }
}

/// Loads every certificate from a PEM bundle.
#[cfg(feature = "tls")]
///
/// # Errors
///
/// Returns [`CaSourceError`] if the file cannot be read, is not PEM, or is empty.
pub fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>, CaSourceError> {
    let pem = std::fs::read(path).map_err(|source| CaSourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let certificates = Certificate::from_pem_bundle(&pem).map_err(|source| CaSourceError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if certificates.is_empty() {
        return Err(CaSourceError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(certificates)
}
