//! Certificate trust policy.

use std::path::{Path, PathBuf};

use crate::transport::TransportErrorKind;

/// Whether certificate failures abort a session, and which extra CAs to trust.
///
/// Fixed at startup and shared by reference with the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    verify: bool,
    ca_sources: Vec<PathBuf>,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TrustPolicy {
    /// Creates a policy with no extra CA sources.
    #[must_use]
    pub fn new(verify: bool) -> Self {
        Self {
            verify,
            ca_sources: Vec::new(),
        }
    }

    /// Adds a trusted CA source. Sources accumulate.
    pub fn load_ca_source(&mut self, path: impl Into<PathBuf>) {
        self.ca_sources.push(path.into());
    }

    /// Returns true when certificate validation is mandatory.
    #[must_use]
    pub fn verify_certificates(&self) -> bool {
        self.verify
    }

    /// Trusted CA sources in the order they were added.
    pub fn ca_sources(&self) -> impl Iterator<Item = &Path> {
        self.ca_sources.iter().map(PathBuf::as_path)
    }

    /// Returns true if a failure of this kind should be logged and ignored.
    #[must_use]
    pub fn should_ignore(&self, kind: TransportErrorKind) -> bool {
        !self.verify && kind.is_certificate()
    }
}
