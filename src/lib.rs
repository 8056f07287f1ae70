//! uget core library
//!
//! Single-shot streaming download of one `http` or `https` URL: connect,
//! request, follow a bounded number of redirects, stream the body to a file
//! or standard output, and report the outcome as a process exit status.
//!
//! # Architecture
//!
//! - [`config`] - Session configuration built from the command line
//! - [`session`] - Request lifecycle controller, output sinks, trust policy
//! - [`transport`] - Transport trait and the `reqwest`-backed implementation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod session;
pub mod transport;
mod user_agent;

use tracing::debug;

// Re-export commonly used types
pub use config::{OutputTarget, SessionConfig};
pub use session::{
    ExitStatus, RequestController, SessionError, SessionState, SetupError, TrustPolicy,
    run_session,
};
pub use transport::{HttpTransport, SecureTransportProvider, Transport};

/// Downloads the configured URL over HTTP(S) and returns the exit status.
///
/// # Errors
///
/// Returns [`SetupError`] if the session cannot be created: an `https` URL
/// without `secure`, or an HTTP client that fails to build.
pub async fn download(
    config: &SessionConfig,
    secure: Option<&SecureTransportProvider>,
) -> Result<ExitStatus, SetupError> {
    let mut controller = RequestController::new(config, secure)?;
    let mut transport = HttpTransport::new(config.trust(), secure)?;
    debug!(url = %config.url(), "session created");
    Ok(run_session(&mut transport, &mut controller).await)
}
