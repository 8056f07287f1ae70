//! Download session: lifecycle controller, output sinks, and trust policy.
//!
//! A session downloads exactly one URL. The [`RequestController`] reacts to
//! transport events delivered by [`drive`], follows up to
//! [`MAX_REDIRECTS`] redirects, streams the accepted body into an
//! [`OutputSink`], and ends with an [`ExitStatus`].
//!
//! # Example
//!
//! ```no_run
//! use uget_core::config::{OutputTarget, SessionConfig};
//! use uget_core::session::{RequestController, TrustPolicy, run_session};
//! use uget_core::transport::{HttpTransport, SecureTransportProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let url = SessionConfig::parse_url("https://example.com/file.tar.gz")?;
//! let config = SessionConfig::new(url, OutputTarget::Derived, TrustPolicy::default());
//! let secure = SecureTransportProvider::detect();
//! let mut transport = HttpTransport::new(config.trust(), secure.as_ref())?;
//! let mut controller = RequestController::new(&config, secure.as_ref())?;
//! let status = run_session(&mut transport, &mut controller).await;
//! std::process::exit(i32::from(status.code()));
//! # }
//! ```

mod controller;
mod driver;
mod error;
mod observer;
mod sink;
mod trust;

#[cfg(test)]
mod testing;

pub use controller::{MAX_REDIRECTS, RequestController, SessionState};
pub use driver::{drive, run_session};
pub use error::{ExitStatus, SessionError, SetupError};
pub use observer::SessionObserver;
pub use sink::{DEFAULT_FILENAME, OutputSink, SinkOrigin, SinkResolver, derive_filename};
pub use trust::TrustPolicy;
