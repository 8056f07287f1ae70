//! Request lifecycle controller.
//!
//! Turns one URL into connect → request → headers → (redirect)* → body →
//! finish, deciding where bytes land and which failures end the session.
//!
//! ```text
//! Idle → Connecting → AwaitingHeaders ─┬─ redirect ─→ Redirecting → Requesting → AwaitingHeaders
//!                                      ├─ 200/204 ──→ StreamingBody → Done
//!                                      └─ other ────→ Aborted
//! ```
//!
//! `Aborted` is reachable from every non-`Idle` state.

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, error, info, warn};
use url::Url;

use super::error::{ExitStatus, SessionError, SetupError};
use super::observer::SessionObserver;
use super::sink::{OutputSink, SinkResolver};
use crate::config::{SUPPORTED_SCHEMES, SessionConfig};
use crate::transport::{
    ConnectInfo, READ_CHUNK_SIZE, ResponseHead, SecureTransportProvider, Transport, TransportError,
};

/// Maximum redirect hops followed per session.
pub const MAX_REDIRECTS: u32 = 10;

/// Statuses whose body is written to the sink.
const SUCCESS_STATUSES: &[u16] = &[200, 204];

/// Lifecycle state of a download session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started.
    Idle,
    /// Connection and request issued.
    Connecting,
    /// Request reissued after a redirect.
    Requesting,
    /// Connected, waiting for the response head.
    AwaitingHeaders,
    /// Handling a redirect response.
    Redirecting,
    /// Writing body bytes to the sink.
    StreamingBody,
    /// Body fully received.
    Done,
    /// Ended by a fatal failure.
    Aborted,
}

impl SessionState {
    /// Returns true for `Done` and `Aborted`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// Drives one download session and owns its output sink.
#[derive(Debug)]
pub struct RequestController<'a> {
    config: &'a SessionConfig,
    resolver: SinkResolver,
    secure_available: bool,
    url: Url,
    state: SessionState,
    redirects: u32,
    sink: Option<OutputSink>,
    exit: ExitStatus,
    bytes_written: u64,
}

impl<'a> RequestController<'a> {
    /// Creates a controller for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::SecureTransportUnavailable`] for an `https` URL
    /// when no secure transport is available; no connection is attempted.
    pub fn new(
        config: &'a SessionConfig,
        secure: Option<&SecureTransportProvider>,
    ) -> Result<Self, SetupError> {
        let url = config.url().clone();
        if url.scheme() == "https" && secure.is_none() {
            return Err(SetupError::SecureTransportUnavailable {
                url: url.to_string(),
            });
        }

        Ok(Self {
            config,
            resolver: SinkResolver::new(config.output_dir()),
            secure_available: secure.is_some(),
            url,
            state: SessionState::Idle,
            redirects: 0,
            sink: None,
            exit: ExitStatus::Success,
            bytes_written: 0,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current target URL (the latest redirect target once redirected).
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Redirect hops followed so far.
    #[must_use]
    pub fn redirects(&self) -> u32 {
        self.redirects
    }

    /// Body bytes written to the sink.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Returns true while a sink is open.
    #[must_use]
    pub fn has_open_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// The session's exit status; success until a failure path assigns one.
    #[must_use]
    pub fn exit_status(&self) -> ExitStatus {
        self.exit
    }

    /// Issues the connection and the `GET` request for the session URL.
    pub fn start(&mut self, transport: &mut dyn Transport) {
        if self.state != SessionState::Idle {
            warn!(state = ?self.state, "session already started");
            return;
        }
        debug!(url = %self.url, "starting session");
        self.state = SessionState::Connecting;
        self.issue_request(transport);
    }

    fn issue_request(&self, transport: &mut dyn Transport) {
        transport.connect(&self.url);
        transport.request(Method::GET, &self.url);
    }

    async fn follow_redirect(&mut self, target: Url, transport: &mut dyn Transport) {
        self.state = SessionState::Redirecting;
        self.redirects += 1;

        if !SUPPORTED_SCHEMES.contains(&target.scheme()) {
            self.abort(
                SessionError::unfollowable_redirect(&target, "unsupported scheme"),
                transport,
            )
            .await;
            return;
        }
        if target.scheme() == "https" && !self.secure_available {
            self.abort(
                SessionError::unfollowable_redirect(&target, "SSL support not available"),
                transport,
            )
            .await;
            return;
        }

        info!(
            "Redirected to {} on {}",
            target,
            target.host_str().unwrap_or_default()
        );
        self.url = target;
        self.issue_request(transport);
        self.state = SessionState::Requesting;
    }

    async fn accept_response(&mut self, head: &ResponseHead, transport: &mut dyn Transport) {
        if !self.config.quiet() {
            info!("Headers ({}):", head.status);
            for (name, value) in head.headers.iter() {
                info!("{name}={value}");
            }
        }

        if !SUCCESS_STATUSES.contains(&head.status) {
            self.abort(SessionError::http_status(&self.url, head.status), transport)
                .await;
            return;
        }

        match self.resolver.resolve(&self.url, self.config.output()).await {
            Ok(sink) => {
                debug!(path = %sink.origin().path().display(), "output sink opened");
                self.sink = Some(sink);
                self.state = SessionState::StreamingBody;
            }
            Err(e) => self.abort(e, transport).await,
        }
    }

    async fn abort(&mut self, failure: SessionError, transport: &mut dyn Transport) {
        error!("{failure}");
        self.exit = failure.exit_status();
        self.finish(SessionState::Aborted, transport).await;
    }

    async fn finish(&mut self, state: SessionState, transport: &mut dyn Transport) {
        if let Some(sink) = self.sink.take() {
            let path = sink.origin().path().to_path_buf();
            if let Err(e) = sink.close().await {
                warn!(path = %path.display(), error = %e, "failed to flush output on close");
            }
        }
        transport.disconnect();
        self.state = state;
    }
}

#[async_trait]
impl<'a> SessionObserver for RequestController<'a> {
    fn on_connected(&mut self, info: &ConnectInfo) {
        if self.state.is_terminal() {
            return;
        }
        info!(
            "Connecting to {} {}:{}",
            info.host,
            info.addr.ip(),
            info.addr.port()
        );
        if matches!(
            self.state,
            SessionState::Connecting | SessionState::Requesting
        ) {
            self.state = SessionState::AwaitingHeaders;
        }
    }

    async fn on_headers(&mut self, head: &ResponseHead, transport: &mut dyn Transport) {
        if self.state.is_terminal() {
            return;
        }
        debug!(status = head.status, redirects = self.redirects, "response headers");

        if self.redirects < MAX_REDIRECTS
            && let Some(target) = head.redirect_target(&self.url)
        {
            self.follow_redirect(target, transport).await;
            return;
        }
        if head.is_redirect() && self.redirects >= MAX_REDIRECTS {
            warn!(
                redirects = self.redirects,
                "redirect limit reached, treating response as final"
            );
        }

        self.accept_response(head, transport).await;
    }

    async fn on_data(&mut self, transport: &mut dyn Transport) {
        if self.state != SessionState::StreamingBody {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        let failure = loop {
            let len = transport.read(&mut buf);
            if len == 0 {
                break None;
            }
            if let Err(e) = sink.write_all(&buf[..len]).await {
                break Some(SessionError::sink_write(sink.origin().path(), e));
            }
            self.bytes_written += len as u64;
        };

        if let Some(failure) = failure {
            self.abort(failure, transport).await;
        }
    }

    async fn on_end(&mut self, transport: &mut dyn Transport) {
        if self.state.is_terminal() {
            return;
        }
        if let Some(sink) = self.sink.take() {
            let path = sink.origin().path().to_path_buf();
            if let Err(e) = sink.close().await {
                self.abort(SessionError::sink_write(path, e), transport).await;
                return;
            }
            info!(path = %path.display(), bytes = self.bytes_written, "download complete");
        }
        self.finish(SessionState::Done, transport).await;
    }

    async fn on_error(&mut self, failure: &TransportError, transport: &mut dyn Transport) {
        if self.state.is_terminal() {
            return;
        }
        let kind = failure.kind();
        if self.config.trust().should_ignore(kind) {
            warn!("Connection error: {kind} (ignored)");
            debug!(detail = failure.message(), "ignored transport error");
            self.exit = ExitStatus::Success;
            return;
        }
        self.abort(SessionError::from_transport(&self.url, failure), transport)
            .await;
    }

    fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }
}
