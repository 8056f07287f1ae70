//! `reqwest`-backed transport.
//!
//! Redirect following is disabled in the underlying client so that every
//! response, including each redirect hop, is reported to the controller.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::{Client, Method, redirect};
use tracing::{debug, instrument, trace};
use url::{Host, Url};

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::{classify_failure, render_error_chain};
use super::{
    ConnectInfo, ResponseHead, SecureTransportProvider, Transport, TransportError, TransportEvent,
};
use crate::session::TrustPolicy;
use crate::user_agent;

type BodyStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

enum Command {
    Connect(Url),
    Request(Method, Url),
}

/// HTTP(S) transport built on a `reqwest` client.
pub struct HttpTransport {
    client: Client,
    commands: VecDeque<Command>,
    body: Option<BodyStream>,
    pending: Bytes,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("queued_commands", &self.commands.len())
            .field("body_in_flight", &self.body.is_some())
            .field("pending_bytes", &self.pending.len())
            .finish()
    }
}

impl HttpTransport {
    /// Creates a transport with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the HTTP client cannot be built.
    pub fn new(
        trust: &TrustPolicy,
        secure: Option<&SecureTransportProvider>,
    ) -> Result<Self, TransportError> {
        Self::with_timeouts(trust, secure, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a transport with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the HTTP client cannot be built.
    #[instrument(level = "debug", skip(trust, secure))]
    pub fn with_timeouts(
        trust: &TrustPolicy,
        secure: Option<&SecureTransportProvider>,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .redirect(redirect::Policy::none())
            .user_agent(user_agent::default_user_agent());
        if let Some(provider) = secure {
            builder = provider.configure(builder, trust);
        }
        let client = builder.build().map_err(|e| {
            TransportError::other(format!("cannot build HTTP client: {}", render_error_chain(&e)))
        })?;

        Ok(Self {
            client,
            commands: VecDeque::new(),
            body: None,
            pending: Bytes::new(),
        })
    }

    fn fail(&mut self, error: TransportError) -> TransportEvent {
        self.commands.clear();
        self.body = None;
        TransportEvent::Error(error)
    }

    async fn resolve(&mut self, url: &Url) -> TransportEvent {
        match resolve_endpoint(url).await {
            Ok(info) => TransportEvent::Connected(info),
            Err(error) => self.fail(error),
        }
    }

    async fn send(&mut self, method: Method, url: Url) -> TransportEvent {
        self.body = None;
        match self.client.request(method, url).send().await {
            Ok(response) => {
                let head = ResponseHead::new(response.status().as_u16(), response.headers().into());
                trace!(status = head.status, headers = head.headers.len(), "response headers received");
                self.body = Some(Box::pin(response.bytes_stream()));
                TransportEvent::HeadersReady(head)
            }
            Err(e) => {
                let error = classify_reqwest_error(&e);
                self.fail(error)
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn connect(&mut self, url: &Url) {
        self.commands.push_back(Command::Connect(url.clone()));
    }

    fn request(&mut self, method: Method, url: &Url) {
        self.commands.push_back(Command::Request(method, url.clone()));
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let len = buf.len().min(self.pending.len());
        let chunk = self.pending.split_to(len);
        buf[..len].copy_from_slice(&chunk);
        len
    }

    fn disconnect(&mut self) {
        self.commands.clear();
        self.body = None;
        self.pending = Bytes::new();
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        // Readiness is edge-triggered: bytes not drained after the last
        // DataAvailable are dropped.
        self.pending = Bytes::new();

        if let Some(command) = self.commands.pop_front() {
            let event = match command {
                Command::Connect(url) => self.resolve(&url).await,
                Command::Request(method, url) => self.send(method, url).await,
            };
            return Some(event);
        }

        let body = self.body.as_mut()?;
        let event = match body.next().await {
            Some(Ok(chunk)) => {
                trace!(bytes = chunk.len(), "body chunk received");
                self.pending = chunk;
                TransportEvent::DataAvailable
            }
            Some(Err(e)) => {
                let error = classify_reqwest_error(&e);
                self.fail(error)
            }
            None => {
                self.body = None;
                TransportEvent::EndOfStream
            }
        };
        Some(event)
    }
}

/// Resolves the URL's host to the first socket address.
async fn resolve_endpoint(url: &Url) -> Result<ConnectInfo, TransportError> {
    let host = url
        .host()
        .ok_or_else(|| TransportError::other(format!("URL has no host: {url}")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| TransportError::other(format!("URL has no known port: {url}")))?;

    let addr = match host {
        Host::Ipv4(ip) => SocketAddr::from((ip, port)),
        Host::Ipv6(ip) => SocketAddr::from((ip, port)),
        Host::Domain(domain) => tokio::net::lookup_host((domain, port))
            .await
            .map_err(|e| TransportError::connect(format!("cannot resolve {domain}: {e}")))?
            .next()
            .ok_or_else(|| TransportError::connect(format!("no addresses for {domain}")))?,
    };

    debug!(%addr, "resolved endpoint");
    Ok(ConnectInfo {
        host: host.to_string(),
        addr,
    })
}

fn classify_reqwest_error(error: &reqwest::Error) -> TransportError {
    let detail = render_error_chain(error);
    let kind = classify_failure(&detail, error.is_connect());
    TransportError::new(kind, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportErrorKind;

    fn transport() -> HttpTransport {
        HttpTransport::new(&TrustPolicy::default(), None).unwrap()
    }

    #[tokio::test]
    async fn test_idle_transport_reports_no_events() {
        let mut transport = transport();
        assert!(transport.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_connect_to_ip_literal_skips_dns() {
        let mut transport = transport();
        let url = Url::parse("http://127.0.0.1:8080/file").unwrap();
        transport.connect(&url);
        match transport.next_event().await {
            Some(TransportEvent::Connected(info)) => {
                assert_eq!(info.host, "127.0.0.1");
                assert_eq!(info.addr.port(), 8080);
            }
            other => panic!("expected Connected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_to_unresolvable_host_drops_queued_request() {
        let mut transport = transport();
        let url = Url::parse("http://host.invalid/file").unwrap();
        transport.connect(&url);
        transport.request(Method::GET, &url);
        match transport.next_event().await {
            Some(TransportEvent::Error(error)) => {
                assert_eq!(error.kind(), TransportErrorKind::Connect);
            }
            other => panic!("expected connect error, got {other:?}"),
        }
        assert!(transport.next_event().await.is_none());
    }

    #[test]
    fn test_read_with_nothing_pending_returns_zero() {
        let mut transport = transport();
        let mut buf = [0u8; 8];
        assert_eq!(transport.read(&mut buf), 0);
    }

    #[test]
    fn test_read_drains_pending_bytes_in_pieces() {
        let mut transport = transport();
        transport.pending = Bytes::from_static(b"0123456789");
        let mut buf = [0u8; 4];
        assert_eq!(transport.read(&mut buf), 4);
        assert_eq!(&buf, b"0123");
        assert_eq!(transport.read(&mut buf), 4);
        assert_eq!(transport.read(&mut buf), 2);
        assert_eq!(&buf[..2], b"89");
        assert_eq!(transport.read(&mut buf), 0);
    }
}
