//! Transport collaborator: connection, request issue, and body delivery.
//!
//! The request controller never touches sockets or HTTP framing directly.
//! It drives a [`Transport`] through a small command set (`connect`,
//! `request`, `read`, `disconnect`) and reacts to the [`TransportEvent`]s the
//! transport reports from [`Transport::next_event`].
//!
//! # Implementations
//!
//! - [`HttpTransport`]: production implementation backed by `reqwest`
//! - Scripted implementations in tests

mod constants;
mod error;
mod http;
mod tls;

use std::net::SocketAddr;

use async_trait::async_trait;
use reqwest::Method;
use url::Url;

pub use constants::{CONNECT_TIMEOUT_SECS, READ_CHUNK_SIZE, READ_TIMEOUT_SECS};
pub use error::{TransportError, TransportErrorKind};
pub use http::HttpTransport;
pub use tls::{CaSourceError, SecureTransportProvider};
#[cfg(feature = "tls")]
pub use tls::load_ca_bundle;

/// HTTP status codes that carry a `Location` to retry at.
pub const REDIRECT_STATUSES: &[u16] = &[301, 302, 303, 307, 308];

/// Readiness notification delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The remote endpoint was resolved and a connection is being made.
    Connected(ConnectInfo),
    /// A response status line and header block were received.
    HeadersReady(ResponseHead),
    /// Body bytes are available through [`Transport::read`].
    DataAvailable,
    /// The response body has been fully received.
    EndOfStream,
    /// The transport failed.
    Error(TransportError),
}

/// Where the transport is connecting to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    /// Host as it appears in the URL.
    pub host: String,
    /// Resolved socket address.
    pub addr: SocketAddr,
}

/// Ordered, case-insensitive header name/value table for one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    entries: Vec<(String, String)>,
}

impl HeaderTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header, preserving arrival order.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the first value for `name`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Iterates headers in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of header entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no headers were received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl From<&reqwest::header::HeaderMap> for HeaderTable {
    fn from(headers: &reqwest::header::HeaderMap) -> Self {
        headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}

/// Status and headers of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderTable,
}

impl ResponseHead {
    /// Creates a response head.
    #[must_use]
    pub fn new(status: u16, headers: HeaderTable) -> Self {
        Self { status, headers }
    }

    /// Returns true if the status asks the client to retry elsewhere.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        REDIRECT_STATUSES.contains(&self.status)
    }

    /// Resolves the `Location` header against `base`.
    ///
    /// Returns `None` for non-redirect statuses, a missing header, or a
    /// location that does not form a valid URL.
    #[must_use]
    pub fn redirect_target(&self, base: &Url) -> Option<Url> {
        if !self.is_redirect() {
            return None;
        }
        let location = self.headers.get("location")?.trim();
        if location.is_empty() {
            return None;
        }
        base.join(location).ok()
    }
}

/// Protocol engine driven by the request controller.
///
/// Commands are non-blocking: they queue work which the transport performs
/// inside [`next_event`](Transport::next_event). A failed connect or request
/// drops any work queued behind it.
#[async_trait]
pub trait Transport: Send {
    /// Queues a connection to the host of `url`.
    fn connect(&mut self, url: &Url);

    /// Queues a request for `url`, replacing any response still in flight.
    fn request(&mut self, method: Method, url: &Url);

    /// Copies currently available body bytes into `buf`.
    ///
    /// Returns 0 once everything delivered by the last
    /// [`TransportEvent::DataAvailable`] has been read.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Drops queued work and any response in flight.
    fn disconnect(&mut self);

    /// Performs the next unit of work and reports its outcome.
    ///
    /// Returns `None` when there is nothing left to do.
    async fn next_event(&mut self) -> Option<TransportEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect(status: u16, location: Option<&str>) -> ResponseHead {
        let mut headers = HeaderTable::new();
        headers.append("Server", "test");
        if let Some(location) = location {
            headers.append("Location", location);
        }
        ResponseHead::new(status, headers)
    }

    #[test]
    fn test_header_table_lookup_is_case_insensitive() {
        let table: HeaderTable = [("Content-Type", "text/plain"), ("X-Custom", "1")]
            .into_iter()
            .collect();
        assert_eq!(table.get("content-type"), Some("text/plain"));
        assert_eq!(table.get("X-CUSTOM"), Some("1"));
        assert_eq!(table.get("missing"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_header_table_preserves_order() {
        let mut table = HeaderTable::new();
        table.append("b", "2");
        table.append("a", "1");
        let names: Vec<&str> = table.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_redirect_target_absolute_location() {
        let base = Url::parse("http://example.com/old").unwrap();
        let head = redirect(301, Some("https://mirror.example.org/new.bin"));
        assert_eq!(
            head.redirect_target(&base).unwrap().as_str(),
            "https://mirror.example.org/new.bin"
        );
    }

    #[test]
    fn test_redirect_target_relative_location() {
        let base = Url::parse("http://example.com/dir/old").unwrap();
        let head = redirect(302, Some("../files/new.bin"));
        assert_eq!(
            head.redirect_target(&base).unwrap().as_str(),
            "http://example.com/files/new.bin"
        );
    }

    #[test]
    fn test_redirect_target_missing_location() {
        let base = Url::parse("http://example.com/").unwrap();
        assert!(redirect(307, None).redirect_target(&base).is_none());
        assert!(redirect(308, Some("  ")).redirect_target(&base).is_none());
    }

    #[test]
    fn test_redirect_target_ignored_for_non_redirect_status() {
        let base = Url::parse("http://example.com/").unwrap();
        let head = redirect(200, Some("/elsewhere"));
        assert!(!head.is_redirect());
        assert!(head.redirect_target(&base).is_none());
    }
}
