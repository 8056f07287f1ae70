//! Scripted transport for controller tests.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use reqwest::Method;
use url::Url;

use crate::transport::{
    ConnectInfo, HeaderTable, ResponseHead, Transport, TransportError, TransportErrorKind,
    TransportEvent,
};

/// One scripted transport outcome.
pub(crate) enum Step {
    Event(TransportEvent),
    Data(Vec<u8>),
}

impl Step {
    pub(crate) fn connected(host: &str) -> Self {
        Self::Event(TransportEvent::Connected(ConnectInfo {
            host: host.to_string(),
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 80),
        }))
    }

    pub(crate) fn headers(status: u16, headers: &[(&str, &str)]) -> Self {
        let table: HeaderTable = headers.iter().copied().collect();
        Self::Event(TransportEvent::HeadersReady(ResponseHead::new(status, table)))
    }

    pub(crate) fn data(bytes: &[u8]) -> Self {
        Self::Data(bytes.to_vec())
    }

    pub(crate) fn end() -> Self {
        Self::Event(TransportEvent::EndOfStream)
    }

    pub(crate) fn error(kind: TransportErrorKind, message: &str) -> Self {
        Self::Event(TransportEvent::Error(TransportError::new(kind, message)))
    }

    pub(crate) fn into_event(self) -> TransportEvent {
        match self {
            Self::Event(event) => event,
            Self::Data(_) => TransportEvent::DataAvailable,
        }
    }
}

/// Replays a fixed sequence of events and records the commands it receives.
pub(crate) struct ScriptedTransport {
    steps: VecDeque<Step>,
    pending: VecDeque<u8>,
    connects: Vec<Url>,
    requests: Vec<(Method, Url)>,
    disconnected: bool,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            pending: VecDeque::new(),
            connects: Vec::new(),
            requests: Vec::new(),
            disconnected: false,
        }
    }

    pub(crate) fn connects(&self) -> &[Url] {
        &self.connects
    }

    pub(crate) fn requests(&self) -> &[(Method, Url)] {
        &self.requests
    }

    pub(crate) fn disconnected(&self) -> bool {
        self.disconnected
    }

    pub(crate) fn remaining(&self) -> usize {
        self.steps.len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn connect(&mut self, url: &Url) {
        self.connects.push(url.clone());
    }

    fn request(&mut self, method: Method, url: &Url) {
        self.requests.push((method, url.clone()));
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let len = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..len)) {
            *slot = byte;
        }
        len
    }

    fn disconnect(&mut self) {
        self.disconnected = true;
        self.pending.clear();
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.pending.clear();
        let step = self.steps.pop_front()?;
        if let Step::Data(bytes) = &step {
            self.pending.extend(bytes.iter().copied());
        }
        Some(step.into_event())
    }
}
