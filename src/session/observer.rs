//! Event interface between the driving loop and a session.

use async_trait::async_trait;

use crate::transport::{ConnectInfo, ResponseHead, Transport, TransportError};

/// Receives transport notifications for one session.
///
/// Handlers await only local output; anything that needs the network is
/// issued as a command on the transport passed in. Once
/// [`is_finished`](Self::is_finished) returns true the driving loop stops and
/// no further handler is called.
#[async_trait]
pub trait SessionObserver: Send {
    /// The transport resolved the remote endpoint.
    fn on_connected(&mut self, info: &ConnectInfo);

    /// A response status and header block arrived.
    async fn on_headers(&mut self, head: &ResponseHead, transport: &mut dyn Transport);

    /// Body bytes can be pulled from the transport.
    async fn on_data(&mut self, transport: &mut dyn Transport);

    /// The body is complete, or the transport has nothing left to do.
    ///
    /// Implementations must reach a terminal state here.
    async fn on_end(&mut self, transport: &mut dyn Transport);

    /// The transport failed.
    async fn on_error(&mut self, error: &TransportError, transport: &mut dyn Transport);

    /// Returns true once the session has reached a terminal state.
    fn is_finished(&self) -> bool;
}
