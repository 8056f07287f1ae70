//! The driving loop: pulls transport events and dispatches them.

use tracing::{debug, instrument, trace};

use super::controller::RequestController;
use super::error::ExitStatus;
use super::observer::SessionObserver;
use crate::transport::{Transport, TransportEvent};

/// Dispatches transport events to `observer` until it is finished.
///
/// A transport with nothing left to do is reported as end-of-stream.
pub async fn drive(transport: &mut dyn Transport, observer: &mut dyn SessionObserver) {
    while !observer.is_finished() {
        let Some(event) = transport.next_event().await else {
            debug!("transport idle, ending session");
            observer.on_end(transport).await;
            continue;
        };
        trace!(?event, "dispatching transport event");
        match event {
            TransportEvent::Connected(info) => observer.on_connected(&info),
            TransportEvent::HeadersReady(head) => observer.on_headers(&head, transport).await,
            TransportEvent::DataAvailable => observer.on_data(transport).await,
            TransportEvent::EndOfStream => observer.on_end(transport).await,
            TransportEvent::Error(error) => observer.on_error(&error, transport).await,
        }
    }
}

/// Starts the controller's session, drives it to completion, and returns
/// its exit status.
#[instrument(skip_all, fields(url = %controller.url()))]
pub async fn run_session(
    transport: &mut dyn Transport,
    controller: &mut RequestController<'_>,
) -> ExitStatus {
    controller.start(transport);
    drive(transport, controller).await;
    controller.exit_status()
}
