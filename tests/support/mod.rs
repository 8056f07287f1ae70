//! Shared helpers for socket-bound integration tests.

pub mod socket_guard;

use std::net::TcpListener;

/// Returns a localhost port that nothing is listening on.
#[allow(dead_code)]
pub fn closed_local_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}
