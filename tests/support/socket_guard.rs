//! Guard for tests that need to bind localhost sockets.
//!
//! Sandboxed runners sometimes forbid binding; such tests are skipped with a
//! note on stderr unless `UGET_REQUIRE_SOCKET_TESTS` asks for a hard failure.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

/// Returns true when `UGET_REQUIRE_SOCKET_TESTS` is set to a truthy value.
#[must_use]
pub fn socket_tests_required() -> bool {
    std::env::var("UGET_REQUIRE_SOCKET_TESTS")
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Returns true if the calling test should return early because localhost
/// cannot be bound. Panics instead when socket tests are required.
#[track_caller]
#[must_use]
pub fn should_skip_socket_bound_test() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let location = Location::caller();
    let message = format!(
        "[socket-bound-test] cannot bind localhost socket at {}:{}; wiremock-based test cannot run in this environment",
        location.file(),
        location.line()
    );
    if socket_tests_required() {
        panic!("{message}. Set UGET_REQUIRE_SOCKET_TESTS=0 to allow local skip behavior.");
    }

    eprintln!("{message}. Skipping test. Set UGET_REQUIRE_SOCKET_TESTS=1 to fail-fast instead.");
    true
}

/// Starts a wiremock server, or returns `None` when the test should be skipped.
#[allow(dead_code)]
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if should_skip_socket_bound_test() {
        None
    } else {
        Some(MockServer::start().await)
    }
}
