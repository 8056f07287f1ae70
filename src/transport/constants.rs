//! Constants for the HTTP transport (timeouts, read granularity).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle read timeout (5 minutes between body chunks).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Size of the scratch buffer the controller drains body bytes into.
pub const READ_CHUNK_SIZE: usize = 16 * 1024;
