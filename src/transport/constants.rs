//! Constants for the transport module (timeouts, redirects, connection handles).

/// Default per-request timeout (30 seconds), applied to connect and total time.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum number of redirects followed per request.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Default cap on simultaneously kept-alive connection handles per host.
pub const DEFAULT_MAX_HANDLES: usize = 100;
