//! Error types for the transport module.
//!
//! A [`TransportError`] returned for a single request never aborts a batch:
//! the executor turns it into a rejected response whose reason is the
//! error's `Display` text.

use thiserror::Error;

/// Errors that can occur while issuing a single GET request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The URL is malformed or uses an unsupported scheme.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, too many redirects, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Buffering the body would exceed the batch memory budget.
    #[error("response body of {url} exceeds the memory budget of {limit_bytes} bytes")]
    BodyTooLarge {
        /// The URL whose body was dropped.
        url: String,
        /// Budget in bytes for the whole batch.
        limit_bytes: u64,
    },

    /// Failure reported by a custom transport.
    #[error("request to {url} failed: {message}")]
    Other {
        /// The URL that failed.
        url: String,
        /// Transport-specific detail.
        message: String,
    },

    /// The HTTP client could not be built from the pool options.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a memory budget error.
    pub fn body_too_large(url: impl Into<String>, limit_bytes: u64) -> Self {
        Self::BodyTooLarge {
            url: url.into(),
            limit_bytes,
        }
    }

    /// Creates a failure for custom transports.
    pub fn other(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Other {
            url: url.into(),
            message: message.into(),
        }
    }
}

// No `From<reqwest::Error>`: every variant needs the URL, which the source error
// does not reliably carry. Use the constructor helpers instead.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_timeout_display() {
        let error = TransportError::timeout("https://a.test/slow");
        let msg = error.to_string();
        assert!(msg.contains("timeout"), "Expected 'timeout' in: {msg}");
        assert!(msg.contains("https://a.test/slow"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_transport_error_invalid_url_display() {
        let msg = TransportError::invalid_url("not-a-url").to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_transport_error_body_too_large_display() {
        let msg = TransportError::body_too_large("https://a.test/big", 1024).to_string();
        assert!(msg.contains("1024"), "Expected limit in: {msg}");
        assert!(msg.contains("https://a.test/big"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_transport_error_other_display() {
        let msg = TransportError::other("https://a.test", "connection reset").to_string();
        assert!(msg.contains("connection reset"), "Expected detail in: {msg}");
    }
}
