//! Error types for pool configuration and execution.
//!
//! Messages name the operation that failed, e.g.
//! ``Cannot find url for `1`. Method: execute()``.

use thiserror::Error;

use crate::request::{InputError, RequestId};

/// Errors raised or recorded by [`HttpPool`](super::HttpPool).
///
/// Per-request transport failures never appear here; they become rejected
/// responses.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Input could not be iterated.
    #[error("{source}. Method: make()")]
    InvalidInput {
        #[from]
        source: InputError,
    },

    /// An item has no resolvable URL. Recorded, never raised.
    #[error("Cannot find url for `{id}`. Method: execute()")]
    UnresolvableUrl {
        /// Identifier of the item.
        id: RequestId,
    },

    /// Normalization produced no requests.
    #[error(
        "No requests to execute, input array can be empty or doesn't have `{url_key}` key. Method: execute()"
    )]
    EmptyBatch {
        /// Configured URL field name.
        url_key: String,
    },

    /// A numeric option is out of range.
    #[error("invalid {name} value {value}: must be at least 1")]
    InvalidLimit {
        /// Option name.
        name: &'static str,
        /// The rejected value.
        value: u64,
    },

    /// The memory limit string could not be parsed.
    #[error("invalid memory limit `{value}`: expected bytes or a size like 512M or 2G")]
    InvalidMemoryLimit {
        /// The rejected value.
        value: String,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,

    /// The dispatch mechanism itself failed.
    #[error("Pool execution failed. Method: execute(). Error: {reason}")]
    BatchExecution {
        /// Failure detail.
        reason: String,
    },
}

impl PoolError {
    /// Creates an unresolvable URL error.
    pub fn unresolvable_url(id: RequestId) -> Self {
        Self::UnresolvableUrl { id }
    }

    /// Creates an empty batch error.
    pub fn empty_batch(url_key: impl Into<String>) -> Self {
        Self::EmptyBatch {
            url_key: url_key.into(),
        }
    }

    /// Creates an out-of-range option error.
    pub fn invalid_limit(name: &'static str, value: u64) -> Self {
        Self::InvalidLimit { name, value }
    }

    /// Creates a batch execution error.
    pub fn batch_execution(reason: impl Into<String>) -> Self {
        Self::BatchExecution {
            reason: reason.into(),
        }
    }
}
