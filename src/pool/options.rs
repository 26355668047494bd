//! Pool configuration.

use std::time::Duration;

use crate::transport::{
    DEFAULT_MAX_HANDLES, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS, MemoryBudget,
    TransportSettings, parse_memory_limit,
};

use super::error::PoolError;

/// Default number of requests per chunk.
pub const DEFAULT_POOL_LIMIT: usize = 250;

/// Default number of in-flight requests within a chunk.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Memory limit used when memory peak mode is enabled without a value.
pub const DEFAULT_MEMORY_LIMIT: &str = "2G";

/// Settings for one pool.
///
/// The three limits are independent: `pool_limit` bounds the size of a
/// chunk, `concurrency` bounds in-flight requests within a chunk and
/// `max_handles` bounds the connections the transport keeps open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum requests per chunk.
    pub pool_limit: usize,
    /// Maximum connection handles kept by the transport.
    pub max_handles: usize,
    /// Maximum redirects followed per request.
    pub max_redirects: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum in-flight requests within a chunk.
    pub concurrency: usize,
    /// Print progress through the console.
    pub verbose: bool,
    /// Raise batch-level errors instead of recording them.
    pub throw_errors: bool,
    /// Buffered body budget for one execution, e.g. `"2G"`.
    pub memory_limit: Option<String>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            pool_limit: DEFAULT_POOL_LIMIT,
            max_handles: DEFAULT_MAX_HANDLES,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            verbose: false,
            throw_errors: true,
            memory_limit: None,
        }
    }
}

impl PoolOptions {
    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidLimit`] for a zero pool limit, concurrency,
    /// handle cap or timeout, and [`PoolError::InvalidMemoryLimit`] for an
    /// unparseable memory limit.
    pub fn validate(&self) -> Result<(), PoolError> {
        for (name, value) in [
            ("pool limit", self.pool_limit),
            ("concurrency", self.concurrency),
            ("max handles", self.max_handles),
        ] {
            if value == 0 {
                return Err(PoolError::invalid_limit(name, 0));
            }
        }
        if self.timeout.is_zero() {
            return Err(PoolError::invalid_limit("timeout", 0));
        }
        self.memory_budget().map(|_| ())
    }

    /// Builds the memory budget for one execution, if a limit is set.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidMemoryLimit`] if the limit cannot be parsed.
    pub fn memory_budget(&self) -> Result<Option<MemoryBudget>, PoolError> {
        let Some(limit) = &self.memory_limit else {
            return Ok(None);
        };
        parse_memory_limit(limit)
            .map(|bytes| Some(MemoryBudget::new(bytes)))
            .ok_or_else(|| PoolError::InvalidMemoryLimit {
                value: limit.clone(),
            })
    }

    /// Transport settings derived from these options.
    #[must_use]
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            timeout: self.timeout,
            max_redirects: self.max_redirects,
            max_handles: self.max_handles,
        }
    }
}
