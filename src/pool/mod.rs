//! Pool orchestration: options, chunked execution and aggregated results.
//!
//! [`HttpPool`] drives the whole pipeline: input normalization,
//! [`PooledExecutor`] dispatch, response classification and aggregation
//! into an [`ExecutedResult`].

mod engine;
mod error;
mod executed;
mod http_pool;
mod options;

pub use engine::{ExecutionReport, PooledExecutor};
pub use error::PoolError;
pub use executed::{ExecutedResult, ExecutionSummary, ResponseSummary};
pub use http_pool::HttpPool;
pub use options::{DEFAULT_CONCURRENCY, DEFAULT_MEMORY_LIMIT, DEFAULT_POOL_LIMIT, PoolOptions};
