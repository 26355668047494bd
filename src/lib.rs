//! HTTP Pool Library
//!
//! Batched, concurrency-bounded HTTP fetching. A heterogeneous collection of
//! request descriptors (bare URLs, key/value maps or records) is normalized
//! into `{id, url}` pairs, fetched with GET requests in sequential chunks of
//! bounded concurrency, and returned as classified responses keyed by id.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`request`] - Input normalization and field resolution
//! - [`transport`] - HTTP transport with streaming bodies and memory budget
//! - [`response`] - Response metadata and body classification
//! - [`pool`] - Chunked executor and the [`HttpPool`] facade
//! - [`console`] - Progress output for verbose pools

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod console;
pub mod pool;
pub mod request;
pub mod response;
pub mod transport;

// Re-export commonly used types
pub use console::{Console, Style};
pub use pool::{
    DEFAULT_CONCURRENCY, DEFAULT_POOL_LIMIT, ExecutedResult, ExecutionSummary, HttpPool,
    PoolError, PoolOptions, PooledExecutor,
};
pub use request::{FieldKeys, InputEntry, PoolInput, Record, RequestId, RequestItem, RequestSet};
pub use response::{BodyKind, DispatchStatus, Response, ResponseBody, ResponseMetadata};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError, TransportSettings};
