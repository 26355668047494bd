//! Transport layer: issuing GET requests and buffering responses.
//!
//! # Features
//!
//! - Never fails on HTTP error statuses; 4xx/5xx are ordinary responses
//! - Configurable timeout, redirect limit and connection handle cap
//! - Streaming body reads, optionally bounded by a per-batch [`MemoryBudget`]
//! - Pluggable through the [`Transport`] trait
//!
//! # Example
//!
//! ```no_run
//! use http_pool::transport::{HttpTransport, Transport, TransportSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(&TransportSettings::default())?;
//! let response = transport.get("https://example.com/feed.xml").await?;
//! println!("HTTP {}: {} bytes", response.status, response.body.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod memory;

pub use client::{HttpTransport, RawResponse, Transport, TransportSettings};
pub use constants::{DEFAULT_MAX_HANDLES, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS};
pub use error::TransportError;
pub use memory::{MemoryBudget, Reservation, parse_memory_limit};
