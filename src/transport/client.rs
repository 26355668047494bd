//! HTTP transport used by the pool to issue GET requests.
//!
//! The [`Transport`] trait is the seam between the executor and the
//! network. [`HttpTransport`] is the reqwest-backed implementation; tests
//! and callers can inject their own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{DEFAULT_MAX_HANDLES, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS};
use super::error::TransportError;
use super::memory::MemoryBudget;

/// Status, headers and body of a completed HTTP exchange.
///
/// HTTP error statuses (4xx, 5xx) are ordinary responses here, never errors.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Fully buffered body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Creates an empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Appends a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Issues a single GET request and returns the raw response.
///
/// Implementations must not fail on HTTP error statuses; only network,
/// timeout and connection failures are errors.
///
/// # Object Safety
///
/// This trait uses `async_trait` so the executor can hold an
/// `Arc<dyn Transport>` and share it with spawned request tasks.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Fetches `url` with a GET request.
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;
}

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    /// Connect and total timeout per request.
    pub timeout: Duration,
    /// Maximum number of redirects followed (0 disables redirects).
    pub max_redirects: usize,
    /// Maximum idle connection handles kept per host.
    pub max_handles: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_handles: DEFAULT_MAX_HANDLES,
        }
    }
}

/// reqwest-backed transport.
///
/// Created once per batch and shared by all request tasks, taking
/// advantage of connection pooling.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    budget: Option<Arc<MemoryBudget>>,
}

impl HttpTransport {
    /// Builds a transport from the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the HTTP client cannot be built.
    #[instrument(level = "debug")]
    pub fn new(settings: &TransportSettings) -> Result<Self, TransportError> {
        let redirect = if settings.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(settings.max_redirects)
        };

        let client = Client::builder()
            .connect_timeout(settings.timeout)
            .timeout(settings.timeout)
            .redirect(redirect)
            .pool_max_idle_per_host(settings.max_handles)
            .gzip(true)
            .user_agent(default_user_agent())
            .build()
            .map_err(|source| TransportError::Client { source })?;

        Ok(Self {
            client,
            budget: None,
        })
    }

    /// Attaches a memory budget that all bodies read by this transport share.
    #[must_use]
    pub fn with_memory_budget(mut self, budget: Arc<MemoryBudget>) -> Self {
        self.budget = Some(budget);
        self
    }

    async fn read_body(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<Vec<u8>, TransportError> {
        let mut stream = response.bytes_stream();
        let mut body = Vec::new();
        let mut reservation = self.budget.as_deref().map(MemoryBudget::reservation);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| TransportError::network(url, e))?;
            if let Some(reserved) = reservation.as_mut()
                && !reserved.grow(chunk.len() as u64)
            {
                return Err(TransportError::body_too_large(url, reserved.limit()));
            }
            body.extend_from_slice(&chunk);
        }

        if let Some(reserved) = reservation {
            reserved.keep();
        }
        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self), fields(url = %url))]
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        let parsed = Url::parse(url).map_err(|_| TransportError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::invalid_url(url));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| TransportError::network(url, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = self.read_body(url, response).await?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// User-Agent sent with every request.
fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("http-pool/{version}")
}
