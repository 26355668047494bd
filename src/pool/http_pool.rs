//! The [`HttpPool`] facade: configuration, normalization and execution.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::engine::PooledExecutor;
use super::error::PoolError;
use super::executed::ExecutedResult;
use super::options::{DEFAULT_MEMORY_LIMIT, PoolOptions};
use crate::request::{FieldKeys, PoolInput, RequestSet, normalize};
use crate::transport::{HttpTransport, Transport};

/// Batched, concurrency-bounded HTTP fetcher.
///
/// Owns the input, the normalized request set and the options. Changing
/// the identifier or URL field re-normalizes the input immediately.
///
/// # Example
///
/// ```no_run
/// use http_pool::HttpPool;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut pool = HttpPool::from_json(json!([
///     {"uuid": 1, "api": "https://example.com/books/1"},
///     {"uuid": 2, "api": "https://example.com/books/2"},
/// ]))?
/// .with_identifier_key("uuid")
/// .with_url_key("api")
/// .with_concurrency(10);
///
/// let result = pool.execute().await?;
/// for response in result.fulfilled() {
///     println!("{}: {:?}", response.id(), response.body().find("title"));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpPool {
    input: PoolInput,
    keys: FieldKeys,
    requests: RequestSet,
    options: PoolOptions,
    transport: Option<Arc<dyn Transport>>,
    is_failed: bool,
    errors: Vec<String>,
}

impl HttpPool {
    /// Creates a pool over `input` with default options.
    #[must_use]
    pub fn new(input: PoolInput) -> Self {
        let keys = FieldKeys::default();
        let requests = normalize(&input, &keys);
        Self {
            input,
            keys,
            requests,
            options: PoolOptions::default(),
            transport: None,
            is_failed: false,
            errors: Vec::new(),
        }
    }

    /// Creates a pool over `input` with the given throw policy.
    #[must_use]
    pub fn make(input: PoolInput, throw_errors: bool) -> Self {
        Self::new(input).with_throw_errors(throw_errors)
    }

    /// Creates a pool from a JSON array or object.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidInput`] for any other JSON value.
    pub fn from_json(value: Value) -> Result<Self, PoolError> {
        Ok(Self::new(PoolInput::from_json(value)?))
    }

    /// Maximum requests per chunk.
    #[must_use]
    pub fn with_pool_limit(mut self, limit: usize) -> Self {
        self.options.pool_limit = limit;
        self
    }

    /// Maximum connection handles kept by the transport.
    #[must_use]
    pub fn with_max_handles(mut self, max_handles: usize) -> Self {
        self.options.max_handles = max_handles;
        self
    }

    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.options.max_redirects = max_redirects;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Maximum in-flight requests within a chunk.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.options.concurrency = concurrency;
        self
    }

    /// Field holding the identifier. Re-normalizes the input.
    #[must_use]
    pub fn with_identifier_key(mut self, key: impl Into<String>) -> Self {
        self.keys.identifier = key.into();
        self.renormalize();
        self
    }

    /// Field holding the URL. Re-normalizes the input.
    #[must_use]
    pub fn with_url_key(mut self, key: impl Into<String>) -> Self {
        self.keys.url = key.into();
        self.renormalize();
        self
    }

    /// Uses the URL as identifier. Re-normalizes the input.
    #[must_use]
    pub fn with_url_as_identifier(mut self, enabled: bool) -> Self {
        self.keys.url_as_identifier = enabled;
        self.renormalize();
        self
    }

    /// Prints progress through the console.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.options.verbose = verbose;
        self
    }

    /// Raises batch-level errors instead of recording them.
    #[must_use]
    pub fn with_throw_errors(mut self, throw_errors: bool) -> Self {
        self.options.throw_errors = throw_errors;
        self
    }

    /// Bounds the bytes buffered by one execution.
    ///
    /// `None` enables the bound with the default of 2G. Ignored by
    /// transports injected with [`with_transport`](Self::with_transport).
    #[must_use]
    pub fn with_memory_peak(mut self, limit: Option<&str>) -> Self {
        self.options.memory_limit = Some(limit.unwrap_or(DEFAULT_MEMORY_LIMIT).to_string());
        self
    }

    /// Replaces all options at once. Field keys are kept.
    #[must_use]
    pub fn with_options(mut self, options: PoolOptions) -> Self {
        self.options = options;
        self
    }

    /// Sends requests through `transport` instead of the HTTP client.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Number of normalized requests.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn requests(&self) -> &RequestSet {
        &self.requests
    }

    #[must_use]
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    #[must_use]
    pub fn keys(&self) -> &FieldKeys {
        &self.keys
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.is_failed
    }

    /// Errors recorded across executions.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Executes every request and aggregates the responses.
    ///
    /// Items without a URL are recorded as errors and skipped. Individual
    /// request failures become rejected responses.
    ///
    /// # Errors
    ///
    /// With `throw_errors` enabled, returns [`PoolError::EmptyBatch`] when
    /// there is nothing to execute, [`PoolError::InvalidLimit`] or
    /// [`PoolError::InvalidMemoryLimit`] for unusable options, and
    /// [`PoolError::BatchExecution`] when dispatch itself fails. Without it,
    /// those errors are recorded and a failed result is returned.
    #[instrument(skip(self), fields(requests = self.requests.len()))]
    pub async fn execute(&mut self) -> Result<ExecutedResult, PoolError> {
        let unresolved: Vec<_> = self.requests.unresolved().map(|item| item.id().clone()).collect();
        for id in unresolved {
            let error = PoolError::unresolvable_url(id);
            warn!(error = %error, "unresolvable request");
            self.record(&error);
        }

        if self.requests.is_empty() {
            return self.halt(PoolError::empty_batch(self.keys.url.clone()));
        }

        let executor = match self.build_executor() {
            Ok(executor) => executor,
            Err(error) => return self.halt(error),
        };

        match executor.execute(&self.requests).await {
            Ok(report) => Ok(ExecutedResult::from_report(
                report,
                self.is_failed,
                self.errors.clone(),
            )),
            Err(error) => self.halt(error),
        }
    }

    fn build_executor(&self) -> Result<PooledExecutor, PoolError> {
        self.options.validate()?;

        let transport = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => {
                let mut transport = HttpTransport::new(&self.options.transport_settings())
                    .map_err(|e| PoolError::batch_execution(e.to_string()))?;
                if let Some(budget) = self.options.memory_budget()? {
                    debug!(limit_bytes = budget.limit(), "memory budget enabled");
                    transport = transport.with_memory_budget(Arc::new(budget));
                }
                Arc::new(transport)
            }
        };

        PooledExecutor::new(transport, &self.options)
    }

    fn renormalize(&mut self) {
        self.requests = normalize(&self.input, &self.keys);
    }

    fn record(&mut self, error: &PoolError) {
        self.is_failed = true;
        self.errors.push(error.to_string());
    }

    /// Records `error`, then raises it or returns a failed result.
    fn halt(&mut self, error: PoolError) -> Result<ExecutedResult, PoolError> {
        warn!(error = %error, "pool execution halted");
        self.record(&error);
        if self.options.throw_errors {
            return Err(error);
        }
        Ok(ExecutedResult::halted(
            self.requests.len(),
            self.errors.clone(),
        ))
    }
}
