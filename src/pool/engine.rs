//! Chunked, concurrency-bounded request execution.
//!
//! The [`PooledExecutor`] splits a [`RequestSet`] into consecutive chunks of
//! at most `pool_limit` items and runs them one after another. Within a
//! chunk, every request runs in its own Tokio task and a semaphore keeps at
//! most `concurrency` of them in flight.
//!
//! # Concurrency Model
//!
//! - Chunk N+1 starts only after every request of chunk N has resolved
//! - A semaphore permit is acquired before spawning each request task
//! - Permits are released automatically when requests complete (RAII)
//! - Each task returns its [`ResponseEnvelope`] through its join handle, so
//!   outcomes are attributed by request, never by arrival order
//!
//! A failing request never aborts the batch: it becomes a rejected envelope.
//!
//! Requests are dispatched once per id. When several items share an id the
//! last one is sent, in the position of the first; the others count toward
//! the report's `diff` like items without a URL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::PoolError;
use super::options::PoolOptions;
use crate::console::{Console, Style};
use crate::request::{RequestId, RequestSet};
use crate::response::{DispatchStatus, ResponseEnvelope};
use crate::transport::{Transport, TransportError};

/// Outcome of one [`PooledExecutor::execute`] run.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    envelopes: Vec<ResponseEnvelope>,
    request_count: usize,
    fulfilled_count: usize,
    rejected_count: usize,
    execution_time: f64,
}

impl ExecutionReport {
    /// Envelopes in request order. Items without a URL have none.
    #[must_use]
    pub fn envelopes(&self) -> &[ResponseEnvelope] {
        &self.envelopes
    }

    #[must_use]
    pub fn into_envelopes(self) -> Vec<ResponseEnvelope> {
        self.envelopes
    }

    /// Number of items in the request set, dispatched or not.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count
    }

    /// Requests that received a response, whatever its status.
    #[must_use]
    pub fn fulfilled_count(&self) -> usize {
        self.fulfilled_count
    }

    /// Requests that failed before a response was received.
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected_count
    }

    /// Items never dispatched, for lack of a URL or because a later item
    /// had the same id.
    #[must_use]
    pub fn diff(&self) -> usize {
        self.request_count
            .saturating_sub(self.fulfilled_count + self.rejected_count)
    }

    /// Wall-clock seconds for the whole run, rounded to two decimals.
    #[must_use]
    pub fn execution_time(&self) -> f64 {
        self.execution_time
    }
}

/// Executes a request set in sequential chunks with bounded concurrency.
#[derive(Debug)]
pub struct PooledExecutor {
    transport: Arc<dyn Transport>,
    semaphore: Arc<Semaphore>,
    pool_limit: usize,
    concurrency: usize,
    timeout: Duration,
    console: Console,
}

impl PooledExecutor {
    /// Creates an executor over `transport` with the limits from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidLimit`] if a limit is zero.
    #[instrument(level = "debug", skip(transport))]
    pub fn new(transport: Arc<dyn Transport>, options: &PoolOptions) -> Result<Self, PoolError> {
        options.validate()?;

        debug!(
            pool_limit = options.pool_limit,
            concurrency = options.concurrency,
            timeout_secs = options.timeout.as_secs(),
            "creating pooled executor"
        );

        Ok(Self {
            transport,
            semaphore: Arc::new(Semaphore::new(options.concurrency)),
            pool_limit: options.pool_limit,
            concurrency: options.concurrency,
            timeout: options.timeout,
            console: Console::new(options.verbose),
        })
    }

    #[must_use]
    pub fn pool_limit(&self) -> usize {
        self.pool_limit
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Dispatches every item with a URL and collects the envelopes.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::SemaphoreClosed`] if the semaphore is closed and
    /// [`PoolError::BatchExecution`] if a request task panics.
    ///
    /// Individual request failures do NOT cause this method to error.
    #[instrument(skip(self, requests), fields(requests = requests.len()))]
    pub async fn execute(&self, requests: &RequestSet) -> Result<ExecutionReport, PoolError> {
        let request_count = requests.len();
        let plan = dispatch_plan(requests);
        let chunk_count = plan.len().div_ceil(self.pool_limit);
        let start = Instant::now();

        if request_count > 0 {
            self.console.new_line();
            if let Some(domain) = first_domain(requests) {
                self.console
                    .print(&format!("  HttpPool {domain} with async requests..."), Style::Info);
            }
            self.console.print(
                &format!(
                    "  Pool is limited to {} from options, {} requests will be converted into {chunk_count} chunks.",
                    self.pool_limit,
                    plan.len()
                ),
                Style::Comment,
            );
        }

        let mut envelopes = Vec::with_capacity(request_count);
        for (index, chunk) in plan.chunks(self.pool_limit).enumerate() {
            let current = index + 1;
            self.console.print(
                &format!(
                    "  Execute {} requests from chunk {current}/{chunk_count}...",
                    chunk.len()
                ),
                Style::Comment,
            );
            debug!(chunk = current, size = chunk.len(), "dispatching chunk");
            envelopes.extend(self.dispatch_chunk(chunk).await?);
        }

        let fulfilled_count = envelopes
            .iter()
            .filter(|envelope| envelope.dispatch() == DispatchStatus::Fulfilled)
            .count();
        let report = ExecutionReport {
            rejected_count: envelopes.len() - fulfilled_count,
            envelopes,
            request_count,
            fulfilled_count,
            execution_time: round_seconds(start.elapsed()),
        };

        self.print_summary(&report);
        info!(
            fulfilled = report.fulfilled_count(),
            rejected = report.rejected_count(),
            diff = report.diff(),
            seconds = report.execution_time(),
            "pool execution complete"
        );
        Ok(report)
    }

    async fn dispatch_chunk(
        &self,
        chunk: &[(RequestId, String)],
    ) -> Result<Vec<ResponseEnvelope>, PoolError> {
        let mut handles = Vec::with_capacity(chunk.len());

        for (id, url) in chunk {
            // Blocks while `concurrency` requests are in flight
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| PoolError::SemaphoreClosed)?;

            let transport = Arc::clone(&self.transport);
            let id = id.clone();
            let url = url.clone();
            let timeout = self.timeout;

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                dispatch(transport.as_ref(), timeout, id, url).await
            }));
        }

        debug!(task_count = handles.len(), "waiting for chunk to complete");

        let mut envelopes = Vec::with_capacity(handles.len());
        let mut failure = None;
        for handle in handles {
            match handle.await {
                Ok(envelope) => envelopes.push(envelope),
                Err(e) => {
                    warn!(error = %e, "request task panicked");
                    failure.get_or_insert_with(|| e.to_string());
                }
            }
        }

        match failure {
            Some(reason) => Err(PoolError::batch_execution(reason)),
            None => Ok(envelopes),
        }
    }

    fn print_summary(&self, report: &ExecutionReport) {
        let style = if report.rejected_count() > 0 {
            Style::Error
        } else {
            Style::Success
        };
        self.console.print(
            &format!(
                "  {} requests fulfilled, {} requests rejected.",
                report.fulfilled_count(),
                report.rejected_count()
            ),
            style,
        );

        let diff = report.diff();
        if diff > 0 {
            self.console.print(
                &format!(
                    "  On {} requests, {diff} requests cannot be executed because URL is not valid or the id is repeated.",
                    report.request_count()
                ),
                Style::Warning,
            );
        }

        self.console.print(
            &format!("  Done in {:.2} seconds.", report.execution_time()),
            Style::Info,
        );
        self.console.new_line();
    }
}

/// Issues one request and wraps its outcome.
async fn dispatch(
    transport: &dyn Transport,
    timeout: Duration,
    id: RequestId,
    url: String,
) -> ResponseEnvelope {
    let outcome = match tokio::time::timeout(timeout, transport.get(&url)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(TransportError::timeout(url.as_str())),
    };

    match outcome {
        Ok(raw) => {
            debug!(id = %id, status = raw.status.as_u16(), "request fulfilled");
            ResponseEnvelope::fulfilled(id, url, raw)
        }
        Err(error) => {
            warn!(id = %id, url = %url, error = %error, "HttpPool: one request rejected");
            ResponseEnvelope::rejected(id, url, error.to_string())
        }
    }
}

/// `(id, url)` pairs to dispatch, in request order.
///
/// Items without a URL are left out. A later item with an id already
/// planned replaces the earlier one in place.
fn dispatch_plan(requests: &RequestSet) -> Vec<(RequestId, String)> {
    let mut plan: Vec<(RequestId, String)> = Vec::with_capacity(requests.len());
    let mut positions: HashMap<&RequestId, usize> = HashMap::new();

    for (_, item) in requests.iter() {
        let Some(url) = item.url() else {
            debug!(id = %item.id(), "skipping item without url");
            continue;
        };
        if let Some(&position) = positions.get(item.id()) {
            debug!(id = %item.id(), "duplicate id, later item replaces earlier one");
            plan[position].1 = url.to_string();
            continue;
        }
        positions.insert(item.id(), plan.len());
        plan.push((item.id().clone(), url.to_string()));
    }
    plan
}

/// Host of the first item with a URL.
fn first_domain(requests: &RequestSet) -> Option<String> {
    let url = requests.first()?.url()?;
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

fn round_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::request::RequestItem;
    use crate::transport::RawResponse;

    /// Answers 200 for every URL except those containing "down".
    #[derive(Debug, Default)]
    struct StubTransport {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
            self.calls.lock().unwrap().push(url.to_string());
            if url.contains("down") {
                return Err(TransportError::other(url, "connection refused"));
            }
            Ok(RawResponse::new(StatusCode::OK).with_body(url.to_string()))
        }
    }

    #[derive(Debug)]
    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn get(&self, _url: &str) -> Result<RawResponse, TransportError> {
            panic!("transport bug");
        }
    }

    #[derive(Debug)]
    struct SlowTransport;

    #[async_trait]
    impl Transport for SlowTransport {
        async fn get(&self, _url: &str) -> Result<RawResponse, TransportError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(RawResponse::new(StatusCode::OK))
        }
    }

    fn request_set(urls: &[Option<&str>]) -> RequestSet {
        let mut set = RequestSet::new();
        for (index, url) in urls.iter().enumerate() {
            let key = RequestId::from(index);
            set.insert(
                key.clone(),
                RequestItem::new(key, url.map(str::to_string)),
            );
        }
        set
    }

    fn executor(transport: Arc<dyn Transport>, pool_limit: usize) -> PooledExecutor {
        let options = PoolOptions {
            pool_limit,
            ..PoolOptions::default()
        };
        PooledExecutor::new(transport, &options).unwrap()
    }

    #[test]
    fn test_new_rejects_zero_concurrency() {
        let options = PoolOptions {
            concurrency: 0,
            ..PoolOptions::default()
        };
        let result = PooledExecutor::new(Arc::new(StubTransport::default()), &options);
        assert!(matches!(
            result,
            Err(PoolError::InvalidLimit {
                name: "concurrency",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_execute_counts_and_order() {
        let transport = Arc::new(StubTransport::default());
        let executor = executor(transport.clone(), 2);
        let requests = request_set(&[
            Some("https://a.test/0"),
            Some("https://down.test/1"),
            None,
            Some("https://a.test/3"),
            Some("https://a.test/4"),
        ]);

        let report = executor.execute(&requests).await.unwrap();

        assert_eq!(report.request_count(), 5);
        assert_eq!(report.fulfilled_count(), 3);
        assert_eq!(report.rejected_count(), 1);
        assert_eq!(report.diff(), 1);
        assert_eq!(
            report.fulfilled_count() + report.rejected_count() + report.diff(),
            report.request_count()
        );

        let ids: Vec<_> = report.envelopes().iter().map(|e| e.id().clone()).collect();
        assert_eq!(
            ids,
            vec![
                RequestId::Int(0),
                RequestId::Int(1),
                RequestId::Int(3),
                RequestId::Int(4)
            ]
        );
        assert_eq!(transport.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_rejection_is_synthetic_500() {
        let executor = executor(Arc::new(StubTransport::default()), 10);
        let requests = request_set(&[Some("https://down.test/")]);

        let report = executor.execute(&requests).await.unwrap();
        let envelope = &report.envelopes()[0];

        assert_eq!(envelope.dispatch(), DispatchStatus::Rejected);
        assert_eq!(envelope.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(envelope.reason().unwrap().contains("connection refused"));
        assert_eq!(envelope.origin(), "https://down.test/");
    }

    #[tokio::test]
    async fn test_timeout_rejects_single_request() {
        let options = PoolOptions {
            timeout: Duration::from_millis(50),
            ..PoolOptions::default()
        };
        let executor = PooledExecutor::new(Arc::new(SlowTransport), &options).unwrap();
        let requests = request_set(&[Some("https://slow.test/")]);

        let report = executor.execute(&requests).await.unwrap();

        assert_eq!(report.rejected_count(), 1);
        assert!(report.envelopes()[0].reason().unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn test_all_unresolved_dispatches_nothing() {
        let transport = Arc::new(StubTransport::default());
        let executor = executor(transport.clone(), 1);
        let requests = request_set(&[None, None]);

        let report = executor.execute(&requests).await.unwrap();

        assert_eq!(report.diff(), 2);
        assert!(report.envelopes().is_empty());
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_request_fails_the_batch() {
        let executor = executor(Arc::new(PanickingTransport), 10);
        let requests = request_set(&[Some("https://a.test/0"), Some("https://a.test/1")]);

        let error = executor.execute(&requests).await.unwrap_err();

        assert!(matches!(error, PoolError::BatchExecution { .. }));
        assert!(error.to_string().starts_with("Pool execution failed"));
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_dispatched_once() {
        let transport = Arc::new(StubTransport::default());
        let executor = executor(transport.clone(), 10);
        let mut requests = RequestSet::new();
        let items = [
            (0, "a", "https://a.test/first"),
            (1, "b", "https://b.test"),
            (2, "a", "https://a.test/last"),
        ];
        for (key, id, url) in items {
            requests.insert(
                RequestId::Int(key),
                RequestItem::new(RequestId::from(id), Some(url.to_string())),
            );
        }

        let report = executor.execute(&requests).await.unwrap();

        assert_eq!(report.request_count(), 3);
        assert_eq!(report.fulfilled_count(), 2);
        assert_eq!(report.diff(), 1);
        let sent: Vec<_> = report.envelopes().iter().map(ResponseEnvelope::origin).collect();
        assert_eq!(sent, ["https://a.test/last", "https://b.test"]);
        assert_eq!(transport.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_dispatch_plan_chunks_preserve_order_and_bound() {
        let urls: Vec<_> = (0..5).map(|i| format!("https://a.test/{i}")).collect();
        let mut with_gap: Vec<Option<&str>> = urls.iter().map(|url| Some(url.as_str())).collect();
        with_gap.insert(2, None);

        let plan = dispatch_plan(&request_set(&with_gap));
        let sizes: Vec<usize> = plan.chunks(2).map(<[_]>::len).collect();

        assert_eq!(sizes, [2, 2, 1]);
        assert_eq!(sizes.iter().sum::<usize>(), 5);
        let sent: Vec<_> = plan.iter().map(|(_, url)| url.as_str()).collect();
        assert_eq!(sent, urls);
    }

    #[test]
    fn test_round_seconds() {
        assert!((round_seconds(Duration::from_millis(1234)) - 1.23).abs() < 1e-9);
        assert!((round_seconds(Duration::from_millis(1236)) - 1.24).abs() < 1e-9);
        assert!(round_seconds(Duration::ZERO).abs() < 1e-9);
    }

    #[test]
    fn test_first_domain() {
        let requests = request_set(&[Some("https://books.test/api"), Some("https://x.test")]);
        assert_eq!(first_domain(&requests).as_deref(), Some("books.test"));
        assert_eq!(first_domain(&request_set(&[None])), None);
    }
}
