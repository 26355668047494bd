//! Aggregate result of one pool execution.

use std::collections::HashMap;

use serde::Serialize;

use super::engine::ExecutionReport;
use crate::request::RequestId;
use crate::response::{BodyKind, DispatchStatus, Response};

/// Responses and counters produced by [`HttpPool::execute`](super::HttpPool::execute).
///
/// Fulfilled and rejected are partitioned by [`Response::is_success`], so an
/// HTTP 404 received from the server counts as rejected here even though
/// the transport delivered it.
#[derive(Debug, Clone, Default)]
pub struct ExecutedResult {
    responses: Vec<Response>,
    positions: HashMap<RequestId, usize>,
    request_count: usize,
    diff: usize,
    execution_time: Option<f64>,
    is_failed: bool,
    errors: Vec<String>,
}

impl ExecutedResult {
    /// Builds the result of a batch that ran.
    pub(crate) fn from_report(report: ExecutionReport, is_failed: bool, errors: Vec<String>) -> Self {
        let mut result = Self {
            request_count: report.request_count(),
            diff: report.diff(),
            execution_time: Some(report.execution_time()),
            is_failed,
            errors,
            ..Self::default()
        };
        for envelope in report.into_envelopes() {
            result.push(Response::make(envelope));
        }
        result
    }

    /// Builds the result of a batch that never ran.
    pub(crate) fn halted(request_count: usize, errors: Vec<String>) -> Self {
        Self {
            request_count,
            is_failed: true,
            errors,
            ..Self::default()
        }
    }

    /// Appends a response. The executor dispatches each id once.
    fn push(&mut self, response: Response) {
        self.positions
            .insert(response.id().clone(), self.responses.len());
        self.responses.push(response);
    }

    /// All responses in request order, including failures.
    #[must_use]
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// Returns the response for `id`.
    #[must_use]
    pub fn get(&self, id: &RequestId) -> Option<&Response> {
        self.positions
            .get(id)
            .map(|&position| &self.responses[position])
    }

    /// Responses with a 2xx status.
    pub fn fulfilled(&self) -> impl Iterator<Item = &Response> {
        self.responses.iter().filter(|response| response.is_success())
    }

    /// Responses without a 2xx status, including transport failures.
    pub fn rejected(&self) -> impl Iterator<Item = &Response> {
        self.responses
            .iter()
            .filter(|response| !response.is_success())
    }

    #[must_use]
    pub fn responses_count(&self) -> usize {
        self.responses.len()
    }

    #[must_use]
    pub fn fulfilled_count(&self) -> usize {
        self.fulfilled().count()
    }

    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected().count()
    }

    /// Number of items in the request set.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count
    }

    /// Items never dispatched, for lack of a URL or because a later item
    /// had the same id.
    #[must_use]
    pub fn diff(&self) -> usize {
        self.diff
    }

    /// Seconds spent executing, `None` if the batch never ran.
    #[must_use]
    pub fn execution_time(&self) -> Option<f64> {
        self.execution_time
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.is_failed
    }

    /// Errors recorded by the pool up to this execution.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Serializable overview of the result.
    #[must_use]
    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            request_count: self.request_count,
            fulfilled_count: self.fulfilled_count(),
            rejected_count: self.rejected_count(),
            diff: self.diff,
            execution_time: self.execution_time,
            is_failed: self.is_failed,
            errors: self.errors.clone(),
            responses: self.responses.iter().map(ResponseSummary::from).collect(),
        }
    }
}

/// Serializable overview of an [`ExecutedResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionSummary {
    pub request_count: usize,
    pub fulfilled_count: usize,
    pub rejected_count: usize,
    pub diff: usize,
    pub execution_time: Option<f64>,
    pub is_failed: bool,
    pub errors: Vec<String>,
    pub responses: Vec<ResponseSummary>,
}

/// One line of an [`ExecutionSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    pub id: RequestId,
    pub url: String,
    pub status_code: u16,
    pub success: bool,
    pub dispatch: DispatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub body: BodyKind,
    pub body_bytes: usize,
}

impl From<&Response> for ResponseSummary {
    fn from(response: &Response) -> Self {
        let metadata = response.metadata();
        Self {
            id: response.id().clone(),
            url: metadata.origin().to_string(),
            status_code: metadata.status_code(),
            success: response.is_success(),
            dispatch: metadata.dispatch_status(),
            reason: metadata.reason().map(str::to_string),
            content_type: metadata.content_type().map(str::to_string),
            body: response.body().kind(),
            body_bytes: response.body().bytes().len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_halted_result() {
        let result = ExecutedResult::halted(0, vec!["No requests to execute".to_string()]);

        assert!(result.is_failed());
        assert_eq!(result.fulfilled_count(), 0);
        assert_eq!(result.rejected_count(), 0);
        assert_eq!(result.execution_time(), None);
        assert_eq!(result.errors().len(), 1);
        assert!(result.responses().is_empty());
    }

    #[test]
    fn test_summary_serializes() {
        let result = ExecutedResult::halted(2, Vec::new());
        let json = serde_json::to_value(result.summary()).unwrap();

        assert_eq!(json["request_count"], 2);
        assert_eq!(json["is_failed"], true);
        assert!(json["execution_time"].is_null());
        assert_eq!(json["responses"].as_array().unwrap().len(), 0);
    }
}
