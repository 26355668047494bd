//! Typed outcome of a single dispatched request.

use std::fmt;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::request::RequestId;
use crate::transport::RawResponse;

/// Transport-level outcome of a dispatched request.
///
/// Fulfilled means an HTTP response was received, whatever its status.
/// Rejected means the request failed before a response was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    /// A response was received.
    Fulfilled,
    /// Network, timeout or connection failure.
    Rejected,
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fulfilled => write!(f, "fulfilled"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Result of one request, returned by the executor together with the
/// identity of the request that produced it.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    id: RequestId,
    origin: String,
    dispatch: DispatchStatus,
    status: StatusCode,
    reason: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseEnvelope {
    /// Wraps a received response.
    #[must_use]
    pub fn fulfilled(id: RequestId, origin: String, raw: RawResponse) -> Self {
        Self {
            id,
            origin,
            dispatch: DispatchStatus::Fulfilled,
            status: raw.status,
            reason: None,
            headers: raw.headers,
            body: raw.body,
        }
    }

    /// Synthesizes a status 500 response for a request that failed in transit.
    #[must_use]
    pub fn rejected(id: RequestId, origin: String, reason: impl Into<String>) -> Self {
        Self {
            id,
            origin,
            dispatch: DispatchStatus::Rejected,
            status: StatusCode::INTERNAL_SERVER_ERROR,
            reason: Some(reason.into()),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Identifier of the request.
    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// URL the request was sent to.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn dispatch(&self) -> DispatchStatus {
        self.dispatch
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Failure detail of a rejected request.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the envelope and returns the body.
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}
