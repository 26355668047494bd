//! Status classification and header view of a completed request.

use std::collections::BTreeMap;
use std::time::SystemTime;

use reqwest::header::{CONTENT_TYPE, DATE, HeaderMap, HeaderName, SERVER};

use super::envelope::{DispatchStatus, ResponseEnvelope};
use crate::request::RequestId;

/// Metadata derived from a [`ResponseEnvelope`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMetadata {
    status_code: u16,
    reason: Option<String>,
    is_success: bool,
    is_json: bool,
    is_xml: bool,
    server: Option<String>,
    date: Option<SystemTime>,
    content_type: Option<String>,
    origin: String,
    id: RequestId,
    dispatch: DispatchStatus,
    headers: BTreeMap<String, String>,
}

impl ResponseMetadata {
    /// Derives metadata from an envelope.
    ///
    /// An absent or unparseable `Date` header yields `None`, never an error.
    #[must_use]
    pub fn make(envelope: &ResponseEnvelope) -> Self {
        let status = envelope.status();
        let headers = envelope.headers();

        let content_type = joined(headers, &CONTENT_TYPE);
        let lowered = content_type
            .as_deref()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let reason = match envelope.dispatch() {
            DispatchStatus::Rejected => envelope.reason().map(str::to_string),
            DispatchStatus::Fulfilled => status.canonical_reason().map(str::to_string),
        };

        Self {
            status_code: status.as_u16(),
            reason,
            is_success: status.is_success(),
            is_json: lowered.contains("json"),
            is_xml: lowered.contains("xml"),
            server: joined(headers, &SERVER),
            date: headers
                .get(DATE)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| httpdate::parse_http_date(value).ok()),
            content_type,
            origin: envelope.origin().to_string(),
            id: envelope.id().clone(),
            dispatch: envelope.dispatch(),
            headers: collect_headers(headers),
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Reason phrase, or the failure detail for a rejected request.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// True when the status code is in `200..300`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.is_success
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        !self.is_success
    }

    /// True when the declared content type mentions JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.is_json
    }

    /// True when the declared content type mentions XML.
    #[must_use]
    pub fn is_xml(&self) -> bool {
        self.is_xml
    }

    #[must_use]
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    #[must_use]
    pub fn date(&self) -> Option<SystemTime> {
        self.date
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// URL the request was sent to.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    #[must_use]
    pub fn dispatch_status(&self) -> DispatchStatus {
        self.dispatch
    }

    /// All headers, keyed by lowercase name. Repeated headers are joined with `", "`.
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Looks up a header by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

fn joined(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .filter_map(|name| joined(headers, name).map(|value| (name.as_str().to_string(), value)))
        .collect()
}
