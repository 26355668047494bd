//! Classified responses.
//!
//! Every dispatched request produces a [`ResponseEnvelope`]. The pool wraps
//! each envelope into a [`Response`]: derived [`ResponseMetadata`] plus a
//! classified [`ResponseBody`].

mod body;
mod envelope;
mod metadata;

pub use body::{BodyKind, ResponseBody};
pub use envelope::{DispatchStatus, ResponseEnvelope};
pub use metadata::ResponseMetadata;

use crate::request::RequestId;

/// A completed request: identifier, metadata and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    id: RequestId,
    metadata: ResponseMetadata,
    body: ResponseBody,
}

impl Response {
    /// Builds a response from an envelope, keyed by the envelope's id.
    #[must_use]
    pub fn make(envelope: ResponseEnvelope) -> Self {
        let metadata = ResponseMetadata::make(&envelope);
        let id = envelope.id().clone();
        let body = ResponseBody::make(envelope.into_body());
        Self { id, metadata, body }
    }

    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    #[must_use]
    pub fn metadata(&self) -> &ResponseMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// True when the status code is in `200..300`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.metadata.is_success()
    }

    /// True when the body is non-empty.
    #[must_use]
    pub fn is_body_available(&self) -> bool {
        self.body.exists()
    }
}
