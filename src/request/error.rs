//! Error types for input normalization.

use thiserror::Error;

/// Errors that can occur while turning raw input into a request set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Input is not a sequence or a key/value collection.
    #[error("input must be an iterable (JSON array or object), found {found}")]
    NotIterable {
        /// Kind of value that was provided instead
        found: &'static str,
    },
}

impl InputError {
    /// Creates a `NotIterable` error for the given JSON value.
    #[must_use]
    pub fn not_iterable(value: &serde_json::Value) -> Self {
        let found = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "an array",
            serde_json::Value::Object(_) => "an object",
        };
        Self::NotIterable { found }
    }
}
