//! Heterogeneous input accepted by the pool.
//!
//! Input is an ordered collection of keyed entries. Each entry is one of
//! three shapes the resolver knows how to read:
//!
//! - a bare string, used as the URL
//! - a key/value map (JSON object)
//! - a [`Record`], a structured value exposing fields and accessors
//!
//! JSON scalars other than strings are kept as [`InputEntry::Scalar`] and
//! resolve nothing, so they fall back to their key with no URL.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::error::InputError;
use super::item::RequestId;

/// A structured value whose fields can be looked up by name.
///
/// Implement this for domain types that should be fed to the pool
/// directly. Resolution tries, in order, [`field`](Self::field) with the
/// configured name, [`call`](Self::call) with the same name, then
/// [`call`](Self::call) with the getter convention `get<Name>`.
///
/// Return `None` when the field or accessor does not exist at all, and
/// `Some(Value::Null)` when it exists but holds no value.
pub trait Record: Send + Sync + fmt::Debug {
    /// Returns the value of a public field.
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Invokes a zero-argument accessor and returns its value.
    fn call(&self, _method: &str) -> Option<Value> {
        None
    }
}

/// One element of the pool input.
#[derive(Debug, Clone)]
pub enum InputEntry {
    /// Bare string, used as the URL when no field resolves one
    Url(String),
    /// Key/value map
    Map(Map<String, Value>),
    /// Structured value with fields and accessors
    Record(Arc<dyn Record>),
    /// Any other JSON value
    Scalar(Value),
}

impl InputEntry {
    /// Wraps a [`Record`] implementation.
    pub fn record(record: impl Record + 'static) -> Self {
        Self::Record(Arc::new(record))
    }
}

impl From<&str> for InputEntry {
    fn from(value: &str) -> Self {
        Self::Url(value.to_string())
    }
}

impl From<String> for InputEntry {
    fn from(value: String) -> Self {
        Self::Url(value)
    }
}

impl From<Map<String, Value>> for InputEntry {
    fn from(value: Map<String, Value>) -> Self {
        Self::Map(value)
    }
}

impl From<Arc<dyn Record>> for InputEntry {
    fn from(value: Arc<dyn Record>) -> Self {
        Self::Record(value)
    }
}

impl From<Value> for InputEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Url(text),
            Value::Object(map) => Self::Map(map),
            other => Self::Scalar(other),
        }
    }
}

/// Ordered, keyed collection of input entries.
///
/// Positional entries receive the next integer key (one past the largest
/// integer key seen so far, starting at zero). Inserting an existing key
/// replaces the entry in place.
#[derive(Debug, Clone, Default)]
pub struct PoolInput {
    entries: Vec<(RequestId, InputEntry)>,
    positions: HashMap<RequestId, usize>,
    next_index: i64,
}

impl PoolInput {
    /// Creates an empty input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds input from a JSON document.
    ///
    /// Arrays produce positional keys; objects produce associative keys,
    /// with canonical integer keys such as `"100"` turned into integers.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::NotIterable`] for any value that is neither an
    /// array nor an object.
    pub fn from_json(value: Value) -> Result<Self, InputError> {
        let mut input = Self::new();
        match value {
            Value::Array(elements) => {
                for element in elements {
                    input.push(element);
                }
            }
            Value::Object(map) => {
                for (key, element) in map {
                    input.insert(RequestId::from_key(&key), element);
                }
            }
            other => return Err(InputError::not_iterable(&other)),
        }
        Ok(input)
    }

    /// Appends an entry under the next positional key.
    pub fn push(&mut self, entry: impl Into<InputEntry>) {
        let key = RequestId::Int(self.next_index);
        self.insert(key, entry);
    }

    /// Inserts an entry under an explicit key.
    pub fn insert(&mut self, key: impl Into<RequestId>, entry: impl Into<InputEntry>) {
        let key = key.into();
        if let RequestId::Int(index) = key
            && index >= self.next_index
        {
            self.next_index = index.saturating_add(1);
        }

        if let Some(&position) = self.positions.get(&key) {
            self.entries[position].1 = entry.into();
            return;
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, entry.into()));
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over `(key, entry)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RequestId, &InputEntry)> {
        self.entries.iter().map(|(key, entry)| (key, entry))
    }
}

impl<T: Into<InputEntry>> FromIterator<T> for PoolInput {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut input = Self::new();
        for entry in iter {
            input.push(entry);
        }
        input
    }
}

impl<T: Into<InputEntry>> From<Vec<T>> for PoolInput {
    fn from(entries: Vec<T>) -> Self {
        entries.into_iter().collect()
    }
}
