//! Types representing normalized request items and the ordered request set.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Identifier of a request: either an integer or a string.
///
/// Input keys (positional indices or associative keys) and resolved
/// identifiers share this type, so a missing identifier can fall back
/// to the element's key without conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer identifier (positional index or numeric key/value)
    Int(i64),
    /// String identifier
    Str(String),
}

impl RequestId {
    /// Parses an associative key, turning canonical decimal integers into `Int`.
    ///
    /// `"100"` and `"-3"` become integers; `"007"`, `"+1"`, `"1.5"` and
    /// `"abc"` stay strings.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        if is_canonical_integer(key)
            && let Ok(value) = key.parse::<i64>()
        {
            return Self::Int(value);
        }
        Self::Str(key.to_string())
    }

    /// Converts a resolved JSON value into an identifier.
    ///
    /// Integers and strings are accepted as-is; every other value
    /// (null, bool, float, array, object) resolves to `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(Self::Int),
            Value::String(text) => Some(Self::Str(text.clone())),
            _ => None,
        }
    }
}

fn is_canonical_integer(key: &str) -> bool {
    let digits = key.strip_prefix('-').unwrap_or(key);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    // "0" is canonical, "-0" and leading zeros are not
    if digits.len() > 1 && digits.starts_with('0') {
        return false;
    }
    !(key.starts_with('-') && digits == "0")
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for RequestId {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Str(value.to_string()), Self::Int)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// A single normalized request: identifier plus target URL.
///
/// `url` is `None` when no URL could be resolved for the input element;
/// such items are reported as unresolvable and never dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestItem {
    id: RequestId,
    url: Option<String>,
}

impl RequestItem {
    /// Creates a new request item.
    #[must_use]
    pub fn new(id: RequestId, url: Option<String>) -> Self {
        Self { id, url }
    }

    /// Returns the resolved identifier.
    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Returns the resolved URL, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl fmt::Display for RequestItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "[{}] {}", self.id, url),
            None => write!(f, "[{}] <no url>", self.id),
        }
    }
}

/// Ordered mapping of input key to [`RequestItem`].
///
/// Iteration follows insertion order. Inserting an existing key replaces
/// the item in place, keeping its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSet {
    entries: Vec<(RequestId, RequestItem)>,
    positions: HashMap<RequestId, usize>,
}

impl RequestSet {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an item under `key`, replacing any previous item with the same key.
    pub fn insert(&mut self, key: RequestId, item: RequestItem) {
        if let Some(&position) = self.positions.get(&key) {
            self.entries[position].1 = item;
            return;
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, item));
    }

    /// Returns the item stored under `key`.
    #[must_use]
    pub fn get(&self, key: &RequestId) -> Option<&RequestItem> {
        self.positions
            .get(key)
            .map(|&position| &self.entries[position].1)
    }

    /// Returns the first item in iteration order.
    #[must_use]
    pub fn first(&self) -> Option<&RequestItem> {
        self.entries.first().map(|(_, item)| item)
    }

    /// Returns true if the set holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over `(key, item)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RequestId, &RequestItem)> {
        self.entries.iter().map(|(key, item)| (key, item))
    }

    /// Iterates over items without a resolvable URL.
    pub fn unresolved(&self) -> impl Iterator<Item = &RequestItem> {
        self.entries
            .iter()
            .map(|(_, item)| item)
            .filter(|item| item.url.is_none())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: i64, url: &str) -> RequestItem {
        RequestItem::new(RequestId::Int(id), Some(url.to_string()))
    }

    #[test]
    fn test_request_id_from_key_parses_canonical_integers() {
        assert_eq!(RequestId::from_key("100"), RequestId::Int(100));
        assert_eq!(RequestId::from_key("0"), RequestId::Int(0));
        assert_eq!(RequestId::from_key("-3"), RequestId::Int(-3));
    }

    #[test]
    fn test_request_id_from_key_keeps_non_canonical_strings() {
        for key in ["007", "+1", "1.5", "abc", "", "-0", "-"] {
            assert_eq!(
                RequestId::from_key(key),
                RequestId::Str(key.to_string()),
                "key {key:?} should stay a string"
            );
        }
    }

    #[test]
    fn test_request_id_from_value() {
        assert_eq!(RequestId::from_value(&json!(12)), Some(RequestId::Int(12)));
        assert_eq!(
            RequestId::from_value(&json!("zqsd")),
            Some(RequestId::Str("zqsd".to_string()))
        );
        assert_eq!(RequestId::from_value(&json!(null)), None);
        assert_eq!(RequestId::from_value(&json!(1.5)), None);
        assert_eq!(RequestId::from_value(&json!(true)), None);
    }

    #[test]
    fn test_request_id_display_and_serialize() {
        assert_eq!(RequestId::Int(7).to_string(), "7");
        assert_eq!(RequestId::from("apero").to_string(), "apero");
        assert_eq!(serde_json::to_value(RequestId::Int(7)).unwrap(), json!(7));
        assert_eq!(
            serde_json::to_value(RequestId::from("apero")).unwrap(),
            json!("apero")
        );
    }

    #[test]
    fn test_request_set_preserves_insertion_order() {
        let mut set = RequestSet::new();
        set.insert(RequestId::Int(2), item(2, "https://b.test"));
        set.insert(RequestId::Int(1), item(1, "https://a.test"));

        let keys: Vec<_> = set.iter().map(|(key, _)| key.clone()).collect();
        assert_eq!(keys, vec![RequestId::Int(2), RequestId::Int(1)]);
        assert_eq!(set.first().unwrap().url(), Some("https://b.test"));
    }

    #[test]
    fn test_request_set_insert_existing_key_replaces_in_place() {
        let mut set = RequestSet::new();
        set.insert(RequestId::Int(0), item(0, "https://a.test"));
        set.insert(RequestId::Int(1), item(1, "https://b.test"));
        set.insert(RequestId::Int(0), item(9, "https://c.test"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.first().unwrap().id(), &RequestId::Int(9));
        assert_eq!(
            set.get(&RequestId::Int(0)).unwrap().url(),
            Some("https://c.test")
        );
    }

    #[test]
    fn test_request_set_unresolved() {
        let mut set = RequestSet::new();
        set.insert(RequestId::Int(0), item(0, "https://a.test"));
        set.insert(RequestId::Int(1), RequestItem::new(RequestId::Int(1), None));

        let unresolved: Vec<_> = set.unresolved().collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].id(), &RequestId::Int(1));
    }

    #[test]
    fn test_request_item_display() {
        assert_eq!(item(3, "https://a.test").to_string(), "[3] https://a.test");
        assert_eq!(
            RequestItem::new(RequestId::Int(4), None).to_string(),
            "[4] <no url>"
        );
    }
}
