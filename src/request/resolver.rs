//! Field resolution: mapping input entries onto `{id, url}` pairs.
//!
//! Each input shape gets its own [`FieldResolver`], chosen by matching on
//! [`InputEntry`]. Resolution order is fixed:
//!
//! 1. map-like entries: the value stored under the field name
//! 2. record-like entries: public field, then accessor of the same name,
//!    then the `get<Name>` accessor
//! 3. string entries: the whole string becomes the URL
//! 4. no identifier resolved: the entry's key in the input

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::input::{InputEntry, PoolInput, Record};
use super::item::{RequestId, RequestItem, RequestSet};

/// Default identifier field name.
pub const DEFAULT_IDENTIFIER_KEY: &str = "id";

/// Default URL field name.
pub const DEFAULT_URL_KEY: &str = "url";

/// Field names used to extract identifier and URL from input entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldKeys {
    /// Name of the identifier field
    pub identifier: String,
    /// Name of the URL field
    pub url: String,
    /// Use the resolved URL as identifier
    pub url_as_identifier: bool,
}

impl Default for FieldKeys {
    fn default() -> Self {
        Self {
            identifier: DEFAULT_IDENTIFIER_KEY.to_string(),
            url: DEFAULT_URL_KEY.to_string(),
            url_as_identifier: false,
        }
    }
}

/// Reads named fields out of one input shape.
pub trait FieldResolver {
    /// Returns the value of `field`, or `None` if the shape has no such field.
    fn resolve(&self, field: &str) -> Option<Value>;

    /// Returns the URL to use when no URL field resolved.
    fn fallback_url(&self) -> Option<String> {
        None
    }
}

struct MapResolver<'a>(&'a Map<String, Value>);

impl FieldResolver for MapResolver<'_> {
    fn resolve(&self, field: &str) -> Option<Value> {
        self.0.get(field).cloned()
    }
}

struct RecordResolver<'a>(&'a dyn Record);

impl FieldResolver for RecordResolver<'_> {
    fn resolve(&self, field: &str) -> Option<Value> {
        self.0
            .field(field)
            .or_else(|| self.0.call(field))
            .or_else(|| self.0.call(&getter_name(field)))
    }
}

struct StringResolver<'a>(&'a str);

impl FieldResolver for StringResolver<'_> {
    fn resolve(&self, _field: &str) -> Option<Value> {
        None
    }

    fn fallback_url(&self) -> Option<String> {
        non_empty(self.0)
    }
}

struct EmptyResolver;

impl FieldResolver for EmptyResolver {
    fn resolve(&self, _field: &str) -> Option<Value> {
        None
    }
}

impl InputEntry {
    /// Returns the resolver matching this entry's shape.
    #[must_use]
    pub fn resolver(&self) -> Box<dyn FieldResolver + '_> {
        match self {
            Self::Url(url) => Box::new(StringResolver(url)),
            Self::Map(map) => Box::new(MapResolver(map)),
            Self::Record(record) => Box::new(RecordResolver(record.as_ref())),
            Self::Scalar(_) => Box::new(EmptyResolver),
        }
    }
}

/// Builds the getter-by-convention name: `uuid` becomes `getUuid`.
#[must_use]
pub fn getter_name(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("get{}{}", first.to_uppercase(), chars.as_str()),
        None => "get".to_string(),
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn url_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => non_empty(text),
        _ => None,
    }
}

/// Resolves a single entry into a request item.
#[must_use]
pub fn resolve_entry(key: &RequestId, entry: &InputEntry, keys: &FieldKeys) -> RequestItem {
    let resolver = entry.resolver();

    let url = resolver
        .resolve(&keys.url)
        .as_ref()
        .and_then(url_from_value)
        .or_else(|| resolver.fallback_url());

    let id = if keys.url_as_identifier {
        url.clone().map(RequestId::Str)
    } else {
        resolver
            .resolve(&keys.identifier)
            .as_ref()
            .and_then(RequestId::from_value)
    };

    RequestItem::new(id.unwrap_or_else(|| key.clone()), url)
}

/// Normalizes the whole input into an ordered request set.
///
/// Output order follows input order. Entries without a resolvable URL are
/// kept with `url = None`; they are reported later, not here.
#[instrument(level = "debug", skip(input), fields(entries = input.len()))]
#[must_use]
pub fn normalize(input: &PoolInput, keys: &FieldKeys) -> RequestSet {
    let mut requests = RequestSet::new();
    for (key, entry) in input.iter() {
        requests.insert(key.clone(), resolve_entry(key, entry, keys));
    }

    debug!(
        requests = requests.len(),
        unresolved = requests.unresolved().count(),
        "normalized input"
    );
    requests
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Record exposing `uuid` as a public field and `endpoint` through a getter.
    #[derive(Debug)]
    struct Book {
        uuid: i64,
        endpoint: String,
    }

    impl Record for Book {
        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "uuid" => Some(json!(self.uuid)),
                _ => None,
            }
        }

        fn call(&self, method: &str) -> Option<Value> {
            match method {
                "getEndpoint" => Some(json!(self.endpoint)),
                _ => None,
            }
        }
    }

    /// Record where the field exists, an accessor of the same name exists too.
    #[derive(Debug)]
    struct Shadowed;

    impl Record for Shadowed {
        fn field(&self, name: &str) -> Option<Value> {
            (name == "url").then(|| json!("https://field.test"))
        }

        fn call(&self, method: &str) -> Option<Value> {
            match method {
                "url" => Some(json!("https://method.test")),
                "getUrl" => Some(json!("https://getter.test")),
                "id" => Some(json!("from-method")),
                "getId" => Some(json!("from-getter")),
                _ => None,
            }
        }
    }

    fn keys(identifier: &str, url: &str) -> FieldKeys {
        FieldKeys {
            identifier: identifier.to_string(),
            url: url.to_string(),
            url_as_identifier: false,
        }
    }

    #[test]
    fn test_bare_urls_use_positional_ids() {
        let input = PoolInput::from_json(json!(["https://a.test", "https://b.test"])).unwrap();
        let requests = normalize(&input, &FieldKeys::default());

        let items: Vec<_> = requests.iter().map(|(_, item)| item.clone()).collect();
        assert_eq!(
            items,
            vec![
                RequestItem::new(RequestId::Int(0), Some("https://a.test".to_string())),
                RequestItem::new(RequestId::Int(1), Some("https://b.test".to_string())),
            ]
        );
    }

    #[test]
    fn test_map_entries_with_custom_fields() {
        let input = PoolInput::from_json(json!([{"uuid": 100, "api": "https://x.test"}])).unwrap();
        let requests = normalize(&input, &keys("uuid", "api"));

        assert_eq!(
            requests.first().unwrap(),
            &RequestItem::new(RequestId::Int(100), Some("https://x.test".to_string()))
        );
    }

    #[test]
    fn test_map_entry_without_url_keeps_null_url() {
        let input = PoolInput::from_json(json!([{"id": 1}])).unwrap();
        let requests = normalize(&input, &FieldKeys::default());

        assert_eq!(
            requests.first().unwrap(),
            &RequestItem::new(RequestId::Int(1), None)
        );
    }

    #[test]
    fn test_associative_keys_become_ids() {
        let input = PoolInput::from_json(json!({
            "100": "https://a.test",
            "apero": "https://b.test",
        }))
        .unwrap();
        let requests = normalize(&input, &FieldKeys::default());

        let ids: Vec<_> = requests.iter().map(|(_, item)| item.id().clone()).collect();
        assert_eq!(ids, vec![RequestId::Int(100), RequestId::from("apero")]);
    }

    #[test]
    fn test_record_field_then_getter() {
        let mut input = PoolInput::new();
        input.push(InputEntry::record(Book {
            uuid: 125,
            endpoint: "https://books.test/125".to_string(),
        }));
        let requests = normalize(&input, &keys("uuid", "endpoint"));

        assert_eq!(
            requests.first().unwrap(),
            &RequestItem::new(
                RequestId::Int(125),
                Some("https://books.test/125".to_string())
            )
        );
    }

    #[test]
    fn test_record_priority_field_over_method_over_getter() {
        let mut input = PoolInput::new();
        input.push(InputEntry::record(Shadowed));
        let requests = normalize(&input, &FieldKeys::default());
        let item = requests.first().unwrap();

        assert_eq!(item.url(), Some("https://field.test"));
        assert_eq!(item.id(), &RequestId::from("from-method"));
    }

    #[test]
    fn test_url_as_identifier_overrides_id_field() {
        let input = PoolInput::from_json(json!([
            {"id": 5, "url": "https://a.test"},
            "https://b.test",
        ]))
        .unwrap();
        let keys = FieldKeys {
            url_as_identifier: true,
            ..FieldKeys::default()
        };
        let requests = normalize(&input, &keys);

        let ids: Vec<_> = requests.iter().map(|(_, item)| item.id().clone()).collect();
        assert_eq!(
            ids,
            vec![RequestId::from("https://a.test"), RequestId::from("https://b.test")]
        );
    }

    #[test]
    fn test_url_as_identifier_without_url_falls_back_to_key() {
        let input = PoolInput::from_json(json!([{"id": 5}])).unwrap();
        let keys = FieldKeys {
            url_as_identifier: true,
            ..FieldKeys::default()
        };
        let requests = normalize(&input, &keys);
        assert_eq!(requests.first().unwrap().id(), &RequestId::Int(0));
    }

    #[test]
    fn test_non_string_or_empty_url_is_unresolved() {
        let input = PoolInput::from_json(json!([
            {"url": 42},
            {"url": ""},
            {"url": null},
            7,
        ]))
        .unwrap();
        let requests = normalize(&input, &FieldKeys::default());
        assert_eq!(requests.unresolved().count(), 4);
    }

    #[test]
    fn test_null_identifier_falls_back_to_key() {
        let input = PoolInput::from_json(json!({"alpha": {"id": null, "url": "https://a.test"}}))
            .unwrap();
        let requests = normalize(&input, &FieldKeys::default());
        assert_eq!(requests.first().unwrap().id(), &RequestId::from("alpha"));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let input = PoolInput::from_json(json!([
            {"uuid": 1, "api": "https://a.test"},
            {"uuid": 2, "api": "https://b.test"},
        ]))
        .unwrap();
        let keys = keys("uuid", "api");
        assert_eq!(normalize(&input, &keys), normalize(&input, &keys));
    }

    #[test]
    fn test_getter_name() {
        assert_eq!(getter_name("uuid"), "getUuid");
        assert_eq!(getter_name("url"), "getUrl");
        assert_eq!(getter_name("Api"), "getApi");
        assert_eq!(getter_name(""), "get");
    }
}
