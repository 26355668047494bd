//! Body classification: binary, JSON, XML, HTML or plain text.
//!
//! Classification ignores the declared content type and looks only at the
//! payload. The checks run in priority order and stop at the first match:
//!
//! 1. Binary, when the payload is not valid UTF-8
//! 2. JSON (object, array or scalar)
//! 3. XML, unless the text carries an HTML5 doctype
//! 4. HTML, when stripping tags would change the text
//!
//! Anything else is plain text.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, ParsingOptions};
use serde::Serialize;
use serde_json::Value;

/// A `<` followed by anything but whitespace opens a tag that stripping would remove.
#[allow(clippy::expect_used)]
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\S").expect("tag regex is valid") // Static pattern, safe to panic
});

const HTML5_DOCTYPE: &str = "<!doctype html>";

/// Shape of a payload, as determined by [`ResponseBody::make`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Empty,
    Binary,
    Json,
    Xml,
    Html,
    Text,
}

/// Classified response payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseBody {
    raw: Vec<u8>,
    json: Option<Value>,
    is_binary: bool,
    is_xml: bool,
    is_html: bool,
}

impl ResponseBody {
    /// Classifies a raw payload.
    #[must_use]
    pub fn make(raw: Vec<u8>) -> Self {
        let mut body = Self {
            raw,
            ..Self::default()
        };
        if body.raw.is_empty() {
            return body;
        }

        let Ok(text) = std::str::from_utf8(&body.raw) else {
            body.is_binary = true;
            return body;
        };

        if let Ok(value) = serde_json::from_str::<Value>(text) {
            body.json = Some(value);
        } else if is_valid_xml(text) {
            body.is_xml = true;
        } else if TAG_PATTERN.is_match(text) {
            body.is_html = true;
        }
        body
    }

    /// True when the payload is non-empty.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.raw.is_empty()
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.is_binary
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.json.is_some()
    }

    /// True when the payload is JSON with an array root.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.json, Some(Value::Array(_)))
    }

    #[must_use]
    pub fn is_xml(&self) -> bool {
        self.is_xml
    }

    #[must_use]
    pub fn is_html(&self) -> bool {
        self.is_html
    }

    /// Returns the classification of the payload.
    #[must_use]
    pub fn kind(&self) -> BodyKind {
        if !self.exists() {
            BodyKind::Empty
        } else if self.is_binary {
            BodyKind::Binary
        } else if self.is_json() {
            BodyKind::Json
        } else if self.is_xml {
            BodyKind::Xml
        } else if self.is_html {
            BodyKind::Html
        } else {
            BodyKind::Text
        }
    }

    /// Payload as text. `None` for empty or binary payloads.
    #[must_use]
    pub fn contents(&self) -> Option<&str> {
        if self.is_binary {
            return None;
        }
        std::str::from_utf8(&self.raw)
            .ok()
            .filter(|text| !text.is_empty())
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Decoded JSON payload.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Parses the payload as an XML document.
    ///
    /// Returns `None` unless the payload was classified as XML.
    #[must_use]
    pub fn xml(&self) -> Option<Document<'_>> {
        if !self.is_xml {
            return None;
        }
        let text = self.contents()?;
        Document::parse_with_options(text.trim(), xml_options()).ok()
    }

    /// Returns the first value stored under `key` in the JSON payload.
    ///
    /// Searches depth-first in document order; array indices never match.
    /// A `null` match ends the search within its own object and yields
    /// `None` there, but a `null` found in a nested object does not stop the
    /// search of its parents. `{"key":null,"x":{"key":1}}` gives `None`,
    /// while `{"a":{"key":null},"b":{"key":1}}` gives `1`.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&Value> {
        found(find_key(self.json.as_ref()?, key))
    }
}

fn xml_options() -> ParsingOptions {
    ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    }
}

fn is_valid_xml(text: &str) -> bool {
    let content = text.trim();
    if content.is_empty() || content.to_ascii_lowercase().contains(HTML5_DOCTYPE) {
        return false;
    }
    Document::parse_with_options(content, xml_options()).is_ok()
}

/// Returns the match at this level, which may be `null`.
fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.iter().find_map(|(name, child)| {
            if name == key {
                Some(child)
            } else {
                found(find_key(child, key))
            }
        }),
        Value::Array(items) => items
            .iter()
            .find_map(|child| found(find_key(child, key))),
        _ => None,
    }
}

fn found(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(raw: &[u8]) -> ResponseBody {
        ResponseBody::make(raw.to_vec())
    }

    fn flags(body: &ResponseBody) -> [bool; 3] {
        [body.is_json(), body.is_xml(), body.is_html()]
    }

    #[test]
    fn test_empty_payload_has_no_flags() {
        let body = classify(b"");
        assert!(!body.exists());
        assert!(!body.is_binary());
        assert_eq!(flags(&body), [false, false, false]);
        assert_eq!(body.contents(), None);
    }

    #[test]
    fn test_binary_short_circuits() {
        let body = classify(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff]);
        assert!(body.exists());
        assert!(body.is_binary());
        assert_eq!(flags(&body), [false, false, false]);
        assert_eq!(body.contents(), None);
        assert_eq!(body.bytes().len(), 9);
    }

    #[test]
    fn test_json_object() {
        let body = classify(br#"{"title":"Dune","author":{"name":"Herbert"}}"#);
        assert!(body.is_json());
        assert!(!body.is_array());
        assert_eq!(flags(&body), [true, false, false]);
        assert_eq!(body.json().unwrap()["title"], "Dune");
    }

    #[test]
    fn test_json_array() {
        let body = classify(b"[1, 2, 3]");
        assert!(body.is_json());
        assert!(body.is_array());
    }

    #[test]
    fn test_xml_document() {
        let body = classify(b"<?xml version=\"1.0\"?>\n<feed><entry>1</entry></feed>");
        assert_eq!(flags(&body), [false, true, false]);

        let doc = body.xml().unwrap();
        assert_eq!(doc.root_element().tag_name().name(), "feed");
    }

    #[test]
    fn test_xml_with_dtd() {
        let body = classify(b"<!DOCTYPE note SYSTEM \"note.dtd\"><note><to>A</to></note>");
        assert!(body.is_xml());
    }

    #[test]
    fn test_html5_doctype_is_html_not_xml() {
        let body = classify(b"<!DOCTYPE html><html><body><p>Hi</p></body></html>");
        assert_eq!(flags(&body), [false, false, true]);
        assert!(body.xml().is_none());
    }

    #[test]
    fn test_malformed_markup_is_html() {
        let body = classify(b"<p>unclosed <br> paragraph");
        assert_eq!(flags(&body), [false, false, true]);
    }

    #[test]
    fn test_plain_text_has_no_flags() {
        let body = classify(b"just some text, 1 < 2");
        assert!(body.exists());
        assert!(!body.is_binary());
        assert_eq!(flags(&body), [false, false, false]);
        assert_eq!(body.contents(), Some("just some text, 1 < 2"));
        assert_eq!(body.kind(), BodyKind::Text);
    }

    #[test]
    fn test_any_strippable_angle_bracket_is_html() {
        assert!(classify(b"price<5 today").is_html());
        assert!(classify(b"a <=b").is_html());
        assert!(!classify(b"a < b").is_html());
    }

    #[test]
    fn test_kind_follows_flags() {
        assert_eq!(classify(b"").kind(), BodyKind::Empty);
        assert_eq!(classify(&[0xff, 0xfe]).kind(), BodyKind::Binary);
        assert_eq!(classify(b"[]").kind(), BodyKind::Json);
        assert_eq!(classify(b"<a/>").kind(), BodyKind::Xml);
        assert_eq!(classify(b"<b>bold").kind(), BodyKind::Html);
    }

    #[test]
    fn test_classification_is_mutually_exclusive() {
        let samples: [&[u8]; 8] = [
            b"{}",
            b"[]",
            b"\"quoted\"",
            b"<a><b/></a>",
            b"<!doctype HTML><title>x</title>",
            b"<div>",
            b"plain",
            &[0xc3, 0x28],
        ];
        for raw in samples {
            let body = classify(raw);
            let set = flags(&body).iter().filter(|flag| **flag).count();
            assert!(set <= 1, "more than one flag for {raw:?}");
            if body.is_binary() {
                assert_eq!(set, 0, "binary payload {raw:?} has a flag");
            }
        }
    }

    #[test]
    fn test_find_nested_key() {
        let body = classify(
            json!({"data": {"items": [{"id": 1, "isbn": "978"}]}, "meta": {"isbn": "other"}})
                .to_string()
                .as_bytes(),
        );
        assert_eq!(body.find("isbn"), Some(&json!("978")));
        assert_eq!(body.find("items").unwrap().as_array().unwrap().len(), 1);
        assert_eq!(body.find("missing"), None);
    }

    #[test]
    fn test_find_is_idempotent() {
        let body = classify(br#"{"a":{"b":{"c":3}}}"#);
        assert_eq!(body.find("c"), body.find("c"));
        assert_eq!(body.find("c"), Some(&json!(3)));
    }

    #[test]
    fn test_find_continues_past_nested_null() {
        let body = classify(br#"{"a":{"key":null},"b":{"key":"found"}}"#);
        assert_eq!(body.find("key"), Some(&json!("found")));
    }

    #[test]
    fn test_find_stops_at_null_on_the_same_level() {
        let body = classify(br#"{"key":null,"x":{"key":1}}"#);
        assert_eq!(body.find("key"), None);

        let body = classify(br#"{"outer":{"key":null,"x":{"key":1}},"key":2}"#);
        assert_eq!(body.find("key"), Some(&json!(2)));
    }

    #[test]
    fn test_find_on_non_json_is_none() {
        assert_eq!(classify(b"<a><key>1</key></a>").find("key"), None);
    }
}
