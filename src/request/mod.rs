//! Input normalization: heterogeneous input to an ordered request set.
//!
//! Input elements may be bare URLs, key/value maps or structured records.
//! Normalization extracts an identifier and a URL from each element using
//! configurable field names and returns a [`RequestSet`] that preserves
//! input order.
//!
//! # Example
//!
//! ```
//! use http_pool::request::{FieldKeys, PoolInput, RequestId, normalize};
//! use serde_json::json;
//!
//! let input = PoolInput::from_json(json!([{"uuid": 100, "api": "https://x.test"}])).unwrap();
//! let keys = FieldKeys {
//!     identifier: "uuid".to_string(),
//!     url: "api".to_string(),
//!     url_as_identifier: false,
//! };
//! let requests = normalize(&input, &keys);
//!
//! let item = requests.first().unwrap();
//! assert_eq!(item.id(), &RequestId::Int(100));
//! assert_eq!(item.url(), Some("https://x.test"));
//! ```

mod error;
mod input;
mod item;
mod resolver;

pub use error::InputError;
pub use input::{InputEntry, PoolInput, Record};
pub use item::{RequestId, RequestItem, RequestSet};
pub use resolver::{
    DEFAULT_IDENTIFIER_KEY, DEFAULT_URL_KEY, FieldKeys, FieldResolver, getter_name, normalize,
    resolve_entry,
};
