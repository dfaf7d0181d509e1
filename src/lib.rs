//! Converts XML documents into [`serde_json::Value`]s.
//!
//! The mapping is fixed and deterministic:
//!
//! * an element with only text becomes a scalar, with the type inferred from
//!   the text (`<a>42</a>` gives `42`);
//! * attributes become keys with a prefix (`@id` by default);
//! * child elements are keyed by tag name; one child gives its value, several
//!   same-named children give an array in document order;
//! * text next to attributes or child elements goes under the text key
//!   (`#text` by default).
//!
//! ```
//! use xml2json_serde::{xml_str_to_json, Config};
//! use serde_json::json;
//!
//! let xml = r#"<a id="1"><b>x</b><b>y</b><c>true</c></a>"#;
//! let json = xml_str_to_json(xml, &Config::new_with_defaults()).unwrap();
//! assert_eq!(json, json!({"@id": 1, "b": ["x", "y"], "c": true}));
//! ```

extern crate quick_xml;
extern crate serde_json;

pub mod classify;
pub mod coerce;
pub mod config;
pub mod convert;
pub mod driver;
pub mod error;
pub mod value;
pub mod xml;


pub use config::{Config, JsonArray, JsonType, NullValue, PathMatcher, DEFAULT_MAX_DEPTH};
pub use convert::Converter;
pub use driver::{convert_document, select_records, xml_str_to_json, xml_str_to_records, xml_string_to_json};
pub use error::{ConvertError, Result};
pub use xml::{parse_document, XmlDocument, XmlElement, XmlNode};
