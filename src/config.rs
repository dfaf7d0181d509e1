//! Conversion settings.

use std::collections::HashMap;

use regex::Regex;
use serde_derive::Deserialize;

use crate::error::{ConvertError, Result};

/// Default nesting limit for a single document.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Defines how empty elements like `<x />` should be handled.
/// `Ignore` -> exclude from JSON, `Null` -> `"x":null`, `EmptyObject` -> `"x":{}`.
/// `Null` is the default.
/// Using `Ignore` on an XML document with an empty root element falls back to `Null` option.
/// E.g. both `<a><x/></a>` and `<a/>` are converted into `{"a":null}` when the root is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NullValue {
    Ignore,
    #[default]
    Null,
    EmptyObject,
}

/// Defines how the values of this Node should be converted into a JSON array with the underlying types.
/// * `Infer` - the nodes are converted into a JSON array only if there are multiple identical elements.
/// E.g. `<a><b>1</b></a>` becomes a map `{"b": 1}` and `<a><b>1</b><b>2</b><b>3</b></a>` becomes
/// an array `{"b": [1, 2, 3]}`
/// * `Always` - the nodes are converted into a JSON array regardless of how many there are.
/// E.g. `<a><b>1</b></a>` becomes an array with a single value `{"b": [1]}`
#[derive(Debug, Clone, PartialEq)]
pub enum JsonArray {
    /// Convert the nodes into a JSON array even if there is only one element
    Always(JsonType),
    /// Convert the nodes into a JSON array only if there are multiple identical elements
    Infer(JsonType),
}

impl JsonArray {
    fn parts(&self) -> (bool, &JsonType) {
        match self {
            JsonArray::Always(v) => (true, v),
            JsonArray::Infer(v) => (false, v),
        }
    }
}

/// Defines which data type to apply in JSON format for consistency of output.
/// E.g., the range of XML values for the same node type may be `1234`, `001234`, `AB1234`.
/// It is impossible to guess with 100% consistency which data type to apply without seeing
/// the entire range of values. Use this enum to tell the converter which data type should
/// be applied.
#[derive(Debug, PartialEq, Clone)]
pub enum JsonType {
    /// Do not try to infer the type and convert the value to JSON string.
    /// E.g. convert `<a>1234</a>` into `"1234"` or `<a>true</a>` into `"true"`
    AlwaysString,
    /// Convert values included in this member into JSON bool `true` and any other value into `false`.
    /// E.g. `Bool(vec!["True".into(), "yes".into()])` turns both of those into `true`.
    Bool(Vec<String>),
    /// Infer the type from the single value being converted, following the
    /// `infer_*` and `empty_as_null` settings.
    Infer,
}

static INFER: JsonType = JsonType::Infer;

/// Used as a parameter for `Config.add_json_type_override`. Defines how the XML path should be matched
/// in order to apply the JSON type overriding rules.
#[derive(Debug)]
pub enum PathMatcher {
    /// An absolute path starting with a leading slash (`/`). E.g. `/a/b/c/@d`.
    /// It's implicitly converted from `&str` and automatically includes the leading slash.
    Absolute(String),
    /// A regex that will be checked against the XML path. E.g. `(\w/)*c$`.
    Regex(Regex),
}

impl From<&str> for PathMatcher {
    fn from(value: &str) -> Self {
        PathMatcher::Absolute(absolute_path(value))
    }
}

impl From<Regex> for PathMatcher {
    fn from(value: Regex) -> Self {
        PathMatcher::Regex(value)
    }
}

fn absolute_path(value: &str) -> String {
    if value.starts_with('/') {
        value.into()
    } else {
        ["/", value].concat()
    }
}

/// Tells the converter how to perform certain conversions.
/// See docs for individual fields for more info.
///
/// A `Config` is passed by reference into every conversion, so documents may
/// be converted concurrently with different settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Turn JSON number literals into numbers.
    pub infer_numbers: bool,
    /// Turn `true`/`false` (any case) into booleans.
    pub infer_booleans: bool,
    /// Empty or whitespace-only text becomes `null` instead of `""`.
    pub empty_as_null: bool,
    /// Deepest element nesting accepted, the root being depth 1.
    pub max_depth: usize,
    /// Prepended to every attribute name.
    pub attribute_prefix: String,
    /// Key holding the text of elements that also have attributes or children.
    pub text_key: String,
    /// Trim leading and trailing whitespace from text before it is used.
    pub trim_text: bool,
    pub empty_element_handling: NullValue,
    /// Return `{rootName: value}` instead of the root value itself.
    pub wrap_root: bool,
    /// Absolute paths of elements to leave out, subtree included.
    pub exclude_paths: Vec<String>,
    /// Ancestors whose attributes are copied into every record picked by
    /// [`crate::select_records`].
    pub attribute_paths: Vec<String>,
    #[serde(skip)]
    pub json_type_overrides: HashMap<String, JsonArray>,
    #[serde(skip)]
    pub json_regex_type_overrides: Vec<(Regex, JsonArray)>,
}

impl Config {
    pub fn new_with_defaults() -> Self {
        Config {
            infer_numbers: true,
            infer_booleans: true,
            empty_as_null: true,
            max_depth: DEFAULT_MAX_DEPTH,
            attribute_prefix: "@".to_owned(),
            text_key: "#text".to_owned(),
            trim_text: false,
            empty_element_handling: NullValue::Null,
            wrap_root: false,
            exclude_paths: Vec::new(),
            attribute_paths: Vec::new(),
            json_type_overrides: HashMap::new(),
            json_regex_type_overrides: Vec::new(),
        }
    }

    pub fn new_with_custom_values(
        infer_types: bool,
        attribute_prefix: &str,
        text_key: &str,
        empty_element_handling: NullValue,
    ) -> Self {
        Config {
            infer_numbers: infer_types,
            infer_booleans: infer_types,
            attribute_prefix: attribute_prefix.to_owned(),
            text_key: text_key.to_owned(),
            empty_element_handling,
            ..Config::new_with_defaults()
        }
    }

    /// Adds a single JSON Type override rule to the current config.
    /// # Example
    /// - **XML**: `<a><b c="123">007</b></a>`
    /// - path for `c`: `/a/b/@c`
    /// - path for `b` text node (007): `/a/b`
    /// - regex path for any `element` node: `(\w/)*element$`
    pub fn add_json_type_override<P>(mut self, path: P, json_type: JsonArray) -> Self
    where
        P: Into<PathMatcher>,
    {
        match path.into() {
            PathMatcher::Absolute(path) => {
                self.json_type_overrides.insert(path, json_type);
            }
            PathMatcher::Regex(regex) => {
                self.json_regex_type_overrides.push((regex, json_type));
            }
        }
        self
    }

    /// Leaves the element at `path` (e.g. `/a/b`) and everything under it out of the output.
    pub fn add_exclude_path(mut self, path: &str) -> Self {
        self.exclude_paths.push(absolute_path(path));
        self
    }

    /// Copies the attributes of the element at `path` (e.g. `/feed`) into every
    /// selected record below it.
    pub fn add_attribute_path(mut self, path: &str) -> Self {
        self.attribute_paths.push(absolute_path(path));
        self
    }

    /// Checks the settings for combinations that would make the output ambiguous.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ConvertError::InvalidConfiguration(msg));

        match self.attribute_prefix.chars().next() {
            None => return invalid("attribute prefix must not be empty".into()),
            Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {
                return invalid(format!(
                    "attribute prefix {:?} can collide with element names",
                    self.attribute_prefix
                ))
            }
            Some(_) => {}
        }
        if self.text_key.is_empty() {
            return invalid("text key must not be empty".into());
        }
        if self.text_key.starts_with(&self.attribute_prefix) {
            return invalid(format!(
                "text key {:?} can collide with attributes prefixed by {:?}",
                self.text_key, self.attribute_prefix
            ));
        }
        if self.max_depth == 0 {
            return invalid("max depth must be at least 1".into());
        }
        Ok(())
    }

    /// Returns the array and value enforcement for `path`. Regex paths take
    /// precedence over absolute ones; `(false, Infer)` when nothing matches.
    pub(crate) fn json_type(&self, path: &str) -> (bool, &JsonType) {
        for (regex, json_array) in &self.json_regex_type_overrides {
            if regex.is_match(path) {
                return json_array.parts();
            }
        }
        match self.json_type_overrides.get(path) {
            Some(json_array) => json_array.parts(),
            None => (false, &INFER),
        }
    }

    pub(crate) fn is_excluded(&self, path: &str) -> bool {
        self.exclude_paths.iter().any(|p| p == path)
    }

    pub(crate) fn is_attribute_path(&self, path: &str) -> bool {
        self.attribute_paths.iter().any(|p| p == path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new_with_defaults()
    }
}
