//! Decides what shape each element takes in JSON.
//!
//! Every element falls into exactly one [`Shape`]:
//!
//! * no attributes, no child elements and no text: [`Shape::Empty`], handled
//!   by `Config::empty_element_handling`;
//! * no attributes, no child elements, only text: [`Shape::Leaf`], the
//!   concatenated text becomes a scalar;
//! * anything else: [`Shape::Structural`], an object holding prefixed
//!   attributes, the text key for non-blank text, and one entry per distinct
//!   child tag name.
//!
//! Attribute keys always carry the prefix, so they never meet element keys.
//! The text key can meet an element of the same name; the element entry then
//! replaces the text entry in place.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::xml::{XmlElement, XmlNode};

#[derive(Debug, PartialEq)]
pub enum Shape<'a> {
    Empty,
    Leaf(String),
    Structural(Structure<'a>),
}

impl Shape<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Empty => "empty",
            Shape::Leaf(_) => "leaf",
            Shape::Structural(_) => "structural",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Structure<'a> {
    pub attributes: &'a [(String, String)],
    /// Text fragments joined without separators, blank fragments dropped.
    /// `None` when nothing is left.
    pub text: Option<String>,
    /// Child elements grouped by tag name, in order of first occurrence.
    pub groups: Vec<ChildGroup<'a>>,
}

#[derive(Debug, PartialEq)]
pub struct ChildGroup<'a> {
    pub name: &'a str,
    /// Same-named children in document order.
    pub members: Vec<&'a XmlElement>,
}

/// Classifies `el`, considering only the child elements for which `keep`
/// returns true.
pub fn classify<'a, F>(el: &'a XmlElement, keep: F) -> Shape<'a>
where
    F: Fn(&XmlElement) -> bool,
{
    let mut fragments: Vec<&'a str> = Vec::new();
    let mut groups: IndexMap<&'a str, Vec<&'a XmlElement>> = IndexMap::new();

    for node in &el.children {
        match node {
            XmlNode::Text(text) => fragments.push(text),
            XmlNode::Element(child) if keep(child) => {
                groups.entry(child.name.as_str()).or_default().push(child)
            }
            XmlNode::Element(_) => {}
        }
    }

    if el.attributes.is_empty() && groups.is_empty() {
        let text = fragments.concat();
        return if text.is_empty() {
            Shape::Empty
        } else {
            Shape::Leaf(text)
        };
    }

    let text: String = fragments
        .into_iter()
        .filter(|fragment| !fragment.trim().is_empty())
        .collect();

    Shape::Structural(Structure {
        attributes: &el.attributes,
        text: (!text.is_empty()).then_some(text),
        groups: groups
            .into_iter()
            .map(|(name, members)| ChildGroup { name, members })
            .collect(),
    })
}

pub fn attribute_key(prefix: &str, name: &str) -> String {
    [prefix, name].concat()
}

/// Files the converted members of one child group under `key`.
///
/// A single value is stored as is, never wrapped, unless `force_array` is set;
/// several values become an array in document order. Nothing is stored when
/// every member was dropped.
pub fn insert_group(object: &mut Map<String, Value>, key: &str, mut values: Vec<Value>, force_array: bool) {
    let value = match values.len() {
        0 => return,
        1 if !force_array => values.remove(0),
        _ => Value::Array(values),
    };
    object.insert(key.to_owned(), value);
}
