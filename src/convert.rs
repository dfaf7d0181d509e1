//! Recursive walk that turns an [`XmlElement`] tree into a JSON value.

use serde_json::{Map, Value};
use tracing::trace;

use crate::classify::{attribute_key, classify, insert_group, Shape};
use crate::coerce::parse_text;
use crate::config::{Config, NullValue};
use crate::error::{ConvertError, Result};
use crate::xml::XmlElement;

/// State of one conversion run: the settings and where the walk currently is.
///
/// Children are fully converted before their parent's object is assembled,
/// so a failure anywhere leaves nothing half built behind.
pub struct Converter<'c> {
    config: &'c Config,
    /// Tag-name path of the element being converted, e.g. `/a/b`.
    path: String,
    depth: usize,
}

impl<'c> Converter<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self::nested(config, String::new(), 0)
    }

    /// Starts below the root: `path` and `depth` describe the parent of the
    /// first element handed to [`Converter::convert_element`].
    pub fn nested(config: &'c Config, path: String, depth: usize) -> Self {
        Converter {
            config,
            path,
            depth,
        }
    }

    /// Converts `el` and its subtree. `None` means the element is dropped,
    /// which only happens to empty elements under `NullValue::Ignore`.
    pub fn convert_element(&mut self, el: &XmlElement) -> Result<Option<Value>> {
        let parent_len = self.path.len();
        self.path.push('/');
        self.path.push_str(&el.name);
        self.depth += 1;

        let result = if self.depth > self.config.max_depth {
            Err(ConvertError::DepthExceeded {
                max: self.config.max_depth,
                path: self.path.clone(),
            })
        } else {
            self.convert_shape(el)
        };

        self.depth -= 1;
        self.path.truncate(parent_len);
        result
    }

    fn convert_shape(&mut self, el: &XmlElement) -> Result<Option<Value>> {
        let config = self.config;
        let shape = {
            let path = &self.path;
            classify(el, |child| {
                config.exclude_paths.is_empty() || !config.is_excluded(&format!("{}/{}", path, child.name))
            })
        };
        trace!(path = %self.path, shape = shape.kind(), "classified element");

        let structure = match shape {
            Shape::Empty => {
                return Ok(match config.empty_element_handling {
                    NullValue::Null => Some(Value::Null),
                    NullValue::EmptyObject => Some(Value::Object(Map::new())),
                    NullValue::Ignore => None,
                })
            }
            Shape::Leaf(text) => {
                let (_, json_type) = config.json_type(&self.path);
                return Ok(Some(parse_text(&text, config, json_type)));
            }
            Shape::Structural(structure) => structure,
        };

        let mut object = Map::new();

        for (name, value) in structure.attributes {
            let (_, json_type) = config.json_type(&format!("{}/@{}", self.path, name));
            object.insert(
                attribute_key(&config.attribute_prefix, name),
                parse_text(value, config, json_type),
            );
        }

        if let Some(text) = structure.text {
            let (_, json_type) = config.json_type(&self.path);
            object.insert(config.text_key.clone(), parse_text(&text, config, json_type));
        }

        for group in structure.groups {
            let mut values = Vec::with_capacity(group.members.len());
            for child in group.members {
                if let Some(value) = self.convert_element(child)? {
                    values.push(value);
                }
            }
            let (force_array, _) = config.json_type(&format!("{}/{}", self.path, group.name));
            insert_group(&mut object, group.name, values, force_array);
        }

        Ok(Some(Value::Object(object)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JsonArray, JsonType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn convert(el: &XmlElement, config: &Config) -> Result<Option<Value>> {
        Converter::new(config).convert_element(el)
    }

    #[test]
    fn test_repeated_and_single_children() {
        let el = XmlElement::new("a")
            .with_child(XmlElement::new("b").with_text("1"))
            .with_child(XmlElement::new("c").with_text("x"))
            .with_child(XmlElement::new("b").with_text("2"));
        assert_eq!(
            convert(&el, &Config::default()).unwrap(),
            Some(json!({"b": [1, 2], "c": "x"}))
        );
    }

    #[test]
    fn test_attribute_and_child_with_same_name() {
        let el = XmlElement::new("a")
            .with_attribute("id", "7")
            .with_child(XmlElement::new("id").with_text("x-7"));
        assert_eq!(
            convert(&el, &Config::default()).unwrap(),
            Some(json!({"@id": 7, "id": "x-7"}))
        );
    }

    #[test]
    fn test_depth_guard_reports_path() {
        let el = XmlElement::new("a").with_child(XmlElement::new("b").with_child(XmlElement::new("c")));
        let mut config = Config::default();
        config.max_depth = 2;
        assert_eq!(
            convert(&el, &config),
            Err(ConvertError::DepthExceeded {
                max: 2,
                path: "/a/b/c".to_owned()
            })
        );
        config.max_depth = 3;
        assert!(convert(&el, &config).is_ok());
    }

    #[test]
    fn test_paths_restored_between_siblings() {
        let el = XmlElement::new("a")
            .with_child(XmlElement::new("b").with_text("007"))
            .with_child(XmlElement::new("c").with_child(XmlElement::new("b").with_text("007")));
        let config = Config::default()
            .add_json_type_override("/a/c/b", JsonArray::Infer(JsonType::AlwaysString));
        assert_eq!(
            convert(&el, &config).unwrap(),
            Some(json!({"b": "007", "c": {"b": "007"}}))
        );

        let config = Config::default()
            .add_json_type_override("/a/b", JsonArray::Always(JsonType::Bool(vec!["007".into()])));
        assert_eq!(
            convert(&el, &config).unwrap(),
            Some(json!({"b": [true], "c": {"b": "007"}}))
        );
    }

    #[test]
    fn test_ignored_members_do_not_count() {
        let el = XmlElement::new("a")
            .with_child(XmlElement::new("b"))
            .with_child(XmlElement::new("b").with_text("1"))
            .with_child(XmlElement::new("c"));
        let mut config = Config::default();
        config.empty_element_handling = NullValue::Ignore;
        assert_eq!(convert(&el, &config).unwrap(), Some(json!({"b": 1})));
        assert_eq!(convert(&XmlElement::new("a"), &config).unwrap(), None);
    }

    #[test]
    fn test_nested_converter_uses_given_path() {
        let el = XmlElement::new("b").with_text("007");
        let config = Config::default()
            .add_json_type_override("/a/b", JsonArray::Infer(JsonType::AlwaysString));
        let mut converter = Converter::nested(&config, "/a".to_owned(), 1);
        assert_eq!(converter.convert_element(&el).unwrap(), Some(json!("007")));
    }
}
