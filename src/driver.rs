//! Whole-document entry points.

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::classify::attribute_key;
use crate::coerce::parse_text;
use crate::config::Config;
use crate::convert::Converter;
use crate::error::{ConvertError, Result};
use crate::xml::{parse_document, XmlDocument, XmlElement};

/// Converts a parsed document into a single JSON value.
///
/// The configuration is validated first. The whole tree is converted before
/// anything is returned; on error nothing is. A root that is excluded or
/// ignored as empty converts to `null`, the same way [`select_records`]
/// drops it.
#[instrument(skip_all)]
pub fn convert_document(doc: &XmlDocument, config: &Config) -> Result<Value> {
    config.validate()?;
    let root = doc.root.as_ref().ok_or(ConvertError::EmptyDocument)?;
    debug!(root = %root.name(), "converting document");

    let value = if config.is_excluded(&format!("/{}", root.name())) {
        debug!("root element is excluded");
        None
    } else {
        Converter::new(config).convert_element(root).map_err(|e| {
            warn!(error = %e, "conversion failed");
            e
        })?
    };
    let value = value.unwrap_or(Value::Null);

    if config.wrap_root {
        let mut data = Map::new();
        data.insert(root.name.clone(), value);
        Ok(Value::Object(data))
    } else {
        Ok(value)
    }
}

/// An element waiting to be visited by [`select_records`].
struct Pending<'a> {
    el: &'a XmlElement,
    parent_path: String,
    parent_depth: usize,
    /// Prefixed attributes collected from `Config::attribute_paths` ancestors.
    inherited: Map<String, Value>,
}

/// Converts every element found at the absolute `path` (e.g. `/feed/entry`),
/// in document order. Elements under an excluded path are never selected.
///
/// Attributes of ancestors listed in `Config::attribute_paths` are merged
/// into each record ahead of its own keys; the record's keys win on a clash.
/// A record that is not an object keeps its value under the text key.
#[instrument(skip(doc, config))]
pub fn select_records(doc: &XmlDocument, path: &str, config: &Config) -> Result<Vec<Value>> {
    config.validate()?;
    let root = doc.root.as_ref().ok_or(ConvertError::EmptyDocument)?;
    let target = if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{}", path)
    };

    let mut records = Vec::new();
    let mut pending = vec![Pending {
        el: root,
        parent_path: String::new(),
        parent_depth: 0,
        inherited: Map::new(),
    }];

    while let Some(Pending {
        el,
        parent_path,
        parent_depth,
        mut inherited,
    }) = pending.pop()
    {
        let el_path = format!("{}/{}", parent_path, el.name());
        let on_target = el_path == target;
        if config.is_excluded(&el_path) || !(on_target || target.starts_with(&format!("{}/", el_path))) {
            continue;
        }

        if on_target {
            let mut converter = Converter::nested(config, parent_path, parent_depth);
            if let Some(value) = converter.convert_element(el)? {
                records.push(with_inherited(inherited, value, config));
            }
            continue;
        }

        let depth = parent_depth + 1;
        if depth > config.max_depth {
            return Err(ConvertError::DepthExceeded {
                max: config.max_depth,
                path: el_path,
            });
        }
        if config.is_attribute_path(&el_path) {
            for (name, value) in &el.attributes {
                let (_, json_type) = config.json_type(&format!("{}/@{}", el_path, name));
                inherited.insert(
                    attribute_key(&config.attribute_prefix, name),
                    parse_text(value, config, json_type),
                );
            }
        }
        // reversed so the stack pops children in document order
        for child in el.child_elements().rev() {
            pending.push(Pending {
                el: child,
                parent_path: el_path.clone(),
                parent_depth: depth,
                inherited: inherited.clone(),
            });
        }
    }

    debug!(count = records.len(), "selected records");
    Ok(records)
}

fn with_inherited(mut inherited: Map<String, Value>, record: Value, config: &Config) -> Value {
    if inherited.is_empty() {
        return record;
    }
    match record {
        Value::Object(fields) => inherited.extend(fields),
        other => {
            inherited.insert(config.text_key.clone(), other);
        }
    }
    Value::Object(inherited)
}

/// Converts the given XML string into `serde_json::Value` using settings from `Config` struct.
pub fn xml_str_to_json(xml: &str, config: &Config) -> Result<Value> {
    config.validate()?;
    let doc = parse_document(xml, config.max_depth)?;
    convert_document(&doc, config)
}

/// Converts the given XML string into `serde_json::Value` using settings from `Config` struct.
pub fn xml_string_to_json(xml: String, config: &Config) -> Result<Value> {
    xml_str_to_json(xml.as_str(), config)
}

/// Parses `xml` and returns one value per element at `path`, see [`select_records`].
pub fn xml_str_to_records(xml: &str, path: &str, config: &Config) -> Result<Vec<Value>> {
    config.validate()?;
    let doc = parse_document(xml, config.max_depth)?;
    select_records(&doc, path, config)
}
