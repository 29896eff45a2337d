//! Attribute tree recovered from device markup
//!
//! Collapsing rules:
//! - an element with no child elements becomes its trimmed text, or an
//!   empty map when it carries attributes
//! - attributes are stored under `@name`
//! - text next to child elements or attributes is stored under `#text`
//! - a child tag seen once maps to its value, a tag seen more than once
//!   maps to a list in document order

use std::collections::BTreeMap;

use serde::Serialize;
use xmltree::{Element, XMLNode};

/// Map of decoded child elements and attributes
pub type AttributeMap = BTreeMap<String, AttributeValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Element without text, attributes or children
    Empty,
    Text(String),
    Map(AttributeMap),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Decode an element and everything below it
    pub fn from_element(element: &Element) -> Self {
        let mut grouped: BTreeMap<String, Vec<AttributeValue>> = BTreeMap::new();
        for child in element.children.iter().filter_map(XMLNode::as_element) {
            grouped
                .entry(child.name.clone())
                .or_default()
                .push(Self::from_element(child));
        }

        let text = element.get_text().map(|text| text.trim().to_string());

        if grouped.is_empty() && element.attributes.is_empty() {
            return match text {
                Some(text) => AttributeValue::Text(text),
                None => AttributeValue::Empty,
            };
        }

        let mut map = AttributeMap::new();
        for (name, mut values) in grouped {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                AttributeValue::List(values)
            };
            map.insert(name, value);
        }
        for (name, value) in &element.attributes {
            map.insert(format!("@{name}"), AttributeValue::Text(value.clone()));
        }
        if let Some(text) = text.filter(|text| !text.is_empty()) {
            map.insert("#text".to_string(), AttributeValue::Text(text));
        }
        AttributeValue::Map(map)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&AttributeMap> {
        match self {
            AttributeValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Child value by key when this is a map
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Values as a list regardless of how many occurrences were collapsed
    pub fn items(&self) -> Vec<&AttributeValue> {
        match self {
            AttributeValue::Empty => Vec::new(),
            AttributeValue::List(values) => values.iter().collect(),
            other => vec![other],
        }
    }

    /// Flatten a map of text leaves into plain strings
    ///
    /// Used for list entries like presets where every field is a scalar.
    pub fn text_fields(&self) -> BTreeMap<String, String> {
        self.as_map()
            .map(|map| {
                map.iter()
                    .filter_map(|(key, value)| value.as_str().map(|text| (key.clone(), text.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}
