//! Element tree consumed by the graph builder
//!
//! [`ElementView`] is the narrow read-only interface the builder needs from a
//! parsed document. [`Element`] is an in-memory implementation that can be
//! assembled programmatically or loaded from SDF-style XML.

use crate::error::{Error, ErrorCode};
use crate::param::{ParamType, ParamValue};
use crate::transform::Pose;
use std::fs;
use std::path::Path;

/// Read-only view of one document element
pub trait ElementView {
    /// Tag of the element, e.g. `link` or `joint`
    fn kind(&self) -> &str;

    /// Value stored under `key`: an attribute, or the value of a child
    /// element with that tag. The key `value` addresses the element's own text.
    fn lookup(&self, key: &str) -> Option<&ParamValue>;

    /// Child elements with tag `kind`, in document order
    fn children_of_kind<'a>(&'a self, kind: &'a str) -> Box<dyn Iterator<Item = &'a Self> + 'a>;

    /// The `name` attribute
    fn name(&self) -> Option<&str> {
        match self.lookup("name") {
            Some(ParamValue::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    fn has_attribute(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Typed value under `key`, `None` when unset
    fn try_get<T: ParamType>(&self, key: &str) -> Result<Option<T>, Error> {
        let Some(value) = self.lookup(key) else {
            return Ok(None);
        };
        let converted = value.convert(T::KIND).map_err(|e| {
            Error::new(
                e.code,
                format!("<{}> attribute [{}]: {}", self.kind(), key, e.message),
            )
        })?;
        Ok(T::from_param(&converted))
    }

    /// Typed value under `key`, with whether it was set; falls back to
    /// `default` when unset or undecodable
    fn get<T: ParamType>(&self, key: &str, default: T) -> (T, bool) {
        match self.try_get(key) {
            Ok(Some(value)) => (value, true),
            _ => (default, false),
        }
    }

    /// First `<pose>` child, if any
    fn pose_element(&self) -> Option<&Self> {
        self.children_of_kind("pose").next()
    }

    /// `relative_to` of the `<pose>` child; empty means unset
    fn relative_to_attribute(&self) -> Option<&str> {
        non_empty(self.pose_element()?.lookup("relative_to"))
    }

    /// `attached_to` attribute; empty means unset
    fn attached_to_attribute(&self) -> Option<&str> {
        non_empty(self.lookup("attached_to"))
    }

    /// Pose declared by the `<pose>` child, identity if absent
    fn raw_pose(&self) -> Result<Pose, Error> {
        let Some(pose) = self.pose_element() else {
            return Ok(Pose::identity());
        };
        match pose.try_get::<Pose>("value") {
            Ok(value) => Ok(value.unwrap_or_else(Pose::identity)),
            Err(e) => Err(Error::new(
                ErrorCode::ParamParse,
                format!(
                    "<{}> [{}] has an unreadable pose: {}",
                    self.kind(),
                    self.name().unwrap_or(""),
                    e.message
                ),
            )),
        }
    }
}

fn non_empty(value: Option<&ParamValue>) -> Option<&str> {
    match value {
        Some(ParamValue::String(s)) if !s.trim().is_empty() => Some(s.trim()),
        _ => None,
    }
}

/// In-memory element with typed attributes and ordered children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    kind: String,
    attributes: Vec<(String, ParamValue)>,
    value: Option<ParamValue>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl ParamType) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder-style value setter
    pub fn with_value(mut self, value: impl ParamType) -> Self {
        self.value = Some(value.into_param());
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl ParamType) {
        let key = key.into();
        let value = value.into_param();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn value(&self) -> Option<&ParamValue> {
        self.value.as_ref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First child with tag `kind`
    pub fn first_child(&self, kind: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// Parse an XML document; attribute and text values are kept as strings
    /// and decoded on typed access
    pub fn from_xml_str(xml: &str) -> Result<Element, Error> {
        let doc = roxmltree::Document::parse(xml).map_err(|e| {
            Error::new(
                ErrorCode::ElementIncorrectType,
                format!("Failed to parse XML: {}", e),
            )
        })?;
        Ok(Self::from_xml_node(doc.root_element()))
    }

    /// Read and parse an XML file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Element, Error> {
        let xml = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::new(
                ErrorCode::ElementIncorrectType,
                format!("Failed to read {}: {}", path.as_ref().display(), e),
            )
        })?;
        Self::from_xml_str(&xml)
    }

    fn from_xml_node(node: roxmltree::Node) -> Element {
        let mut element = Element::new(node.tag_name().name());

        for attr in node.attributes() {
            element.set_attribute(attr.name(), attr.value().to_string());
        }

        let text: String = node
            .children()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        if !text.trim().is_empty() {
            element.value = Some(ParamValue::String(text.trim().to_string()));
        }

        for child in node.children().filter(|n| n.is_element()) {
            element.children.push(Self::from_xml_node(child));
        }

        element
    }
}

impl ElementView for Element {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn lookup(&self, key: &str) -> Option<&ParamValue> {
        if key == "value" {
            return self.value.as_ref();
        }
        if let Some((_, value)) = self.attributes.iter().find(|(k, _)| k == key) {
            return Some(value);
        }
        self.first_child(key).and_then(|c| c.value.as_ref())
    }

    fn children_of_kind<'a>(&'a self, kind: &'a str) -> Box<dyn Iterator<Item = &'a Self> + 'a> {
        Box::new(self.children.iter().filter(move |c| c.kind == kind))
    }
}
