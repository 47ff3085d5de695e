//! Owned XML document model for `DOM` responses.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("malformed XML: {0}")]
pub struct XmlError(#[from] roxmltree::Error);

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlDocument {
    pub root: XmlElement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlElement {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Child elements, skipping text nodes.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    /// Concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for child in &element.children {
        match child {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(inner) => collect_text(inner, out),
        }
    }
}

/// Parse `text` into an owned document.
///
/// Document type declarations are accepted (feeds often carry one); external
/// entities are never resolved.
pub fn parse_document(text: &str) -> Result<XmlDocument, XmlError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(text, options)?;
    Ok(XmlDocument {
        root: convert(document.root_element()),
    })
}

fn convert(node: roxmltree::Node<'_, '_>) -> XmlElement {
    let tag = node.tag_name();
    let attributes = node
        .attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect();
    let children = node
        .children()
        .filter_map(|child| {
            if child.is_element() {
                Some(XmlNode::Element(convert(child)))
            } else if child.is_text() {
                child.text().map(|text| XmlNode::Text(text.to_string()))
            } else {
                None
            }
        })
        .collect();

    XmlElement {
        name: tag.name().to_string(),
        namespace: tag.namespace().map(str::to_string),
        attributes,
        children,
    }
}
