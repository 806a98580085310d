//! Minimal XML tree built from quick-xml events
//!
//! The XDMF index files are small, so the whole document is parsed into an
//! owned element tree that the walker can navigate freely. Only the pieces
//! the walker needs are kept: element names, attributes, text content and
//! child elements. Comments, processing instructions and declarations are
//! dropped.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};

/// An XML element with attributes, text content and child elements
#[derive(Debug, Clone, Default)]
pub struct Element {
    name: String,
    attributes: HashMap<String, String>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Tag name of this element
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Concatenated text content, whitespace-trimmed
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Child elements in document order
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// First child element with the given tag name
    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First child element with the given tag name and `Name` attribute
    pub fn find_named(&self, tag: &str, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|c| c.name == tag && c.attribute("Name") == Some(name))
    }

    /// Child element at `index`, or a structural error naming the parent
    pub fn child_at(&self, index: usize) -> Result<&Element> {
        self.children.get(index).ok_or_else(|| Error::MissingElement {
            parent: self.name.clone(),
            element: crate::utils::f!("child [{index}]"),
        })
    }
}

/// Read and parse an XML file into an element tree
pub fn read<P: AsRef<Path>>(path: P) -> Result<Element> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Parse an XML string into its root element
pub fn parse(content: &str) -> Result<Element> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(start) => {
                let mut element = Element {
                    name: String::from_utf8_lossy(start.name().as_ref()).to_string(),
                    ..Default::default()
                };
                for attr in start.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    element.attributes.insert(key, value);
                }
                stack.push(element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
            }
            Event::Empty(empty) => {
                let mut element = Element {
                    name: String::from_utf8_lossy(empty.name().as_ref()).to_string(),
                    ..Default::default()
                };
                for attr in empty.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    element.attributes.insert(key, value);
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                if let Ok(content) = text.unescape() {
                    if let Some(parent) = stack.last_mut() {
                        if !parent.text.is_empty() {
                            parent.text.push(' ');
                        }
                        parent.text.push_str(&content);
                    }
                }
            }
            _ => {}
        }
    }

    root.ok_or(Error::MissingElement {
        parent: "document".to_string(),
        element: "root".to_string(),
    })
}
