//! Storage-format parser with namespace support.

#![allow(clippy::unused_self)] // Unit struct methods have &self for API consistency

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::entities::{decode_reference, resolve_entity};
use crate::error::ParseError;
use crate::tree::{Attributes, Document, NodeId};

/// Tag of the synthetic wrapper element that holds the parsed fragment.
pub(crate) const ROOT_TAG: &str = "root";

/// Confluence XML namespaces.
const NAMESPACES: &[(&str, &str)] = &[
    ("ac", "http://www.atlassian.com/schema/confluence/4/ac/"),
    ("ri", "http://www.atlassian.com/schema/confluence/4/ri/"),
];

/// Parses storage-format fragments into a [`Document`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageParser;

impl StorageParser {
    /// Create a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse a storage-format fragment.
    ///
    /// The fragment may have several top-level elements and loose text; it is
    /// wrapped in a root element that declares the `ac:` and `ri:` prefixes.
    ///
    /// # Errors
    ///
    /// Returns an error if the markup is not well-formed XML.
    pub fn parse(&self, markup: &str) -> Result<Document, ParseError> {
        let namespace_decls = NAMESPACES
            .iter()
            .map(|(prefix, uri)| format!(r#"xmlns:{prefix}="{uri}""#))
            .collect::<Vec<_>>()
            .join(" ");
        let wrapped = format!("<{ROOT_TAG} {namespace_decls}>{markup}</{ROOT_TAG}>");

        let mut reader = Reader::from_str(&wrapped);
        reader.config_mut().trim_text(false);

        let mut doc = Document::new(ROOT_TAG);
        let mut open: Vec<NodeId> = Vec::new();
        let mut in_root = false;

        loop {
            let current = open.last().copied().unwrap_or_else(|| doc.root());
            match reader.read_event()? {
                Event::Start(e) => {
                    if !in_root {
                        in_root = true;
                        continue;
                    }
                    let node = self.new_element(&mut doc, &reader, &e)?;
                    doc.append_child(current, node)?;
                    open.push(node);
                }
                Event::Empty(e) => {
                    let node = self.new_element(&mut doc, &reader, &e)?;
                    doc.append_child(current, node)?;
                }
                Event::End(_) => {
                    if open.pop().is_none() {
                        in_root = false;
                    }
                }
                Event::Text(e) if in_root => {
                    let text = reader.decoder().decode(&e)?;
                    doc.append_text(current, &text)?;
                }
                Event::GeneralRef(e) if in_root => {
                    let name = reader.decoder().decode(&e)?;
                    doc.append_text(current, &decode_reference(&name))?;
                }
                Event::CData(e) if in_root => {
                    let text = String::from_utf8_lossy(&e);
                    doc.append_text(current, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(&unclosed) = open.last() {
            let tag = doc.get(unclosed).map(|el| el.tag.clone()).unwrap_or_default();
            return Err(ParseError::Unclosed(tag));
        }

        Ok(doc)
    }

    fn new_element(
        &self,
        doc: &mut Document,
        reader: &Reader<&[u8]>,
        e: &BytesStart,
    ) -> Result<NodeId, ParseError> {
        let name = e.name();
        let tag = reader.decoder().decode(name.as_ref())?;
        let attrs = self.decode_attrs(reader, e)?;
        Ok(doc.new_node(&tag, attrs))
    }

    fn decode_attrs(&self, reader: &Reader<&[u8]>, e: &BytesStart) -> Result<Attributes, ParseError> {
        let mut attrs = Attributes::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = reader.decoder().decode(attr.key.as_ref())?;

            // Skip namespace declarations
            if key.starts_with("xmlns") {
                continue;
            }

            let value = attr.unescape_value_with(resolve_entity).map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                std::borrow::Cow::into_owned,
            );
            attrs.set(key, value);
        }
        Ok(attrs)
    }
}
