//! Storage-format serializer with CDATA support.

#![allow(clippy::unused_self)] // Unit struct methods have &self for API consistency

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::tree::{Document, NodeId};

/// Pattern for matching plain-text-body elements.
static PLAIN_TEXT_BODY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(<ac:plain-text-body[^>]*>)(.*?)(</ac:plain-text-body>)")
        .expect("invalid plain-text-body regex")
});

/// HTML elements that never have content.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Writes a [`Document`] back to markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageSerializer;

impl StorageSerializer {
    /// Create a new serializer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Serialize the document without its root wrapper.
    ///
    /// Empty void and namespaced elements are self-closed; other empty
    /// elements get an explicit end tag so the output stays valid HTML.
    /// `ac:plain-text-body` content is written back as CDATA.
    pub fn serialize(&self, doc: &Document) -> Result<String, std::fmt::Error> {
        let mut out = String::with_capacity(4096);

        if let Some(root) = doc.get(doc.root()) {
            escape_into(&root.text, false, &mut out);
            for &child in root.children() {
                serialize_node(doc, child, &mut out)?;
            }
        }

        Ok(restore_cdata_sections(&out))
    }
}

fn serialize_node(doc: &Document, id: NodeId, out: &mut String) -> std::fmt::Result {
    let Some(node) = doc.get(id) else {
        return Ok(());
    };

    write!(out, "<{}", node.tag)?;
    for (key, value) in node.attrs.iter() {
        write!(out, r#" {key}=""#)?;
        escape_into(value, true, out);
        out.push('"');
    }

    let is_empty = node.children().is_empty() && node.text.is_empty();
    if is_empty && (VOID_ELEMENTS.contains(&node.tag.as_str()) || node.tag.contains(':')) {
        out.push_str(" />");
    } else {
        out.push('>');
        escape_into(&node.text, false, out);
        for &child in node.children() {
            serialize_node(doc, child, out)?;
        }
        write!(out, "</{}>", node.tag)?;
    }

    escape_into(&node.tail, false, out);
    Ok(())
}

/// Append `text` with XML special characters escaped.
pub(crate) fn escape_into(text: &str, escape_quotes: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if escape_quotes => out.push_str("&quot;"),
            '\'' if escape_quotes => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
}

/// Restore CDATA sections for plain-text-body elements.
fn restore_cdata_sections(markup: &str) -> String {
    PLAIN_TEXT_BODY_PATTERN
        .replace_all(markup, |caps: &regex::Captures| {
            let content = caps[2]
                .replace("&lt;", "<")
                .replace("&gt;", ">")
                .replace("&quot;", "\"")
                .replace("&apos;", "'")
                .replace("&amp;", "&");
            format!("{}{}{}", &caps[1], cdata(&content), &caps[3])
        })
        .into_owned()
}

/// Wrap text in a CDATA section.
///
/// Any `]]>` in the text is split across two sections.
pub(crate) fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::StorageParser;

    fn roundtrip(markup: &str) -> String {
        let doc = StorageParser::new().parse(markup).unwrap();
        StorageSerializer::new().serialize(&doc).unwrap()
    }

    #[test]
    fn test_serialize_nested_with_tail() {
        assert_eq!(
            roundtrip("<p><strong>Bold</strong> text</p>"),
            "<p><strong>Bold</strong> text</p>"
        );
    }

    #[test]
    fn test_serialize_void_and_empty_elements() {
        assert_eq!(roundtrip("<p>a<br />b</p><p></p>"), "<p>a<br />b</p><p></p>");
    }

    #[test]
    fn test_serialize_empty_macro_self_closes() {
        assert_eq!(
            roundtrip(r#"<ri:attachment ri:filename="x.png"></ri:attachment>"#),
            r#"<ri:attachment ri:filename="x.png" />"#
        );
    }

    #[test]
    fn test_serialize_attribute_order_preserved() {
        assert_eq!(
            roundtrip(r#"<img src="a.png" alt="A" title="T" />"#),
            r#"<img src="a.png" alt="A" title="T" />"#
        );
    }

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(
            roundtrip("<p>a &lt; b &amp; c &gt; d</p>"),
            "<p>a &lt; b &amp; c &gt; d</p>"
        );
    }

    #[test]
    fn test_top_level_text_kept() {
        assert_eq!(roundtrip("lead <b>x</b> trail"), "lead <b>x</b> trail");
    }

    #[test]
    fn test_restore_cdata_sections() {
        assert_eq!(
            roundtrip("<ac:plain-text-body><![CDATA[if a < b && c]]></ac:plain-text-body>"),
            "<ac:plain-text-body><![CDATA[if a < b && c]]></ac:plain-text-body>"
        );
    }

    #[test]
    fn test_cdata_terminator_in_text_is_split() {
        let markup = "<ac:plain-text-body><![CDATA[a]]]]><![CDATA[>b]]></ac:plain-text-body>";
        let once = roundtrip(markup);
        assert_eq!(once, markup);
        assert_eq!(roundtrip(&once), markup);

        let doc = StorageParser::new().parse(&once).unwrap();
        let body = doc.get(doc.children(doc.root())[0]).unwrap();
        assert_eq!(body.text, "a]]>b");
    }

    #[test]
    fn test_cdata_entity_text_kept() {
        let markup = r#"<ac:plain-text-body><![CDATA[echo "&nbsp;"]]></ac:plain-text-body>"#;
        assert_eq!(roundtrip(markup), markup);
    }
}
