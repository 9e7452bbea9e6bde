//! Markdown rendering of a processed storage-format tree.
//!
//! Confluence elements without an HTML form are rewritten on a copy of the
//! tree first: code macros become `<pre><code>` blocks, other plain-text
//! bodies become `<pre>`, and macro parameters and empty macro elements are
//! dropped. The result is serialized and converted by `htmd`, which escapes
//! Markdown syntax found in text.

use htmd::HtmlToMarkdown;
use htmd::options::{BulletListMarker, CodeBlockStyle, HeadingStyle, Options};

use crate::error::{ProcessError, TreeError};
use crate::serializer::StorageSerializer;
use crate::tags;
use crate::tree::{Attributes, Document, NodeId};

/// Render a document as Markdown.
///
/// The result is trimmed and ends with a single newline unless it is empty.
///
/// # Errors
///
/// Returns an error if the prepared tree cannot be serialized or converted.
pub fn to_markdown(doc: &Document) -> Result<String, ProcessError> {
    let prepared = prepare(doc)?;
    let html = StorageSerializer::new().serialize(&prepared)?;

    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "head"])
        .options(Options {
            heading_style: HeadingStyle::Atx,
            code_block_style: CodeBlockStyle::Fenced,
            bullet_list_marker: BulletListMarker::Dash,
            ..Options::default()
        })
        .build();
    let markdown = converter
        .convert(&html)
        .map_err(|e| ProcessError::Markdown(e.to_string()))?;

    let markdown = markdown.trim();
    if markdown.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("{markdown}\n"))
    }
}

/// Copy of `doc` with Confluence-only elements turned into plain HTML.
fn prepare(doc: &Document) -> Result<Document, TreeError> {
    let mut doc = doc.clone();

    for code in doc.find_all(tags::STRUCTURED_MACRO, &[(tags::NAME, tags::CODE_MACRO)]) {
        if !doc.is_attached(code) {
            continue;
        }
        let language = doc
            .find_first_in(code, tags::PARAMETER, &[(tags::NAME, tags::LANGUAGE_PARAM)])
            .map(|param| doc.text_content(param))
            .unwrap_or_default();
        let body = doc
            .find_first_in(code, tags::PLAIN_TEXT_BODY, &[])
            .map(|body| raw_text(&doc, body))
            .unwrap_or_default();
        let block = code_block(&mut doc, &language, &body)?;
        doc.replace_with_node(code, block)?;
    }

    for body in doc.find_all(tags::PLAIN_TEXT_BODY, &[]) {
        if !doc.is_attached(body) {
            continue;
        }
        let text = raw_text(&doc, body);
        let block = code_block(&mut doc, "", &text)?;
        doc.replace_with_node(body, block)?;
    }

    for param in doc.find_all(tags::PARAMETER, &[]) {
        if doc.is_attached(param) {
            doc.replace_with_text(param, "")?;
        }
    }

    // Empty namespaced elements would swallow following content in an HTML
    // parser. Children go first so a parent emptied by them is dropped too.
    for id in doc.descendants(doc.root()).into_iter().rev() {
        let empty = doc.get(id).is_some_and(|el| {
            el.tag.contains(':') && el.text.is_empty() && el.children().is_empty()
        });
        if empty {
            doc.replace_with_text(id, "")?;
        }
    }

    Ok(doc)
}

/// `<pre><code class="language-..">` holding `code`.
fn code_block(doc: &mut Document, language: &str, code: &str) -> Result<NodeId, TreeError> {
    let mut attrs = Attributes::new();
    if !language.is_empty() {
        attrs.set("class", format!("language-{language}"));
    }
    let pre = doc.new_node("pre", Attributes::new());
    let inner = doc.new_node("code", attrs);
    doc.set_text(inner, code.trim_matches('\n'))?;
    doc.append_child(pre, inner)?;
    Ok(pre)
}

/// Text under `id` exactly as written, excluding its own tail.
fn raw_text(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    let Some(el) = doc.get(id) else {
        return out;
    };
    out.push_str(&el.text);
    for &child in el.children() {
        out.push_str(&raw_text(doc, child));
        if let Some(child_el) = doc.get(child) {
            out.push_str(&child_el.tail);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::StorageParser;

    fn md(markup: &str) -> String {
        to_markdown(&StorageParser::new().parse(markup).unwrap()).unwrap()
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let out = md("<h1>Title</h1><p>First paragraph.</p><h3>Sub</h3>");
        assert!(out.contains("# Title"));
        assert!(out.contains("First paragraph."));
        assert!(out.contains("### Sub"));
    }

    #[test]
    fn test_inline_formatting() {
        let out = md("<p><strong>bold</strong> and <code>x = 1</code></p>");
        assert!(out.contains("**bold**"));
        assert!(out.contains("`x = 1`"));
    }

    #[test]
    fn test_links_and_images() {
        let out = md(
            r#"<p>See <a href="https://h/a.pdf">the doc</a> and <img src="https://h/i.png" alt="chart" /></p>"#,
        );
        assert!(out.contains("[the doc](https://h/a.pdf)"));
        assert!(out.contains("![chart](https://h/i.png)"));
    }

    #[test]
    fn test_markdown_syntax_in_text_is_escaped() {
        let out = md("<p>*not emphasis* and [not a link](x)</p>");
        assert!(out.contains("not emphasis"));
        assert!(!out.contains("*not emphasis*"));
        assert!(!out.contains("[not a link](x)"));
    }

    #[test]
    fn test_lists() {
        let out = md("<ul><li>One</li><li>Two</li></ul>");
        assert!(out.contains("One"));
        assert!(out.contains("Two"));
    }

    #[test]
    fn test_code_macro_with_language() {
        let markup = r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">rust</ac:parameter><ac:plain-text-body><![CDATA[let x = 1;
let y = 2;]]></ac:plain-text-body></ac:structured-macro>"#;
        let out = md(markup);
        assert!(out.contains("```rust"));
        assert!(out.contains("let x = 1;\nlet y = 2;"));
        assert!(!out.contains("language"));
    }

    #[test]
    fn test_code_macro_keeps_entity_text() {
        let markup = r#"<ac:structured-macro ac:name="code"><ac:plain-text-body><![CDATA[echo "&nbsp;" <b>]]></ac:plain-text-body></ac:structured-macro>"#;
        let out = md(markup);
        assert!(out.contains(r#"echo "&nbsp;" <b>"#));
        assert!(!out.contains('\u{00a0}'));
    }

    #[test]
    fn test_table() {
        let out = md(
            "<table><tbody><tr><th>Name</th><th>Role</th></tr><tr><td>Jane</td><td>Lead</td></tr></tbody></table>",
        );
        assert!(out.contains('|'));
        assert!(out.contains("Name"));
        assert!(out.contains("Jane"));
    }

    #[test]
    fn test_other_macros_render_text_without_parameters() {
        let markup = r#"<ac:structured-macro ac:name="info"><ac:parameter ac:name="title">Hidden</ac:parameter><ac:rich-text-body><p>Shown</p></ac:rich-text-body></ac:structured-macro>"#;
        let out = md(markup);
        assert!(out.contains("Shown"));
        assert!(!out.contains("Hidden"));
    }

    #[test]
    fn test_empty_macro_does_not_swallow_following_text() {
        let out = md(r#"<p><ac:emoticon ac:name="smile" /> after</p><p>next</p>"#);
        assert!(out.contains("after"));
        assert!(out.contains("next"));
    }

    #[test]
    fn test_prepare_leaves_source_untouched() {
        let doc = StorageParser::new()
            .parse(r#"<ac:structured-macro ac:name="code"><ac:plain-text-body>x</ac:plain-text-body></ac:structured-macro>"#)
            .unwrap();
        let prepared = prepare(&doc).unwrap();

        assert_eq!(doc.find_all(tags::PLAIN_TEXT_BODY, &[]).len(), 1);
        assert!(prepared.find_all(tags::PLAIN_TEXT_BODY, &[]).is_empty());
        assert_eq!(prepared.find_all("pre", &[]).len(), 1);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(md(""), "");
        assert_eq!(md("<p>   </p>"), "");
    }
}
