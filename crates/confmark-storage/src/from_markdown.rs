//! Markdown to storage format conversion.

use std::fmt::Write;

use pulldown_cmark::{
    BlockQuoteKind, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html,
};
use tracing::error;

use crate::parser::StorageParser;
use crate::serializer::{cdata, escape_into};

/// Converts Markdown into Confluence storage format.
///
/// Code blocks become `code` macros, GitHub alerts become panel macros and
/// images become `ac:image` references. When the rendered markup is not
/// well-formed (raw HTML in the source can cause this), the plain HTML
/// rendering is returned wrapped in a paragraph instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter {
    heading_anchors: bool,
}

impl MarkdownConverter {
    /// Create a converter without heading anchors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an `anchor` macro named after the heading slug into each heading.
    #[must_use]
    pub fn heading_anchors(mut self, enabled: bool) -> Self {
        self.heading_anchors = enabled;
        self
    }

    /// Convert `markdown` to storage format.
    pub fn convert(&self, markdown: &str) -> String {
        let storage =
            StorageRenderer::new(self.heading_anchors).render(Parser::new_ext(markdown, options()));

        match StorageParser::new().parse(&storage) {
            Ok(_) => storage,
            Err(e) => {
                error!(error = %e, "Storage output is not well-formed, falling back to HTML");
                let mut fallback = String::new();
                html::push_html(&mut fallback, Parser::new_ext(markdown, options()));
                format!("<p>{fallback}</p>")
            }
        }
    }
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
}

/// Heading being collected until its end tag.
struct Heading {
    level: u8,
    text: String,
    html: String,
}

/// Renders pulldown-cmark events to storage format.
struct StorageRenderer {
    output: String,
    heading_anchors: bool,
    heading: Option<Heading>,
    /// Language and collected text of the open code block.
    code: Option<(Option<String>, String)>,
    /// Source and collected alt text of the open image.
    image: Option<(String, String)>,
    /// Panel macro name for each open block quote, `None` for a plain quote.
    quotes: Vec<Option<&'static str>>,
    in_table_head: bool,
}

impl StorageRenderer {
    fn new(heading_anchors: bool) -> Self {
        Self {
            output: String::with_capacity(4096),
            heading_anchors,
            heading: None,
            code: None,
            image: None,
            quotes: Vec::new(),
            in_table_head: false,
        }
    }

    fn render<'a>(mut self, events: impl Iterator<Item = Event<'a>>) -> String {
        for event in events {
            self.process_event(event);
        }
        self.output
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if let Some(heading) = &mut self.heading {
                    heading.text.push_str(&code);
                }
                self.push("<code>");
                self.push_escaped(&code);
                self.push("</code>");
            }
            Event::Html(markup) | Event::InlineHtml(markup) => self.push(&markup),
            Event::SoftBreak => self.push("\n"),
            Event::HardBreak => self.push("<br />"),
            Event::Rule => self.push("<hr />"),
            Event::TaskListMarker(checked) => self.push(if checked { "[x] " } else { "[ ] " }),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.push("<p>"),
            Tag::Heading { level, .. } => {
                self.heading = Some(Heading {
                    level: heading_level_to_num(level),
                    text: String::new(),
                    html: String::new(),
                });
            }
            Tag::BlockQuote(kind) => {
                let panel = kind.map(panel_macro);
                self.quotes.push(panel);
                match panel {
                    Some(name) => {
                        let _ = write!(
                            self.output,
                            r#"<ac:structured-macro ac:name="{name}" ac:schema-version="1"><ac:rich-text-body>"#
                        );
                    }
                    None => self.push("<blockquote>"),
                }
            }
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::List(Some(1)) => self.push("<ol>"),
            Tag::List(Some(start)) => {
                let _ = write!(self.output, r#"<ol start="{start}">"#);
            }
            Tag::List(None) => self.push("<ul>"),
            Tag::Item => self.push("<li>"),
            Tag::DefinitionList => self.push("<dl>"),
            Tag::DefinitionListTitle => self.push("<dt>"),
            Tag::DefinitionListDefinition => self.push("<dd>"),
            Tag::Table(_) => self.push("<table><tbody>"),
            Tag::TableHead => {
                self.in_table_head = true;
                self.push("<tr>");
            }
            Tag::TableRow => self.push("<tr>"),
            Tag::TableCell => self.push(if self.in_table_head { "<th>" } else { "<td>" }),
            Tag::Emphasis => self.push("<em>"),
            Tag::Strong => self.push("<strong>"),
            Tag::Strikethrough => self.push("<s>"),
            Tag::Superscript => self.push("<sup>"),
            Tag::Subscript => self.push("<sub>"),
            Tag::Link { dest_url, .. } => {
                self.push(r#"<a href=""#);
                self.push_attr(&dest_url);
                self.push(r#"">"#);
            }
            Tag::Image { dest_url, .. } => {
                self.image = Some((dest_url.to_string(), String::new()));
            }
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.push("</p>"),
            TagEnd::Heading(_) => self.end_heading(),
            TagEnd::BlockQuote(_) => match self.quotes.pop().flatten() {
                Some(_) => self.push("</ac:rich-text-body></ac:structured-macro>"),
                None => self.push("</blockquote>"),
            },
            TagEnd::CodeBlock => self.end_code_block(),
            TagEnd::List(ordered) => self.push(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.push("</li>"),
            TagEnd::DefinitionList => self.push("</dl>"),
            TagEnd::DefinitionListTitle => self.push("</dt>"),
            TagEnd::DefinitionListDefinition => self.push("</dd>"),
            TagEnd::Table => self.push("</tbody></table>"),
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.push("</tr>");
            }
            TagEnd::TableRow => self.push("</tr>"),
            TagEnd::TableCell => self.push(if self.in_table_head { "</th>" } else { "</td>" }),
            TagEnd::Emphasis => self.push("</em>"),
            TagEnd::Strong => self.push("</strong>"),
            TagEnd::Strikethrough => self.push("</s>"),
            TagEnd::Superscript => self.push("</sup>"),
            TagEnd::Subscript => self.push("</sub>"),
            TagEnd::Link => self.push("</a>"),
            TagEnd::Image => self.end_image(),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, code)) = &mut self.code {
            code.push_str(text);
        } else if let Some((_, alt)) = &mut self.image {
            alt.push_str(text);
        } else {
            if let Some(heading) = &mut self.heading {
                heading.text.push_str(text);
            }
            self.push_escaped(text);
        }
    }

    fn end_heading(&mut self) {
        let Some(heading) = self.heading.take() else {
            return;
        };
        let level = heading.level;
        let _ = write!(self.output, "<h{level}>");
        if self.heading_anchors {
            let slug = slugify(&heading.text);
            if !slug.is_empty() {
                let _ = write!(
                    self.output,
                    r#"<ac:structured-macro ac:name="anchor" ac:schema-version="1"><ac:parameter ac:name="">{slug}</ac:parameter></ac:structured-macro>"#
                );
            }
        }
        let _ = write!(self.output, "{}</h{level}>", heading.html.trim());
    }

    fn end_code_block(&mut self) {
        let Some((language, code)) = self.code.take() else {
            return;
        };
        self.push(r#"<ac:structured-macro ac:name="code" ac:schema-version="1">"#);
        if let Some(language) = language {
            self.push(r#"<ac:parameter ac:name="language">"#);
            self.push_escaped(&language);
            self.push("</ac:parameter>");
        }
        let body = cdata(code.strip_suffix('\n').unwrap_or(&code));
        let _ = write!(
            self.output,
            "<ac:plain-text-body>{body}</ac:plain-text-body></ac:structured-macro>"
        );
    }

    fn end_image(&mut self) {
        let Some((src, alt)) = self.image.take() else {
            return;
        };
        self.push("<ac:image");
        if !alt.is_empty() {
            self.push(r#" ac:alt=""#);
            self.push_attr(&alt);
            self.push(r#"""#);
        }
        self.push(">");
        if src.starts_with("http://") || src.starts_with("https://") {
            self.push(r#"<ri:url ri:value=""#);
            self.push_attr(&src);
        } else {
            // Local file, expected to be uploaded as an attachment
            let filename = src.rsplit('/').next().unwrap_or(&src).to_owned();
            self.push(r#"<ri:attachment ri:filename=""#);
            self.push_attr(&filename);
        }
        self.push(r#"" /></ac:image>"#);
    }

    /// Append markup to the open heading or the output.
    fn push(&mut self, markup: &str) {
        match &mut self.heading {
            Some(heading) => heading.html.push_str(markup),
            None => self.output.push_str(markup),
        }
    }

    fn push_escaped(&mut self, text: &str) {
        let target = match &mut self.heading {
            Some(heading) => &mut heading.html,
            None => &mut self.output,
        };
        escape_into(text, false, target);
    }

    fn push_attr(&mut self, value: &str) {
        let target = match &mut self.heading {
            Some(heading) => &mut heading.html,
            None => &mut self.output,
        };
        escape_into(value, true, target);
    }
}

fn panel_macro(kind: BlockQuoteKind) -> &'static str {
    match kind {
        BlockQuoteKind::Note => "info",
        BlockQuoteKind::Tip => "tip",
        BlockQuoteKind::Important | BlockQuoteKind::Warning => "note",
        BlockQuoteKind::Caution => "warning",
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Lowercase ASCII slug with dashes between words.
fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn convert(markdown: &str) -> String {
        MarkdownConverter::new().convert(markdown)
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(convert("Hello, world!"), "<p>Hello, world!</p>");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(convert("a < b & c"), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_heading_without_anchor() {
        assert_eq!(convert("# Title"), "<h1>Title</h1>");
    }

    #[test]
    fn test_heading_with_anchor() {
        let out = MarkdownConverter::new()
            .heading_anchors(true)
            .convert("## Getting *Started*");
        assert_eq!(
            out,
            concat!(
                "<h2>",
                r#"<ac:structured-macro ac:name="anchor" ac:schema-version="1">"#,
                r#"<ac:parameter ac:name="">getting-started</ac:parameter>"#,
                "</ac:structured-macro>",
                "Getting <em>Started</em></h2>",
            )
        );
    }

    #[test]
    fn test_code_block() {
        let out = convert("```python\nprint('hello')\n```");
        assert_eq!(
            out,
            concat!(
                r#"<ac:structured-macro ac:name="code" ac:schema-version="1">"#,
                r#"<ac:parameter ac:name="language">python</ac:parameter>"#,
                "<ac:plain-text-body><![CDATA[print('hello')]]></ac:plain-text-body>",
                "</ac:structured-macro>",
            )
        );
    }

    #[test]
    fn test_code_block_with_cdata_terminator() {
        let out = convert("```\nx]]>y\n```");
        assert!(out.contains("<![CDATA[x]]]]><![CDATA[>y]]>"));
        assert!(!out.contains(r#"ac:name="language""#));
    }

    #[test]
    fn test_images() {
        assert_eq!(
            convert("![Chart](images/chart.png)"),
            r#"<p><ac:image ac:alt="Chart"><ri:attachment ri:filename="chart.png" /></ac:image></p>"#
        );
        assert_eq!(
            convert("![](https://h/i.png)"),
            r#"<p><ac:image><ri:url ri:value="https://h/i.png" /></ac:image></p>"#
        );
    }

    #[test]
    fn test_link() {
        assert_eq!(
            convert("[docs](https://h/?a=1&b=2)"),
            r#"<p><a href="https://h/?a=1&amp;b=2">docs</a></p>"#
        );
    }

    #[test]
    fn test_alert_becomes_panel() {
        let out = convert("> [!NOTE]\n> Be careful");
        assert!(out.starts_with(r#"<ac:structured-macro ac:name="info""#));
        assert!(out.contains("Be careful"));
        assert!(out.ends_with("</ac:rich-text-body></ac:structured-macro>"));
    }

    #[test]
    fn test_plain_blockquote() {
        assert_eq!(convert("> quoted"), "<blockquote><p>quoted</p></blockquote>");
    }

    #[test]
    fn test_table_header_cells() {
        let out = convert("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(out.contains("<tr><th>A</th><th>B</th></tr>"));
        assert!(out.contains("<tr><td>1</td><td>2</td></tr>"));
    }

    #[test]
    fn test_lists() {
        assert_eq!(convert("- a\n- b"), "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(
            convert("3. c\n4. d"),
            r#"<ol start="3"><li>c</li><li>d</li></ol>"#
        );
    }

    #[test]
    fn test_output_is_parseable() {
        let out = MarkdownConverter::new().heading_anchors(true).convert(
            "# T\n\nText with `code` and **bold**.\n\n```rust\nfn main() {}\n```\n\n![x](x.png)",
        );
        assert!(StorageParser::new().parse(&out).is_ok());
    }

    #[test]
    fn test_malformed_html_falls_back_to_paragraph() {
        let out = convert("<div>unclosed\n\ntext");
        assert!(out.starts_with("<p><div>unclosed"));
        assert!(out.ends_with("</p>"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  API_v2 -- notes! "), "api-v2-notes");
        assert_eq!(slugify("!!!"), "");
    }
}
