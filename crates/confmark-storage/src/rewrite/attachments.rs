//! Inline attachments: image macros, bare attachment references and
//! attachment links become `<img>` and `<a>` elements.
//!
//! The three passes must run in order: images, bare references, links. A bare
//! reference still nested in an `ac:image` or `ac:link` belongs to the image or
//! link pass and is skipped.

use tracing::debug;

use super::{Pass, Replacement, RewriteFailure, RewriteResult, attachment_filename};
use crate::tags;
use crate::tree::{Attributes, Document, NodeId};
use crate::url::UrlBuilder;

const IMAGE_PLACEHOLDER: &str = "[Image attachment]";
const ATTACHMENT_PLACEHOLDER: &str = "[Attachment]";
const ATTACHMENT_LINK_PLACEHOLDER: &str = "[Attachment link]";

/// Where attachment URLs point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AttachmentTarget<'a> {
    pub(crate) urls: &'a UrlBuilder,
    pub(crate) content_id: &'a str,
}

impl AttachmentTarget<'_> {
    fn url(&self, filename: &str) -> String {
        self.urls.download_url(self.content_id, filename)
    }
}

fn link(href: String, text: String) -> Replacement {
    Replacement::Element {
        tag: "a",
        attrs: [("href", href)].into_iter().collect(),
        text,
    }
}

/// `<ac:image><ri:attachment ri:filename="..." /></ac:image>` to `<img>`.
pub(crate) struct ImagePass<'a> {
    target: AttachmentTarget<'a>,
}

impl<'a> ImagePass<'a> {
    pub(crate) fn new(target: AttachmentTarget<'a>) -> Self {
        Self { target }
    }
}

/// Alt text from the first `alt`, `title` or `caption` parameter in document order.
fn alt_text(doc: &Document, image: NodeId) -> Option<String> {
    doc.find_all_in(image, tags::PARAMETER, &[])
        .into_iter()
        .find(|&param| {
            doc.attr(param, tags::NAME)
                .is_some_and(|name| tags::ALT_TEXT_PARAMS.contains(&name))
        })
        .map(|param| doc.text_content(param))
}

impl Pass for ImagePass<'_> {
    fn name(&self) -> &'static str {
        "image attachment"
    }

    fn select(&self, doc: &Document) -> Vec<NodeId> {
        doc.find_all(tags::IMAGE, &[])
    }

    fn rewrite(&self, doc: &Document, node: NodeId) -> RewriteResult {
        doc.element(node)
            .map_err(|e| RewriteFailure::new(IMAGE_PLACEHOLDER, e))?;
        let Some(attachment) = doc.find_first_in(node, tags::ATTACHMENT, &[]) else {
            return Ok(None);
        };
        let Some(filename) = attachment_filename(doc, attachment) else {
            return Ok(None);
        };

        let alt = alt_text(doc, node)
            .filter(|alt| !alt.is_empty())
            .unwrap_or_else(|| filename.to_owned());
        let src = self.target.url(filename);
        debug!(filename, %src, "Inlining image attachment");

        let attrs: Attributes = [("src", src), ("alt", alt)].into_iter().collect();
        Ok(Some(Replacement::Element {
            tag: "img",
            attrs,
            text: String::new(),
        }))
    }
}

/// Standalone `<ri:attachment ri:filename="..." />` to `<a>`.
pub(crate) struct BareAttachmentPass<'a> {
    target: AttachmentTarget<'a>,
}

impl<'a> BareAttachmentPass<'a> {
    pub(crate) fn new(target: AttachmentTarget<'a>) -> Self {
        Self { target }
    }
}

impl Pass for BareAttachmentPass<'_> {
    fn name(&self) -> &'static str {
        "attachment reference"
    }

    fn select(&self, doc: &Document) -> Vec<NodeId> {
        doc.find_all(tags::ATTACHMENT, &[])
    }

    fn rewrite(&self, doc: &Document, node: NodeId) -> RewriteResult {
        doc.element(node)
            .map_err(|e| RewriteFailure::new(ATTACHMENT_PLACEHOLDER, e))?;
        let Some(filename) = attachment_filename(doc, node) else {
            return Ok(None);
        };
        if doc.find_parent(node, tags::IMAGE).is_some()
            || doc.find_parent(node, tags::LINK).is_some()
        {
            return Ok(None);
        }

        let href = self.target.url(filename);
        debug!(filename, %href, "Linking attachment reference");
        Ok(Some(link(href, filename.to_owned())))
    }
}

/// `<ac:link><ri:attachment .../><ac:link-body>...</ac:link-body></ac:link>` to `<a>`.
pub(crate) struct AttachmentLinkPass<'a> {
    target: AttachmentTarget<'a>,
}

impl<'a> AttachmentLinkPass<'a> {
    pub(crate) fn new(target: AttachmentTarget<'a>) -> Self {
        Self { target }
    }
}

impl Pass for AttachmentLinkPass<'_> {
    fn name(&self) -> &'static str {
        "attachment link"
    }

    fn select(&self, doc: &Document) -> Vec<NodeId> {
        doc.find_all(tags::LINK, &[])
    }

    fn rewrite(&self, doc: &Document, node: NodeId) -> RewriteResult {
        doc.element(node)
            .map_err(|e| RewriteFailure::new(ATTACHMENT_LINK_PLACEHOLDER, e))?;
        let Some(attachment) = doc.find_first_in(node, tags::ATTACHMENT, &[]) else {
            return Ok(None);
        };
        let Some(filename) = attachment_filename(doc, attachment) else {
            return Ok(None);
        };

        let text = doc
            .find_first_in(node, tags::LINK_BODY, &[])
            .map_or_else(|| filename.to_owned(), |body| doc.text_content(body));
        let href = self.target.url(filename);
        debug!(filename, %href, "Linking attachment macro");
        Ok(Some(link(href, text)))
    }
}
