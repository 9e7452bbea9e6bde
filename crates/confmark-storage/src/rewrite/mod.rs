//! Macro rewriting passes.
//!
//! Each macro family is handled by a [`Pass`]. A pass selects candidate nodes
//! once, then rewrites them one at a time. Every rewrite produces a complete
//! replacement (or a skip) before the tree is touched, so a macro is either
//! replaced as a whole or left as it was.
//!
//! Failures are isolated per node: a [`RewriteFailure`] carries the
//! placeholder text that takes the macro's place, and the pass moves on.

mod attachments;
mod mentions;
mod profiles;

pub(crate) use attachments::{AttachmentLinkPass, AttachmentTarget, BareAttachmentPass, ImagePass};
pub(crate) use mentions::MentionPass;
pub(crate) use profiles::ProfilePass;

use crate::error::TreeError;
use crate::tags;
use crate::tree::{Attributes, Document, NodeId};

/// What replaces a macro node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Replacement {
    /// Plain text.
    Text(String),
    /// A standard element with text content.
    Element {
        tag: &'static str,
        attrs: Attributes,
        text: String,
    },
}

impl Replacement {
    /// Text content of the replacement.
    fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Element { text, .. } => text,
        }
    }

    fn apply(self, doc: &mut Document, node: NodeId) -> Result<(), TreeError> {
        match self {
            Self::Text(text) => doc.replace_with_text(node, &text),
            Self::Element { tag, attrs, text } => {
                let element = doc.new_node(tag, attrs);
                doc.set_text(element, text)?;
                doc.replace_with_node(node, element)
            }
        }
    }
}

/// Reason a macro could not be rewritten normally.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RewriteError {
    #[error("profile macro has no user parameter")]
    MissingUserParameter,

    #[error("user parameter has no user reference")]
    MissingUserReference,

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Rewrite failure with the text that replaces the macro.
#[derive(Debug)]
pub(crate) struct RewriteFailure {
    pub(crate) placeholder: String,
    pub(crate) error: RewriteError,
}

impl RewriteFailure {
    pub(crate) fn new(placeholder: impl Into<String>, error: impl Into<RewriteError>) -> Self {
        Self {
            placeholder: placeholder.into(),
            error: error.into(),
        }
    }
}

/// Result of rewriting one node. `Ok(None)` leaves the node untouched.
pub(crate) type RewriteResult = Result<Option<Replacement>, RewriteFailure>;

/// One macro family.
pub(crate) trait Pass {
    /// Name used in log messages.
    fn name(&self) -> &'static str;

    /// Candidate nodes, in document order.
    fn select(&self, doc: &Document) -> Vec<NodeId>;

    /// Compute the replacement for one candidate.
    fn rewrite(&self, doc: &Document, node: NodeId) -> RewriteResult;
}

/// Counts from one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PassReport {
    /// Nodes replaced by their rewrite.
    pub(crate) rewritten: usize,
    /// Nodes replaced by a failure placeholder.
    pub(crate) placeholders: usize,
    /// Candidates left untouched.
    pub(crate) skipped: usize,
}

/// Run a pass over the document.
///
/// Candidates are collected up front. Nodes created by the pass are never
/// visited, and candidates detached by an earlier replacement are skipped, as
/// is the root. Every remaining candidate has a parent, so replacing it cannot
/// fail; should an element replacement still be rejected, its text is inserted
/// instead so the macro does not survive.
pub(crate) fn run_pass(doc: &mut Document, pass: &dyn Pass) -> PassReport {
    let mut report = PassReport::default();

    for node in pass.select(doc) {
        if node == doc.root() || !doc.is_attached(node) {
            report.skipped += 1;
            continue;
        }

        let (replacement, failed) = match pass.rewrite(doc, node) {
            Ok(Some(replacement)) => (replacement, false),
            Ok(None) => {
                report.skipped += 1;
                continue;
            }
            Err(failure) => {
                tracing::warn!(
                    pass = pass.name(),
                    error = %failure.error,
                    placeholder = %failure.placeholder,
                    "Macro rewrite failed, using placeholder"
                );
                (Replacement::Text(failure.placeholder), true)
            }
        };

        let fallback = replacement.text().to_owned();
        match replacement.apply(doc, node) {
            Ok(()) if failed => report.placeholders += 1,
            Ok(()) => report.rewritten += 1,
            Err(e) => {
                tracing::warn!(pass = pass.name(), error = %e, "Could not replace macro node");
                match doc.replace_with_text(node, &fallback) {
                    Ok(()) => report.placeholders += 1,
                    Err(_) => report.skipped += 1,
                }
            }
        }
    }

    tracing::debug!(
        pass = pass.name(),
        rewritten = report.rewritten,
        placeholders = report.placeholders,
        skipped = report.skipped,
        "Pass finished"
    );
    report
}

/// User reference read from an `ri:user` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UserReference<'d> {
    pub(crate) account_id: Option<&'d str>,
    pub(crate) userkey: Option<&'d str>,
}

impl<'d> UserReference<'d> {
    pub(crate) fn read(doc: &'d Document, user: NodeId) -> Self {
        let non_empty = |name: &str| doc.attr(user, name).filter(|v| !v.is_empty());
        Self {
            account_id: non_empty(tags::ACCOUNT_ID),
            userkey: non_empty(tags::USERKEY),
        }
    }
}

/// Non-empty `ri:filename` of an `ri:attachment` element.
pub(crate) fn attachment_filename(doc: &Document, attachment: NodeId) -> Option<&str> {
    doc.attr(attachment, tags::FILENAME)
        .filter(|name| !name.is_empty())
}
