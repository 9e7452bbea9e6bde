//! User mentions: `<ac:link><ri:user ri:account-id="..." /></ac:link>`.

use tracing::debug;

use super::{Pass, Replacement, RewriteResult, UserReference};
use crate::resolver::{IdentityResolver, Lookup, UserKey};
use crate::tags;
use crate::tree::{Document, NodeId};

/// How a mention is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MentionShape {
    /// The link wraps the user reference.
    Direct,
    /// The link also carries an `ac:link-body` showing `@`.
    LinkBody,
}

/// A link recognized as a user mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Mention<'d> {
    pub(crate) account_id: &'d str,
    pub(crate) shape: MentionShape,
}

/// Classify an `ac:link`. Links without an account id are not mentions.
pub(crate) fn classify(doc: &Document, link: NodeId) -> Option<Mention<'_>> {
    let user = doc.find_first_in(link, tags::USER, &[])?;
    let account_id = UserReference::read(doc, user).account_id?;

    let shows_at = doc
        .find_first_in(link, tags::LINK_BODY, &[])
        .is_some_and(|body| doc.text_content(body).contains('@'));
    let shape = if shows_at {
        MentionShape::LinkBody
    } else {
        MentionShape::Direct
    };

    Some(Mention { account_id, shape })
}

/// Rewrites user mentions to `@Display Name`.
pub(crate) struct MentionPass<'r> {
    resolver: Option<&'r dyn IdentityResolver>,
}

impl<'r> MentionPass<'r> {
    pub(crate) fn new(resolver: Option<&'r dyn IdentityResolver>) -> Self {
        Self { resolver }
    }
}

impl Pass for MentionPass<'_> {
    fn name(&self) -> &'static str {
        "user mention"
    }

    fn select(&self, doc: &Document) -> Vec<NodeId> {
        doc.find_all(tags::LINK, &[])
    }

    fn rewrite(&self, doc: &Document, node: NodeId) -> RewriteResult {
        let Some(mention) = classify(doc, node) else {
            return Ok(None);
        };
        let account_id = mention.account_id;

        let text = match Lookup::run(self.resolver, UserKey::AccountId(account_id)) {
            Lookup::Resolved(name) => format!("@{name}"),
            Lookup::NoResolver => {
                debug!(account_id, "No resolver for user mention, using fallback");
                fallback_mention(account_id)
            }
            Lookup::CallFailed(e) => {
                tracing::warn!(account_id, error = %e, "Error processing user mention");
                fallback_mention(account_id)
            }
            Lookup::NoDisplayName => {
                debug!(account_id, "User has no display name, using fallback");
                fallback_mention(account_id)
            }
        };

        debug!(account_id, shape = ?mention.shape, replacement = %text, "Rewrote user mention");
        Ok(Some(Replacement::Text(text)))
    }
}

fn fallback_mention(account_id: &str) -> String {
    format!("@user_{account_id}")
}
