//! User profile macros: `<ac:structured-macro ac:name="profile">`.

use tracing::debug;

use super::{Pass, Replacement, RewriteError, RewriteFailure, RewriteResult, UserReference};
use crate::resolver::{IdentityResolver, Lookup, UserKey};
use crate::tags;
use crate::tree::{Document, NodeId};

/// Replaces profile macros that lack the `user` parameter or its reference.
pub(crate) const MALFORMED_PROFILE: &str = "[User Profile Macro (Malformed)]";

/// Fallback identifier when the reference has neither account id nor userkey.
const UNKNOWN_USER: &str = "unknown_user";

/// Rewrites profile macros to `@Display Name`.
pub(crate) struct ProfilePass<'r> {
    resolver: Option<&'r dyn IdentityResolver>,
}

impl<'r> ProfilePass<'r> {
    pub(crate) fn new(resolver: Option<&'r dyn IdentityResolver>) -> Self {
        Self { resolver }
    }
}

impl Pass for ProfilePass<'_> {
    fn name(&self) -> &'static str {
        "user profile"
    }

    fn select(&self, doc: &Document) -> Vec<NodeId> {
        doc.find_all(
            tags::STRUCTURED_MACRO,
            &[(tags::NAME, tags::PROFILE_MACRO)],
        )
    }

    fn rewrite(&self, doc: &Document, node: NodeId) -> RewriteResult {
        let malformed = |error: RewriteError| RewriteFailure::new(MALFORMED_PROFILE, error);

        doc.element(node).map_err(|e| malformed(e.into()))?;
        let param = doc
            .find_first_in(node, tags::PARAMETER, &[(tags::NAME, tags::USER_PARAM)])
            .ok_or_else(|| malformed(RewriteError::MissingUserParameter))?;
        let user = doc
            .find_first_in(param, tags::USER, &[])
            .ok_or_else(|| malformed(RewriteError::MissingUserReference))?;

        let reference = UserReference::read(doc, user);
        let key = match (reference.account_id, reference.userkey) {
            (Some(id), _) => Some(UserKey::AccountId(id)),
            (None, Some(name)) => Some(UserKey::Username(name)),
            (None, None) => None,
        };
        let identifier = reference
            .account_id
            .or(reference.userkey)
            .unwrap_or(UNKNOWN_USER);

        let lookup = match (key, self.resolver) {
            (Some(key), _) => Lookup::run(self.resolver, key),
            (None, None) => Lookup::NoResolver,
            // Nothing to look up
            (None, Some(_)) => Lookup::NoDisplayName,
        };

        let text = match lookup {
            Lookup::Resolved(name) => format!("@{name}"),
            Lookup::NoResolver => {
                tracing::warn!("Confluence client not available for user profile macro processing");
                fallback_profile(identifier)
            }
            Lookup::CallFailed(e) => {
                tracing::warn!(user = identifier, error = %e, "Error fetching user details for profile macro");
                fallback_profile(identifier)
            }
            Lookup::NoDisplayName => fallback_profile(identifier),
        };

        debug!(user = identifier, replacement = %text, "Rewrote user profile macro");
        Ok(Some(Replacement::Text(text)))
    }
}

fn fallback_profile(identifier: &str) -> String {
    format!("[User Profile: {identifier}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::StorageParser;
    use crate::rewrite::run_pass;
    use crate::serializer::StorageSerializer;
    use crate::testing::StaticResolver;

    fn profile(inner: &str) -> String {
        format!(r#"<p><ac:structured-macro ac:name="profile">{inner}</ac:structured-macro></p>"#)
    }

    fn rewrite(markup: &str, resolver: Option<&dyn IdentityResolver>) -> String {
        let mut doc = StorageParser::new().parse(markup).unwrap();
        run_pass(&mut doc, &ProfilePass::new(resolver));
        StorageSerializer::new().serialize(&doc).unwrap()
    }

    #[test]
    fn test_profile_resolved_by_account_id() {
        let resolver = StaticResolver::new().with_account("a1", "Jane Doe");
        let markup = profile(
            r#"<ac:parameter ac:name="user"><ri:user ri:account-id="a1" /></ac:parameter>"#,
        );
        assert_eq!(rewrite(&markup, Some(&resolver)), "<p>@Jane Doe</p>");
    }

    #[test]
    fn test_profile_resolved_by_userkey() {
        let resolver = StaticResolver::new().with_username("jdoe", "Jane Doe");
        let markup =
            profile(r#"<ac:parameter ac:name="user"><ri:user ri:userkey="jdoe" /></ac:parameter>"#);
        assert_eq!(rewrite(&markup, Some(&resolver)), "<p>@Jane Doe</p>");
    }

    #[test]
    fn test_profile_prefers_account_id() {
        let resolver = StaticResolver::new()
            .with_account("a1", "By Account")
            .with_username("jdoe", "By Username");
        let markup = profile(
            r#"<ac:parameter ac:name="user"><ri:user ri:account-id="a1" ri:userkey="jdoe" /></ac:parameter>"#,
        );
        assert_eq!(rewrite(&markup, Some(&resolver)), "<p>@By Account</p>");
    }

    #[test]
    fn test_profile_missing_user_parameter_is_malformed() {
        let markup = profile(r#"<ac:parameter ac:name="other">x</ac:parameter>"#);
        let resolver = StaticResolver::new();
        assert_eq!(
            rewrite(&markup, Some(&resolver)),
            "<p>[User Profile Macro (Malformed)]</p>"
        );
        assert_eq!(rewrite(&markup, None), "<p>[User Profile Macro (Malformed)]</p>");
        assert_eq!(resolver.calls(), 0);
    }

    #[test]
    fn test_profile_missing_user_reference_is_malformed() {
        let markup = profile(r#"<ac:parameter ac:name="user">jdoe</ac:parameter>"#);
        assert_eq!(rewrite(&markup, None), "<p>[User Profile Macro (Malformed)]</p>");
    }

    #[test]
    fn test_profile_lookup_failure_uses_account_id() {
        let resolver = StaticResolver::new();
        let markup = profile(
            r#"<ac:parameter ac:name="user"><ri:user ri:account-id="a1" /></ac:parameter>"#,
        );
        assert_eq!(
            rewrite(&markup, Some(&resolver)),
            "<p>[User Profile: a1]</p>"
        );
    }

    #[test]
    fn test_profile_without_resolver_uses_userkey() {
        let markup =
            profile(r#"<ac:parameter ac:name="user"><ri:user ri:userkey="jdoe" /></ac:parameter>"#);
        assert_eq!(rewrite(&markup, None), "<p>[User Profile: jdoe]</p>");
    }

    #[test]
    fn test_profile_nameless_user_uses_fallback() {
        let resolver = StaticResolver::new().with_nameless_account("a1");
        let markup = profile(
            r#"<ac:parameter ac:name="user"><ri:user ri:account-id="a1" /></ac:parameter>"#,
        );
        assert_eq!(
            rewrite(&markup, Some(&resolver)),
            "<p>[User Profile: a1]</p>"
        );
    }

    #[test]
    fn test_profile_without_identifier_is_unknown() {
        let resolver = StaticResolver::new();
        let markup = profile(r#"<ac:parameter ac:name="user"><ri:user /></ac:parameter>"#);
        assert_eq!(
            rewrite(&markup, Some(&resolver)),
            "<p>[User Profile: unknown_user]</p>"
        );
        assert_eq!(resolver.calls(), 0);
    }

    #[test]
    fn test_other_structured_macros_untouched() {
        let markup = r#"<ac:structured-macro ac:name="info"><ac:parameter ac:name="title">Hi</ac:parameter></ac:structured-macro>"#;
        assert_eq!(rewrite(markup, None), markup);
    }
}
