//! Identity lookup contract used by the user rewriters.

use std::error::Error;

/// User record returned by an [`IdentityResolver`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDetails {
    /// Display name, if the service returned one.
    pub display_name: Option<String>,
}

impl UserDetails {
    /// Record with a display name.
    #[must_use]
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
        }
    }
}

/// Identity lookup failure.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ResolveError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl ResolveError {
    /// Error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Maps user identifiers to display names.
///
/// Implementations may block (e.g. a REST call). They are called once per
/// macro occurrence; any caching is up to the implementation.
pub trait IdentityResolver {
    /// Look up a user by account id.
    fn resolve_by_account_id(&self, account_id: &str) -> Result<UserDetails, ResolveError>;

    /// Look up a user by legacy username (Server/Data Center userkey).
    fn resolve_by_username(&self, username: &str) -> Result<UserDetails, ResolveError>;
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for &R {
    fn resolve_by_account_id(&self, account_id: &str) -> Result<UserDetails, ResolveError> {
        (**self).resolve_by_account_id(account_id)
    }

    fn resolve_by_username(&self, username: &str) -> Result<UserDetails, ResolveError> {
        (**self).resolve_by_username(username)
    }
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for Box<R> {
    fn resolve_by_account_id(&self, account_id: &str) -> Result<UserDetails, ResolveError> {
        (**self).resolve_by_account_id(account_id)
    }

    fn resolve_by_username(&self, username: &str) -> Result<UserDetails, ResolveError> {
        (**self).resolve_by_username(username)
    }
}

/// Identifier used for a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UserKey<'a> {
    AccountId(&'a str),
    Username(&'a str),
}

/// Outcome of one lookup.
///
/// Everything except [`Lookup::Resolved`] leads to fallback text; the variants
/// stay separate so each path can be logged and tested on its own.
#[derive(Debug)]
pub(crate) enum Lookup {
    /// Non-empty display name.
    Resolved(String),
    /// No resolver was supplied.
    NoResolver,
    /// The resolver returned an error.
    CallFailed(ResolveError),
    /// The resolver answered without a usable display name.
    NoDisplayName,
}

impl Lookup {
    pub(crate) fn run(resolver: Option<&dyn IdentityResolver>, key: UserKey<'_>) -> Self {
        let Some(resolver) = resolver else {
            return Self::NoResolver;
        };
        let result = match key {
            UserKey::AccountId(id) => resolver.resolve_by_account_id(id),
            UserKey::Username(name) => resolver.resolve_by_username(name),
        };
        match result {
            Ok(UserDetails {
                display_name: Some(name),
            }) if !name.is_empty() => Self::Resolved(name),
            Ok(_) => Self::NoDisplayName,
            Err(e) => Self::CallFailed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticResolver;

    #[test]
    fn test_lookup_without_resolver() {
        let lookup = Lookup::run(None, UserKey::AccountId("a1"));
        assert!(matches!(lookup, Lookup::NoResolver));
    }

    #[test]
    fn test_lookup_resolved() {
        let resolver = StaticResolver::new().with_account("a1", "Jane Doe");
        let lookup = Lookup::run(Some(&resolver), UserKey::AccountId("a1"));
        assert!(matches!(lookup, Lookup::Resolved(name) if name == "Jane Doe"));
    }

    #[test]
    fn test_lookup_by_username() {
        let resolver = StaticResolver::new().with_username("jdoe", "Jane Doe");
        let lookup = Lookup::run(Some(&resolver), UserKey::Username("jdoe"));
        assert!(matches!(lookup, Lookup::Resolved(name) if name == "Jane Doe"));
    }

    #[test]
    fn test_lookup_empty_display_name() {
        let resolver = StaticResolver::new().with_account("a1", "");
        let lookup = Lookup::run(Some(&resolver), UserKey::AccountId("a1"));
        assert!(matches!(lookup, Lookup::NoDisplayName));
    }

    #[test]
    fn test_lookup_missing_display_name() {
        let resolver = StaticResolver::new().with_nameless_account("a1");
        let lookup = Lookup::run(Some(&resolver), UserKey::AccountId("a1"));
        assert!(matches!(lookup, Lookup::NoDisplayName));
    }

    #[test]
    fn test_lookup_call_failed() {
        let resolver = StaticResolver::new();
        let lookup = Lookup::run(Some(&resolver), UserKey::AccountId("missing"));
        assert!(matches!(lookup, Lookup::CallFailed(_)));
    }
}
