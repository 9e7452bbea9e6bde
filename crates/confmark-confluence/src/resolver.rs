//! Display name lookup backed by the Confluence user API.

use std::collections::HashMap;
use std::sync::RwLock;

use confmark_storage::{IdentityResolver, ResolveError, UserDetails};
use tracing::debug;

use crate::client::ConfluenceClient;
use crate::types::User;

impl From<User> for UserDetails {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name,
        }
    }
}

impl IdentityResolver for ConfluenceClient {
    fn resolve_by_account_id(&self, account_id: &str) -> Result<UserDetails, ResolveError> {
        self.user_by_account_id(account_id)
            .map(UserDetails::from)
            .map_err(|e| {
                ResolveError::with_source(format!("failed to look up account {account_id}"), e)
            })
    }

    fn resolve_by_username(&self, username: &str) -> Result<UserDetails, ResolveError> {
        self.user_by_username(username)
            .map(UserDetails::from)
            .map_err(|e| ResolveError::with_source(format!("failed to look up user {username}"), e))
    }
}

/// Memoizes successful lookups of another resolver.
///
/// Failures are not cached, so a transient error is retried on the next
/// occurrence of the same user.
#[derive(Debug)]
pub struct CachedResolver<R> {
    inner: R,
    accounts: RwLock<HashMap<String, UserDetails>>,
    usernames: RwLock<HashMap<String, UserDetails>>,
}

impl<R: IdentityResolver> CachedResolver<R> {
    /// Wrap `inner` with an empty cache.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            accounts: RwLock::new(HashMap::new()),
            usernames: RwLock::new(HashMap::new()),
        }
    }

    /// The wrapped resolver.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn cached(
        cache: &RwLock<HashMap<String, UserDetails>>,
        key: &str,
        lookup: impl FnOnce() -> Result<UserDetails, ResolveError>,
    ) -> Result<UserDetails, ResolveError> {
        if let Some(details) = cache.read().ok().and_then(|map| map.get(key).cloned()) {
            debug!(key, "User cache hit");
            return Ok(details);
        }

        let details = lookup()?;
        if let Ok(mut map) = cache.write() {
            map.insert(key.to_owned(), details.clone());
        }
        Ok(details)
    }
}

impl<R: IdentityResolver> IdentityResolver for CachedResolver<R> {
    fn resolve_by_account_id(&self, account_id: &str) -> Result<UserDetails, ResolveError> {
        Self::cached(&self.accounts, account_id, || {
            self.inner.resolve_by_account_id(account_id)
        })
    }

    fn resolve_by_username(&self, username: &str) -> Result<UserDetails, ResolveError> {
        Self::cached(&self.usernames, username, || {
            self.inner.resolve_by_username(username)
        })
    }
}
