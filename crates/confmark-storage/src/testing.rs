//! In-memory resolver for unit tests.

use std::cell::Cell;
use std::collections::HashMap;

use crate::resolver::{IdentityResolver, ResolveError, UserDetails};

/// Resolver backed by fixed maps. Unknown identifiers fail.
#[derive(Debug, Default)]
pub(crate) struct StaticResolver {
    accounts: HashMap<String, UserDetails>,
    usernames: HashMap<String, UserDetails>,
    calls: Cell<usize>,
}

impl StaticResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_account(mut self, account_id: &str, display_name: &str) -> Self {
        self.accounts
            .insert(account_id.to_owned(), UserDetails::named(display_name));
        self
    }

    pub(crate) fn with_nameless_account(mut self, account_id: &str) -> Self {
        self.accounts
            .insert(account_id.to_owned(), UserDetails::default());
        self
    }

    pub(crate) fn with_username(mut self, username: &str, display_name: &str) -> Self {
        self.usernames
            .insert(username.to_owned(), UserDetails::named(display_name));
        self
    }

    /// Number of lookups made so far.
    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl IdentityResolver for StaticResolver {
    fn resolve_by_account_id(&self, account_id: &str) -> Result<UserDetails, ResolveError> {
        self.calls.set(self.calls.get() + 1);
        self.accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| ResolveError::new(format!("no user with account id {account_id}")))
    }

    fn resolve_by_username(&self, username: &str) -> Result<UserDetails, ResolveError> {
        self.calls.set(self.calls.get() + 1);
        self.usernames
            .get(username)
            .cloned()
            .ok_or_else(|| ResolveError::new(format!("no user named {username}")))
    }
}
