//! User operations for Confluence API.

use tracing::info;

use super::{ConfluenceClient, encode_query};
use crate::error::ConfluenceError;
use crate::types::User;

impl ConfluenceClient {
    /// Get a user by Cloud account id.
    pub fn user_by_account_id(&self, account_id: &str) -> Result<User, ConfluenceError> {
        info!(account_id, "Getting user");
        self.get_json(&self.user_url("accountId", account_id))
    }

    /// Get a user by Server/Data Center username.
    pub fn user_by_username(&self, username: &str) -> Result<User, ConfluenceError> {
        info!(username, "Getting user");
        self.get_json(&self.user_url("username", username))
    }

    fn user_url(&self, param: &str, value: &str) -> String {
        format!("{}/user?{}={}", self.api_url(), param, encode_query(value))
    }
}
