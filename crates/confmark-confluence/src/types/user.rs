//! Confluence user types.

use serde::Deserialize;

/// Confluence user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Cloud account id.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Server/Data Center username.
    #[serde(default)]
    pub username: Option<String>,
    /// Name shown in the UI.
    #[serde(default)]
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_cloud_user() {
        let user: User = serde_json::from_str(
            r#"{"type": "known", "accountId": "557058:f00", "displayName": "Jane Doe"}"#,
        )
        .unwrap();
        assert_eq!(user.account_id.as_deref(), Some("557058:f00"));
        assert_eq!(user.display_name.as_deref(), Some("Jane Doe"));
        assert_eq!(user.username, None);
    }
}
