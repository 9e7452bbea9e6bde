//! Request authentication.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;

/// Credentials sent with every request.
#[derive(Clone)]
pub enum Auth {
    /// Cloud: account email and API token, sent as HTTP basic auth.
    Basic {
        /// Account email or username.
        username: String,
        /// API token.
        api_token: String,
    },
    /// Server/Data Center personal access token.
    Bearer(String),
}

impl Auth {
    /// Value of the `Authorization` header.
    pub(crate) fn header_value(&self) -> String {
        match self {
            Self::Basic {
                username,
                api_token,
            } => {
                let credentials = BASE64_STANDARD.encode(format!("{username}:{api_token}"));
                format!("Basic {credentials}")
            }
            Self::Bearer(token) => format!("Bearer {token}"),
        }
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}
