//! Page operations for Confluence API.

use tracing::info;

use super::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::Page;

impl ConfluenceClient {
    /// Get a page with its storage body and version.
    pub fn get_page(&self, page_id: &str) -> Result<Page, ConfluenceError> {
        let url = self.page_url(page_id);

        info!(page_id, "Getting page");

        self.get_json(&url)
    }

    fn page_url(&self, page_id: &str) -> String {
        format!(
            "{}/content/{}?expand=body.storage,version",
            self.api_url(),
            page_id
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::Auth;
    use crate::ConfluenceClient;

    #[test]
    fn test_page_url_expands_storage_and_version() {
        let client = ConfluenceClient::new("https://h", Auth::Bearer("t".to_owned()));
        assert_eq!(
            client.page_url("123"),
            "https://h/rest/api/content/123?expand=body.storage,version"
        );
    }
}
