//! Attachment operations for Confluence API.

use tracing::info;

use super::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::AttachmentsResponse;

impl ConfluenceClient {
    /// List attachments on a page.
    pub fn get_attachments(&self, page_id: &str) -> Result<AttachmentsResponse, ConfluenceError> {
        let url = format!("{}/content/{}/child/attachment", self.api_url(), page_id);

        info!(page_id, "Getting attachments");

        self.get_json(&url)
    }
}
