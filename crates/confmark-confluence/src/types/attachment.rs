//! Confluence attachment types.

use serde::Deserialize;

/// Confluence attachment.
///
/// Serde ignores unknown fields from the API response.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    /// Attachment ID.
    pub id: String,
    /// Attachment title/filename.
    pub title: String,
    /// Media type and size.
    #[serde(default)]
    pub extensions: Option<AttachmentExtensions>,
    /// Hypermedia links.
    #[serde(rename = "_links", default)]
    pub links: Option<AttachmentLinks>,
}

/// Attachment metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentExtensions {
    /// MIME type.
    #[serde(default)]
    pub media_type: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Attachment links.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentLinks {
    /// Download path relative to the site base URL.
    #[serde(default)]
    pub download: Option<String>,
}

/// Attachments API response.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentsResponse {
    /// List of attachments.
    pub results: Vec<Attachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_attachments() {
        let json = r#"{
            "results": [
                {
                    "id": "att1",
                    "title": "diagram.png",
                    "extensions": {"mediaType": "image/png", "fileSize": 2048},
                    "_links": {"download": "/download/attachments/123/diagram.png"}
                },
                {"id": "att2", "title": "notes.txt"}
            ],
            "size": 2
        }"#;
        let response: AttachmentsResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.results.len(), 2);
        let first = &response.results[0];
        let extensions = first.extensions.as_ref().unwrap();
        assert_eq!(extensions.media_type.as_deref(), Some("image/png"));
        assert_eq!(extensions.file_size, Some(2048));
        assert_eq!(
            first.links.as_ref().and_then(|l| l.download.as_deref()),
            Some("/download/attachments/123/diagram.png")
        );
        assert!(response.results[1].extensions.is_none());
    }
}
