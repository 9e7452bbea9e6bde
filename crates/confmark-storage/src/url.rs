//! Attachment download URLs.

use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Path-segment escaping: everything except `A-Z a-z 0-9 - . _ ~ /`.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Download location of one attachment.
///
/// Formats as `{base}/download/attachments/{content_id}/{filename}` with the
/// filename percent-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadUrl<'a> {
    /// Site base URL without trailing slash.
    pub base: &'a str,
    /// Page or blog post id that owns the attachment.
    pub content_id: &'a str,
    /// Raw attachment filename.
    pub filename: &'a str,
}

impl fmt::Display for DownloadUrl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/download/attachments/{}/{}",
            self.base,
            self.content_id,
            utf8_percent_encode(self.filename, FILENAME_ENCODE_SET)
        )
    }
}

/// Builds [`DownloadUrl`]s for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    base: String,
}

impl UrlBuilder {
    /// Create a builder, stripping one trailing slash from `base`.
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self {
            base: base.strip_suffix('/').unwrap_or(base).to_owned(),
        }
    }

    /// Normalized base URL.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Download URL for `filename` attached to `content_id`.
    #[must_use]
    pub fn download_url(&self, content_id: &str, filename: &str) -> String {
        DownloadUrl {
            base: &self.base,
            content_id,
            filename,
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_filename() {
        let urls = UrlBuilder::new("https://h");
        assert_eq!(
            urls.download_url("12345", "diagram.png"),
            "https://h/download/attachments/12345/diagram.png"
        );
    }

    #[test]
    fn test_space_is_encoded() {
        let urls = UrlBuilder::new("https://h");
        assert_eq!(
            urls.download_url("1", "data export.csv"),
            "https://h/download/attachments/1/data%20export.csv"
        );
    }

    #[test]
    fn test_reserved_and_unicode_are_encoded() {
        let urls = UrlBuilder::new("https://h");
        assert_eq!(
            urls.download_url("1", "a#b?c&d.txt"),
            "https://h/download/attachments/1/a%23b%3Fc%26d.txt"
        );
        assert_eq!(
            urls.download_url("1", "\u{00fc}ber.pdf"),
            "https://h/download/attachments/1/%C3%BCber.pdf"
        );
    }

    #[test]
    fn test_safe_characters_untouched() {
        let urls = UrlBuilder::new("https://h");
        assert_eq!(
            urls.download_url("1", "dir/my-file_v1.0~x"),
            "https://h/download/attachments/1/dir/my-file_v1.0~x"
        );
    }

    #[test]
    fn test_single_trailing_slash_stripped() {
        assert_eq!(UrlBuilder::new("https://h/").base(), "https://h");
        assert_eq!(UrlBuilder::new("https://h//").base(), "https://h/");
        assert_eq!(UrlBuilder::new("https://h/wiki").base(), "https://h/wiki");
    }
}
