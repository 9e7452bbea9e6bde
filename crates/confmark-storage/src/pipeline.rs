//! Macro resolution pipeline.
//!
//! [`Preprocessor`] turns Confluence storage format into plain HTML and
//! Markdown:
//!
//! 1. parse the fragment into a [`Document`]
//! 2. rewrite user mentions
//! 3. rewrite profile macros
//! 4. rewrite images, bare attachment references and attachment links, when
//!    inline attachments are enabled and a content id is known
//! 5. serialize the tree and render Markdown
//!
//! # Example
//!
//! ```ignore
//! use confmark_storage::{Preprocessor, ProcessOptions};
//!
//! let preprocessor = Preprocessor::new("https://company.atlassian.net/wiki")
//!     .inline_attachments(true);
//! let processed = preprocessor.process(
//!     storage_markup,
//!     &ProcessOptions {
//!         resolver: Some(&client),
//!         content_id: Some("12345"),
//!         ..ProcessOptions::default()
//!     },
//! )?;
//! println!("{}", processed.markdown);
//! ```

use tracing::{debug, error};

use crate::error::ProcessError;
use crate::markdown::to_markdown;
use crate::parser::StorageParser;
use crate::resolver::IdentityResolver;
use crate::rewrite::{
    AttachmentLinkPass, AttachmentTarget, BareAttachmentPass, ImagePass, MentionPass, ProfilePass,
    run_pass,
};
use crate::serializer::StorageSerializer;
use crate::tree::Document;
use crate::url::UrlBuilder;

/// Per-call inputs of [`Preprocessor::process`].
#[derive(Clone, Copy, Default)]
pub struct ProcessOptions<'a> {
    /// Resolver for user mentions and profile macros.
    pub resolver: Option<&'a dyn IdentityResolver>,
    /// Page or blog post that owns the attachments.
    pub content_id: Option<&'a str>,
    /// Overrides the preprocessor's inline attachment setting.
    pub inline_attachments: Option<bool>,
}

/// Output of one [`Preprocessor::process`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    /// Rewritten storage markup.
    pub html: String,
    /// Markdown rendering of the rewritten markup.
    pub markdown: String,
}

/// Resolves Confluence macros for one site.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    urls: UrlBuilder,
    inline_attachments: bool,
}

impl Preprocessor {
    /// Create a preprocessor for the site at `base_url`.
    ///
    /// Inline attachments are off until enabled with
    /// [`inline_attachments`](Self::inline_attachments).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            urls: UrlBuilder::new(base_url),
            inline_attachments: false,
        }
    }

    /// Set the default for rewriting images and attachments.
    #[must_use]
    pub fn inline_attachments(mut self, enabled: bool) -> Self {
        self.inline_attachments = enabled;
        self
    }

    /// Site base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.urls.base()
    }

    /// Whether inline attachments are enabled by default.
    #[must_use]
    pub fn inline_attachments_enabled(&self) -> bool {
        self.inline_attachments
    }

    /// Resolve every macro in `markup`.
    ///
    /// Individual macros that cannot be resolved get fallback or placeholder
    /// text; only parse and serialize failures abort the call.
    pub fn process(
        &self,
        markup: &str,
        options: &ProcessOptions<'_>,
    ) -> Result<Processed, ProcessError> {
        let mut doc = StorageParser::new().parse(markup).map_err(|e| {
            error!(error = %e, "Failed to parse storage markup");
            ProcessError::from(e)
        })?;

        self.rewrite(&mut doc, options);

        let html = StorageSerializer::new().serialize(&doc).map_err(|e| {
            error!(error = %e, "Failed to serialize rewritten markup");
            ProcessError::from(e)
        })?;
        let markdown = to_markdown(&doc).map_err(|e| {
            error!(error = %e, "Failed to render Markdown");
            e
        })?;

        Ok(Processed { html, markdown })
    }

    /// Run the rewrite passes over an already parsed document.
    pub fn rewrite(&self, doc: &mut Document, options: &ProcessOptions<'_>) {
        run_pass(doc, &MentionPass::new(options.resolver));
        run_pass(doc, &ProfilePass::new(options.resolver));

        let enabled = options.inline_attachments.unwrap_or(self.inline_attachments);
        match (enabled, options.resolver, options.content_id) {
            (true, Some(_), Some(content_id)) if !content_id.is_empty() => {
                let target = AttachmentTarget {
                    urls: &self.urls,
                    content_id,
                };
                run_pass(doc, &ImagePass::new(target));
                run_pass(doc, &BareAttachmentPass::new(target));
                run_pass(doc, &AttachmentLinkPass::new(target));
            }
            _ => debug!(
                enabled,
                has_resolver = options.resolver.is_some(),
                has_content_id = options.content_id.is_some(),
                "Skipping inline attachment processing"
            ),
        }
    }
}
