//! `confmark page` command implementation.

use std::path::PathBuf;

use clap::Args;
use confmark_config::{CliSettings, Config};
use confmark_confluence::types::AttachmentsResponse;
use confmark_confluence::{CachedResolver, ConfluenceClient};
use confmark_storage::{IdentityResolver, Preprocessor, ProcessOptions};
use tracing::info;

use super::{Format, create_confluence_client, write_document};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the page command.
#[derive(Args)]
pub(crate) struct PageArgs {
    /// Confluence page ID.
    page_id: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    format: Format,

    /// Write the result to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Look up every user occurrence instead of caching display names.
    #[arg(long)]
    no_cache: bool,

    /// Rewrite images and attachments to download links.
    #[arg(long)]
    inline_attachments: bool,

    /// Print the page's attachment list to stderr.
    #[arg(long)]
    list_attachments: bool,

    /// Path to configuration file (default: auto-discover confmark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl PageArgs {
    /// Execute the page command.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or a Confluence request fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            inline_attachments: self.inline_attachments.then_some(true),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let client = create_confluence_client(config.require_confluence()?)?;

        let page = client.get_page(&self.page_id)?;
        let markup = page.storage().ok_or_else(|| {
            CliError::Validation(format!("page {} has no storage body", page.id))
        })?;
        output.heading(&format!("{} (id={})", page.title, page.id));

        if self.list_attachments {
            print_attachments(&output, &client.get_attachments(&page.id)?, &client);
        }

        let cached = CachedResolver::new(&client);
        let resolver: &dyn IdentityResolver = if self.no_cache { &client } else { &cached };

        info!(page_id = %page.id, "Converting page");
        let preprocessor = Preprocessor::new(client.base_url())
            .inline_attachments(config.conversion.inline_attachments);
        let processed = preprocessor.process(
            markup,
            &ProcessOptions {
                resolver: Some(resolver),
                content_id: Some(&page.id),
                ..ProcessOptions::default()
            },
        )?;

        write_document(&output, &processed, self.format, self.output.as_deref())
    }
}

fn print_attachments(output: &Output, attachments: &AttachmentsResponse, client: &ConfluenceClient) {
    if attachments.results.is_empty() {
        output.info("No attachments.");
        return;
    }

    output.info(&format!("Attachments ({}):", attachments.results.len()));
    for attachment in &attachments.results {
        let extensions = attachment.extensions.as_ref();
        let media_type = extensions
            .and_then(|e| e.media_type.as_deref())
            .unwrap_or("unknown type");
        let size = extensions
            .and_then(|e| e.file_size)
            .map_or_else(String::new, |bytes| format!(", {bytes} bytes"));
        let download = attachment
            .links
            .as_ref()
            .and_then(|l| l.download.as_deref())
            .map_or_else(String::new, |path| {
                format!(" -> {}{path}", client.base_url())
            });
        output.info(&format!(
            "  {} ({media_type}{size}){download}",
            attachment.title
        ));
    }
}
