//! `confmark convert` command implementation.

use std::path::PathBuf;

use clap::Args;
use confmark_config::{CliSettings, Config};
use confmark_storage::{IdentityResolver, Preprocessor, ProcessOptions};
use tracing::info;

use super::{Format, create_confluence_client, write_document};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Storage-format file to convert.
    file: PathBuf,

    /// Confluence base URL for attachment links (overrides config).
    #[arg(long)]
    base_url: Option<String>,

    /// Page or blog post id that owns the attachments.
    #[arg(long)]
    content_id: Option<String>,

    /// Rewrite images and attachments to download links.
    #[arg(long)]
    inline_attachments: bool,

    /// Look up user display names with the configured Confluence client.
    #[arg(long)]
    resolve_users: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    format: Format,

    /// Write the result to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover confmark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if the config, the input file or the markup is invalid.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            base_url: self.base_url.clone(),
            inline_attachments: self.inline_attachments.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let client = if self.resolve_users {
            Some(create_confluence_client(config.require_confluence()?)?)
        } else {
            None
        };
        let resolver = client.as_ref().map(|c| c as &dyn IdentityResolver);

        let inline_attachments = config.conversion.inline_attachments;
        let base_url = config.base_url().unwrap_or_default();
        if inline_attachments {
            if base_url.is_empty() {
                return Err(CliError::Validation(
                    "inline attachments need a base URL: pass --base-url or set confluence.base_url"
                        .to_owned(),
                ));
            }
            if resolver.is_none() || self.content_id.is_none() {
                output.warning(
                    "Inline attachments need --resolve-users and --content-id; \
                     attachment macros are left as-is",
                );
            }
        }

        let markup = std::fs::read_to_string(&self.file)?;
        info!(file = %self.file.display(), "Converting storage file");

        let preprocessor = Preprocessor::new(base_url).inline_attachments(inline_attachments);
        let processed = preprocessor.process(
            &markup,
            &ProcessOptions {
                resolver,
                content_id: self.content_id.as_deref(),
                ..ProcessOptions::default()
            },
        )?;

        write_document(&output, &processed, self.format, self.output.as_deref())
    }
}
