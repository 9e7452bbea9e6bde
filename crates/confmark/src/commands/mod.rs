//! CLI command implementations.

pub(crate) mod convert;
pub(crate) mod page;
pub(crate) mod to_storage;

pub(crate) use convert::ConvertArgs;
pub(crate) use page::PageArgs;
pub(crate) use to_storage::ToStorageArgs;

use std::path::Path;

use clap::ValueEnum;
use confmark_config::{ConfluenceConfig, Credentials};
use confmark_confluence::{Auth, ConfluenceClient};
use confmark_storage::Processed;
use serde_json::json;

use crate::error::CliError;
use crate::output::Output;

/// What to write for a converted document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// Markdown only.
    #[default]
    Markdown,
    /// Rewritten storage markup only.
    Html,
    /// JSON object with `html` and `markdown` fields.
    Both,
}

/// Render the processed document in `format`.
pub(crate) fn render(processed: &Processed, format: Format) -> Result<String, CliError> {
    Ok(match format {
        Format::Markdown => processed.markdown.clone(),
        Format::Html => {
            let mut html = processed.html.clone();
            if !html.ends_with('\n') {
                html.push('\n');
            }
            html
        }
        Format::Both => {
            let value = json!({
                "html": processed.html,
                "markdown": processed.markdown,
            });
            let mut text = serde_json::to_string_pretty(&value)?;
            text.push('\n');
            text
        }
    })
}

/// Write the rendered document to `path`, or stdout when `None`.
pub(crate) fn write_document(
    output: &Output,
    processed: &Processed,
    format: Format,
    path: Option<&Path>,
) -> Result<(), CliError> {
    let text = render(processed, format)?;
    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            output.info(&format!("Wrote {}", path.display()));
        }
        None => output.document(&text)?,
    }
    Ok(())
}

/// Build a REST client from validated configuration.
pub(crate) fn create_confluence_client(
    conf_config: &ConfluenceConfig,
) -> Result<ConfluenceClient, CliError> {
    let auth = match conf_config.credentials()? {
        Credentials::Basic {
            username,
            api_token,
        } => Auth::Basic {
            username: username.to_owned(),
            api_token: api_token.to_owned(),
        },
        Credentials::Bearer(token) => Auth::Bearer(token.to_owned()),
    };
    Ok(ConfluenceClient::new(&conf_config.base_url, auth))
}
