//! `confmark to-storage` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use confmark_storage::MarkdownConverter;
use tracing::info;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the to-storage command.
#[derive(Args)]
pub(crate) struct ToStorageArgs {
    /// Markdown file to convert.
    file: PathBuf,

    /// Add an anchor macro to every heading.
    #[arg(long)]
    heading_anchors: bool,

    /// Write the result to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ToStorageArgs {
    /// Execute the to-storage command.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or the output written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let markdown = std::fs::read_to_string(&self.file)?;
        info!(file = %self.file.display(), "Converting Markdown to storage format");

        let storage = convert(&markdown, self.heading_anchors);
        write_storage(&output, &storage, self.output.as_deref())
    }
}

fn convert(markdown: &str, heading_anchors: bool) -> String {
    let mut storage = MarkdownConverter::new()
        .heading_anchors(heading_anchors)
        .convert(markdown);
    if !storage.ends_with('\n') {
        storage.push('\n');
    }
    storage
}

fn write_storage(output: &Output, storage: &str, path: Option<&Path>) -> Result<(), CliError> {
    match path {
        Some(path) => {
            std::fs::write(path, storage)?;
            output.info(&format!("Wrote {}", path.display()));
        }
        None => output.document(storage)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_convert_ends_with_newline() {
        assert_eq!(convert("# Title", false), "<h1>Title</h1>\n");
    }

    #[test]
    fn test_convert_with_heading_anchors() {
        assert!(convert("# Title", true).contains(r#"<ac:parameter ac:name="">title</ac:parameter>"#));
    }

    #[test]
    fn test_execute_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("page.md");
        let target = dir.path().join("page.xml");
        std::fs::write(&input, "Hello").unwrap();

        ToStorageArgs {
            file: input,
            heading_anchors: false,
            output: Some(target.clone()),
            verbose: false,
        }
        .execute()
        .unwrap();

        assert_eq!(std::fs::read_to_string(target).unwrap(), "<p>Hello</p>\n");
    }

    #[test]
    fn test_execute_missing_file() {
        let result = ToStorageArgs {
            file: PathBuf::from("/nonexistent/page.md"),
            heading_anchors: false,
            output: None,
            verbose: false,
        }
        .execute();
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
