//! confmark CLI - Confluence storage format to HTML and Markdown.
//!
//! Provides commands for:
//! - `convert`: Resolve macros in a local storage-format file
//! - `page`: Fetch a page from Confluence and resolve its macros
//! - `to-storage`: Convert a Markdown file to storage format

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConvertArgs, PageArgs, ToStorageArgs};
use output::Output;

/// confmark - Confluence storage format to HTML and Markdown.
#[derive(Parser)]
#[command(name = "confmark", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a local storage-format file.
    Convert(ConvertArgs),
    /// Fetch a Confluence page and convert it.
    Page(PageArgs),
    /// Convert a Markdown file to storage format.
    ToStorage(ToStorageArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Convert(args) => args.verbose,
        Commands::Page(args) => args.verbose,
        Commands::ToStorage(args) => args.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert(args) => args.execute(),
        Commands::Page(args) => args.execute(),
        Commands::ToStorage(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
