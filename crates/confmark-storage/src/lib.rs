//! Confluence storage format macro resolution.
//!
//! This crate rewrites the vendor macros of Confluence storage format into
//! plain markup and renders the result as Markdown:
//! - [`Preprocessor`]: the pipeline entry point
//! - [`IdentityResolver`]: display name lookup used for mentions and profiles
//! - [`Document`]: arena tree the rewrites operate on
//! - [`StorageParser`] / [`StorageSerializer`]: markup in and out
//! - [`UrlBuilder`]: attachment download URLs
//! - [`MarkdownConverter`]: Markdown to storage format
//!
//! # Example
//!
//! ```ignore
//! use confmark_storage::{Preprocessor, ProcessOptions};
//!
//! let processed = Preprocessor::new("https://company.atlassian.net/wiki")
//!     .process(r#"<p><ac:link><ri:user ri:account-id="abc" /></ac:link></p>"#,
//!         &ProcessOptions::default())?;
//! assert_eq!(processed.html, "<p>@user_abc</p>");
//! ```

mod entities;
mod from_markdown;
mod markdown;
mod parser;
mod pipeline;
mod resolver;
mod rewrite;
mod serializer;
mod tags;
#[cfg(test)]
mod testing;
mod tree;
mod url;

pub mod error;

pub use error::{ParseError, ProcessError, TreeError};
pub use from_markdown::MarkdownConverter;
pub use markdown::to_markdown;
pub use parser::StorageParser;
pub use pipeline::{Preprocessor, ProcessOptions, Processed};
pub use resolver::{IdentityResolver, ResolveError, UserDetails};
pub use serializer::StorageSerializer;
pub use tree::{Attributes, Document, Element, NodeId};
pub use url::{DownloadUrl, UrlBuilder};
