//! Confluence integration for confmark.
//!
//! This crate provides:
//! - [`ConfluenceClient`]: REST API client for pages, attachments and users
//! - [`CachedResolver`]: memoizing wrapper around any
//!   [`IdentityResolver`](confmark_storage::IdentityResolver)
//!
//! `ConfluenceClient` implements `IdentityResolver`, so it can be handed
//! straight to the storage preprocessor.
//!
//! # Example
//!
//! ```ignore
//! use confmark_confluence::{Auth, CachedResolver, ConfluenceClient};
//! use confmark_storage::{Preprocessor, ProcessOptions};
//!
//! let client = ConfluenceClient::new(
//!     "https://company.atlassian.net/wiki",
//!     Auth::Basic { username: "me@company.com".into(), api_token: token },
//! );
//! let page = client.get_page("123")?;
//! let resolver = CachedResolver::new(&client);
//! let processed = Preprocessor::new(client.base_url()).process(
//!     page.storage().unwrap_or_default(),
//!     &ProcessOptions { resolver: Some(&resolver), content_id: Some(&page.id), ..Default::default() },
//! )?;
//! ```

mod auth;
pub use auth::Auth;

// API client
mod client;
pub use client::ConfluenceClient;

// Identity resolution
mod resolver;
pub use resolver::CachedResolver;

// Types
pub mod types;

// Errors
pub mod error;
pub use error::ConfluenceError;
