//! Error types for storage-format processing.

use std::str::Utf8Error;

use crate::tree::NodeId;

/// Error from a tree operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Handle was not issued by this document.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Node is not attached to a parent.
    #[error("node {0:?} is detached")]
    Detached(NodeId),

    /// Node is already attached and cannot be inserted again.
    #[error("node {0:?} is already attached")]
    AlreadyAttached(NodeId),

    /// The root element cannot be replaced.
    #[error("root element cannot be replaced")]
    Root,
}

/// Error while parsing storage-format markup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parse error")]
    Xml(#[from] quick_xml::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error")]
    Utf8(#[from] Utf8Error),

    /// XML attribute error.
    #[error("XML attribute error")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// Encoding error during XML parsing.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// Element was still open at the end of input.
    #[error("unclosed element <{0}>")]
    Unclosed(String),

    /// Tree construction failed.
    #[error("tree error")]
    Tree(#[from] TreeError),
}

/// Error that aborts a whole [`Preprocessor::process`](crate::Preprocessor::process) call.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Input markup could not be parsed.
    #[error("failed to parse storage markup")]
    Parse(#[from] ParseError),

    /// Rewritten tree could not be serialized.
    #[error("failed to serialize markup")]
    Serialize(#[from] std::fmt::Error),

    /// Tree could not be prepared for Markdown conversion.
    #[error("failed to prepare tree for Markdown")]
    Tree(#[from] TreeError),

    /// HTML to Markdown conversion failed.
    #[error("failed to convert to Markdown: {0}")]
    Markdown(String),
}
