//! Error types for XML to JSON conversion

use thiserror::Error;

/// Everything that can stop a conversion. No partial output is ever
/// returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// The input held no root element (only a prolog, comments or nothing).
    #[error("document has no root element")]
    EmptyDocument,

    /// Element nesting went past `Config::max_depth`.
    ///
    /// `path` is the tag-name path of the element that tripped the guard,
    /// e.g. `/a/b/c`.
    #[error("nesting depth exceeded (max: {max}) at {path}")]
    DepthExceeded { max: usize, path: String },

    /// The configuration was rejected before traversal began.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The XML parser rejected the input.
    #[error("XML parse error at position {position}: {message}")]
    Xml { position: usize, message: String },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
