//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// The ref name is invalid.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A ref file does not hold a valid object ID.
    #[error("invalid object id in {name}: {source}")]
    InvalidId {
        name: String,
        #[source]
        source: sprig_types::TypeError,
    },

    /// A symbolic ref was found where an object ID was expected, or vice versa.
    #[error("malformed ref {name}: {reason}")]
    Malformed { name: String, reason: String },

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal failed while listing refs.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
