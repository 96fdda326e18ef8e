use std::path::PathBuf;

use sprig_types::{ObjectId, TypeError};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The object header or payload is malformed.
    #[error("malformed object: {0}")]
    Format(String),

    /// The header's declared size disagrees with the payload length.
    #[error("object size mismatch: header declares {declared} bytes, payload has {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    /// The header's kind token is not blob, tree, or commit.
    #[error("unknown object kind: {0:?}")]
    UnknownKind(String),

    /// A tree entry carries a mode token outside the fixed set.
    #[error("unknown tree entry mode: {0:?}")]
    UnknownMode(String),

    /// An object identifier is not 40 hex characters.
    #[error("invalid object id: {0}")]
    InvalidId(#[from] TypeError),

    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// No repository marker was found between the start path and the filesystem root.
    #[error("repository not found (searched upward from {start})")]
    RepositoryNotFound { start: PathBuf },

    /// The stored bytes cannot be decompressed, or decode to the wrong size or hash.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// A directory entry name cannot be represented in a tree.
    #[error("unsupported path {0}")]
    InvalidPath(PathBuf),

    /// Directory traversal failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
