use std::path::PathBuf;

use sprig_store::ObjectKind;
use sprig_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("repository not initialized at {}", .0.display())]
    NotInitialized(PathBuf),

    #[error("revision not found: {0}")]
    RevisionNotFound(String),

    #[error("object {id} is a {actual}, expected {expected}")]
    WrongKind {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("store error: {0}")]
    Store(#[from] sprig_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] sprig_refs::RefError),

    #[error("protocol error: {0}")]
    Protocol(#[from] sprig_protocol::ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
