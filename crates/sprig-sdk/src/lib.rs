//! High-level SDK for sprig.
//!
//! [`Repository`] ties the object store, ref store, and tree builder to one
//! work tree. It is the entry point for applications embedding sprig and the
//! layer the `sprig` binary is written against.

pub mod config;
pub mod error;
pub mod repository;

pub use config::RepoConfig;
pub use error::{SdkError, SdkResult};
pub use repository::{ls_remote, CommitOutcome, Repository};

// Re-export key types
pub use sprig_protocol::{DiscoveryConfig, Reference, ReferenceAdvertisement};
pub use sprig_refs::Head;
pub use sprig_store::{
    Blob, BuildOutput, Commit, EntryMode, GitObject, Identity, Object, ObjectKind, Tree, TreeEntry,
};
pub use sprig_types::ObjectId;
