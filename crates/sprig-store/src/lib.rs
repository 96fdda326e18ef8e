//! Content-addressed object storage for sprig.
//!
//! This crate implements a hash-keyed object store byte-compatible with
//! git's `.git/objects/` directory. Every blob, tree, and commit is an
//! immutable object identified by the SHA-1 of its canonical encoding.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file content
//! - [`Tree`] -- sorted directory listing mapping names to object references
//! - [`Commit`] -- tree + parents + author/committer + message
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`LooseObjectStore`] -- zlib-compressed loose files, one per object
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Children are written before the trees and commits that name them.
//! 3. Concurrent reads are always safe; identical concurrent writes race harmlessly.
//! 4. Reads verify size and hash before returning.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod builder;
pub mod codec;
pub mod commit;
pub mod discover;
pub mod error;
pub mod loose;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use builder::{BuildOutput, BuilderConfig, SymlinkPolicy, TreeBuilder};
pub use codec::{ObjectKind, StoredObject};
pub use commit::{Commit, Identity, Signature};
pub use discover::{find_root, find_root_from_cwd, DEFAULT_MARKER};
pub use error::{StoreError, StoreResult};
pub use loose::LooseObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, EntryMode, GitObject, Object, Tree, TreeEntry};
pub use traits::ObjectStore;
