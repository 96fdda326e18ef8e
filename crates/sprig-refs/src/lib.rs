//! Reference management for sprig.
//!
//! References are named pointers to object IDs, stored as plain text files
//! under the repository metadata directory, byte-compatible with git:
//!
//! - `<root>/refs/heads/<branch>` holds `<40-hex-id>\n`
//! - `<root>/HEAD` holds either `ref: refs/heads/<branch>\n` (symbolic) or
//!   `<40-hex-id>\n` (detached)
//!
//! Refs are the only mutable state in a repository: objects are write-once,
//! a ref may be overwritten.
//!
//! # Modules
//!
//! - [`error`] — Error types for ref operations
//! - [`types`] — [`Head`]
//! - [`traits`] — The [`RefStore`] trait defining the storage interface
//! - [`names`] — Ref name validation
//! - [`file`] — [`FileRefStore`], the on-disk backend

pub mod error;
pub mod file;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, RefResult};
pub use file::FileRefStore;
pub use names::{branch_ref, validate_branch_name, validate_ref_name};
pub use traits::RefStore;
pub use types::Head;
