//! Foundation types for sprig.
//!
//! Every other sprig crate depends on `sprig-types`. It carries the one
//! identifier shared by the object store, the ref files, and the wire
//! protocol.
//!
//! # Key Types
//!
//! - [`ObjectId`] — 20-byte content address (SHA-1 of an object's canonical encoding)
//! - [`TypeError`] — malformed identifier text

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::{ObjectId, HEX_LEN, RAW_LEN};
