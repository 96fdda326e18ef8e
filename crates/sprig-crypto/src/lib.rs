//! Cryptographic primitives for sprig.
//!
//! Object identity is the SHA-1 digest of the canonical encoding, the same
//! digest the wider git ecosystem uses. Interoperability depends on hashing
//! exactly `"<kind> <size>\0<payload>"`, never the payload alone.
//!
//! Hashing wraps the `sha1` crate; there is no custom cryptography.

pub mod hasher;

pub use hasher::ObjectHasher;
