//! Canonical object encoding.
//!
//! Every object is stored and hashed as
//!
//! ```text
//! <kind> SP <decimal payload length> NUL <payload>
//! ```
//!
//! with no padding and no compression at this layer. The object ID is the
//! SHA-1 of exactly these bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sprig_crypto::ObjectHasher;
use sprig_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// Longest header the decoder will scan for its NUL terminator.
///
/// `"commit 18446744073709551615"` is 27 bytes; anything longer is not a
/// header.
pub const MAX_HEADER_LEN: usize = 32;

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Raw content (file contents).
    Blob,
    /// Directory listing: sorted entries mapping names to object references.
    Tree,
    /// Snapshot record pointing at a tree and its parent commits.
    Commit,
}

impl ObjectKind {
    /// The header token for this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            other => Err(StoreError::UnknownKind(other.to_string())),
        }
    }
}

/// A stored object: kind tag + payload bytes + cached size.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// payload; typed views live in [`crate::object`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The payload bytes (without header).
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and payload.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// The canonical encoding: header, NUL, payload.
    pub fn encode(&self) -> Vec<u8> {
        encode(self.kind, &self.data)
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        ObjectHasher::hash_object(self.kind.as_str(), &self.data)
    }

    /// Parse a canonical encoding back into a stored object.
    pub fn decode(raw: &[u8]) -> StoreResult<Self> {
        let (kind, payload) = decode(raw)?;
        Ok(Self::new(kind, payload.to_vec()))
    }
}

/// Produce `"<kind> <len(payload)>\0<payload>"`.
pub fn encode(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let header = format!("{} {}\0", kind, payload.len());
    let mut raw = Vec::with_capacity(header.len() + payload.len());
    raw.extend_from_slice(header.as_bytes());
    raw.extend_from_slice(payload);
    raw
}

/// Split a canonical encoding into its kind and payload.
///
/// Fails when no NUL terminator appears within [`MAX_HEADER_LEN`] bytes, when
/// the header is not `"<kind> <decimal>"`, when the kind token is unknown, or
/// when the declared size differs from the payload length.
pub fn decode(raw: &[u8]) -> StoreResult<(ObjectKind, &[u8])> {
    let window = &raw[..raw.len().min(MAX_HEADER_LEN)];
    let nul = window
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| StoreError::Format("no NUL terminator in object header".into()))?;

    let header = std::str::from_utf8(&raw[..nul])
        .map_err(|_| StoreError::Format("object header is not ASCII".into()))?;
    let (kind, size) = header
        .split_once(' ')
        .ok_or_else(|| StoreError::Format(format!("object header {header:?} has no size")))?;
    let kind: ObjectKind = kind.parse()?;

    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StoreError::Format(format!("object size {size:?} is not a decimal number")));
    }
    let declared: usize = size
        .parse()
        .map_err(|_| StoreError::Format(format!("object size {size:?} out of range")))?;

    let payload = &raw[nul + 1..];
    if declared != payload.len() {
        return Err(StoreError::SizeMismatch {
            declared,
            actual: payload.len(),
        });
    }
    Ok((kind, payload))
}
