use sha1::{Digest, Sha1};
use sprig_types::ObjectId;

/// SHA-1 hasher for canonical object encodings.
///
/// [`ObjectHasher::hash_object`] streams the header and the payload into the
/// digest separately, so large blobs are never copied just to be hashed. The
/// result is identical to hashing the concatenated encoding.
#[derive(Default)]
pub struct ObjectHasher {
    inner: Sha1,
}

impl ObjectHasher {
    /// Start an empty digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes into the digest.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Consume the hasher and produce the object ID.
    pub fn finish(self) -> ObjectId {
        ObjectId::from_hash(self.inner.finalize().into())
    }

    /// Hash a complete raw encoding (header included).
    pub fn hash_raw(raw: &[u8]) -> ObjectId {
        let mut hasher = Self::new();
        hasher.update(raw);
        hasher.finish()
    }

    /// Hash a payload under the header `"<kind> <len>\0"` without building the
    /// encoding in memory.
    pub fn hash_object(kind: &str, payload: &[u8]) -> ObjectId {
        let mut hasher = Self::new();
        hasher
            .update(kind.as_bytes())
            .update(b" ")
            .update(payload.len().to_string().as_bytes())
            .update(b"\0")
            .update(payload);
        hasher.finish()
    }

    /// Verify that a raw encoding produces the expected object ID.
    pub fn verify(raw: &[u8], expected: &ObjectId) -> bool {
        Self::hash_raw(raw) == *expected
    }
}
