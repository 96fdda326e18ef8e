use sprig_types::ObjectId;

use crate::codec::StoredObject;
use crate::error::StoreResult;
use crate::object::{GitObject, Object};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are write-once. The same encoding always produces the same ID,
///   so writing an object that already exists is a no-op.
/// - Nothing is ever updated or deleted.
/// - Reads verify what they return: a missing object is `NotFound`, damaged
///   bytes are `CorruptObject`.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    fn read(&self, id: &ObjectId) -> StoreResult<StoredObject>;

    /// Write an object and return its content-addressed ID.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read and decode an object into its typed form.
    fn read_object(&self, id: &ObjectId) -> StoreResult<Object> {
        Object::from_stored_object(&self.read(id)?)
    }

    /// Encode and write a typed object.
    fn write_object(&self, object: &dyn GitObject) -> StoreResult<ObjectId> {
        self.write(&object.to_stored_object())
    }
}
