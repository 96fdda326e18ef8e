use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use sprig_types::ObjectId;
use tracing::debug;

use crate::codec::StoredObject;
use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Filesystem store in the loose-object layout:
/// `<root>/objects/<2 hex>/<38 hex>`, each file the zlib-compressed canonical
/// encoding.
///
/// Files are written to a temporary name in the fan-out directory and renamed
/// into place, so a reader never sees a partial object. Two writers racing on
/// the same content produce the same bytes at the same path, so no locking is
/// needed.
#[derive(Clone, Debug)]
pub struct LooseObjectStore {
    root: PathBuf,
}

impl LooseObjectStore {
    /// Open the store under a repository metadata directory (e.g. `.git`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The metadata directory this store lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `objects` directory.
    pub fn objects_dir(&self) -> PathBuf {
        self.root.join("objects")
    }

    /// Path of an object given its textual ID.
    ///
    /// Fails with `InvalidId` unless `id` is exactly 40 hex characters.
    pub fn path_for(&self, id: &str) -> StoreResult<PathBuf> {
        Ok(self.object_path(&ObjectId::from_hex(id)?))
    }

    /// Path of an object.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (dir, file) = id.fan_out();
        self.objects_dir().join(dir).join(file)
    }

    fn corrupt(id: &ObjectId, reason: impl Into<String>) -> StoreError {
        StoreError::CorruptObject {
            id: *id,
            reason: reason.into(),
        }
    }
}

impl ObjectStore for LooseObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        let path = self.object_path(id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound(*id)),
            Err(e) => return Err(e.into()),
        };

        let mut raw = Vec::new();
        ZlibDecoder::new(file)
            .read_to_end(&mut raw)
            .map_err(|e| Self::corrupt(id, format!("decompression failed: {e}")))?;

        let object = StoredObject::decode(&raw).map_err(|e| match e {
            StoreError::SizeMismatch { .. } => Self::corrupt(id, e.to_string()),
            other => other,
        })?;

        let computed = object.compute_id();
        if computed != *id {
            return Err(Self::corrupt(id, format!("content hashes to {computed}")));
        }
        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "read object");
        Ok(object)
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(&id);
        if path.exists() {
            debug!(id = %id.short_hex(), "object already present");
            return Ok(id);
        }

        let dir = path
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(path.clone()))?;
        fs::create_dir_all(dir)?;

        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        let mut encoder = ZlibEncoder::new(tmp, Compression::default());
        encoder.write_all(&object.encode())?;
        let tmp = encoder.finish()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "wrote object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}
