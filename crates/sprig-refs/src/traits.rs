//! The [`RefStore`] trait defining the reference storage interface.

use sprig_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::types::Head;

/// Storage backend for named references.
///
/// Names are full ref names under `refs/` (e.g. `refs/heads/master`).
pub trait RefStore: Send + Sync {
    /// Read the object ID a ref points at.
    fn read_ref(&self, name: &str) -> RefResult<ObjectId>;

    /// Create or overwrite a ref.
    fn write_ref(&self, name: &str, id: &ObjectId) -> RefResult<()>;

    /// List all refs whose name starts with `prefix`, sorted by name.
    fn list_refs(&self, prefix: &str) -> RefResult<Vec<(String, ObjectId)>>;

    /// Read the current HEAD state, `None` if HEAD does not exist.
    fn head(&self) -> RefResult<Option<Head>>;

    /// Replace HEAD.
    fn set_head(&self, head: &Head) -> RefResult<()>;

    /// The object HEAD resolves to, `None` when HEAD names a ref that does
    /// not exist yet (a fresh repository).
    fn resolve_head(&self) -> RefResult<Option<ObjectId>> {
        match self.head()? {
            None => Ok(None),
            Some(Head::Detached(id)) => Ok(Some(id)),
            Some(Head::Symbolic(target)) => match self.read_ref(&target) {
                Ok(id) => Ok(Some(id)),
                Err(RefError::NotFound { .. }) => Ok(None),
                Err(e) => Err(e),
            },
        }
    }

    /// Point whatever HEAD names at `id`: the symbolic target ref, or HEAD
    /// itself when detached. Returns the name that was updated.
    fn advance_head(&self, id: &ObjectId) -> RefResult<String> {
        match self.head()? {
            Some(Head::Symbolic(target)) => {
                self.write_ref(&target, id)?;
                Ok(target)
            }
            _ => {
                self.set_head(&Head::Detached(*id))?;
                Ok("HEAD".to_string())
            }
        }
    }
}
