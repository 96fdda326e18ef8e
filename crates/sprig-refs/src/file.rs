use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sprig_types::ObjectId;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::Head;

const HEAD_FILE: &str = "HEAD";
const SYMREF_PREFIX: &str = "ref: ";

/// Refs stored as plain text files under a repository metadata directory.
///
/// Writes go to a temporary file beside the target and are renamed into
/// place, so a concurrent reader sees either the old or the new ID.
#[derive(Clone, Debug)]
pub struct FileRefStore {
    root: PathBuf,
}

impl FileRefStore {
    /// Open the ref store under a metadata directory (e.g. `.git`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a ref file.
    pub fn ref_path(&self, name: &str) -> RefResult<PathBuf> {
        validate_ref_name(name)?;
        Ok(self.root.join(name))
    }

    fn read_text(&self, path: &Path, name: &str) -> RefResult<String> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(RefError::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn write_text(&self, path: &Path, contents: &str) -> RefResult<()> {
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(path).map_err(|e| RefError::Io(e.error))?;
        Ok(())
    }

    fn parse_id(name: &str, text: &str) -> RefResult<ObjectId> {
        let line = text.trim_end();
        if line.starts_with(SYMREF_PREFIX) {
            return Err(RefError::Malformed {
                name: name.to_string(),
                reason: "symbolic ref where an object id was expected".into(),
            });
        }
        ObjectId::from_hex(line).map_err(|source| RefError::InvalidId {
            name: name.to_string(),
            source,
        })
    }
}

impl RefStore for FileRefStore {
    fn read_ref(&self, name: &str) -> RefResult<ObjectId> {
        let path = self.ref_path(name)?;
        let text = self.read_text(&path, name)?;
        Self::parse_id(name, &text)
    }

    fn write_ref(&self, name: &str, id: &ObjectId) -> RefResult<()> {
        let path = self.ref_path(name)?;
        self.write_text(&path, &format!("{id}\n"))?;
        debug!(name, id = %id.short_hex(), "updated ref");
        Ok(())
    }

    fn list_refs(&self, prefix: &str) -> RefResult<Vec<(String, ObjectId)>> {
        let refs_dir = self.root.join("refs");
        if !refs_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut refs = Vec::new();
        for entry in WalkDir::new(&refs_dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !name.starts_with(prefix) || validate_ref_name(&name).is_err() {
                continue;
            }
            let text = self.read_text(entry.path(), &name)?;
            refs.push((name.clone(), Self::parse_id(&name, &text)?));
        }
        refs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(refs)
    }

    fn head(&self) -> RefResult<Option<Head>> {
        let text = match self.read_text(&self.root.join(HEAD_FILE), HEAD_FILE) {
            Ok(text) => text,
            Err(RefError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let line = text.trim_end();
        match line.strip_prefix(SYMREF_PREFIX) {
            Some(target) => {
                validate_ref_name(target)?;
                Ok(Some(Head::Symbolic(target.to_string())))
            }
            None => Ok(Some(Head::Detached(Self::parse_id(HEAD_FILE, line)?))),
        }
    }

    fn set_head(&self, head: &Head) -> RefResult<()> {
        if let Head::Symbolic(target) = head {
            validate_ref_name(target)?;
        }
        self.write_text(&self.root.join(HEAD_FILE), &head.to_file_contents())?;
        debug!(?head, "updated HEAD");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_refs() -> (tempfile::TempDir, FileRefStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRefStore::new(dir.path().join(".git"));
        (dir, store)
    }

    fn id(byte: u8) -> ObjectId {
        ObjectId::from_hash([byte; 20])
    }

    #[test]
    fn ref_file_is_hex_and_newline() {
        let (dir, refs) = temp_refs();
        refs.write_ref("refs/heads/master", &id(0xab)).unwrap();
        let text = fs::read_to_string(dir.path().join(".git/refs/heads/master")).unwrap();
        assert_eq!(text, format!("{}\n", "ab".repeat(20)));
        assert_eq!(refs.read_ref("refs/heads/master").unwrap(), id(0xab));
    }

    #[test]
    fn refs_can_be_overwritten() {
        let (_dir, refs) = temp_refs();
        refs.write_ref("refs/heads/master", &id(1)).unwrap();
        refs.write_ref("refs/heads/master", &id(2)).unwrap();
        assert_eq!(refs.read_ref("refs/heads/master").unwrap(), id(2));
    }

    #[test]
    fn missing_ref_is_not_found() {
        let (_dir, refs) = temp_refs();
        assert!(matches!(
            refs.read_ref("refs/heads/nope"),
            Err(RefError::NotFound { .. })
        ));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let (_dir, refs) = temp_refs();
        assert!(matches!(
            refs.write_ref("refs/../escape", &id(1)),
            Err(RefError::InvalidName { .. })
        ));
    }

    #[test]
    fn garbage_ref_file_is_invalid_id() {
        let (dir, refs) = temp_refs();
        let path = dir.path().join(".git/refs/heads/bad");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not-a-hash\n").unwrap();
        assert!(matches!(
            refs.read_ref("refs/heads/bad"),
            Err(RefError::InvalidId { .. })
        ));
    }

    #[test]
    fn list_refs_by_prefix() {
        let (_dir, refs) = temp_refs();
        refs.write_ref("refs/heads/master", &id(1)).unwrap();
        refs.write_ref("refs/heads/feature/x", &id(2)).unwrap();
        refs.write_ref("refs/tags/v1", &id(3)).unwrap();

        let heads = refs.list_refs("refs/heads/").unwrap();
        let names: Vec<&str> = heads.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["refs/heads/feature/x", "refs/heads/master"]);
        assert_eq!(refs.list_refs("").unwrap().len(), 3);
    }

    #[test]
    fn head_symbolic_and_resolution() {
        let (dir, refs) = temp_refs();
        assert_eq!(refs.head().unwrap(), None);

        refs.set_head(&Head::Symbolic("refs/heads/master".into())).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join(".git/HEAD")).unwrap(),
            "ref: refs/heads/master\n"
        );
        assert_eq!(refs.resolve_head().unwrap(), None);

        let updated = refs.advance_head(&id(7)).unwrap();
        assert_eq!(updated, "refs/heads/master");
        assert_eq!(refs.resolve_head().unwrap(), Some(id(7)));
    }

    #[test]
    fn head_detached() {
        let (_dir, refs) = temp_refs();
        refs.set_head(&Head::Detached(id(9))).unwrap();
        assert_eq!(refs.head().unwrap(), Some(Head::Detached(id(9))));
        assert_eq!(refs.advance_head(&id(10)).unwrap(), "HEAD");
        assert_eq!(refs.resolve_head().unwrap(), Some(id(10)));
    }
}
