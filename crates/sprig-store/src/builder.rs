//! Tree construction from a directory on disk.
//!
//! The walk is contents-first: every file and subdirectory is written to the
//! store before the tree that names it, because a tree's payload embeds its
//! children's IDs.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sprig_types::ObjectId;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::discover::DEFAULT_MARKER;
use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, EntryMode, Tree, TreeEntry};
use crate::traits::ObjectStore;

/// What a symbolic link's blob holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymlinkPolicy {
    /// The content of the file the link points at. Links to anything other
    /// than a readable file fall back to [`SymlinkPolicy::LinkPath`].
    #[default]
    ResolveTarget,
    /// The link's target path text, as `git` itself stores links.
    LinkPath,
}

/// Configuration for [`TreeBuilder`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Names left out of every tree (the metadata directory or gitfile).
    pub skip_names: Vec<String>,
    /// How symbolic links are captured.
    pub symlinks: SymlinkPolicy,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            skip_names: vec![DEFAULT_MARKER.to_string()],
            symlinks: SymlinkPolicy::default(),
        }
    }
}

/// Result of building a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOutput {
    /// ID of the top-level tree.
    pub root: ObjectId,
    /// The top-level tree itself.
    pub tree: Tree,
    /// Every object written, in write order (children before parents).
    pub written: Vec<ObjectId>,
}

/// Builds and persists tree objects for a directory hierarchy.
pub struct TreeBuilder<'a> {
    store: &'a dyn ObjectStore,
    config: BuilderConfig,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self::with_config(store, BuilderConfig::default())
    }

    pub fn with_config(store: &'a dyn ObjectStore, config: BuilderConfig) -> Self {
        Self { store, config }
    }

    /// Write every file and directory under `dir` and return the top tree.
    pub fn build(&self, dir: &Path) -> StoreResult<BuildOutput> {
        let mut pending: HashMap<PathBuf, Tree> = HashMap::new();
        let mut written = Vec::new();

        let walker = WalkDir::new(dir)
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_skipped(e));

        for entry in walker {
            let entry = entry?;
            let file_type = entry.file_type();
            // A symlinked root is followed by the walk but still reports the
            // link's own file type.
            let is_dir = file_type.is_dir() || (entry.depth() == 0 && entry.path().is_dir());

            let (mode, id) = if is_dir {
                let tree = pending.remove(entry.path()).unwrap_or_default();
                let id = self.store.write_object(&tree)?;
                written.push(id);
                debug!(path = %entry.path().display(), id = %id.short_hex(), entries = tree.len(), "wrote tree");
                if entry.depth() == 0 {
                    return Ok(BuildOutput {
                        root: id,
                        tree,
                        written,
                    });
                }
                (EntryMode::Directory, id)
            } else if file_type.is_file() {
                let blob = Blob::new(fs::read(entry.path())?);
                let mode = if is_executable(&entry)? {
                    EntryMode::Executable
                } else {
                    EntryMode::Regular
                };
                let id = self.store.write_object(&blob)?;
                written.push(id);
                (mode, id)
            } else if file_type.is_symlink() {
                let blob = self.symlink_blob(entry.path())?;
                let id = self.store.write_object(&blob)?;
                written.push(id);
                (EntryMode::Symlink, id)
            } else {
                warn!(path = %entry.path().display(), "skipping special file");
                continue;
            };

            let name = entry_name(&entry)?;
            let parent = entry
                .path()
                .parent()
                .ok_or_else(|| StoreError::InvalidPath(entry.path().to_path_buf()))?;
            pending
                .entry(parent.to_path_buf())
                .or_default()
                .insert(TreeEntry::new(mode, name, id))?;
        }

        // The walk only ends without visiting a directory root when the root
        // is not a directory.
        Err(StoreError::InvalidPath(dir.to_path_buf()))
    }

    /// Skipped names match any file type: a worktree or submodule keeps a
    /// `.git` file instead of a directory.
    fn is_skipped(&self, entry: &DirEntry) -> bool {
        self.config
            .skip_names
            .iter()
            .any(|n| OsStr::new(n) == entry.file_name())
    }

    fn symlink_blob(&self, path: &Path) -> StoreResult<Blob> {
        if self.config.symlinks == SymlinkPolicy::ResolveTarget {
            match fs::metadata(path) {
                Ok(meta) if meta.is_file() => return Ok(Blob::new(fs::read(path)?)),
                _ => warn!(path = %path.display(), "link target is not a file; storing link path"),
            }
        }
        Ok(Blob::new(link_bytes(&fs::read_link(path)?)))
    }
}

fn entry_name(entry: &DirEntry) -> StoreResult<String> {
    entry
        .file_name()
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| StoreError::InvalidPath(entry.path().to_path_buf()))
}

#[cfg(unix)]
fn is_executable(entry: &DirEntry) -> StoreResult<bool> {
    use std::os::unix::fs::PermissionsExt;
    Ok(entry.metadata()?.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_entry: &DirEntry) -> StoreResult<bool> {
    Ok(false)
}

#[cfg(unix)]
fn link_bytes(target: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    target.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn link_bytes(target: &Path) -> Vec<u8> {
    target.to_string_lossy().replace('\\', "/").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loose::LooseObjectStore;
    use crate::memory::InMemoryObjectStore;
    use crate::object::{GitObject, Object};

    fn populate(root: &Path) {
        fs::create_dir_all(root.join(".git").join("objects")).unwrap();
        fs::write(root.join(".git").join("HEAD"), b"ref: refs/heads/master\n").unwrap();
        fs::write(root.join("hello.txt"), b"hello world\n").unwrap();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src").join("main.rs"), b"fn main() {}\n").unwrap();
    }

    #[test]
    fn empty_directory_is_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryObjectStore::new();
        let out = TreeBuilder::new(&store).build(dir.path()).unwrap();
        assert!(out.tree.is_empty());
        assert_eq!(out.root.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert_eq!(out.written, vec![out.root]);
    }

    #[test]
    fn builds_reference_hashes() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let store = InMemoryObjectStore::new();
        let out = TreeBuilder::new(&store).build(dir.path()).unwrap();

        let names: Vec<&str> = out.tree.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["hello.txt", "src"]);
        assert_eq!(
            out.tree.get("hello.txt").unwrap().object_id.to_hex(),
            "3b18e512dba79e4c8300dd08aeb37f8e728b8dad"
        );
        assert_eq!(out.tree.get("src").unwrap().mode, EntryMode::Directory);
        // `git write-tree` over the same files.
        assert_eq!(out.root.to_hex(), "e5a99208dafbe5fdb4601aa62f9898439dafd05d");
    }

    #[test]
    fn children_are_written_before_parents() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let store = InMemoryObjectStore::new();
        let out = TreeBuilder::new(&store).build(dir.path()).unwrap();

        let src_id = out.tree.get("src").unwrap().object_id;
        let pos = |id: &ObjectId| out.written.iter().position(|w| w == id).unwrap();
        assert!(pos(&src_id) < pos(&out.root));
        assert_eq!(*out.written.last().unwrap(), out.root);

        let Object::Tree(src) = store.read_object(&src_id).unwrap() else {
            panic!("src is not a tree");
        };
        let main_id = src.get("main.rs").unwrap().object_id;
        assert!(pos(&main_id) < pos(&src_id));
    }

    #[test]
    fn metadata_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let store = InMemoryObjectStore::new();
        let out = TreeBuilder::new(&store).build(dir.path()).unwrap();
        assert!(out.tree.get(".git").is_none());
    }

    #[test]
    fn metadata_gitfile_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".git"), b"gitdir: ../main/.git/worktrees/wt\n").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let store = InMemoryObjectStore::new();
        let out = TreeBuilder::new(&store).build(dir.path()).unwrap();
        assert!(out.tree.get(".git").is_none());
        assert_eq!(out.tree.len(), 1);
    }

    #[test]
    fn file_sorts_before_directory_sharing_its_prefix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("foo.rs"), b"a\n").unwrap();
        fs::create_dir(dir.path().join("foo")).unwrap();
        fs::write(dir.path().join("foo").join("x"), b"b\n").unwrap();

        let store = InMemoryObjectStore::new();
        let out = TreeBuilder::new(&store).build(dir.path()).unwrap();
        let names: Vec<&str> = out.tree.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["foo.rs", "foo"]);
        // `git write-tree` over the same files.
        assert_eq!(out.root.to_hex(), "5a7bd324c6378ca9ef5453b0319a6959907e1ea8");
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_root_is_built_as_its_target() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("a.txt"), b"hello world\n").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let store = InMemoryObjectStore::new();
        let via_link = TreeBuilder::new(&store).build(&link).unwrap();
        let direct = TreeBuilder::new(&store).build(&real).unwrap();
        assert_eq!(via_link.root, direct.root);
        assert_eq!(
            via_link.tree.get("a.txt").unwrap().object_id.to_hex(),
            "3b18e512dba79e4c8300dd08aeb37f8e728b8dad"
        );
    }

    #[test]
    fn repeated_builds_are_reproducible_and_readable() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let store = LooseObjectStore::new(dir.path().join(".git"));
        let first = TreeBuilder::new(&store).build(dir.path()).unwrap();
        let second = TreeBuilder::new(&store).build(dir.path()).unwrap();
        assert_eq!(first.root, second.root);

        let read = store.read_object(&first.root).unwrap();
        assert_eq!(read.raw_bytes(), first.tree.raw_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_is_recorded() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("run.sh");
        fs::write(&script, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o744)).unwrap();
        fs::write(dir.path().join("plain"), b"x").unwrap();

        let store = InMemoryObjectStore::new();
        let out = TreeBuilder::new(&store).build(dir.path()).unwrap();
        assert_eq!(out.tree.get("run.sh").unwrap().mode, EntryMode::Executable);
        assert_eq!(out.tree.get("plain").unwrap().mode, EntryMode::Regular);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_policies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("target.txt"), b"payload").unwrap();
        std::os::unix::fs::symlink("target.txt", dir.path().join("link")).unwrap();
        std::os::unix::fs::symlink("nowhere", dir.path().join("dangling")).unwrap();

        let store = InMemoryObjectStore::new();
        let out = TreeBuilder::new(&store).build(dir.path()).unwrap();
        let link = out.tree.get("link").unwrap();
        assert_eq!(link.mode, EntryMode::Symlink);
        assert_eq!(link.object_id, Blob::new(b"payload".to_vec()).hash());
        let dangling = out.tree.get("dangling").unwrap();
        assert_eq!(dangling.object_id, Blob::new(b"nowhere".to_vec()).hash());

        let config = BuilderConfig {
            symlinks: SymlinkPolicy::LinkPath,
            ..Default::default()
        };
        let out = TreeBuilder::with_config(&store, config)
            .build(dir.path())
            .unwrap();
        assert_eq!(
            out.tree.get("link").unwrap().object_id,
            Blob::new(b"target.txt".to_vec()).hash()
        );
    }

    #[test]
    fn building_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();
        let store = InMemoryObjectStore::new();
        assert!(matches!(
            TreeBuilder::new(&store).build(&file),
            Err(StoreError::InvalidPath(_))
        ));
    }
}
