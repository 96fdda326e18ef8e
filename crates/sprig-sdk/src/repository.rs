use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use sprig_protocol::{Discovery, DiscoveryConfig, ReferenceAdvertisement};
use sprig_refs::{branch_ref, validate_branch_name, FileRefStore, Head, RefError, RefStore};
use sprig_store::{
    find_root, find_root_from_cwd, Blob, BuildOutput, BuilderConfig, Commit, GitObject, Identity,
    LooseObjectStore, Object, ObjectKind, ObjectStore, Tree, TreeBuilder,
};
use sprig_types::{ObjectId, HEX_LEN};
use tracing::{debug, info};

use crate::config::RepoConfig;
use crate::error::{SdkError, SdkResult};

/// Result of [`Repository::commit_tree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    pub id: ObjectId,
    pub commit: Commit,
    /// The ref that now points at the commit (`refs/heads/<branch>`, or
    /// `HEAD` when detached).
    pub updated_ref: String,
}

/// A work tree with its metadata directory.
pub struct Repository {
    work_dir: PathBuf,
    git_dir: PathBuf,
    objects: LooseObjectStore,
    refs: FileRefStore,
    config: RepoConfig,
}

impl Repository {
    fn at(work_dir: PathBuf, config: RepoConfig) -> Self {
        let git_dir = work_dir.join(&config.marker_dir);
        Self {
            objects: LooseObjectStore::new(&git_dir),
            refs: FileRefStore::new(&git_dir),
            work_dir,
            git_dir,
            config,
        }
    }

    /// Create the metadata directory under `work_dir`.
    ///
    /// Re-running on an existing repository keeps its objects, refs and HEAD.
    pub fn init(work_dir: impl Into<PathBuf>, config: RepoConfig) -> SdkResult<Self> {
        validate_branch_name(&config.default_branch)?;
        let repo = Self::at(work_dir.into(), config);
        for sub in ["objects", "refs/heads", "refs/tags"] {
            fs::create_dir_all(repo.git_dir.join(sub))?;
        }
        if repo.refs.head()?.is_none() {
            let head = Head::Symbolic(branch_ref(&repo.config.default_branch));
            repo.refs.set_head(&head)?;
        }
        info!(path = %repo.git_dir.display(), "initialized repository");
        Ok(repo)
    }

    /// Open the repository whose work tree is exactly `work_dir`.
    pub fn open(work_dir: impl Into<PathBuf>, config: RepoConfig) -> SdkResult<Self> {
        let repo = Self::at(work_dir.into(), config);
        if !repo.git_dir.is_dir() {
            return Err(SdkError::NotInitialized(repo.work_dir));
        }
        Ok(repo)
    }

    /// Open the nearest repository at or above `start`.
    pub fn discover(start: &Path, config: RepoConfig) -> SdkResult<Self> {
        let root = find_root(start, &config.marker_dir)?;
        Self::open(root, config)
    }

    /// Open the nearest repository at or above the current directory.
    pub fn discover_from_cwd(config: RepoConfig) -> SdkResult<Self> {
        let root = find_root_from_cwd(&config.marker_dir)?;
        Self::open(root, config)
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn objects(&self) -> &LooseObjectStore {
        &self.objects
    }

    pub fn refs(&self) -> &FileRefStore {
        &self.refs
    }

    pub fn head(&self) -> SdkResult<Option<Head>> {
        Ok(self.refs.head()?)
    }

    // ---- Revisions ----

    /// Resolve a 40-hex ID, `HEAD`, a full ref name or a branch name.
    pub fn resolve(&self, rev: &str) -> SdkResult<ObjectId> {
        if rev.len() == HEX_LEN {
            if let Ok(id) = ObjectId::from_hex(rev) {
                return Ok(id);
            }
        }
        let found = if rev == "HEAD" {
            self.refs.resolve_head()?
        } else {
            let name = if rev.starts_with("refs/") {
                rev.to_string()
            } else {
                branch_ref(rev)
            };
            match self.refs.read_ref(&name) {
                Ok(id) => Some(id),
                Err(RefError::NotFound { .. } | RefError::InvalidName { .. }) => None,
                Err(e) => return Err(e.into()),
            }
        };
        found.ok_or_else(|| SdkError::RevisionNotFound(rev.to_string()))
    }

    fn expect_kind(&self, id: &ObjectId, expected: ObjectKind) -> SdkResult<()> {
        let actual = self.objects.read(id)?.kind;
        if actual != expected {
            return Err(SdkError::WrongKind {
                id: *id,
                expected,
                actual,
            });
        }
        Ok(())
    }

    // ---- Plumbing ----

    /// Hash `data` as a blob, storing it when `write` is set.
    pub fn hash_object(&self, data: &[u8], write: bool) -> SdkResult<ObjectId> {
        let blob = Blob::new(data.to_vec());
        if write {
            Ok(self.objects.write_object(&blob)?)
        } else {
            Ok(blob.hash())
        }
    }

    /// [`Repository::hash_object`] over a file's content.
    pub fn hash_file(&self, path: &Path, write: bool) -> SdkResult<ObjectId> {
        let data = fs::read(path)?;
        self.hash_object(&data, write)
    }

    /// Read and decode the object `rev` names.
    pub fn cat_file(&self, rev: &str) -> SdkResult<(ObjectId, Object)> {
        let id = self.resolve(rev)?;
        let object = self.objects.read_object(&id)?;
        Ok((id, object))
    }

    /// The tree `rev` names, peeling a commit to its tree.
    pub fn ls_tree(&self, rev: &str) -> SdkResult<Tree> {
        let (id, object) = self.cat_file(rev)?;
        match object {
            Object::Tree(tree) => Ok(tree),
            Object::Commit(commit) => match self.objects.read_object(&commit.tree)? {
                Object::Tree(tree) => Ok(tree),
                other => Err(SdkError::WrongKind {
                    id: commit.tree,
                    expected: ObjectKind::Tree,
                    actual: other.kind(),
                }),
            },
            Object::Blob(_) => Err(SdkError::WrongKind {
                id,
                expected: ObjectKind::Tree,
                actual: ObjectKind::Blob,
            }),
        }
    }

    /// Snapshot the work tree, skipping the metadata directory.
    pub fn write_tree(&self) -> SdkResult<BuildOutput> {
        let config = BuilderConfig {
            skip_names: vec![self.config.marker_dir.clone()],
            ..BuilderConfig::default()
        };
        let output = TreeBuilder::with_config(&self.objects, config).build(&self.work_dir)?;
        debug!(tree = %output.root, objects = output.written.len(), "wrote tree");
        Ok(output)
    }

    /// Commit `tree` as the environment identity at the current local time.
    pub fn commit_tree(
        &self,
        tree: ObjectId,
        parents: Vec<ObjectId>,
        message: &str,
    ) -> SdkResult<CommitOutcome> {
        self.check_commit_inputs(&tree, &parents)?;
        self.store_commit(Commit::compose_now(tree, parents, Identity::from_env(), message))
    }

    /// Write a commit with an explicit author and time, and move whatever
    /// HEAD names to it.
    pub fn commit_tree_as(
        &self,
        tree: ObjectId,
        parents: Vec<ObjectId>,
        message: &str,
        author: Identity,
        when: DateTime<FixedOffset>,
    ) -> SdkResult<CommitOutcome> {
        self.check_commit_inputs(&tree, &parents)?;
        self.store_commit(Commit::compose(tree, parents, author, message, when))
    }

    fn check_commit_inputs(&self, tree: &ObjectId, parents: &[ObjectId]) -> SdkResult<()> {
        self.expect_kind(tree, ObjectKind::Tree)?;
        for parent in parents {
            self.expect_kind(parent, ObjectKind::Commit)?;
        }
        Ok(())
    }

    fn store_commit(&self, commit: Commit) -> SdkResult<CommitOutcome> {
        let id = self.objects.write_object(&commit)?;
        let updated_ref = self.refs.advance_head(&id)?;
        info!(commit = %id.short_hex(), updated = %updated_ref, "committed");
        Ok(CommitOutcome {
            id,
            commit,
            updated_ref,
        })
    }
}

/// List the refs a remote repository advertises.
pub fn ls_remote(repo: &str, config: &DiscoveryConfig) -> SdkResult<ReferenceAdvertisement> {
    Ok(Discovery::new(config.clone())?.discover(repo)?)
}
