use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use sprig_crypto::ObjectHasher;
use sprig_types::{ObjectId, RAW_LEN};

use crate::codec::{self, ObjectKind, StoredObject};
use crate::commit::Commit;
use crate::error::{StoreError, StoreResult};

/// Capabilities shared by every object variant.
pub trait GitObject {
    /// The header kind of this object.
    fn kind(&self) -> ObjectKind;

    /// The payload bytes (everything after the header NUL).
    fn payload(&self) -> Vec<u8>;

    /// The canonical encoding.
    fn raw_bytes(&self) -> Vec<u8> {
        codec::encode(self.kind(), &self.payload())
    }

    /// The content-addressed ID.
    fn hash(&self) -> ObjectId {
        ObjectHasher::hash_object(self.kind().as_str(), &self.payload())
    }

    /// The ID in 40-character hex form.
    fn hash_string(&self) -> String {
        self.hash().to_hex()
    }

    /// Convert into a `StoredObject` for storage.
    fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(self.kind(), self.payload())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object: file bytes verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Declared size of the blob.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        expect_kind(obj, ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

impl GitObject for Blob {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Blob
    }

    fn payload(&self) -> Vec<u8> {
        self.data.clone()
    }

    fn hash(&self) -> ObjectId {
        ObjectHasher::hash_object("blob", &self.data)
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file.
    Regular,
    /// File with any execute bit set.
    Executable,
    /// Symbolic link.
    Symlink,
    /// Subtree.
    Directory,
}

/// The fixed mode tokens. The directory token has no leading zero, as git
/// writes it; `040000` would give every tree a different hash.
const MODE_TOKENS: [(EntryMode, &str); 4] = [
    (EntryMode::Regular, "100644"),
    (EntryMode::Executable, "100755"),
    (EntryMode::Symlink, "120000"),
    (EntryMode::Directory, "40000"),
];

impl EntryMode {
    /// The token written into the tree payload.
    pub fn token(&self) -> &'static str {
        MODE_TOKENS
            .iter()
            .find_map(|(mode, token)| (mode == self).then_some(*token))
            .unwrap_or_default()
    }

    /// Parse a tree payload token.
    pub fn from_token(token: &str) -> StoreResult<Self> {
        MODE_TOKENS
            .iter()
            .find_map(|(mode, t)| (*t == token).then_some(*mode))
            .ok_or_else(|| StoreError::UnknownMode(token.to_string()))
    }

    /// Whether the entry names a subtree.
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Kind of object an entry with this mode points at.
    pub fn target_kind(&self) -> ObjectKind {
        match self {
            Self::Directory => ObjectKind::Tree,
            _ => ObjectKind::Blob,
        }
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ls-tree style: zero-padded to six digits.
        write!(f, "{:0>6}", self.token())
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// File mode (regular, executable, symlink, directory).
    pub mode: EntryMode,
    /// Entry name: a single path segment.
    pub name: String,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }

    /// `"<mode-token> <name>\0<20 raw hash bytes>"`.
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.mode.token().as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.name.as_bytes());
        out.push(0);
        out.extend_from_slice(self.object_id.as_bytes());
    }
}

/// Order two entries the way git does: a directory sorts as if its name
/// ended in `/`, so `foo.rs` comes before the directory `foo`.
fn git_order(a_name: &str, a_dir: bool, b_name: &str, b_dir: bool) -> Ordering {
    let suffix = |dir: bool| if dir { &b"/"[..] } else { &b""[..] };
    a_name
        .as_bytes()
        .iter()
        .chain(suffix(a_dir))
        .cmp(b_name.as_bytes().iter().chain(suffix(b_dir)))
}

/// A name must be a single non-empty path segment without NUL.
fn check_entry_name(name: &str) -> StoreResult<()> {
    if name.is_empty() || name.contains(['/', '\0']) {
        return Err(StoreError::Format(format!("invalid tree entry name {name:?}")));
    }
    Ok(())
}

/// Directory listing object.
///
/// Entries are held in git's tree order (see [`Tree::insert`]) and names are
/// unique: inserting a name that is already present leaves the tree
/// unchanged, even when the modes differ.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a tree from entries. Later duplicates of a name are dropped.
    pub fn new(entries: impl IntoIterator<Item = TreeEntry>) -> StoreResult<Self> {
        let mut tree = Self::empty();
        for entry in entries {
            tree.insert(entry)?;
        }
        Ok(tree)
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        [false, true].into_iter().find_map(|dir| {
            self.entries
                .binary_search_by(|e| git_order(&e.name, e.mode.is_dir(), name, dir))
                .ok()
        })
    }

    /// Insert an entry at its sorted position.
    ///
    /// Names are compared bytewise, with directories ordered as `name/`.
    /// Returns `Ok(false)` (and keeps the existing entry) when the name is
    /// taken; a name that is empty or holds `/` or NUL is a `Format` error.
    pub fn insert(&mut self, entry: TreeEntry) -> StoreResult<bool> {
        check_entry_name(&entry.name)?;
        if self.position(&entry.name).is_some() {
            return Ok(false);
        }
        let (Ok(pos) | Err(pos)) = self.entries.binary_search_by(|e| {
            git_order(&e.name, e.mode.is_dir(), &entry.name, entry.mode.is_dir())
        });
        self.entries.insert(pos, entry);
        Ok(true)
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.position(name).map(|i| &self.entries[i])
    }

    /// Entries in tree order.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Iterate entries in tree order.
    pub fn iter(&self) -> std::slice::Iter<'_, TreeEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode a tree payload.
    ///
    /// Every entry must be complete and carry a known mode; a damaged entry
    /// fails the whole tree instead of being skipped. Entries must be in
    /// strictly ascending tree order with unique names, otherwise the payload
    /// would not re-encode to the same bytes.
    pub fn parse(payload: &[u8]) -> StoreResult<Self> {
        let mut tree = Self::empty();
        let mut rest = payload;
        while !rest.is_empty() {
            let space = rest
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| StoreError::Format("tree entry has no mode separator".into()))?;
            let mode = std::str::from_utf8(&rest[..space])
                .map_err(|_| StoreError::UnknownMode(String::from_utf8_lossy(&rest[..space]).into()))?;
            let mode = EntryMode::from_token(mode)?;
            rest = &rest[space + 1..];

            let nul = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| StoreError::Format("tree entry name is not terminated".into()))?;
            let name = std::str::from_utf8(&rest[..nul])
                .map_err(|_| StoreError::Format("tree entry name is not UTF-8".into()))?;
            check_entry_name(name)?;
            rest = &rest[nul + 1..];

            if rest.len() < RAW_LEN {
                return Err(StoreError::Format(format!(
                    "tree entry {name:?} has a truncated hash ({} of {RAW_LEN} bytes)",
                    rest.len()
                )));
            }
            let object_id = ObjectId::from_raw(&rest[..RAW_LEN])?;
            rest = &rest[RAW_LEN..];

            if let Some(prev) = tree.entries.last().filter(|p| {
                git_order(&p.name, p.mode.is_dir(), name, mode.is_dir()) != Ordering::Less
            }) {
                return Err(StoreError::Format(format!(
                    "tree entries out of order: {:?} before {name:?}",
                    prev.name
                )));
            }
            if tree.position(name).is_some() {
                return Err(StoreError::Format(format!("duplicate tree entry {name:?}")));
            }
            tree.entries.push(TreeEntry::new(mode, name, object_id));
        }
        Ok(tree)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        expect_kind(obj, ObjectKind::Tree)?;
        Self::parse(&obj.data)
    }
}

impl GitObject for Tree {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Tree
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * (RAW_LEN + 16));
        for entry in &self.entries {
            entry.encode_into(&mut out);
        }
        out
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = &'a TreeEntry;
    type IntoIter = std::slice::Iter<'a, TreeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// Any decoded object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    /// Decode the payload of a stored object according to its kind.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        Ok(match obj.kind {
            ObjectKind::Blob => Self::Blob(Blob::from_stored_object(obj)?),
            ObjectKind::Tree => Self::Tree(Tree::from_stored_object(obj)?),
            ObjectKind::Commit => Self::Commit(Commit::from_stored_object(obj)?),
        })
    }

    /// Decode a full canonical encoding.
    pub fn decode(raw: &[u8]) -> StoreResult<Self> {
        Self::from_stored_object(&StoredObject::decode(raw)?)
    }
}

impl GitObject for Object {
    fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(b) => b.kind(),
            Self::Tree(t) => t.kind(),
            Self::Commit(c) => c.kind(),
        }
    }

    fn payload(&self) -> Vec<u8> {
        match self {
            Self::Blob(b) => b.payload(),
            Self::Tree(t) => t.payload(),
            Self::Commit(c) => c.payload(),
        }
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Self::Tree(tree)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Self::Commit(commit)
    }
}

pub(crate) fn expect_kind(obj: &StoredObject, kind: ObjectKind) -> StoreResult<()> {
    if obj.kind != kind {
        return Err(StoreError::CorruptObject {
            id: obj.compute_id(),
            reason: format!("expected {kind}, got {}", obj.kind),
        });
    }
    Ok(())
}
