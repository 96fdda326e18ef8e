//! Commit records and author identities.
//!
//! A commit payload is UTF-8 text:
//!
//! ```text
//! tree <hex>
//! parent <hex>            (zero or more, in order)
//! author <name> <<email>> <unix-seconds> <+hhmm>
//! committer <name> <<email>> <unix-seconds> <+hhmm>
//!
//! <message>
//! ```

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, SubsecRound, TimeZone};
use serde::{Deserialize, Serialize};
use sprig_types::ObjectId;

use crate::codec::{ObjectKind, StoredObject};
use crate::error::{StoreError, StoreResult};
use crate::object::{expect_kind, GitObject};

/// Name used when `USER` is unset or empty.
pub const PLACEHOLDER_NAME: &str = "Anonymous Coward";

/// Host used when `HOST` is unset or empty.
pub const PLACEHOLDER_HOST: &str = "localhost";

/// Who made a commit: `"<name> <<email>>"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// `user <user@host>`.
    pub fn at_host(user: &str, host: &str) -> Self {
        Self::new(user, format!("{user}@{host}"))
    }

    /// Identity from the process environment (`USER`, `HOST`).
    ///
    /// Never prompts; missing values fall back to fixed placeholders.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("USER").ok().as_deref(),
            std::env::var("HOST").ok().as_deref(),
        )
    }

    /// Identity from explicit variable values. Empty strings count as unset.
    pub fn from_vars(user: Option<&str>, host: Option<&str>) -> Self {
        let user = user.filter(|u| !u.is_empty()).unwrap_or(PLACEHOLDER_NAME);
        let host = host.filter(|h| !h.is_empty()).unwrap_or(PLACEHOLDER_HOST);
        Self::at_host(user, host)
    }

    fn parse(s: &str) -> StoreResult<Self> {
        let (name, rest) = s
            .split_once(" <")
            .ok_or_else(|| StoreError::Format(format!("identity {s:?} has no email")))?;
        let email = rest
            .strip_suffix('>')
            .ok_or_else(|| StoreError::Format(format!("identity {s:?} has an unterminated email")))?;
        Ok(Self::new(name, email))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// An identity stamped with a point in time and its UTC offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub identity: Identity,
    pub when: DateTime<FixedOffset>,
}

impl Signature {
    /// Sub-second precision is dropped; the text form carries whole seconds.
    pub fn new(identity: Identity, when: DateTime<FixedOffset>) -> Self {
        Self {
            identity,
            when: when.trunc_subsecs(0),
        }
    }

    fn parse(s: &str) -> StoreResult<Self> {
        let mut parts = s.rsplitn(3, ' ');
        let (offset, secs, identity) = match (parts.next(), parts.next(), parts.next()) {
            (Some(o), Some(t), Some(i)) => (o, t, i),
            _ => return Err(StoreError::Format(format!("signature {s:?} is incomplete"))),
        };
        let offset = parse_offset(offset)?;
        let secs: i64 = secs
            .parse()
            .map_err(|_| StoreError::Format(format!("bad timestamp {secs:?}")))?;
        let when = offset
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| StoreError::Format(format!("timestamp {secs} out of range")))?;
        Ok(Self::new(Identity::parse(identity)?, when))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.identity, self.when.format("%s %z"))
    }
}

fn parse_offset(s: &str) -> StoreResult<FixedOffset> {
    let bad = || StoreError::Format(format!("bad UTC offset {s:?}"));
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(bad()),
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| bad())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| bad())?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(bad)
}

/// A commit record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    /// Headers other than tree/parent/author/committer (e.g. `gpgsig`),
    /// kept verbatim so a decoded commit re-encodes to the same bytes.
    pub extra_headers: Vec<(String, String)>,
    /// Message text including its terminating newline.
    pub message: String,
}

impl Commit {
    /// Build a commit whose author and committer are the same signature.
    ///
    /// The message is terminated with a newline unless it already ends in one.
    pub fn compose(
        tree: ObjectId,
        parents: Vec<ObjectId>,
        author: Identity,
        message: &str,
        when: DateTime<FixedOffset>,
    ) -> Self {
        let signature = Signature::new(author, when);
        let mut message = message.to_string();
        if !message.ends_with('\n') {
            message.push('\n');
        }
        Self {
            tree,
            parents,
            author: signature.clone(),
            committer: signature,
            extra_headers: Vec::new(),
            message,
        }
    }

    /// [`Commit::compose`] stamped with the local time and offset.
    pub fn compose_now(
        tree: ObjectId,
        parents: Vec<ObjectId>,
        author: Identity,
        message: &str,
    ) -> Self {
        Self::compose(tree, parents, author, message, Local::now().fixed_offset())
    }

    /// The canonical commit text.
    pub fn to_text(&self) -> String {
        let mut out = format!("tree {}\n", self.tree);
        for parent in &self.parents {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!("committer {}\n", self.committer));
        for (key, value) in &self.extra_headers {
            out.push_str(key);
            out.push(' ');
            out.push_str(&value.replace('\n', "\n "));
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.message);
        out
    }

    /// Decode a commit payload.
    pub fn parse(payload: &[u8]) -> StoreResult<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| StoreError::Format("commit is not UTF-8".into()))?;
        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| StoreError::Format("commit has no message separator".into()))?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut extra_headers: Vec<(String, String)> = Vec::new();

        for line in headers.split('\n') {
            if let Some(cont) = line.strip_prefix(' ') {
                let (_, value) = extra_headers
                    .last_mut()
                    .ok_or_else(|| StoreError::Format("continuation line without header".into()))?;
                value.push('\n');
                value.push_str(cont);
                continue;
            }
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| StoreError::Format(format!("commit header {line:?} has no value")))?;
            match key {
                "tree" if tree.is_none() && parents.is_empty() => {
                    tree = Some(ObjectId::from_hex(value)?)
                }
                "parent" if tree.is_some() && author.is_none() => {
                    parents.push(ObjectId::from_hex(value)?)
                }
                "author" if tree.is_some() && author.is_none() => {
                    author = Some(Signature::parse(value)?)
                }
                "committer" if author.is_some() && committer.is_none() => {
                    committer = Some(Signature::parse(value)?)
                }
                "tree" | "parent" | "author" | "committer" => {
                    return Err(StoreError::Format(format!("unexpected {key} header")))
                }
                _ if committer.is_some() => extra_headers.push((key.to_string(), value.to_string())),
                _ => return Err(StoreError::Format(format!("unexpected {key} header"))),
            }
        }

        Ok(Self {
            tree: tree.ok_or_else(|| StoreError::Format("commit has no tree".into()))?,
            parents,
            author: author.ok_or_else(|| StoreError::Format("commit has no author".into()))?,
            committer: committer
                .ok_or_else(|| StoreError::Format("commit has no committer".into()))?,
            extra_headers,
            message: message.to_string(),
        })
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        expect_kind(obj, ObjectKind::Commit)?;
        Self::parse(&obj.data)
    }
}

impl GitObject for Commit {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Commit
    }

    fn payload(&self) -> Vec<u8> {
        self.to_text().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

    fn at(secs: i64, offset_secs: i32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_secs)
            .unwrap()
            .timestamp_opt(secs, 0)
            .unwrap()
    }

    #[test]
    fn root_commit_matches_reference_hash() {
        let commit = Commit::compose(
            ObjectId::from_hex(EMPTY_TREE).unwrap(),
            vec![],
            Identity::new("Test User", "test@example.com"),
            "initial",
            at(1_700_000_000, 0),
        );
        assert_eq!(
            commit.to_text(),
            "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
             author Test User <test@example.com> 1700000000 +0000\n\
             committer Test User <test@example.com> 1700000000 +0000\n\
             \n\
             initial\n"
        );
        assert_eq!(commit.hash_string(), "2f14753d6f3a7e196458b9d3d65c60f46ff2e728");
    }

    #[test]
    fn parent_and_negative_offset() {
        let commit = Commit::compose(
            ObjectId::from_hex("68aba62e560c0ebc3396e8ae9335232cd93a3f60").unwrap(),
            vec![ObjectId::from_hex("3b18e512dba79e4c8300dd08aeb37f8e728b8dad").unwrap()],
            Identity::new("Ada", "ada@host"),
            "second\n",
            at(1_700_000_000, -(5 * 3600 + 30 * 60)),
        );
        let text = commit.to_text();
        assert!(text.contains("\nparent 3b18e512dba79e4c8300dd08aeb37f8e728b8dad\n"));
        assert!(text.contains("author Ada <ada@host> 1700000000 -0530\n"));
        assert_eq!(commit.message, "second\n");
        assert_eq!(commit.hash_string(), "a9ed67dd878338605e3173c940aa5e43a96b7295");
    }

    #[test]
    fn parents_keep_their_order() {
        let p1 = ObjectId::from_hash([1; 20]);
        let p2 = ObjectId::from_hash([2; 20]);
        let commit = Commit::compose(
            ObjectId::from_hex(EMPTY_TREE).unwrap(),
            vec![p2, p1],
            Identity::new("a", "a@b"),
            "merge",
            at(0, 0),
        );
        let text = commit.to_text();
        let first = text.find(&p2.to_hex()).unwrap();
        let second = text.find(&p1.to_hex()).unwrap();
        assert!(first < second);
    }

    #[test]
    fn parse_roundtrip() {
        let commit = Commit::compose(
            ObjectId::from_hex(EMPTY_TREE).unwrap(),
            vec![ObjectId::from_hash([9; 20])],
            Identity::new("Test User", "test@example.com"),
            "subject\n\nbody line\n",
            at(1_234_567_890, 3600),
        );
        let parsed = Commit::parse(&commit.payload()).unwrap();
        assert_eq!(parsed, commit);
        assert_eq!(parsed.author.when.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn parse_keeps_extra_headers_verbatim() {
        let text = "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
                    author A <a@b> 1 +0000\n\
                    committer A <a@b> 1 +0000\n\
                    gpgsig -----BEGIN-----\n line two\n -----END-----\n\
                    \n\
                    signed\n";
        let commit = Commit::parse(text.as_bytes()).unwrap();
        assert_eq!(commit.extra_headers.len(), 1);
        assert_eq!(commit.extra_headers[0].1, "-----BEGIN-----\nline two\n-----END-----");
        assert_eq!(commit.to_text(), text);
    }

    #[test]
    fn parse_rejects_missing_tree() {
        let text = "author A <a@b> 1 +0000\ncommitter A <a@b> 1 +0000\n\nmsg\n";
        assert!(matches!(Commit::parse(text.as_bytes()), Err(StoreError::Format(_))));
    }

    #[test]
    fn parse_rejects_bad_offset() {
        let text = "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
                    author A <a@b> 1 0000\ncommitter A <a@b> 1 +0000\n\nmsg\n";
        assert!(Commit::parse(text.as_bytes()).is_err());
    }

    #[test]
    fn compose_now_uses_local_clock() {
        let before = Local::now().timestamp();
        let commit = Commit::compose_now(
            ObjectId::from_hex(EMPTY_TREE).unwrap(),
            vec![],
            Identity::new("Ada", "ada@host"),
            "now",
        );
        let after = Local::now().timestamp();

        let stamped = commit.author.when.timestamp();
        assert!(before <= stamped && stamped <= after);
        assert_eq!(commit.author, commit.committer);
        assert_eq!(commit.message, "now\n");
        let parsed = Commit::parse(&commit.payload()).unwrap();
        assert_eq!(parsed, commit);
    }

    #[test]
    fn identity_placeholders() {
        let id = Identity::from_vars(None, None);
        assert_eq!(id.to_string(), "Anonymous Coward <Anonymous Coward@localhost>");
        let id = Identity::from_vars(Some(""), Some(""));
        assert_eq!(id.name, PLACEHOLDER_NAME);
    }

    #[test]
    fn identity_from_vars() {
        let id = Identity::from_vars(Some("kyle"), Some("build01"));
        assert_eq!(id.to_string(), "kyle <kyle@build01>");
    }
}
