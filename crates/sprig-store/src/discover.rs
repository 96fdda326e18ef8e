use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Name of the repository metadata directory.
pub const DEFAULT_MARKER: &str = ".git";

/// Walk upward from `start` to the first directory containing a `marker`
/// subdirectory, and return that directory (the work tree root).
///
/// This is a pure path walk: the process working directory is never read or
/// changed, so there is nothing to restore on any exit path. A relative
/// `start` is resolved against the current directory first.
pub fn find_root(start: &Path, marker: &str) -> StoreResult<PathBuf> {
    let start = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()?.join(start)
    };

    for dir in start.ancestors() {
        if dir.join(marker).is_dir() {
            debug!(root = %dir.display(), "found repository root");
            return Ok(dir.to_path_buf());
        }
    }
    Err(StoreError::RepositoryNotFound { start })
}

/// [`find_root`] starting from the current directory.
pub fn find_root_from_cwd(marker: &str) -> StoreResult<PathBuf> {
    find_root(&std::env::current_dir()?, marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_marker_in_start_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        assert_eq!(find_root(dir.path(), ".git").unwrap(), dir.path());
    }

    #[test]
    fn walks_up_from_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_root(&nested, ".git").unwrap(), dir.path());
    }

    #[test]
    fn marker_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".sprig-test-marker"), b"not a dir").unwrap();
        let err = find_root(dir.path(), ".sprig-test-marker").unwrap_err();
        assert!(matches!(err, StoreError::RepositoryNotFound { .. }));
    }

    #[test]
    fn not_found_leaves_cwd_alone() {
        let before = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = find_root(dir.path(), ".no-such-marker-dir").unwrap_err();
        assert!(matches!(err, StoreError::RepositoryNotFound { start } if start == dir.path()));
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn from_cwd_starts_at_current_directory() {
        // Tests run from the package directory, which holds `src/`.
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(find_root_from_cwd("src").unwrap(), cwd);
        assert!(matches!(
            find_root_from_cwd(".no-such-marker-dir"),
            Err(StoreError::RepositoryNotFound { .. })
        ));
    }
}
