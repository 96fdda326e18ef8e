//! Ref name validation following git-style conventions.
//!
//! Valid names:
//! - Must be non-empty
//! - Must not contain whitespace, control characters, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not start or end with `/`, or end with `.`
//! - Must not end with `.lock`
//! - Components between slashes must be non-empty and not start with `.`

use crate::error::{RefError, RefResult};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a full ref name such as `refs/heads/master`.
///
/// The name must live under `refs/`, which also keeps it from escaping the
/// metadata directory once joined onto it.
pub fn validate_ref_name(name: &str) -> RefResult<()> {
    if !name.starts_with("refs/") {
        return Err(invalid(name, "must start with 'refs/'"));
    }
    validate_components(name)
}

/// Validate a short branch name such as `master` or `feature/auth`.
pub fn validate_branch_name(name: &str) -> RefResult<()> {
    validate_components(name)
}

/// `refs/heads/<branch>`.
pub fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{branch}")
}

fn validate_components(name: &str) -> RefResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "must not be empty"));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    if name.ends_with('.') {
        return Err(invalid(name, "must not end with '.'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(name, format!("component must not start with '.': {component:?}")));
        }
    }
    Ok(())
}
