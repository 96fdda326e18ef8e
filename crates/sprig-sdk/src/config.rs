use serde::{Deserialize, Serialize};
use sprig_store::DEFAULT_MARKER;

/// Repository layout settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Name of the metadata directory at the work tree root.
    pub marker_dir: String,
    /// Branch HEAD points at after `init`.
    pub default_branch: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            marker_dir: DEFAULT_MARKER.into(),
            default_branch: "master".into(),
        }
    }
}
