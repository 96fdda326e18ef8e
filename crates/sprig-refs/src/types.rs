use serde::{Deserialize, Serialize};
use sprig_types::ObjectId;

/// The state of HEAD: either symbolic (naming a ref) or detached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Head {
    /// HEAD names a ref, e.g. `refs/heads/master`.
    Symbolic(String),
    /// HEAD points directly at an object.
    Detached(ObjectId),
}

impl Head {
    /// The file contents for this HEAD state.
    pub fn to_file_contents(&self) -> String {
        match self {
            Self::Symbolic(target) => format!("ref: {target}\n"),
            Self::Detached(id) => format!("{id}\n"),
        }
    }

    /// Branch name when HEAD is symbolic and points under `refs/heads/`.
    pub fn branch(&self) -> Option<&str> {
        match self {
            Self::Symbolic(target) => target.strip_prefix("refs/heads/"),
            Self::Detached(_) => None,
        }
    }
}
