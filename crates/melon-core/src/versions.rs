use serde::{Deserialize, Serialize};

use crate::request::Edition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledVersion {
    pub id: String,
    #[serde(default)]
    pub kind: String,
}

impl InstalledVersion {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}

/// Outcome of mapping a requested edition onto a concrete version id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSelection {
    pub version_id: String,
    pub requested: Edition,
    pub resolved: Edition,
    /// Set when a modloader was requested but nothing matching was installed.
    pub fallback: bool,
}

impl VersionSelection {
    pub fn exact(version_id: impl Into<String>, edition: Edition) -> Self {
        Self {
            version_id: version_id.into(),
            requested: edition,
            resolved: edition,
            fallback: false,
        }
    }

    pub fn latest_release(version_id: impl Into<String>, requested: Edition) -> Self {
        Self {
            version_id: version_id.into(),
            requested,
            resolved: Edition::Vanilla,
            fallback: requested != Edition::Vanilla,
        }
    }
}

/// First installed version whose id mentions `loader`, ignoring ASCII case.
pub fn find_loader_version<'a>(
    loader: &str,
    installed: &'a [InstalledVersion],
) -> Option<&'a InstalledVersion> {
    let needle = loader.to_ascii_lowercase();
    installed
        .iter()
        .find(|version| version.id.to_ascii_lowercase().contains(&needle))
}
