use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::manifest::VersionData;
use crate::paths::GameDirs;

pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}-{nanos}"))
}

pub fn version_data(id: &str) -> VersionData {
    VersionData {
        id: id.to_string(),
        kind: "release".to_string(),
        main_class: String::new(),
        arguments: None,
        minecraft_arguments: None,
        asset_index: None,
        downloads: None,
        libraries: Vec::new(),
        java_version: None,
        inherits_from: None,
        jar: None,
    }
}

pub fn write_version(dirs: &GameDirs, version: &VersionData) {
    std::fs::create_dir_all(dirs.version_dir(&version.id)).expect("create version dir");
    let body = serde_json::to_vec_pretty(version).expect("serialize version");
    std::fs::write(dirs.version_json(&version.id), body).expect("write version json");
}
