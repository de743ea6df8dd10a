use std::path::{Path, PathBuf};

/// Where the official launcher keeps its game files on this OS.
pub fn minecraft_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(".minecraft");
        }
    }

    if cfg!(target_os = "macos") {
        if let Some(home) = dirs::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("minecraft");
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".minecraft");
    }

    PathBuf::from(".minecraft")
}

/// Fixed layout below a game directory.
#[derive(Debug, Clone)]
pub struct GameDirs {
    pub root: PathBuf,
}

impl GameDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn versions(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_dir(&self, version_id: &str) -> PathBuf {
        self.versions().join(version_id)
    }

    pub fn version_json(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{version_id}.json"))
    }

    pub fn client_jar(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{version_id}.jar"))
    }

    pub fn natives(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id).join("natives")
    }

    pub fn libraries(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn assets(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn runtime(&self) -> PathBuf {
        self.root.join("runtime")
    }
}

pub fn ensure_dir(path: &Path) -> Result<(), String> {
    std::fs::create_dir_all(path)
        .map_err(|err| format!("Failed to create dir {}: {err}", path.display()))
}

pub fn file_exists(path: &Path) -> bool {
    std::fs::metadata(path).is_ok()
}
