use std::path::{Path, PathBuf};

use game_library::minecraft_dir;

pub const HOME_ENV: &str = "MELON_HOME";
pub const GAME_DIR_ENV: &str = "MELON_GAME_DIR";

pub const PREFS_FILE: &str = "melonclient_config.json";
pub const AUTH_FILE: &str = "auth.json";
pub const LOG_FILE: &str = "melon_client.log";

pub fn melon_home() -> Result<PathBuf, String> {
    resolve_home(std::env::var(HOME_ENV).ok())
}

fn resolve_home(home_override: Option<String>) -> Result<PathBuf, String> {
    if let Some(value) = normalize_optional(home_override) {
        return Ok(PathBuf::from(value));
    }
    if let Some(base) = dirs::data_dir() {
        return Ok(base.join("melon"));
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".melon"));
    }
    Err("Unable to resolve a writable data directory".to_string())
}

pub fn prefs_path() -> Result<PathBuf, String> {
    Ok(melon_home()?.join(PREFS_FILE))
}

pub fn auth_store_path() -> Result<PathBuf, String> {
    Ok(melon_home()?.join(AUTH_FILE))
}

pub fn log_path() -> Result<PathBuf, String> {
    Ok(melon_home()?.join(LOG_FILE))
}

/// `--game-dir`, then `MELON_GAME_DIR`, then the official launcher's folder.
pub fn resolve_game_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.filter(|path| !path.as_os_str().is_empty())
        .or_else(|| normalize_optional(std::env::var(GAME_DIR_ENV).ok()).map(PathBuf::from))
        .unwrap_or_else(minecraft_dir)
}

pub fn ensure_dir(path: &Path) -> Result<(), String> {
    std::fs::create_dir_all(path)
        .map_err(|err| format!("Failed to create dir {}: {err}", path.display()))
}

pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
