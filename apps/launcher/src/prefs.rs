use std::fs;
use std::path::Path;

use melon_core::{LaunchRequest, LoginMode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::paths::ensure_dir;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<String> for PrefsError {
    fn from(value: String) -> Self {
        PrefsError::Message(value)
    }
}

/// Choices remembered between runs. Keys this launcher does not know about are
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Preferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Preferences {
    /// Stored login type, ignoring values this build does not recognise.
    pub fn login_mode(&self) -> Option<LoginMode> {
        let raw = self.login_type.as_deref()?;
        match raw.parse() {
            Ok(mode) => Some(mode),
            Err(err) => {
                warn!("ignoring stored login_type: {err}");
                None
            }
        }
    }

    pub fn record_launch(&mut self, request: &LaunchRequest) {
        if request.login_mode == LoginMode::Offline {
            if let Some(username) = &request.username {
                self.offline_username = Some(username.clone());
            }
        }
        self.login_type = Some(request.login_mode.as_str().to_string());
        self.ram = Some(request.memory_gb);
    }
}

/// Missing files give defaults. Unreadable or malformed files are logged and
/// also give defaults, so startup never fails on preferences.
pub fn load(path: &Path) -> Preferences {
    match try_load(path) {
        Ok(Some(prefs)) => {
            info!("Configuration loaded from {}", path.display());
            prefs
        }
        Ok(None) => {
            info!("No configuration file; starting with defaults.");
            Preferences::default()
        }
        Err(err) => {
            error!("Failed to load config {}: {err}", path.display());
            Preferences::default()
        }
    }
}

fn try_load(path: &Path) -> Result<Option<Preferences>, PrefsError> {
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(map) => Ok(Some(Preferences::from_map(map))),
        other => Err(format!("expected a JSON object, found {}", json_kind(&other)).into()),
    }
}

impl Preferences {
    /// Known keys are read one by one so a single bad value only loses that
    /// value. Everything else is kept for the next save.
    fn from_map(mut extra: Map<String, Value>) -> Self {
        Self {
            offline_username: take_key(&mut extra, "offline_username"),
            login_type: take_key(&mut extra, "login_type"),
            ram: take_key(&mut extra, "ram"),
            extra,
        }
    }
}

fn take_key<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = map.remove(key)?;
    match serde_json::from_value::<Option<T>>(value) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("ignoring config value for {key}: {err}");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn save(path: &Path, prefs: &Preferences) -> Result<(), PrefsError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let payload = serde_json::to_vec_pretty(prefs)?;
    fs::write(path, payload)?;
    info!("Configuration saved to {}", path.display());
    Ok(())
}

/// Saves and logs failures instead of returning them.
pub fn save_or_log(path: &Path, prefs: &Preferences) {
    if let Err(err) = save(path, prefs) {
        error!("Failed to save config {}: {err}", path.display());
    }
}
