use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    #[default]
    Offline,
    Microsoft,
}

impl LoginMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMode::Offline => "offline",
            LoginMode::Microsoft => "microsoft",
        }
    }
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "offline" => Ok(LoginMode::Offline),
            "microsoft" | "msa" => Ok(LoginMode::Microsoft),
            other => Err(format!(
                "unknown login mode `{other}` (expected offline or microsoft)"
            )),
        }
    }
}

/// Which game variant to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    #[default]
    Vanilla,
    Forge,
    Fabric,
}

impl Edition {
    pub const ALL: [Edition; 3] = [Edition::Vanilla, Edition::Forge, Edition::Fabric];

    /// Substring that identifies an installed version built for this loader.
    pub fn loader_name(&self) -> Option<&'static str> {
        match self {
            Edition::Vanilla => None,
            Edition::Forge => Some("forge"),
            Edition::Fabric => Some("fabric"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Edition::Vanilla => "Vanilla",
            Edition::Forge => "Forge",
            Edition::Fabric => "Fabric",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vanilla" => Ok(Edition::Vanilla),
            "forge" => Ok(Edition::Forge),
            "fabric" => Ok(Edition::Fabric),
            other => Err(format!(
                "unknown edition `{other}` (expected vanilla, forge or fabric)"
            )),
        }
    }
}

/// Identity returned by a completed account sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub name: String,
    pub id: String,
    pub access_token: String,
}

/// Snapshot of the launch form taken when the user asks to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub login_mode: LoginMode,
    pub username: Option<String>,
    pub edition: Edition,
    pub memory_gb: u32,
    pub account: Option<AccountProfile>,
}

impl LaunchRequest {
    pub fn offline(username: impl Into<String>, edition: Edition, memory_gb: u32) -> Self {
        Self {
            login_mode: LoginMode::Offline,
            username: Some(username.into()),
            edition,
            memory_gb,
            account: None,
        }
    }

    pub fn microsoft(account: Option<AccountProfile>, edition: Edition, memory_gb: u32) -> Self {
        Self {
            login_mode: LoginMode::Microsoft,
            username: None,
            edition,
            memory_gb,
            account,
        }
    }
}
