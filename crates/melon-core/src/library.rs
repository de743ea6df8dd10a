use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::session::LaunchOptions;
use crate::versions::InstalledVersion;

/// Failure reported by a game library or process launcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct LibraryError(pub String);

impl From<String> for LibraryError {
    fn from(value: String) -> Self {
        LibraryError(value)
    }
}

impl From<&str> for LibraryError {
    fn from(value: &str) -> Self {
        LibraryError(value.to_string())
    }
}

/// A ready-to-spawn game process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl LaunchCommand {
    /// Program plus the first few arguments, for log lines. Keeps tokens out of logs.
    pub fn preview(&self, max_args: usize) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().take(max_args).cloned());
        if self.args.len() > max_args {
            parts.push("...".to_string());
        }
        parts.join(" ")
    }
}

/// Installs game versions and turns them into launch commands.
#[async_trait]
pub trait GameLibrary: Send + Sync {
    fn game_dir(&self) -> &Path;

    async fn installed_versions(&self) -> Result<Vec<InstalledVersion>, LibraryError>;

    async fn latest_release(&self) -> Result<String, LibraryError>;

    /// Must be a no-op for versions that are already complete on disk.
    async fn install(&self, version_id: &str) -> Result<(), LibraryError>;

    async fn launch_command(
        &self,
        version_id: &str,
        options: &LaunchOptions,
    ) -> Result<LaunchCommand, LibraryError>;
}

pub trait ProcessLauncher: Send + Sync {
    /// Starts the process without waiting on it. Returns the child pid.
    fn spawn(&self, command: &LaunchCommand) -> Result<u32, LibraryError>;
}
