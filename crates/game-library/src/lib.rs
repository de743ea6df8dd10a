//! Mojang-compatible game directory handling: version metadata, downloads,
//! natives and the java command line for a version.

pub mod args;
pub mod command;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod java;
pub mod libraries;
pub mod manifest;
pub mod paths;
pub mod process;
pub mod versions;

#[cfg(test)]
mod test_support;

use async_trait::async_trait;
use melon_core::{GameLibrary, InstalledVersion, LaunchCommand, LaunchOptions, LibraryError};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use crate::error::InstallError;
pub use crate::paths::{minecraft_dir, GameDirs};
pub use crate::process::DetachedLauncher;

use crate::http::shared_client;
use crate::versions::VersionResolver;

/// A game directory laid out the way the official launcher does it.
#[derive(Debug, Clone)]
pub struct MojangLibrary {
    dirs: GameDirs,
    client: Client,
    java_override: Option<String>,
}

impl MojangLibrary {
    pub fn new(game_dir: impl Into<PathBuf>) -> Self {
        Self {
            dirs: GameDirs::new(game_dir),
            client: shared_client().clone(),
            java_override: None,
        }
    }

    pub fn with_java(mut self, java: Option<String>) -> Self {
        self.java_override = java.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn dirs(&self) -> &GameDirs {
        &self.dirs
    }
}

#[async_trait]
impl GameLibrary for MojangLibrary {
    fn game_dir(&self) -> &Path {
        &self.dirs.root
    }

    async fn installed_versions(&self) -> Result<Vec<InstalledVersion>, LibraryError> {
        Ok(versions::list_installed(&self.dirs)?)
    }

    async fn latest_release(&self) -> Result<String, LibraryError> {
        let mut resolver = VersionResolver::new(&self.client, &self.dirs);
        let manifest = resolver.manifest().await?;
        Ok(manifest.latest.release.clone())
    }

    async fn install(&self, version_id: &str) -> Result<(), LibraryError> {
        install::install_version(&self.client, &self.dirs, version_id).await?;
        Ok(())
    }

    async fn launch_command(
        &self,
        version_id: &str,
        options: &LaunchOptions,
    ) -> Result<LaunchCommand, LibraryError> {
        let version = versions::resolve_local(&self.dirs, version_id)?;
        let java = java::resolve_java_binary(
            &self.dirs.runtime(),
            &version,
            self.java_override.as_deref(),
        )?;
        debug!("launching {} with {java}", version.id);
        Ok(command::build_launch_command(&self.dirs, &version, &java, options)?)
    }
}
