use std::collections::HashSet;

use melon_core::InstalledVersion;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::InstallError;
use crate::http::fetch_json;
use crate::manifest::{Arguments, VersionData, VersionManifest, VERSION_MANIFEST_URL};
use crate::paths::{ensure_dir, GameDirs};

/// Every `versions/<id>/<id>.json` that parses and names its own folder,
/// sorted by id.
pub fn list_installed(dirs: &GameDirs) -> Result<Vec<InstalledVersion>, InstallError> {
    let root = dirs.versions();
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut installed = Vec::new();
    for entry in std::fs::read_dir(&root)?.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        let Some(id) = entry.file_name().to_str().map(ToString::to_string) else {
            continue;
        };
        match read_local(dirs, &id) {
            // Launching looks the json up by id, so the folder has to match it.
            Ok(Some(data)) if data.id != id => {
                warn!("skipping version folder {id}: its json declares id {}", data.id)
            }
            Ok(Some(data)) => installed.push(InstalledVersion::new(data.id, data.kind)),
            Ok(None) => {}
            Err(err) => warn!("skipping unreadable version {id}: {err}"),
        }
    }

    installed.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(installed)
}

pub fn read_local(dirs: &GameDirs, version_id: &str) -> Result<Option<VersionData>, InstallError> {
    let path = dirs.version_json(version_id);
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)?;
    let data = serde_json::from_str::<VersionData>(&raw).map_err(|err| {
        InstallError::Message(format!("Invalid version file {}: {err}", path.display()))
    })?;
    Ok(Some(data))
}

/// Loads version metadata from disk, falling back to Mojang's manifest. The
/// manifest is fetched at most once per resolver.
pub struct VersionResolver<'a> {
    client: &'a Client,
    dirs: &'a GameDirs,
    manifest: Option<VersionManifest>,
}

impl<'a> VersionResolver<'a> {
    pub fn new(client: &'a Client, dirs: &'a GameDirs) -> Self {
        Self {
            client,
            dirs,
            manifest: None,
        }
    }

    pub async fn manifest(&mut self) -> Result<&VersionManifest, InstallError> {
        if self.manifest.is_none() {
            debug!("fetching version manifest");
            let manifest: VersionManifest = fetch_json(self.client, VERSION_MANIFEST_URL).await?;
            self.manifest = Some(manifest);
        }
        self.manifest
            .as_ref()
            .ok_or_else(|| InstallError::Message("Version manifest unavailable".to_string()))
    }

    /// Local json when present, otherwise downloaded and written next to where
    /// the jar will go.
    pub async fn load(&mut self, version_id: &str) -> Result<VersionData, InstallError> {
        if let Some(data) = read_local(self.dirs, version_id)? {
            return Ok(data);
        }

        let url = self
            .manifest()
            .await?
            .find(version_id)
            .map(|version| version.url.clone())
            .ok_or_else(|| format!("Version {version_id} not found in manifest"))?;

        debug!("downloading version metadata for {version_id}");
        let data: VersionData = fetch_json(self.client, &url).await?;
        ensure_dir(&self.dirs.version_dir(version_id))?;
        std::fs::write(
            self.dirs.version_json(version_id),
            serde_json::to_vec_pretty(&data)?,
        )?;
        Ok(data)
    }

    /// The version with every `inheritsFrom` ancestor merged in.
    pub async fn resolve(&mut self, version_id: &str) -> Result<VersionData, InstallError> {
        let mut visited = HashSet::from([version_id.to_string()]);
        let mut chain = vec![self.load(version_id).await?];

        while let Some(parent_id) = chain.last().and_then(|data| data.inherits_from.clone()) {
            if !visited.insert(parent_id.clone()) {
                return Err(format!("Version inheritance loop detected at {parent_id}").into());
            }
            chain.push(self.load(&parent_id).await?);
        }

        merge_chain(chain)
    }
}

/// Same as [`VersionResolver::resolve`] but never touches the network; every
/// ancestor has to be installed already.
pub fn resolve_local(dirs: &GameDirs, version_id: &str) -> Result<VersionData, InstallError> {
    let mut visited = HashSet::new();
    let mut chain = Vec::new();
    let mut next = Some(version_id.to_string());

    while let Some(id) = next {
        if !visited.insert(id.clone()) {
            return Err(format!("Version inheritance loop detected at {id}").into());
        }
        let data = read_local(dirs, &id)?
            .ok_or_else(|| format!("Version {id} is not installed"))?;
        next = data.inherits_from.clone();
        chain.push(data);
    }

    merge_chain(chain)
}

/// `chain` runs child first, root ancestor last.
fn merge_chain(mut chain: Vec<VersionData>) -> Result<VersionData, InstallError> {
    let mut merged = chain
        .pop()
        .ok_or_else(|| InstallError::Message("Failed to resolve version data.".to_string()))?;
    let root_id = merged.id.clone();
    while let Some(overlay) = chain.pop() {
        merged = merge_versions(merged, overlay);
    }
    if merged.jar.is_none() && merged.id != root_id {
        merged.jar = Some(root_id);
    }
    Ok(merged)
}

fn merge_versions(base: VersionData, overlay: VersionData) -> VersionData {
    // Child libraries go first so loader-provided artifacts win on the classpath.
    let mut libraries = overlay.libraries;
    libraries.extend(base.libraries);

    VersionData {
        id: overlay.id,
        kind: if overlay.kind.trim().is_empty() {
            base.kind
        } else {
            overlay.kind
        },
        main_class: if overlay.main_class.trim().is_empty() {
            base.main_class
        } else {
            overlay.main_class
        },
        arguments: merge_arguments(base.arguments, overlay.arguments),
        minecraft_arguments: overlay.minecraft_arguments.or(base.minecraft_arguments),
        asset_index: overlay.asset_index.or(base.asset_index),
        downloads: overlay.downloads.or(base.downloads),
        libraries,
        java_version: overlay.java_version.or(base.java_version),
        inherits_from: None,
        jar: overlay.jar.or(base.jar),
    }
}

fn merge_arguments(base: Option<Arguments>, overlay: Option<Arguments>) -> Option<Arguments> {
    match (base, overlay) {
        (Some(mut base), Some(mut overlay)) => {
            base.game.append(&mut overlay.game);
            base.jvm.append(&mut overlay.jvm);
            Some(base)
        }
        (base, None) => base,
        (None, overlay) => overlay,
    }
}
