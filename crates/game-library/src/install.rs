use reqwest::Client;
use tracing::{debug, info};

use crate::download::{download_all, download_if_needed, DownloadJob};
use crate::error::InstallError;
use crate::libraries::{extract_natives, plan_libraries};
use crate::manifest::{AssetIndexData, Download, VersionData, RESOURCES_URL};
use crate::paths::{ensure_dir, file_exists, GameDirs};
use crate::versions::VersionResolver;

/// Brings a version to a launchable state. Files that are already present and
/// intact are left alone, so repeating this for an installed version is cheap.
pub async fn install_version(
    client: &Client,
    dirs: &GameDirs,
    version_id: &str,
) -> Result<VersionData, InstallError> {
    let mut resolver = VersionResolver::new(client, dirs);
    let version = resolver.resolve(version_id).await?;

    sync_client_jar(client, dirs, &version).await?;
    sync_libraries(client, dirs, &version).await?;
    sync_assets(client, dirs, &version).await?;

    info!("version {} is ready", version.id);
    Ok(version)
}

async fn sync_client_jar(
    client: &Client,
    dirs: &GameDirs,
    version: &VersionData,
) -> Result<(), InstallError> {
    let jar_id = version.jar.as_deref().unwrap_or(&version.id);
    let path = dirs.client_jar(jar_id);
    match &version.downloads {
        Some(downloads) => {
            debug!("syncing client jar for {jar_id}");
            download_if_needed(client, &downloads.client, &path).await?;
        }
        None if file_exists(&path) => {}
        None => {
            return Err(format!("Version {} has no client download", version.id).into());
        }
    }
    Ok(())
}

async fn sync_libraries(
    client: &Client,
    dirs: &GameDirs,
    version: &VersionData,
) -> Result<(), InstallError> {
    let plan = plan_libraries(&dirs.libraries(), &version.libraries);
    debug!(
        "syncing {} libraries ({} natives) for {}",
        plan.classpath.len(),
        plan.natives.len(),
        version.id
    );
    download_all(client, plan.jobs, "libraries").await?;

    if plan.natives.is_empty() {
        return Ok(());
    }
    let natives_dir = dirs.natives(&version.id);
    ensure_dir(&natives_dir)?;
    for native in &plan.natives {
        extract_natives(native, &natives_dir, &version.libraries)?;
    }
    Ok(())
}

async fn sync_assets(
    client: &Client,
    dirs: &GameDirs,
    version: &VersionData,
) -> Result<(), InstallError> {
    let Some(asset_index) = &version.asset_index else {
        return Ok(());
    };

    let index_path = dirs
        .assets()
        .join("indexes")
        .join(format!("{}.json", asset_index.id));
    download_if_needed(
        client,
        &Download {
            path: None,
            url: asset_index.url.clone(),
            sha1: asset_index.sha1.clone(),
            size: asset_index.size,
        },
        &index_path,
    )
    .await?;

    let raw = std::fs::read_to_string(&index_path)?;
    let index: AssetIndexData = serde_json::from_str(&raw)?;
    let jobs = asset_jobs(dirs, &index);
    debug!("syncing {} assets for index {}", jobs.len(), asset_index.id);
    download_all(client, jobs, "assets").await?;
    Ok(())
}

fn asset_jobs(dirs: &GameDirs, index: &AssetIndexData) -> Vec<DownloadJob> {
    let objects_dir = dirs.assets().join("objects");
    index
        .objects
        .values()
        .filter(|object| object.hash.len() > 2)
        .map(|object| {
            let prefix = &object.hash[0..2];
            DownloadJob::new(
                Download {
                    path: None,
                    url: format!("{RESOURCES_URL}/{prefix}/{}", object.hash),
                    sha1: Some(object.hash.clone()),
                    size: Some(object.size),
                },
                objects_dir.join(prefix).join(&object.hash),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::shared_client;
    use crate::libraries::current_os_key;
    use crate::manifest::{AssetIndex, AssetObject, Extract, Library, LibraryDownloads, VersionDownloads};
    use crate::test_support::{unique_temp_dir, version_data, write_version};
    use sha1::{Digest, Sha1};
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use zip::write::SimpleFileOptions;

    /// Nothing listens on the discard port, so any request fails fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    /// Writes `bytes` to `path` and returns a download entry that matches it.
    fn place(path: &Path, bytes: &[u8]) -> Download {
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
        std::fs::write(path, bytes).expect("write file");
        Download {
            path: None,
            url: format!("{UNREACHABLE}/{}", path.display()),
            sha1: Some(hex::encode(Sha1::digest(bytes))),
            size: Some(bytes.len() as u64),
        }
    }

    fn natives_jar() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, body) in [
            ("META-INF/MANIFEST.MF", "manifest"),
            ("liblwjgl.so", "native"),
            ("skip/readme.txt", "excluded"),
        ] {
            writer.start_file(name, options).expect("start file");
            writer.write_all(body.as_bytes()).expect("write entry");
        }
        writer.finish().expect("finish jar").into_inner()
    }

    /// A version whose jar, libraries, natives and assets are all on disk.
    fn installed_fixture(dirs: &GameDirs) -> VersionData {
        let mut version = version_data("1.12.2");
        version.downloads = Some(VersionDownloads {
            client: place(&dirs.client_jar("1.12.2"), b"client jar"),
        });

        let artifact_rel = "com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar";
        let mut artifact = place(&dirs.libraries().join(artifact_rel), b"brigadier");
        artifact.path = Some(artifact_rel.to_string());

        let native_rel = "org/lwjgl/lwjgl/lwjgl-platform/2.9.4/lwjgl-platform-2.9.4-natives-test.jar";
        let mut native = place(&dirs.libraries().join(native_rel), &natives_jar());
        native.path = Some(native_rel.to_string());

        version.libraries = vec![
            Library {
                name: "com.mojang:brigadier:1.0.18".to_string(),
                downloads: Some(LibraryDownloads {
                    artifact: Some(artifact),
                    classifiers: None,
                }),
                url: None,
                natives: None,
                rules: None,
                extract: None,
                sha1: None,
                size: None,
            },
            Library {
                name: "org.lwjgl.lwjgl:lwjgl-platform:2.9.4".to_string(),
                downloads: Some(LibraryDownloads {
                    artifact: None,
                    classifiers: Some(HashMap::from([("natives-test".to_string(), native)])),
                }),
                url: None,
                natives: Some(HashMap::from([(
                    current_os_key().to_string(),
                    "natives-test".to_string(),
                )])),
                rules: None,
                extract: Some(Extract {
                    exclude: vec!["skip/".to_string()],
                }),
                sha1: None,
                size: None,
            },
        ];

        let object = b"png bytes";
        let object_hash = hex::encode(Sha1::digest(object));
        place(
            &dirs
                .assets()
                .join("objects")
                .join(&object_hash[0..2])
                .join(&object_hash),
            object,
        );
        let index = serde_json::json!({
            "objects": { "icons/icon_16x16.png": { "hash": object_hash, "size": object.len() } }
        })
        .to_string();
        let index_download = place(
            &dirs.assets().join("indexes").join("1.12.json"),
            index.as_bytes(),
        );
        version.asset_index = Some(AssetIndex {
            id: "1.12".to_string(),
            url: index_download.url,
            sha1: index_download.sha1,
            size: index_download.size,
        });

        write_version(dirs, &version);
        version
    }

    #[tokio::test]
    async fn reinstalling_complete_version_needs_no_network() {
        let dirs = GameDirs::new(unique_temp_dir("melon-reinstall"));
        installed_fixture(&dirs);

        let version = install_version(shared_client(), &dirs, "1.12.2")
            .await
            .expect("install");
        assert_eq!(version.id, "1.12.2");

        let natives = dirs.natives("1.12.2");
        assert_eq!(
            std::fs::read_to_string(natives.join("liblwjgl.so")).expect("native"),
            "native"
        );
        assert!(!natives.join("META-INF").exists());
        assert!(!natives.join("skip").exists());
        let _ = std::fs::remove_dir_all(&dirs.root);
    }

    #[tokio::test]
    async fn damaged_library_is_fetched_again() {
        let dirs = GameDirs::new(unique_temp_dir("melon-damaged"));
        installed_fixture(&dirs);
        let jar = dirs
            .libraries()
            .join("com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar");
        std::fs::write(&jar, b"brigadiex").expect("corrupt jar");

        let err = install_version(shared_client(), &dirs, "1.12.2")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Download failed"), "{err}");
        let _ = std::fs::remove_dir_all(&dirs.root);
    }

    #[test]
    fn assets_are_stored_by_hash_prefix() {
        let dirs = GameDirs::new("/games/mc");
        let index = AssetIndexData {
            objects: HashMap::from([(
                "minecraft/sounds/ambient/cave/cave1.ogg".to_string(),
                AssetObject {
                    hash: "b7dc5d2e2b8b5c5e0f4bdbd0e6a1c8c4e5b1cf3a".to_string(),
                    size: 12345,
                },
            )]),
        };

        let jobs = asset_jobs(&dirs, &index);
        assert_eq!(jobs.len(), 1);
        assert_eq!(
            jobs[0].download.url,
            "https://resources.download.minecraft.net/b7/b7dc5d2e2b8b5c5e0f4bdbd0e6a1c8c4e5b1cf3a"
        );
        assert_eq!(
            jobs[0].path,
            PathBuf::from("/games/mc/assets/objects/b7/b7dc5d2e2b8b5c5e0f4bdbd0e6a1c8c4e5b1cf3a")
        );
        assert_eq!(jobs[0].download.size, Some(12345));
    }
}
