use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::args::rules_allow;
use crate::download::DownloadJob;
use crate::manifest::{Download, Library};
use crate::paths::ensure_dir;

/// Where each allowed library lives on disk and what has to be fetched for it.
#[derive(Debug, Default)]
pub struct LibraryPlan {
    pub classpath: Vec<PathBuf>,
    pub natives: Vec<PathBuf>,
    pub jobs: Vec<DownloadJob>,
}

pub fn plan_libraries(libraries_dir: &Path, libraries: &[Library]) -> LibraryPlan {
    let mut plan = LibraryPlan::default();
    let os_key = current_os_key();
    let arch = current_arch();

    for library in libraries.iter().filter(|lib| rules_allow(lib.rules.as_deref())) {
        let classifier = library
            .natives
            .as_ref()
            .and_then(|natives| natives.get(os_key))
            .map(|classifier| classifier.replace("${arch}", arch));

        if let Some(downloads) = &library.downloads {
            if let Some(artifact) = &downloads.artifact {
                let rel = artifact
                    .path
                    .clone()
                    .unwrap_or_else(|| library_path_from_name(&library.name));
                let path = libraries_dir.join(rel);
                plan.classpath.push(path.clone());
                plan.jobs.push(DownloadJob::new(artifact.clone(), path));
            }

            let native = classifier.as_ref().and_then(|classifier| {
                downloads
                    .classifiers
                    .as_ref()
                    .and_then(|classifiers| classifiers.get(classifier))
                    .map(|download| (classifier, download))
            });
            if let Some((classifier, native)) = native {
                let rel = native.path.clone().unwrap_or_else(|| {
                    library_path_from_parts(&library.name, Some(classifier.as_str()))
                });
                let path = libraries_dir.join(rel);
                plan.natives.push(path.clone());
                plan.jobs.push(DownloadJob::new(native.clone(), path));
            }
            continue;
        }

        // Loader profiles list maven coordinates plus a repository base url.
        let rel = library_path_from_name(&library.name);
        let path = libraries_dir.join(&rel);
        plan.classpath.push(path.clone());
        if let Some(base) = library.url.as_deref().map(maven_base) {
            plan.jobs.push(DownloadJob::new(
                Download {
                    path: Some(rel.clone()),
                    url: format!("{base}{rel}"),
                    sha1: library.sha1.clone(),
                    size: library.size,
                },
                path,
            ));

            if let Some(classifier) = &classifier {
                let native_rel = library_path_from_parts(&library.name, Some(classifier.as_str()));
                let native_path = libraries_dir.join(&native_rel);
                plan.natives.push(native_path.clone());
                plan.jobs.push(DownloadJob::new(
                    Download {
                        path: Some(native_rel.clone()),
                        url: format!("{base}{native_rel}"),
                        sha1: None,
                        size: None,
                    },
                    native_path,
                ));
            }
        }
    }

    plan
}

fn maven_base(url: &str) -> String {
    let mut base = url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

pub fn extract_natives(
    path: &Path,
    natives_dir: &Path,
    libraries: &[Library],
) -> Result<(), String> {
    let file = File::open(path)
        .map_err(|err| format!("Failed to open native jar {}: {err}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| format!("Failed to read native jar: {err}"))?;

    let excluded: Vec<&String> = libraries
        .iter()
        .filter_map(|lib| lib.extract.as_ref())
        .flat_map(|extract| extract.exclude.iter())
        .collect();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| format!("Zip error: {err}"))?;
        if entry.is_dir() {
            continue;
        }
        let Some(name) = entry.enclosed_name() else {
            continue;
        };
        let display = name.to_string_lossy().replace('\\', "/");
        if display.starts_with("META-INF/")
            || excluded.iter().any(|pattern| display.starts_with(pattern.as_str()))
        {
            continue;
        }

        let out_path = natives_dir.join(&name);
        if let Some(parent) = out_path.parent() {
            ensure_dir(parent)?;
        }
        let mut outfile =
            File::create(&out_path).map_err(|err| format!("Failed to write native: {err}"))?;
        std::io::copy(&mut entry, &mut outfile)
            .map_err(|err| format!("Failed to extract native: {err}"))?;
    }

    Ok(())
}

/// Joins library jars and the client jar, dropping repeated entries. Merged
/// loader profiles frequently list the same artifact twice.
pub fn build_classpath(libraries: &[PathBuf], client_jar: &Path) -> String {
    let sep = if cfg!(target_os = "windows") { ";" } else { ":" };
    let mut seen = HashSet::new();
    libraries
        .iter()
        .map(PathBuf::as_path)
        .chain(std::iter::once(client_jar))
        .map(|path| path.to_string_lossy().to_string())
        .filter(|entry| seen.insert(entry.clone()))
        .collect::<Vec<_>>()
        .join(sep)
}

pub(crate) fn library_path_from_name(name: &str) -> String {
    library_path_from_parts(name, None)
}

pub(crate) fn library_path_from_parts(name: &str, classifier: Option<&str>) -> String {
    let parts: Vec<&str> = name.split(':').collect();
    if parts.len() < 3 {
        return name.replace(':', "/");
    }
    let group = parts[0].replace('.', "/");
    let artifact = parts[1];
    let version = parts[2];
    let classifier = classifier.or_else(|| parts.get(3).copied());

    let filename = match classifier {
        Some(classifier) => format!("{artifact}-{version}-{classifier}.jar"),
        None => format!("{artifact}-{version}.jar"),
    };

    format!("{group}/{artifact}/{version}/{filename}")
}

pub fn current_os_key() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

pub fn current_arch() -> &'static str {
    if cfg!(target_arch = "x86") {
        "32"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        "64"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Extract, LibraryDownloads, Rule, RuleOs};
    use crate::test_support::unique_temp_dir;
    use std::collections::HashMap;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn maven_library(name: &str) -> Library {
        Library {
            name: name.to_string(),
            downloads: None,
            url: Some("https://maven.fabricmc.net".to_string()),
            natives: None,
            rules: None,
            extract: None,
            sha1: None,
            size: None,
        }
    }

    #[test]
    fn library_path_from_maven_coords() {
        assert_eq!(
            library_path_from_name("com.example:demo:1.2.3"),
            "com/example/demo/1.2.3/demo-1.2.3.jar"
        );
        assert_eq!(
            library_path_from_parts("org.lwjgl:lwjgl:3.3.3", Some("natives-linux")),
            "org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-linux.jar"
        );
        assert_eq!(
            library_path_from_name("org.lwjgl:lwjgl:3.3.3:natives-windows"),
            "org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3-natives-windows.jar"
        );
    }

    #[test]
    fn maven_libraries_download_from_their_repository() {
        let root = PathBuf::from("/games/libraries");
        let plan = plan_libraries(&root, &[maven_library("net.fabricmc:fabric-loader:0.16.9")]);

        assert_eq!(
            plan.classpath,
            vec![root.join("net/fabricmc/fabric-loader/0.16.9/fabric-loader-0.16.9.jar")]
        );
        assert_eq!(plan.jobs.len(), 1);
        assert_eq!(
            plan.jobs[0].download.url,
            "https://maven.fabricmc.net/net/fabricmc/fabric-loader/0.16.9/fabric-loader-0.16.9.jar"
        );
    }

    #[test]
    fn maven_libraries_carry_their_checksum() {
        let library: Library = serde_json::from_str(
            r#"{
              "name": "net.fabricmc:intermediary:1.21.4",
              "url": "https://maven.fabricmc.net/",
              "sha1": "2a2b7e7d4b3f1b0e3c5c8b0a9a1e6c7f0d9e8b7a",
              "size": 154321
            }"#,
        )
        .expect("library json");

        let plan = plan_libraries(Path::new("/games/libraries"), &[library]);
        assert_eq!(plan.jobs.len(), 1);
        let download = &plan.jobs[0].download;
        assert_eq!(
            download.sha1.as_deref(),
            Some("2a2b7e7d4b3f1b0e3c5c8b0a9a1e6c7f0d9e8b7a")
        );
        assert_eq!(download.size, Some(154321));
        assert_eq!(
            download.url,
            "https://maven.fabricmc.net/net/fabricmc/intermediary/1.21.4/intermediary-1.21.4.jar"
        );
    }

    #[test]
    fn artifact_downloads_keep_their_declared_path() {
        let mut library = maven_library("com.mojang:brigadier:1.3.10");
        library.url = None;
        library.downloads = Some(LibraryDownloads {
            artifact: Some(Download {
                path: Some("com/mojang/brigadier/1.3.10/brigadier-1.3.10.jar".to_string()),
                url: "https://libraries.minecraft.net/com/mojang/brigadier/1.3.10/brigadier-1.3.10.jar"
                    .to_string(),
                sha1: Some("d15b53a14cf20fdcaa98f731af5dda654452c010".to_string()),
                size: Some(77392),
            }),
            classifiers: None,
        });

        let root = PathBuf::from("/games/libraries");
        let plan = plan_libraries(&root, &[library]);
        assert_eq!(plan.classpath.len(), 1);
        assert!(plan.natives.is_empty());
        assert_eq!(plan.jobs[0].path, root.join("com/mojang/brigadier/1.3.10/brigadier-1.3.10.jar"));
    }

    #[test]
    fn disallowed_libraries_are_skipped() {
        let other_os = if current_os_key() == "osx" { "linux" } else { "osx" };
        let mut library = maven_library("ca.weblite:java-objc-bridge:1.1");
        library.rules = Some(vec![Rule {
            action: "allow".to_string(),
            os: Some(RuleOs {
                name: Some(other_os.to_string()),
                arch: None,
            }),
            features: None,
        }]);

        let plan = plan_libraries(Path::new("/games/libraries"), &[library]);
        assert!(plan.classpath.is_empty());
        assert!(plan.jobs.is_empty());
    }

    #[test]
    fn native_classifier_resolves_for_current_os() {
        let mut library = maven_library("org.lwjgl.lwjgl:lwjgl-platform:2.9.4");
        library.natives = Some(HashMap::from([(
            current_os_key().to_string(),
            "natives-${arch}".to_string(),
        )]));

        let plan = plan_libraries(Path::new("/l"), &[library]);
        assert_eq!(plan.natives.len(), 1);
        let expected = format!("lwjgl-platform-2.9.4-natives-{}.jar", current_arch());
        assert!(plan.natives[0].to_string_lossy().ends_with(&expected));
    }

    #[test]
    fn classpath_deduplicates_library_entries() {
        let libs = vec![
            PathBuf::from("/tmp/a.jar"),
            PathBuf::from("/tmp/a.jar"),
            PathBuf::from("/tmp/b.jar"),
        ];
        let classpath = build_classpath(&libs, Path::new("/tmp/c.jar"));
        let sep = if cfg!(target_os = "windows") { ";" } else { ":" };
        let entries: Vec<&str> = classpath.split(sep).collect();
        assert_eq!(entries.len(), 3);
        assert!(entries[2].ends_with("c.jar"));
    }

    #[test]
    fn extract_natives_skips_meta_inf_and_excludes() {
        let dir = unique_temp_dir("melon-natives");
        std::fs::create_dir_all(&dir).expect("create dir");
        let jar = dir.join("natives.jar");
        {
            let file = File::create(&jar).expect("create jar");
            let mut writer = zip::ZipWriter::new(file);
            let options = SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            for (name, body) in [
                ("META-INF/MANIFEST.MF", "manifest"),
                ("liblwjgl.so", "lib"),
                ("skip/me.txt", "skip"),
            ] {
                writer.start_file(name, options).expect("start file");
                writer.write_all(body.as_bytes()).expect("write entry");
            }
            writer.finish().expect("finish jar");
        }

        let mut library = maven_library("org.lwjgl:lwjgl:2.9.4");
        library.extract = Some(Extract {
            exclude: vec!["skip/".to_string()],
        });
        let out = dir.join("out");
        extract_natives(&jar, &out, &[library]).expect("extract");

        assert!(out.join("liblwjgl.so").is_file());
        assert!(!out.join("META-INF").exists());
        assert!(!out.join("skip").exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
