use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::manifest::VersionData;

const RUNTIME_SEARCH_DEPTH: usize = 6;

/// Picks the java binary for a version: an explicit override, then a runtime the
/// official launcher installed under `<game_dir>/runtime`, then `java` on PATH.
pub fn resolve_java_binary(
    runtime_root: &Path,
    version: &VersionData,
    java_override: Option<&str>,
) -> Result<String, String> {
    if let Some(value) = java_override.map(str::trim).filter(|value| !value.is_empty()) {
        return normalize_java_override_path(value);
    }

    let component = version
        .java_version
        .as_ref()
        .map(|java| java.component.as_str());

    if let Some(component) = component {
        if let Some(path) = find_runtime_java_binary(&runtime_root.join(component)) {
            debug!("using bundled java runtime {component} at {}", path.display());
            return Ok(path.to_string_lossy().to_string());
        }
    }

    if let Some(path) = find_runtime_java_binary(runtime_root) {
        debug!("using bundled java runtime at {}", path.display());
        return Ok(path.to_string_lossy().to_string());
    }

    Ok("java".to_string())
}

pub(crate) fn normalize_java_override_path(path: &str) -> Result<String, String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err("Configured Java path is empty.".to_string());
    }

    let candidate = Path::new(trimmed);
    let looks_like_path =
        candidate.is_absolute() || trimmed.contains('/') || trimmed.contains('\\');
    if !looks_like_path {
        return Ok(trimmed.to_string());
    }

    if !candidate.is_file() {
        return Err(format!("Configured Java path is not a file: {trimmed}"));
    }
    if !is_usable_java_binary(candidate) {
        return Err(format!(
            "Configured Java path is not executable: {}",
            candidate.display()
        ));
    }

    let canonical = fs::canonicalize(candidate)
        .map_err(|err| format!("Failed to canonicalize Java path `{trimmed}`: {err}"))?;
    Ok(canonical.to_string_lossy().to_string())
}

fn find_runtime_java_binary(root: &Path) -> Option<PathBuf> {
    let mut stack = vec![(root.to_path_buf(), 0usize)];
    while let Some((dir, depth)) = stack.pop() {
        if depth > RUNTIME_SEARCH_DEPTH || !dir.is_dir() {
            continue;
        }
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push((path, depth + 1));
                continue;
            }
            let Some(name) = path.file_name().and_then(|value| value.to_str()) else {
                continue;
            };
            let name = name.to_ascii_lowercase();
            let in_bin = path
                .parent()
                .and_then(|parent| parent.file_name())
                .is_some_and(|parent| parent == "bin");
            if in_bin && (name == "java" || name == "javaw.exe" || name == "java.exe")
                && is_usable_java_binary(&path)
            {
                return Some(path);
            }
        }
    }
    None
}

fn is_usable_java_binary(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        fs::metadata(path)
            .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        let Some(ext) = path.extension().and_then(|value| value.to_str()) else {
            return true;
        };
        matches!(
            ext.to_ascii_lowercase().as_str(),
            "exe" | "cmd" | "bat" | "com"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{unique_temp_dir, version_data};

    #[test]
    fn bare_command_override_is_kept_verbatim() {
        let version = version_data("1.21.4");
        let resolved =
            resolve_java_binary(Path::new("/nonexistent"), &version, Some("  java21  "))
                .expect("override");
        assert_eq!(resolved, "java21");
    }

    #[test]
    fn missing_override_path_is_rejected() {
        let err = normalize_java_override_path("/definitely/not/here/java").unwrap_err();
        assert!(err.contains("not a file"));
    }

    #[test]
    fn falls_back_to_java_on_path() {
        let dir = unique_temp_dir("melon-java-empty");
        let version = version_data("1.21.4");
        let resolved = resolve_java_binary(&dir, &version, None).expect("fallback");
        assert_eq!(resolved, "java");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[test]
    fn finds_installed_runtime_binary() {
        let dir = unique_temp_dir("melon-java-runtime");
        let bin = dir
            .join("java-runtime-delta")
            .join("linux")
            .join("java-runtime-delta")
            .join("bin");
        std::fs::create_dir_all(&bin).expect("create bin");
        let java = bin.join("java");
        std::fs::write(&java, b"#!/bin/sh\n").expect("write java");
        let mut perms = std::fs::metadata(&java).expect("meta").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&java, perms).expect("chmod");

        let mut version = version_data("1.21.4");
        version.java_version = Some(crate::manifest::JavaVersion {
            component: "java-runtime-delta".to_string(),
            major_version: 21,
        });
        let resolved = resolve_java_binary(&dir, &version, None).expect("runtime");
        assert_eq!(PathBuf::from(resolved), java);
        let _ = std::fs::remove_dir_all(dir);
    }
}
