use melon_core::{LaunchCommand, LaunchOptions};

use crate::args::{build_arguments, unresolved_tokens, Replacements};
use crate::error::InstallError;
use crate::libraries::{build_classpath, plan_libraries};
use crate::manifest::VersionData;
use crate::paths::GameDirs;

pub const LAUNCHER_NAME: &str = "melon";

/// Assembles `java <jvm args> <main class> <game args>` for a merged version.
pub fn build_launch_command(
    dirs: &GameDirs,
    version: &VersionData,
    java: &str,
    options: &LaunchOptions,
) -> Result<LaunchCommand, InstallError> {
    if version.main_class.trim().is_empty() {
        return Err(format!("Version {} has no main class", version.id).into());
    }

    let jar_id = version.jar.as_deref().unwrap_or(&version.id);
    let plan = plan_libraries(&dirs.libraries(), &version.libraries);
    let classpath = build_classpath(&plan.classpath, &dirs.client_jar(jar_id));
    let natives_dir = dirs.natives(&version.id).to_string_lossy().to_string();
    let assets_dir = dirs.assets().to_string_lossy().to_string();
    let game_dir = dirs.root.to_string_lossy().to_string();
    let libraries_dir = dirs.libraries().to_string_lossy().to_string();
    let asset_index = version
        .asset_index
        .as_ref()
        .map(|index| index.id.clone())
        .unwrap_or_else(|| "legacy".to_string());
    let user_type = if options.token.is_empty() { "legacy" } else { "msa" };
    // The game refuses an empty token, offline sessions pass a dummy.
    let token = if options.token.is_empty() {
        "0".to_string()
    } else {
        options.token.clone()
    };

    let mut replacements = Replacements::new();
    replacements.insert("auth_player_name", options.username.clone());
    replacements.insert("auth_uuid", options.uuid.clone());
    replacements.insert("auth_access_token", token.clone());
    replacements.insert("auth_session", token);
    replacements.insert("auth_xuid", String::new());
    replacements.insert("clientid", String::new());
    replacements.insert("user_type", user_type.to_string());
    replacements.insert("user_properties", "{}".to_string());
    replacements.insert("version_name", version.id.clone());
    replacements.insert("version_type", version.kind.clone());
    replacements.insert("game_directory", game_dir.clone());
    replacements.insert("assets_root", assets_dir.clone());
    replacements.insert("game_assets", assets_dir);
    replacements.insert("assets_index_name", asset_index);
    replacements.insert("library_directory", libraries_dir);
    replacements.insert("classpath", classpath);
    replacements.insert("classpath_separator", classpath_separator().to_string());
    replacements.insert("natives_directory", natives_dir.clone());
    replacements.insert("launcher_name", LAUNCHER_NAME.to_string());
    replacements.insert("launcher_version", env!("CARGO_PKG_VERSION").to_string());

    let (jvm_args, game_args) = build_arguments(version, &replacements)?;
    let mut unresolved = unresolved_tokens(&jvm_args);
    unresolved.extend(unresolved_tokens(&game_args));
    unresolved.sort();
    unresolved.dedup();
    if !unresolved.is_empty() {
        return Err(format!(
            "Launch metadata contains unresolved placeholders: {}",
            unresolved.join(", ")
        )
        .into());
    }

    let mut args = options.jvm_arguments.clone();
    args.extend(jvm_args);
    if !args.iter().any(|arg| arg.starts_with("-Djava.library.path")) {
        args.push(format!("-Djava.library.path={natives_dir}"));
    }
    args.push(version.main_class.clone());
    args.extend(game_args);

    Ok(LaunchCommand {
        program: java.to_string(),
        args,
        working_dir: dirs.root.clone(),
    })
}

fn classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Argument, Arguments};
    use crate::test_support::version_data;
    use melon_core::Session;

    fn modern_version() -> VersionData {
        let mut version = version_data("1.21.4");
        version.main_class = "net.minecraft.client.main.Main".to_string();
        version.arguments = Some(Arguments {
            jvm: vec![
                Argument::String("-Djava.library.path=${natives_directory}".to_string()),
                Argument::String("-cp".to_string()),
                Argument::String("${classpath}".to_string()),
            ],
            game: [
                "--username",
                "${auth_player_name}",
                "--uuid",
                "${auth_uuid}",
                "--accessToken",
                "${auth_access_token}",
                "--userType",
                "${user_type}",
                "--gameDir",
                "${game_directory}",
            ]
            .into_iter()
            .map(|arg| Argument::String(arg.to_string()))
            .collect(),
        });
        version
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|index| args.get(index + 1))
            .map(String::as_str)
    }

    #[test]
    fn offline_command_carries_identity_and_heap() {
        let dirs = GameDirs::new("/games/mc");
        let options = LaunchOptions::new(&Session::offline("Steve"), 4);
        let command =
            build_launch_command(&dirs, &modern_version(), "java", &options).expect("command");

        assert_eq!(command.program, "java");
        assert_eq!(command.args[0], "-Xmx4G");
        assert_eq!(command.args[1], "-Xms2G");
        assert_eq!(value_after(&command.args, "--username"), Some("Steve"));
        assert_eq!(
            value_after(&command.args, "--uuid"),
            Some("5627dd98-e6be-3c21-b8a8-e92344183641")
        );
        assert_eq!(value_after(&command.args, "--accessToken"), Some("0"));
        assert_eq!(value_after(&command.args, "--userType"), Some("legacy"));
        assert_eq!(command.working_dir, dirs.root);

        let main_index = command
            .args
            .iter()
            .position(|arg| arg == "net.minecraft.client.main.Main")
            .expect("main class");
        let library_path = command
            .args
            .iter()
            .position(|arg| arg.starts_with("-Djava.library.path="))
            .expect("library path");
        assert!(library_path < main_index);
        assert_eq!(
            command
                .args
                .iter()
                .filter(|arg| arg.starts_with("-Djava.library.path="))
                .count(),
            1
        );
    }

    #[test]
    fn account_sessions_use_msa_user_type() {
        let dirs = GameDirs::new("/games/mc");
        let account = melon_core::AccountProfile {
            name: "Notch".to_string(),
            id: "069a79f4-44e9-4726-a5be-fca90e38aaf5".to_string(),
            access_token: "token-123".to_string(),
        };
        let options = LaunchOptions::new(&Session::from_account(&account), 2);
        let command =
            build_launch_command(&dirs, &modern_version(), "java", &options).expect("command");

        assert_eq!(value_after(&command.args, "--accessToken"), Some("token-123"));
        assert_eq!(value_after(&command.args, "--userType"), Some("msa"));
    }

    #[test]
    fn legacy_versions_get_library_path_and_classpath() {
        let dirs = GameDirs::new("/games/mc");
        let mut version = version_data("1.7.10");
        version.main_class = "net.minecraft.client.main.Main".to_string();
        version.minecraft_arguments =
            Some("--username ${auth_player_name} --version ${version_name}".to_string());
        let options = LaunchOptions::new(&Session::offline("Alex"), 1);

        let command = build_launch_command(&dirs, &version, "/opt/java/bin/java", &options)
            .expect("command");
        assert!(command.args.iter().any(|arg| arg == "-cp"));
        assert!(command
            .args
            .iter()
            .any(|arg| arg.starts_with("-Djava.library.path=")));
        assert_eq!(value_after(&command.args, "--version"), Some("1.7.10"));
    }

    #[test]
    fn unresolved_placeholders_fail() {
        let dirs = GameDirs::new("/games/mc");
        let mut version = modern_version();
        if let Some(arguments) = version.arguments.as_mut() {
            arguments
                .game
                .push(Argument::String("${resolution_width}".to_string()));
        }
        let options = LaunchOptions::new(&Session::offline("Steve"), 4);

        let err = build_launch_command(&dirs, &version, "java", &options).unwrap_err();
        assert!(err.to_string().contains("resolution_width"));
    }

    #[test]
    fn missing_main_class_fails() {
        let dirs = GameDirs::new("/games/mc");
        let version = version_data("1.21.4");
        let options = LaunchOptions::new(&Session::offline("Steve"), 4);
        assert!(build_launch_command(&dirs, &version, "java", &options).is_err());
    }
}
