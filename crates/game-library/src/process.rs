use std::process::{Command, Stdio};

use melon_core::{LaunchCommand, LibraryError, ProcessLauncher};
use tracing::info;

/// Starts the game and lets it run on its own. The launcher never waits on the
/// child, so it keeps running after the launcher exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedLauncher;

impl ProcessLauncher for DetachedLauncher {
    fn spawn(&self, command: &LaunchCommand) -> Result<u32, LibraryError> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| LibraryError(format!("Failed to start {}: {err}", command.program)))?;

        let pid = child.id();
        info!("game process started with pid {pid}");
        Ok(pid)
    }
}
