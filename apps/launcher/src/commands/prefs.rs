use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use melon_core::{LoginMode, is_valid_username};

use crate::memory;
use crate::paths;
use crate::prefs::{self, Preferences};

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Print the stored preferences.
    Show,
    /// Update stored preferences without launching.
    Set(SetArgs),
}

#[derive(Args, Debug, Default)]
pub struct SetArgs {
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    login_type: Option<LoginMode>,
    #[arg(long)]
    ram: Option<u32>,
}

pub fn run(command: PrefsCommand) -> Result<()> {
    let path = paths::prefs_path().map_err(anyhow::Error::msg)?;
    match command {
        PrefsCommand::Show => {
            let stored = prefs::load(&path);
            println!("File: {}", path.display());
            println!("{}", serde_json::to_string_pretty(&stored)?);
            Ok(())
        }
        PrefsCommand::Set(args) => {
            let mut stored = prefs::load(&path);
            apply(&mut stored, args, memory::system_max_gb())?;
            prefs::save(&path, &stored).context("Failed to save preferences")?;
            println!("Preferences saved to {}", path.display());
            Ok(())
        }
    }
}

fn apply(stored: &mut Preferences, args: SetArgs, max_ram_gb: u32) -> Result<()> {
    if let Some(username) = args.username {
        let username = username.trim();
        if !is_valid_username(username) {
            bail!(
                "Username must be 3-16 characters long and contain only letters, numbers, and underscores."
            );
        }
        stored.offline_username = Some(username.to_string());
    }
    if let Some(mode) = args.login_type {
        stored.login_type = Some(mode.as_str().to_string());
    }
    if let Some(ram) = args.ram {
        let clamped = memory::clamp_ram_gb(ram, max_ram_gb);
        if clamped != ram {
            println!("RAM adjusted to {clamped} GB (system max {max_ram_gb} GB).");
        }
        stored.ram = Some(clamped);
    }
    Ok(())
}
