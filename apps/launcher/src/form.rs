use anyhow::{Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use melon_core::{AccountProfile, Edition, LaunchRequest, LoginMode, is_valid_username};
use tracing::warn;

use crate::memory::{clamp_ram_gb, default_ram_gb};
use crate::paths::normalize_optional;
use crate::prefs::Preferences;

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct FormInput {
    pub login_mode: Option<LoginMode>,
    pub username: Option<String>,
    pub edition: Option<Edition>,
    pub ram_gb: Option<u32>,
}

/// Current choices, ready to be turned into a launch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    pub login_mode: LoginMode,
    pub username: Option<String>,
    pub edition: Edition,
    pub memory_gb: u32,
}

impl FormSnapshot {
    pub fn into_request(self, account: Option<AccountProfile>) -> LaunchRequest {
        match self.login_mode {
            LoginMode::Offline => LaunchRequest {
                login_mode: LoginMode::Offline,
                username: self.username,
                edition: self.edition,
                memory_gb: self.memory_gb,
                account: None,
            },
            LoginMode::Microsoft => LaunchRequest::microsoft(account, self.edition, self.memory_gb),
        }
    }
}

/// Asks for values nobody supplied.
pub trait Prompter {
    fn login_mode(&self, default: LoginMode) -> Result<LoginMode>;
    fn username(&self, default: Option<&str>) -> Result<String>;
    fn edition(&self, default: Edition) -> Result<Edition>;
    fn ram_gb(&self, default: u32, max_gb: u32) -> Result<u32>;
}

/// Flags first, then stored preferences, then prompts (when a prompter is
/// given), then defaults.
pub fn snapshot(
    input: FormInput,
    prefs: &Preferences,
    max_ram_gb: u32,
    prompter: Option<&dyn Prompter>,
) -> Result<FormSnapshot> {
    let login_mode = match input.login_mode.or_else(|| prefs.login_mode()) {
        Some(mode) => mode,
        None => match prompter {
            Some(prompter) => prompter.login_mode(LoginMode::Offline)?,
            None => LoginMode::Offline,
        },
    };

    let username = match login_mode {
        LoginMode::Microsoft => None,
        LoginMode::Offline => {
            match normalize_optional(input.username)
                .or_else(|| normalize_optional(prefs.offline_username.clone()))
            {
                Some(name) => Some(name),
                None => match prompter {
                    Some(prompter) => normalize_optional(Some(prompter.username(None)?)),
                    None => None,
                },
            }
        }
    };

    let edition = match input.edition {
        Some(edition) => edition,
        None => match prompter {
            Some(prompter) => prompter.edition(Edition::Vanilla)?,
            None => Edition::Vanilla,
        },
    };

    let requested = match input.ram_gb.or(prefs.ram) {
        Some(ram) => ram,
        None => match prompter {
            Some(prompter) => prompter.ram_gb(default_ram_gb(max_ram_gb), max_ram_gb)?,
            None => default_ram_gb(max_ram_gb),
        },
    };
    let memory_gb = clamp_ram_gb(requested, max_ram_gb);
    if memory_gb != requested {
        warn!("RAM request of {requested} GB adjusted to {memory_gb} GB (system max {max_ram_gb} GB)");
    }

    Ok(FormSnapshot {
        login_mode,
        username,
        edition,
        memory_gb,
    })
}

#[derive(Default)]
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl Prompter for DialoguerPrompter {
    fn login_mode(&self, default: LoginMode) -> Result<LoginMode> {
        let modes = [LoginMode::Offline, LoginMode::Microsoft];
        let labels = ["Offline", "Microsoft account"];
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Login type")
            .items(&labels)
            .default(modes.iter().position(|mode| *mode == default).unwrap_or(0))
            .interact()
            .context("Failed to read login type")?;
        Ok(modes[selection])
    }

    fn username(&self, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt("Username")
            .validate_with(|value: &String| {
                if is_valid_username(value.trim()) {
                    Ok(())
                } else {
                    Err("3-16 characters: letters, numbers, and underscores")
                }
            });
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input.interact_text().context("Failed to read username")
    }

    fn edition(&self, default: Edition) -> Result<Edition> {
        let labels: Vec<&str> = Edition::ALL.iter().map(Edition::label).collect();
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Game type")
            .items(&labels)
            .default(Edition::ALL.iter().position(|edition| *edition == default).unwrap_or(0))
            .interact()
            .context("Failed to read game type")?;
        Ok(Edition::ALL[selection])
    }

    fn ram_gb(&self, default: u32, max_gb: u32) -> Result<u32> {
        Input::<u32>::with_theme(&self.theme)
            .with_prompt(format!("RAM allocation in GB (1-{max_gb})"))
            .default(default)
            .validate_with(move |value: &u32| {
                if (1..=max_gb).contains(value) {
                    Ok(())
                } else {
                    Err(format!("Choose between 1 and {max_gb}"))
                }
            })
            .interact_text()
            .context("Failed to read RAM allocation")
    }
}
