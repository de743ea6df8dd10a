use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Args;
use game_library::{DetachedLauncher, MojangLibrary};
use melon_core::{Edition, LaunchSequencer, LoginMode};
use tracing::info;

use crate::auth::{self, ReqwestHttpClient};
use crate::form::{self, DialoguerPrompter, FormInput, Prompter};
use crate::memory;
use crate::observer::{ConsoleObserver, failure_message, success_message};
use crate::paths;
use crate::prefs;

#[derive(Args, Debug, Default)]
pub struct LaunchArgs {
    /// Play with an offline username.
    #[arg(long, conflicts_with = "microsoft")]
    offline: bool,
    /// Play with the stored Microsoft account (see `melon login`).
    #[arg(long)]
    microsoft: bool,
    #[arg(long)]
    username: Option<String>,
    /// vanilla, forge or fabric.
    #[arg(long)]
    edition: Option<Edition>,
    /// Heap size in GB.
    #[arg(long)]
    ram: Option<u32>,
    #[arg(long)]
    game_dir: Option<PathBuf>,
    /// Java executable to use instead of a bundled runtime.
    #[arg(long)]
    java: Option<String>,
    /// Never prompt; use flags, stored preferences and defaults only.
    #[arg(long)]
    no_input: bool,
}

impl LaunchArgs {
    fn form_input(&self) -> FormInput {
        let login_mode = if self.offline {
            Some(LoginMode::Offline)
        } else if self.microsoft {
            Some(LoginMode::Microsoft)
        } else {
            None
        };
        FormInput {
            login_mode,
            username: self.username.clone(),
            edition: self.edition,
            ram_gb: self.ram,
        }
    }

    fn interactive(&self) -> bool {
        !self.no_input && io::stdin().is_terminal() && io::stdout().is_terminal()
    }
}

pub async fn run(args: LaunchArgs) -> Result<()> {
    let prefs_path = paths::prefs_path().map_err(anyhow::Error::msg)?;
    let mut stored = prefs::load(&prefs_path);
    let max_ram_gb = memory::system_max_gb();

    let prompter = DialoguerPrompter::default();
    let prompter: Option<&dyn Prompter> = if args.interactive() {
        Some(&prompter)
    } else {
        None
    };
    let form = form::snapshot(args.form_input(), &stored, max_ram_gb, prompter)?;

    let account = match form.login_mode {
        LoginMode::Microsoft => {
            let store = paths::auth_store_path().map_err(anyhow::Error::msg)?;
            auth::account_for_launch(&ReqwestHttpClient::new(), &store).await
        }
        LoginMode::Offline => None,
    };
    let request = form.into_request(account);

    let game_dir = paths::resolve_game_dir(args.game_dir);
    info!("game directory: {}", game_dir.display());
    let library = MojangLibrary::new(game_dir).with_java(args.java);
    let launcher = DetachedLauncher;
    let observer = ConsoleObserver;

    let report = LaunchSequencer::new(&library, &launcher)
        .with_observer(&observer)
        .run(request.clone())
        .await
        .map_err(|err| anyhow!(failure_message(&err)))?;

    println!("{}", success_message(&report));
    stored.record_launch(&request);
    prefs::save_or_log(&prefs_path, &stored);
    Ok(())
}
