use anyhow::Result;
use clap::{Parser, Subcommand};

mod auth;
mod commands;
mod form;
mod memory;
mod observer;
mod paths;
mod prefs;
mod telemetry;

use commands::{launch, login, logout, prefs as prefs_cmd};

#[derive(Parser)]
#[command(name = "melon", version, about = "Melon Client Minecraft launcher")]
struct Cli {
    /// Also write log lines to stderr.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install (if needed) and start the game.
    Launch(launch::LaunchArgs),
    /// Sign in with a Microsoft account.
    Login(login::LoginArgs),
    /// Forget the stored Microsoft account.
    Logout,
    Prefs {
        #[command(subcommand)]
        command: prefs_cmd::PrefsCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    match cli.command {
        Commands::Launch(args) => launch::run(args).await,
        Commands::Login(args) => login::run(args).await,
        Commands::Logout => logout::run(),
        Commands::Prefs { command } => prefs_cmd::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbose_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from(["melon", "logout", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Logout));
    }

    #[test]
    fn prefs_set_parses_login_type() {
        let cli =
            Cli::try_parse_from(["melon", "prefs", "set", "--login-type", "microsoft", "--ram", "8"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Prefs {
                command: prefs_cmd::PrefsCommand::Set(_)
            }
        ));
    }
}
