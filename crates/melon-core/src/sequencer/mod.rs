use std::fmt;
use tracing::{error, info, warn};

use crate::error::LaunchError;
use crate::library::{GameLibrary, ProcessLauncher};
use crate::request::{LaunchRequest, LoginMode};
use crate::session::{LaunchOptions, Session};
use crate::username::is_valid_username;
use crate::versions::{VersionSelection, find_loader_version};

/// Number of command arguments echoed into the log before eliding the rest.
const COMMAND_PREVIEW_ARGS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStage {
    Validating,
    ResolvingVersion,
    Installing,
    BuildingSession,
    Launching,
    Done,
}

impl LaunchStage {
    pub fn label(&self) -> &'static str {
        match self {
            LaunchStage::Validating => "validating",
            LaunchStage::ResolvingVersion => "resolving-version",
            LaunchStage::Installing => "installing",
            LaunchStage::BuildingSession => "building-session",
            LaunchStage::Launching => "launching",
            LaunchStage::Done => "done",
        }
    }
}

impl fmt::Display for LaunchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Receives stage transitions as a launch attempt progresses.
pub trait LaunchObserver: Send + Sync {
    fn on_stage(&self, stage: LaunchStage, message: &str);

    fn on_failure(&self, _error: &LaunchError) {}
}

struct SilentObserver;

impl LaunchObserver for SilentObserver {
    fn on_stage(&self, _stage: LaunchStage, _message: &str) {}
}

static SILENT: SilentObserver = SilentObserver;

#[derive(Debug, Clone)]
pub struct LaunchReport {
    pub selection: VersionSelection,
    pub session: Session,
    pub options: LaunchOptions,
    pub pid: u32,
}

/// Runs one launch attempt: validate, resolve, install, build session, spawn.
pub struct LaunchSequencer<'a, L: ?Sized, P: ?Sized> {
    library: &'a L,
    launcher: &'a P,
    observer: &'a dyn LaunchObserver,
}

impl<'a, L, P> LaunchSequencer<'a, L, P>
where
    L: GameLibrary + ?Sized,
    P: ProcessLauncher + ?Sized,
{
    pub fn new(library: &'a L, launcher: &'a P) -> Self {
        Self {
            library,
            launcher,
            observer: &SILENT,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn LaunchObserver) -> Self {
        self.observer = observer;
        self
    }

    pub async fn run(&self, request: LaunchRequest) -> Result<LaunchReport, LaunchError> {
        info!(
            mode = %request.login_mode,
            user = request.username.as_deref().unwrap_or(""),
            edition = %request.edition,
            ram_gb = request.memory_gb,
            "launch initiated"
        );
        match self.run_stages(request).await {
            Ok(report) => Ok(report),
            Err(err) => {
                error!(stage = %err.stage(), "launch failed: {err}");
                self.observer.on_failure(&err);
                Err(err)
            }
        }
    }

    async fn run_stages(&self, request: LaunchRequest) -> Result<LaunchReport, LaunchError> {
        self.enter(LaunchStage::Validating, "Checking launch settings");
        validate(&request)?;

        self.enter(LaunchStage::ResolvingVersion, "Selecting game version");
        let selection = self.resolve_version(&request).await?;
        info!(
            version = %selection.version_id,
            edition = %selection.resolved,
            "using version"
        );

        self.enter(
            LaunchStage::Installing,
            &format!("Installing Minecraft {}", selection.version_id),
        );
        self.library
            .install(&selection.version_id)
            .await
            .map_err(|source| LaunchError::Install {
                version: selection.version_id.clone(),
                source,
            })?;

        self.enter(LaunchStage::BuildingSession, "Preparing session");
        let session = build_session(&request)?;
        info!(
            name = %session.display_name,
            uuid = %session.identifier,
            "session ready"
        );

        self.enter(LaunchStage::Launching, "Starting Minecraft");
        let options = LaunchOptions::new(&session, request.memory_gb);
        let command = self
            .library
            .launch_command(&selection.version_id, &options)
            .await
            .map_err(LaunchError::Launch)?;
        info!("executing command: {}", command.preview(COMMAND_PREVIEW_ARGS));
        let pid = self.launcher.spawn(&command).map_err(LaunchError::Launch)?;

        self.enter(
            LaunchStage::Done,
            &format!("Launching Minecraft ({})", selection.resolved),
        );
        info!(pid, "minecraft launched");
        Ok(LaunchReport {
            selection,
            session,
            options,
            pid,
        })
    }

    async fn resolve_version(
        &self,
        request: &LaunchRequest,
    ) -> Result<VersionSelection, LaunchError> {
        let edition = request.edition;
        if let Some(loader) = edition.loader_name() {
            let installed = self
                .library
                .installed_versions()
                .await
                .map_err(LaunchError::VersionResolution)?;
            if let Some(found) = find_loader_version(loader, &installed) {
                return Ok(VersionSelection::exact(found.id.clone(), edition));
            }
            warn!(
                edition = %edition,
                "no installed {loader} version; falling back to the latest release"
            );
        }

        let latest = self
            .library
            .latest_release()
            .await
            .map_err(LaunchError::VersionResolution)?;
        Ok(VersionSelection::latest_release(latest, edition))
    }

    fn enter(&self, stage: LaunchStage, message: &str) {
        info!(stage = %stage, "{message}");
        self.observer.on_stage(stage, message);
    }
}

fn validate(request: &LaunchRequest) -> Result<(), LaunchError> {
    match request.login_mode {
        LoginMode::Offline => {
            let username = request.username.as_deref().unwrap_or_default();
            if !is_valid_username(username) {
                warn!("invalid offline username: {username:?}");
                return Err(LaunchError::InvalidUsername {
                    username: username.to_string(),
                });
            }
        }
        LoginMode::Microsoft => {
            if request.account.is_none() {
                warn!("microsoft login missing before launch");
                return Err(LaunchError::NotAuthenticated);
            }
        }
    }
    Ok(())
}

fn build_session(request: &LaunchRequest) -> Result<Session, LaunchError> {
    match request.login_mode {
        LoginMode::Offline => Ok(Session::offline(
            request.username.as_deref().unwrap_or_default(),
        )),
        LoginMode::Microsoft => request
            .account
            .as_ref()
            .map(Session::from_account)
            .ok_or(LaunchError::NotAuthenticated),
    }
}
