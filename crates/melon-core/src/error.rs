use thiserror::Error;

use crate::library::LibraryError;
use crate::sequencer::LaunchStage;

/// Errors that end a launch attempt. None of them are retried.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(
        "Username must be 3-16 characters long and contain only letters, numbers, and underscores."
    )]
    InvalidUsername { username: String },

    #[error("Please log in with Microsoft before launching.")]
    NotAuthenticated,

    #[error("Could not determine game version: {0}")]
    VersionResolution(#[source] LibraryError),

    #[error("Failed to install Minecraft {version}: {source}")]
    Install {
        version: String,
        #[source]
        source: LibraryError,
    },

    #[error("An error occurred while launching: {0}")]
    Launch(#[source] LibraryError),
}

impl LaunchError {
    /// Stage the sequencer was in when this error ended the attempt.
    pub fn stage(&self) -> LaunchStage {
        match self {
            LaunchError::InvalidUsername { .. } | LaunchError::NotAuthenticated => {
                LaunchStage::Validating
            }
            LaunchError::VersionResolution(_) => LaunchStage::ResolvingVersion,
            LaunchError::Install { .. } => LaunchStage::Installing,
            LaunchError::Launch(_) => LaunchStage::Launching,
        }
    }

    /// Short heading for the message shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            LaunchError::InvalidUsername { .. } => "Invalid Username",
            LaunchError::NotAuthenticated => "Not Logged In",
            LaunchError::VersionResolution(_) => "Launch Error",
            LaunchError::Install { .. } => "Installation Error",
            LaunchError::Launch(_) => "Launch Failed",
        }
    }
}
