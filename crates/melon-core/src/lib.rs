mod error;
pub mod identity;
pub mod library;
pub mod request;
pub mod sequencer;
pub mod session;
pub mod username;
pub mod versions;

pub use crate::error::LaunchError;
pub use crate::identity::offline_uuid;
pub use crate::library::{GameLibrary, LaunchCommand, LibraryError, ProcessLauncher};
pub use crate::request::{AccountProfile, Edition, LaunchRequest, LoginMode};
pub use crate::sequencer::{LaunchObserver, LaunchReport, LaunchSequencer, LaunchStage};
pub use crate::session::{LaunchOptions, Session, heap_arguments};
pub use crate::username::is_valid_username;
pub use crate::versions::{InstalledVersion, VersionSelection};
