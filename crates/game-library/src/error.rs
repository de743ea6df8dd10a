use melon_core::LibraryError;
use thiserror::Error;

use crate::http::HttpError;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl From<String> for InstallError {
    fn from(value: String) -> Self {
        InstallError::Message(value)
    }
}

impl From<InstallError> for LibraryError {
    fn from(value: InstallError) -> Self {
        LibraryError(value.to_string())
    }
}
