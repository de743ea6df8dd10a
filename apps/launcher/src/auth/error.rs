use thiserror::Error;

use super::http::HttpError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("This Microsoft account does not own Minecraft.")]
    MissingMinecraftEntitlement,
}

impl From<String> for AuthError {
    fn from(value: String) -> Self {
        AuthError::Message(value)
    }
}
