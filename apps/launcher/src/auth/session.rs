use melon_core::AccountProfile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use super::error::AuthError;
use super::flow::{self, Profile};
use super::http::HttpClient;
use super::ms;
use crate::paths::ensure_dir;

/// Refresh when the token has less than this many seconds left.
const REFRESH_WINDOW_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub access_token_expires_at: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub client_id: String,
    pub profile: Profile,
}

impl AuthSession {
    pub fn account(&self) -> AccountProfile {
        AccountProfile {
            name: self.profile.name.clone(),
            id: self.profile.id.clone(),
            access_token: self.access_token.clone(),
        }
    }
}

pub fn load_session(path: &Path) -> Result<Option<AuthSession>, AuthError> {
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(path).map_err(|err| format!("Failed to read auth session: {err}"))?;
    let session = serde_json::from_slice::<AuthSession>(&bytes)
        .map_err(|err| format!("Failed to parse auth session: {err}"))?;
    Ok(Some(session))
}

pub fn save_session(path: &Path, session: &AuthSession) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let payload = serde_json::to_vec_pretty(session)?;
    fs::write(path, payload).map_err(|err| format!("Failed to write auth session: {err}"))?;
    Ok(())
}

/// Returns whether a session file was removed.
pub fn clear_session(path: &Path) -> Result<bool, AuthError> {
    if !path.is_file() {
        return Ok(false);
    }
    fs::remove_file(path).map_err(|err| format!("Failed to remove auth session: {err}"))?;
    Ok(true)
}

pub(crate) fn needs_refresh(session: &AuthSession, now: u64) -> bool {
    session.access_token_expires_at == 0
        || now.saturating_add(REFRESH_WINDOW_SECS) >= session.access_token_expires_at
}

pub async fn ensure_fresh_session<H: HttpClient + ?Sized>(
    http: &H,
    session: AuthSession,
) -> Result<AuthSession, AuthError> {
    if !needs_refresh(&session, unix_timestamp()) {
        return Ok(session);
    }

    info!("refreshing Microsoft session for {}", session.profile.name);
    let refresh_token = session
        .refresh_token
        .clone()
        .ok_or_else(|| "Missing refresh token; please sign in again.".to_string())?;
    let refreshed = ms::refresh_token(http, &session.client_id, &refresh_token).await?;
    let next_refresh = refreshed.refresh_token.clone().or(Some(refresh_token));
    flow::session_from_ms_token(http, &session.client_id, &refreshed.access_token, next_refresh)
        .await
}

pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
