mod error;
mod flow;
mod http;
mod ms;
mod session;

use melon_core::AccountProfile;
use std::path::Path;
use tracing::{info, warn};

use crate::paths::normalize_optional;

pub use error::AuthError;
pub use http::{HttpClient, ReqwestHttpClient};
pub use ms::DeviceCodeResponse;
pub use session::{AuthSession, clear_session, load_session, save_session};

pub const CLIENT_ID_ENV: &str = "MELON_MS_CLIENT_ID";

/// `--client-id`, then the runtime env var, then whatever was baked in at build time.
pub fn resolve_client_id(client_id_override: Option<String>) -> Option<String> {
    normalize_optional(client_id_override)
        .or_else(|| normalize_optional(std::env::var(CLIENT_ID_ENV).ok()))
        .or_else(|| normalize_optional(option_env!("MELON_MS_CLIENT_ID").map(str::to_string)))
}

pub async fn start_device_code<H: HttpClient + ?Sized>(
    http: &H,
    client_id: &str,
) -> Result<DeviceCodeResponse, AuthError> {
    ms::start_device_code(http, client_id).await
}

pub async fn complete_device_code<H: HttpClient + ?Sized>(
    http: &H,
    client_id: &str,
    device: &DeviceCodeResponse,
) -> Result<AuthSession, AuthError> {
    let token = ms::poll_device_token(http, client_id, device).await?;
    flow::session_from_ms_token(http, client_id, &token.access_token, token.refresh_token).await
}

/// The stored account, refreshed when close to expiry. Anything that goes wrong
/// is logged and yields `None`, which the launch reports as not logged in.
pub async fn account_for_launch<H: HttpClient + ?Sized>(
    http: &H,
    store: &Path,
) -> Option<AccountProfile> {
    let stored = match load_session(store) {
        Ok(Some(stored)) => stored,
        Ok(None) => {
            info!("no stored Microsoft session");
            return None;
        }
        Err(err) => {
            warn!("failed to load Microsoft session: {err}");
            return None;
        }
    };

    let previous = stored.clone();
    match session::ensure_fresh_session(http, stored).await {
        Ok(fresh) => {
            if fresh != previous {
                if let Err(err) = save_session(store, &fresh) {
                    warn!("failed to store refreshed session: {err}");
                }
            }
            Some(fresh.account())
        }
        Err(err) => {
            warn!("failed to refresh Microsoft session: {err}");
            None
        }
    }
}
