use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

use super::error::AuthError;
use super::http::HttpClient;

pub(crate) const DEVICE_CODE_URL: &str =
    "https://login.microsoftonline.com/consumers/oauth2/v2.0/devicecode";
pub(crate) const TOKEN_URL: &str = "https://login.microsoftonline.com/consumers/oauth2/v2.0/token";
pub(crate) const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const SCOPE: &str = "XboxLive.signin offline_access";

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug)]
pub(crate) enum PollStatus {
    Success(TokenResponse),
    AuthorizationPending,
    SlowDown,
    ExpiredToken,
    AccessDenied,
    Fatal(String),
}

/// Token endpoint replies with 400 while the user has not finished signing in,
/// so the error body has to be inspected rather than treated as a failure.
pub(crate) fn parse_poll_body(status: u16, body: &str) -> PollStatus {
    if (200..300).contains(&status) {
        return match serde_json::from_str::<TokenResponse>(body) {
            Ok(token) => PollStatus::Success(token),
            Err(err) => PollStatus::Fatal(format!("Failed to parse token response: {err}")),
        };
    }

    let err = serde_json::from_str::<OAuthError>(body).unwrap_or(OAuthError {
        error: "unknown".to_string(),
        error_description: Some(body.to_string()),
    });
    match err.error.as_str() {
        "authorization_pending" => PollStatus::AuthorizationPending,
        "slow_down" => PollStatus::SlowDown,
        "expired_token" => PollStatus::ExpiredToken,
        "access_denied" | "authorization_declined" => PollStatus::AccessDenied,
        _ => PollStatus::Fatal(err.error_description.unwrap_or(err.error)),
    }
}

pub async fn start_device_code<H: HttpClient + ?Sized>(
    http: &H,
    client_id: &str,
) -> Result<DeviceCodeResponse, AuthError> {
    let params = [("client_id", client_id), ("scope", SCOPE)];
    Ok(http.post_form(DEVICE_CODE_URL, &params).await?)
}

pub(crate) async fn poll_device_token<H: HttpClient + ?Sized>(
    http: &H,
    client_id: &str,
    device: &DeviceCodeResponse,
) -> Result<TokenResponse, AuthError> {
    let mut interval = Duration::from_secs(device.interval.max(1));
    let deadline = Instant::now() + Duration::from_secs(device.expires_in.max(1));

    loop {
        if Instant::now() > deadline {
            return Err("Device code expired. Start login again.".to_string().into());
        }

        let params = [
            ("client_id", client_id),
            ("grant_type", DEVICE_CODE_GRANT_TYPE),
            ("device_code", device.device_code.as_str()),
        ];
        let response = http.post_form_raw(TOKEN_URL, &params).await?;

        match parse_poll_body(response.status, &response.body) {
            PollStatus::Success(token) => return Ok(token),
            PollStatus::AuthorizationPending => {
                debug!("device code authorization pending");
                sleep(interval).await;
            }
            PollStatus::SlowDown => {
                interval += Duration::from_secs(5);
                sleep(interval).await;
            }
            PollStatus::ExpiredToken => {
                return Err("Device code expired. Start login again.".to_string().into());
            }
            PollStatus::AccessDenied => {
                return Err("Device code authorization denied.".to_string().into());
            }
            PollStatus::Fatal(message) => {
                return Err(format!("Device code login failed: {message}").into());
            }
        }
    }
}

pub(crate) async fn refresh_token<H: HttpClient + ?Sized>(
    http: &H,
    client_id: &str,
    refresh_token: &str,
) -> Result<TokenResponse, AuthError> {
    let params = [
        ("client_id", client_id),
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("scope", SCOPE),
    ];

    Ok(http.post_form(TOKEN_URL, &params).await?)
}
