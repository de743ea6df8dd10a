//! Microsoft access token to a Minecraft session: Xbox Live user token, XSTS
//! token, Minecraft token, then the profile and an ownership check.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::error::AuthError;
use super::http::HttpClient;
use super::session::{AuthSession, unix_timestamp};

pub(crate) const XBL_AUTH_URL: &str = "https://user.auth.xboxlive.com/user/authenticate";
pub(crate) const XSTS_AUTH_URL: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
pub(crate) const MC_LOGIN_URL: &str =
    "https://api.minecraftservices.com/authentication/login_with_xbox";
pub(crate) const MC_PROFILE_URL: &str = "https://api.minecraftservices.com/minecraft/profile";
pub(crate) const MC_ENTITLEMENTS_URL: &str =
    "https://api.minecraftservices.com/entitlements/mcstore";

/// Entitlement names that mean the account can play Java Edition.
const OWNERSHIP_ITEMS: [&str; 2] = ["game_minecraft", "product_minecraft"];

/// Java Edition profile. `id` comes back without dashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
}

/// What both Xbox endpoints hand back: a token and the user hash it belongs to.
#[derive(Debug)]
struct XboxToken {
    token: String,
    user_hash: String,
}

#[derive(Deserialize)]
struct XboxReply {
    #[serde(rename = "Token")]
    token: String,
    #[serde(rename = "DisplayClaims")]
    claims: XboxClaims,
}

#[derive(Deserialize)]
struct XboxClaims {
    #[serde(default)]
    xui: Vec<XboxUser>,
}

#[derive(Deserialize)]
struct XboxUser {
    uhs: String,
}

#[derive(Deserialize)]
struct XboxRejection {
    #[serde(rename = "XErr")]
    code: u64,
}

#[derive(Deserialize)]
struct MinecraftToken {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct Entitlements {
    #[serde(default)]
    items: Vec<Entitlement>,
}

#[derive(Deserialize)]
struct Entitlement {
    #[serde(default)]
    name: String,
}

impl Entitlements {
    fn owns_java_edition(&self) -> bool {
        self.items
            .iter()
            .any(|item| OWNERSHIP_ITEMS.contains(&item.name.as_str()))
    }
}

pub(crate) async fn session_from_ms_token<H: HttpClient + ?Sized>(
    http: &H,
    client_id: &str,
    ms_access_token: &str,
    refresh_token: Option<String>,
) -> Result<AuthSession, AuthError> {
    let refresh_token =
        refresh_token.ok_or_else(|| "Missing refresh token from Microsoft login.".to_string())?;

    let user = exchange_xbox(
        http,
        XBL_AUTH_URL,
        json!({
            "Properties": {
                "AuthMethod": "RPS",
                "SiteName": "user.auth.xboxlive.com",
                "RpsTicket": format!("d={ms_access_token}")
            },
            "RelyingParty": "http://auth.xboxlive.com",
            "TokenType": "JWT"
        }),
    )
    .await?;
    debug!("xbox live user token acquired");

    let xsts = exchange_xbox(
        http,
        XSTS_AUTH_URL,
        json!({
            "Properties": { "SandboxId": "RETAIL", "UserTokens": [user.token] },
            "RelyingParty": "rp://api.minecraftservices.com/",
            "TokenType": "JWT"
        }),
    )
    .await?;
    debug!("xsts token acquired");

    let identity = format!("XBL3.0 x={};{}", xsts.user_hash, xsts.token);
    let minecraft: MinecraftToken = http
        .post_json(MC_LOGIN_URL, &json!({ "identityToken": identity }))
        .await?;

    let profile: Profile = http
        .get_json(MC_PROFILE_URL, Some(&minecraft.access_token))
        .await?;
    let entitlements: Entitlements = http
        .get_json(MC_ENTITLEMENTS_URL, Some(&minecraft.access_token))
        .await?;
    if !entitlements.owns_java_edition() {
        return Err(AuthError::MissingMinecraftEntitlement);
    }

    info!("signed in as {}", profile.name);
    Ok(AuthSession {
        access_token: minecraft.access_token,
        access_token_expires_at: unix_timestamp().saturating_add(minecraft.expires_in),
        refresh_token: Some(refresh_token),
        client_id: client_id.to_string(),
        profile,
    })
}

async fn exchange_xbox<H: HttpClient + ?Sized>(
    http: &H,
    url: &str,
    body: Value,
) -> Result<XboxToken, AuthError> {
    let response = http.post_json_raw(url, &body).await?;
    if !(200..300).contains(&response.status) {
        return Err(xbox_rejection(response.status, &response.body).into());
    }

    let reply: XboxReply = serde_json::from_str(&response.body)?;
    let user_hash = reply
        .claims
        .xui
        .into_iter()
        .next()
        .map(|user| user.uhs)
        .ok_or_else(|| "Xbox Live response carried no user hash".to_string())?;
    Ok(XboxToken {
        token: reply.token,
        user_hash,
    })
}

/// XSTS explains most refusals with an `XErr` code.
pub(crate) fn xbox_rejection(status: u16, body: &str) -> String {
    match serde_json::from_str::<XboxRejection>(body).map(|rejection| rejection.code) {
        Ok(2148916233) => {
            "This Microsoft account has no Xbox profile. Sign in at xbox.com once, then try again."
                .to_string()
        }
        Ok(2148916235) => "Xbox Live is not available in this account's country.".to_string(),
        Ok(2148916236 | 2148916237) => {
            "This account needs adult verification on xbox.com before it can sign in.".to_string()
        }
        Ok(2148916238) => {
            "This is a child account. An adult has to add it to a Microsoft family first."
                .to_string()
        }
        Ok(code) => format!("Xbox Live refused the sign-in (XErr {code})."),
        Err(_) => format!("Xbox Live sign-in failed ({status}): {body}"),
    }
}
