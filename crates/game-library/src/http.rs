use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

static CLIENT: OnceLock<Client> = OnceLock::new();

/// One client for the whole process so connections to Mojang hosts are pooled.
pub fn shared_client() -> &'static Client {
    CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent(concat!("melon-launcher/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
    #[error("Failed to parse JSON from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A single GET. Anything but a 2xx is an error; the caller decides what a
/// failure means for the attempt.
pub async fn get(client: &Client, url: &str) -> Result<Response, HttpError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| HttpError::Request {
            url: url.to_string(),
            source,
        })?;
    check_status(url, response.status())?;
    Ok(response)
}

pub async fn fetch_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, HttpError> {
    let body = get(client, url)
        .await?
        .bytes()
        .await
        .map_err(|source| HttpError::Request {
            url: url.to_string(),
            source,
        })?;
    serde_json::from_slice(&body).map_err(|source| HttpError::Parse {
        url: url.to_string(),
        source,
    })
}

fn check_status(url: &str, status: StatusCode) -> Result<(), HttpError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(HttpError::Status {
            url: url.to_string(),
            status,
        })
    }
}
