use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

static CLIENT: OnceLock<Client> = OnceLock::new();

pub fn shared_client() -> &'static Client {
    CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent(concat!("melon-launcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Request failed ({status}): {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to parse JSON: {source}. Body: {body}")]
    Parse {
        source: serde_json::Error,
        body: String,
    },
}

/// Raw status and body, for endpoints whose error responses carry meaning.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post_form_raw(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<RawResponse, HttpError>;

    async fn post_json_raw(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<RawResponse, HttpError>;

    async fn get_raw(&self, url: &str, bearer: Option<&str>) -> Result<RawResponse, HttpError>;

    async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, HttpError> {
        decode(self.post_form_raw(url, params).await?)
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + Send + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        let value = serde_json::to_value(body).map_err(|err| HttpError::Parse {
            source: err,
            body: String::new(),
        })?;
        decode(self.post_json_raw(url, &value).await?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: Option<&str>,
    ) -> Result<T, HttpError> {
        decode(self.get_raw(url, bearer).await?)
    }
}

fn decode<T: DeserializeOwned>(response: RawResponse) -> Result<T, HttpError> {
    if !(200..300).contains(&response.status) {
        return Err(HttpError::Status {
            status: StatusCode::from_u16(response.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: response.body,
        });
    }
    serde_json::from_str::<T>(&response.body).map_err(|err| HttpError::Parse {
        source: err,
        body: response.body,
    })
}

pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: shared_client().clone(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn into_raw(response: reqwest::Response) -> Result<RawResponse, HttpError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(HttpError::Request)?;
    Ok(RawResponse { status, body })
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_form_raw(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<RawResponse, HttpError> {
        let response = self
            .client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(HttpError::Request)?;
        into_raw(response).await
    }

    async fn post_json_raw(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<RawResponse, HttpError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(HttpError::Request)?;
        into_raw(response).await
    }

    async fn get_raw(&self, url: &str, bearer: Option<&str>) -> Result<RawResponse, HttpError> {
        let mut request = self.client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(HttpError::Request)?;
        into_raw(response).await
    }
}
