//! API client for the diabetes predictor service

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the predictor HTTP API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send_get(path).await?;
        let response = check_status(response).await?;
        response.json().await.context("Failed to parse response")
    }

    /// GET that also accepts 503, for health and readiness probes whose
    /// body is meaningful either way
    pub async fn get_probe<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send_get(path).await?;
        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return response.json().await.context("Failed to parse response");
        }
        let response = check_status(response).await?;
        response.json().await.context("Failed to parse response")
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.send_post(path, body).await?;
        let response = check_status(response).await?;
        response.json().await.context("Failed to parse response")
    }

    /// POST with JSON body, returning the raw response bytes
    pub async fn post_bytes<B: Serialize>(&self, path: &str, body: &B) -> Result<Vec<u8>> {
        let response = self.send_post(path, body).await?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await.context("Failed to read response")?;
        Ok(bytes.to_vec())
    }

    async fn send_get(&self, path: &str) -> Result<Response> {
        let url = self.base_url.join(path).context("Invalid path")?;
        self.client
            .get(url)
            .send()
            .await
            .context("Failed to send request")
    }

    async fn send_post<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        let url = self.base_url.join(path).context("Invalid path")?;
        self.client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")
    }
}

async fn check_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => anyhow::bail!("API error ({}): {} [{}]", status, err.error, err.code),
        Err(_) => anyhow::bail!("API error ({}): {}", status, body),
    }
}

// API response types not shared with the library

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub kind: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaView {
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
