use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::wire::{
    ApplicationRecord, ApplicationsResponse, HealthResponse, PollResponse, TriggerResponse,
};

pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";

/// Only the connect phase is bounded. Poll requests are held open by the
/// server for as long as it likes, so there is no overall request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Thin wrapper over the loan application backend
///
/// Every call is a single request; retry and backoff policy belongs to the
/// caller (the sync loop owns its own cooldown).
#[derive(Debug, Clone)]
pub struct LoanAppClient {
    client: reqwest::Client,
    base_url: String,
}

impl LoanAppClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    /// Point the client at another backend, e.g. `http://10.0.0.5:8080/api`
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("LoanWatch/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the complete application list
    pub async fn list_applications(&self) -> Result<Vec<ApplicationRecord>> {
        let body = self.get_text("applications").await?;
        let response: ApplicationsResponse = serde_json::from_str(&body)?;
        let records = response.into_records();
        debug!("Fetched {} applications", records.len());
        Ok(records)
    }

    /// Issue one long-poll request
    ///
    /// Resolves when the server either has something to report or gives up
    /// waiting on its side.
    pub async fn poll(&self) -> Result<PollResponse> {
        let body = self.get_text("poll").await?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        Ok(PollResponse::from_value(&value))
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let body = self.get_text("health").await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Ask the backend to wake every pending poller
    pub async fn trigger_refresh(&self) -> Result<TriggerResponse> {
        let url = self.endpoint("trigger-refresh");
        let response = self.client.post(&url).send().await?;
        let body = Self::success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.endpoint(path);
        let response = self.client.get(&url).send().await?;
        Self::success_body(response).await
    }

    async fn success_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}
