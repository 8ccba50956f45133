//! HTTP client for the intent service's `POST /intent` endpoint.

use std::env;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use smartpay_core::{Classification, IntentRequest};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("intent service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("intent service request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct IntentClient {
    http: Client,
    base_url: String,
}

impl IntentClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Uses `AI_URL` when set, otherwise [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = env::var("AI_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn parse_intent(&self, text: &str) -> Result<Classification, ClientError> {
        let url = format!("{}/intent", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&IntentRequest::new(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let classification = response.json::<Classification>().await?;
        debug!(url = %url, intent = classification.intent().as_label(), "intent parsed");
        Ok(classification)
    }
}
