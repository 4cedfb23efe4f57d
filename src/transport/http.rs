//! reqwest-backed transport for the Ollama generate API.

use super::{DeliveryError, Transport};
use crate::protocol::{Endpoint, GenerateRequest, GenerateResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Sends generate requests over HTTP.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose attempts each give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn generate(
        &self,
        endpoint: &Endpoint,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, DeliveryError> {
        let url = endpoint.generate_url();
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(classify)?;
        serde_json::from_str(&body).map_err(|e| DeliveryError::MalformedBody(e.to_string()))
    }
}

/// Map a reqwest failure onto the delivery taxonomy.
fn classify(error: reqwest::Error) -> DeliveryError {
    if error.is_timeout() {
        DeliveryError::Timeout
    } else if error.is_decode() {
        DeliveryError::MalformedBody(error.to_string())
    } else {
        DeliveryError::Connection(error.to_string())
    }
}
