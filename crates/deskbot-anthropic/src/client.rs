// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Provides [`AnthropicClient`] which handles authentication headers, the
//! client-side timeout, transient error retry, and the mapping of HTTP
//! failures onto [`AiError`].

use std::time::Duration;

use deskbot_core::{AiError, DeskbotError};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// Endpoint of the Anthropic Messages API.
const API_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

const PROVIDER: &str = "anthropic";

/// HTTP client for Anthropic API communication.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    max_retries: u32,
    base_url: String,
}

impl AnthropicClient {
    /// Creates a client that authenticates with `api_key` and sends
    /// `anthropic-version: {api_version}` on every request.
    pub fn new(
        api_key: &str,
        api_version: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, DeskbotError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| DeskbotError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                DeskbotError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DeskbotError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the endpoint (for testing with wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sends a request and returns the full response.
    ///
    /// Transient statuses (429, 500, 503, 529) are retried up to
    /// `max_retries` times with a 1-second pause.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, AiError> {
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying anthropic request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(request)
                .send()
                .await
                .map_err(transport_error)?;

            let status = response.status();
            debug!(status = %status, attempt, "anthropic response received");

            if status.is_success() {
                let body = response.text().await.map_err(transport_error)?;
                return serde_json::from_str(&body).map_err(|e| AiError::Unknown {
                    provider: PROVIDER.to_string(),
                    message: format!("failed to parse API response: {e}"),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("{}: {}", api_err.error.type_, api_err.error.message),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(AiError::from_status(PROVIDER, status.as_u16(), message));
        }

        Err(AiError::Unreachable {
            provider: PROVIDER.to_string(),
            message: "request failed after retries".into(),
        })
    }
}

/// Connect failures, timeouts, and broken bodies all mean the provider
/// could not be reached.
fn transport_error(e: reqwest::Error) -> AiError {
    if e.is_decode() {
        AiError::Unknown {
            provider: PROVIDER.to_string(),
            message: format!("failed to read response body: {e}"),
        }
    } else {
        AiError::Unreachable {
            provider: PROVIDER.to_string(),
            message: format!("HTTP request failed: {e}"),
        }
    }
}

/// Returns true for HTTP status codes worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}
