// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completion servers.

use std::time::Duration;

use deskbot_core::{AiError, DeskbotError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

const PROVIDER: &str = "openai";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

impl OpenAiClient {
    /// Creates a client posting to `{base_url}/chat/completions` with a
    /// bearer token.
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, DeskbotError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| DeskbotError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DeskbotError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AiError> {
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying openai request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| AiError::Unreachable {
                    provider: PROVIDER.to_string(),
                    message: format!("HTTP request failed: {e}"),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "openai response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| AiError::Unreachable {
                    provider: PROVIDER.to_string(),
                    message: format!("failed to read response body: {e}"),
                })?;
                return serde_json::from_str(&body).map_err(|e| AiError::Unknown {
                    provider: PROVIDER.to_string(),
                    message: format!("failed to parse API response: {e}"),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if matches!(status.as_u16(), 429 | 500 | 503) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                continue;
            }

            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("API returned {status}: {body}"));
            return Err(AiError::from_status(PROVIDER, status.as_u16(), message));
        }

        Err(AiError::Unreachable {
            provider: PROVIDER.to_string(),
            message: "request failed after retries".into(),
        })
    }
}
