// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible responder for the Deskbot triage engine.
//!
//! Talks to any server exposing `POST {base_url}/chat/completions`, which
//! makes it the secondary entry of the default fallback chain.

pub mod client;
pub mod pricing;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use deskbot_config::model::OpenAiConfig;
use deskbot_core::traits::{AiResponder, PluginAdapter};
use deskbot_core::types::{AdapterType, AiResponse, HealthStatus, Prompt};
use deskbot_core::{AiError, DeskbotError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest};

pub const KEY_PREFIX: &str = "sk-";
pub const KEY_ENV_VAR: &str = "OPENAI_API_KEY";

pub struct OpenAiResponder {
    client: Option<OpenAiClient>,
    model: String,
    max_tokens: u32,
}

impl OpenAiResponder {
    /// Key resolution: `openai.api_key`, then `OPENAI_API_KEY`. Keys not
    /// starting with `sk-` are skipped; with none left the responder is
    /// disabled.
    pub fn new(config: &OpenAiConfig) -> Result<Self, DeskbotError> {
        let env_key = std::env::var(KEY_ENV_VAR).ok();
        let client = match resolve_api_key(config.api_key.as_deref(), env_key.as_deref()) {
            Some(key) => {
                info!(model = %config.model, base_url = %config.base_url, "openai responder initialized");
                Some(OpenAiClient::new(
                    key,
                    &config.base_url,
                    Duration::from_secs(config.timeout_secs),
                    config.max_retries,
                )?)
            }
            None => {
                info!("openai responder disabled: no valid API key");
                None
            }
        };

        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn with_client(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            model: model.into(),
            max_tokens: 1024,
        }
    }

    fn to_chat_request(&self, prompt: &Prompt) -> ChatRequest {
        let system = (!prompt.system.is_empty()).then(|| ChatMessage {
            role: "system".into(),
            content: prompt.system.clone(),
        });
        let messages = system
            .into_iter()
            .chain(prompt.turns.iter().map(|t| ChatMessage {
                role: t.role.to_string(),
                content: t.text.clone(),
            }))
            .collect();
        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
        }
    }

    async fn call(&self, client: &OpenAiClient, prompt: &Prompt) -> Result<AiResponse, AiError> {
        let response = client.complete(&self.to_chat_request(prompt)).await?;

        let text = match response.first_text() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => {
                return Err(AiError::EmptyResponse {
                    provider: "openai".to_string(),
                });
            }
        };
        let confidence = match response.finish_reason() {
            Some("length") => 0.55,
            _ => 0.8,
        };
        let model = response.model.clone().unwrap_or_else(|| self.model.clone());
        let usage = response.usage.unwrap_or_default();
        let cost_usd = pricing::calculate_cost(
            usage.prompt_tokens,
            usage.completion_tokens,
            pricing::get_pricing(&model),
        );
        debug!(model, cost_usd, "openai reply received");

        Ok(AiResponse {
            provider: "openai".to_string(),
            model,
            text,
            confidence,
            reasoning_summary: None,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            cost_usd,
        })
    }
}

#[async_trait]
impl PluginAdapter for OpenAiResponder {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Responder
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskbotError> {
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy("no valid API key".into()),
        })
    }
}

#[async_trait]
impl AiResponder for OpenAiResponder {
    fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn respond(
        &self,
        prompt: &Prompt,
        cancel: &CancellationToken,
    ) -> Result<AiResponse, AiError> {
        let Some(client) = &self.client else {
            return Err(AiError::Unauthorized {
                provider: "openai".to_string(),
                message: "responder is disabled".to_string(),
            });
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AiError::Cancelled),
            result = self.call(client, prompt) => result,
        }
    }
}

/// First key, config before env, that carries the `sk-` prefix.
fn resolve_api_key<'a>(config_key: Option<&'a str>, env_key: Option<&'a str>) -> Option<&'a str> {
    [config_key, env_key]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|k| k.starts_with(KEY_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskbot_core::PromptTurn;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn responder_for(server: &MockServer) -> OpenAiResponder {
        let client =
            OpenAiClient::new("sk-test", &server.uri(), Duration::from_secs(5), 0).unwrap();
        OpenAiResponder::with_client(client, "gpt-4o-mini")
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "Seja breve.".into(),
            turns: vec![
                PromptTurn::user("O e-mail não sincroniza"),
                PromptTurn::assistant("Qual cliente de e-mail?"),
                PromptTurn::user("Outlook"),
            ],
        }
    }

    #[test]
    fn system_prompt_leads_the_message_list() {
        let responder = OpenAiResponder::with_client(
            OpenAiClient::new("sk-x", "http://h", Duration::from_secs(1), 0).unwrap(),
            "gpt-4o-mini",
        );
        let request = responder.to_chat_request(&prompt());
        let roles: Vec<_> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant", "user"]);
    }

    #[test]
    fn key_must_carry_sk_prefix() {
        assert_eq!(resolve_api_key(Some("pk-live-123"), None), None);
        assert_eq!(resolve_api_key(Some("pk-live-123"), Some("sk-env")), Some("sk-env"));
        assert_eq!(resolve_api_key(Some(" sk-cfg "), Some("sk-env")), Some("sk-cfg"));

        let config = OpenAiConfig {
            api_key: Some("sk-proj-abc".into()),
            ..OpenAiConfig::default()
        };
        assert!(OpenAiResponder::new(&config).unwrap().is_enabled());
    }

    #[tokio::test]
    async fn respond_maps_usage_and_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{"message": {"content": "Remova e adicione a conta novamente."}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 40, "completion_tokens": 9}
            })))
            .mount(&server)
            .await;

        let response = responder_for(&server)
            .respond(&prompt(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.provider, "openai");
        assert_eq!(response.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(response.input_tokens, 40);
        assert!(response.cost_usd > 0.0);
    }

    #[tokio::test]
    async fn null_content_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": null}, "finish_reason": "tool_calls"}]
            })))
            .mount(&server)
            .await;

        let err = responder_for(&server)
            .respond(&prompt(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "empty_response");
    }

    #[tokio::test]
    async fn no_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let err = responder_for(&server)
            .respond(&prompt(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "empty_response");
    }

    #[tokio::test]
    async fn rate_limit_surfaces_as_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = responder_for(&server)
            .respond(&prompt(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "rate_limited");
    }
}
