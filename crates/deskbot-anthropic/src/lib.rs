// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude responder for the Deskbot triage engine.
//!
//! Implements [`AiResponder`] over the Anthropic Messages API. This is the
//! primary entry of the default fallback chain.

pub mod client;
pub mod pricing;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use deskbot_config::model::AnthropicConfig;
use deskbot_core::traits::{AiResponder, PluginAdapter};
use deskbot_core::types::{AdapterType, AiResponse, HealthStatus, Prompt, PromptRole};
use deskbot_core::{AiError, DeskbotError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Prefix every valid Anthropic API key carries.
pub const KEY_PREFIX: &str = "sk-ant-";

/// Environment variable consulted when the config holds no key.
pub const KEY_ENV_VAR: &str = "ANTHROPIC_API_KEY";

/// Confidence reported for a reply that finished normally.
const CONFIDENCE_COMPLETE: f32 = 0.85;
/// Confidence reported for a reply cut off by `max_tokens`.
const CONFIDENCE_TRUNCATED: f32 = 0.6;

/// Anthropic Claude responder.
///
/// Without a usable API key the responder is constructed disabled and the
/// chain skips it.
pub struct AnthropicResponder {
    client: Option<AnthropicClient>,
    model: String,
    max_tokens: u32,
}

impl AnthropicResponder {
    /// Builds the responder from its config section.
    ///
    /// Key resolution: `anthropic.api_key`, then `ANTHROPIC_API_KEY`; the
    /// first one carrying the `sk-ant-` prefix wins. Without one the
    /// responder is disabled.
    pub fn new(config: &AnthropicConfig) -> Result<Self, DeskbotError> {
        let env_key = std::env::var(KEY_ENV_VAR).ok();
        let client = match resolve_api_key(config.api_key.as_deref(), env_key.as_deref()) {
            Some(key) => Some(AnthropicClient::new(
                key,
                &config.api_version,
                Duration::from_secs(config.timeout_secs),
                config.max_retries,
            )?),
            None => {
                info!("anthropic responder disabled: no valid API key");
                None
            }
        };

        if client.is_some() {
            info!(model = %config.model, "anthropic responder initialized");
        }

        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Creates a responder with an existing client (for testing).
    pub fn with_client(client: AnthropicClient, model: impl Into<String>) -> Self {
        Self {
            client: Some(client),
            model: model.into(),
            max_tokens: 1024,
        }
    }

    /// Converts a [`Prompt`] into an Anthropic [`MessageRequest`].
    fn to_message_request(&self, prompt: &Prompt) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            messages: to_api_messages(prompt),
            system: (!prompt.system.is_empty()).then(|| prompt.system.clone()),
            max_tokens: self.max_tokens,
        }
    }

    async fn call(&self, client: &AnthropicClient, prompt: &Prompt) -> Result<AiResponse, AiError> {
        let request = self.to_message_request(prompt);
        let response = client.complete_message(&request).await?;

        let text = response.text();
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse {
                provider: "anthropic".to_string(),
            });
        }

        let confidence = match response.stop_reason.as_deref() {
            Some("max_tokens") => CONFIDENCE_TRUNCATED,
            _ => CONFIDENCE_COMPLETE,
        };
        let cost_usd = pricing::calculate_cost(
            response.usage.input_tokens,
            response.usage.output_tokens,
            pricing::get_pricing(&response.model),
        );
        debug!(
            id = %response.id,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            cost_usd,
            "anthropic reply received"
        );

        Ok(AiResponse {
            provider: "anthropic".to_string(),
            model: response.model,
            text,
            confidence,
            reasoning_summary: None,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
            cost_usd,
        })
    }
}

#[async_trait]
impl PluginAdapter for AnthropicResponder {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Responder
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskbotError> {
        // No API call: health checks must not consume tokens.
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy("no valid API key".into()),
        })
    }
}

#[async_trait]
impl AiResponder for AnthropicResponder {
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
                provider: "anthropic".to_string(),
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

/// Picks the first key with the Anthropic prefix.
fn resolve_api_key<'a>(config_key: Option<&'a str>, env_key: Option<&'a str>) -> Option<&'a str> {
    [config_key, env_key]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| key.starts_with(KEY_PREFIX))
}

/// Maps prompt turns onto the alternating user/assistant sequence the API
/// requires: leading assistant turns are dropped and consecutive turns of
/// the same role are merged.
fn to_api_messages(prompt: &Prompt) -> Vec<ApiMessage> {
    let mut messages: Vec<ApiMessage> = Vec::with_capacity(prompt.turns.len());
    for turn in prompt
        .turns
        .iter()
        .skip_while(|t| t.role == PromptRole::Assistant)
    {
        let role = turn.role.to_string();
        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&turn.text);
            }
            _ => messages.push(ApiMessage {
                role,
                content: turn.text.clone(),
            }),
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskbot_core::PromptTurn;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prompt(turns: Vec<PromptTurn>) -> Prompt {
        Prompt {
            system: "Você é o assistente de suporte.".into(),
            turns,
        }
    }

    fn responder_for(server: &MockServer) -> AnthropicResponder {
        let client =
            AnthropicClient::new("sk-ant-test", "2023-06-01", Duration::from_secs(5), 0)
                .unwrap()
                .with_base_url(server.uri());
        AnthropicResponder::with_client(client, "claude-sonnet-4-20250514")
    }

    #[test]
    fn key_resolution_prefers_config_then_env() {
        assert_eq!(resolve_api_key(Some("sk-ant-a"), Some("sk-ant-b")), Some("sk-ant-a"));
        assert_eq!(resolve_api_key(Some(""), Some("sk-ant-b")), Some("sk-ant-b"));
        assert_eq!(resolve_api_key(None, Some("sk-ant-b")), Some("sk-ant-b"));
        assert_eq!(resolve_api_key(None, None), None);
    }

    #[test]
    fn malformed_key_disables() {
        assert_eq!(resolve_api_key(Some("sk-proj-123"), None), None);
        assert_eq!(resolve_api_key(Some("garbage"), None), None);
    }

    #[test]
    fn malformed_config_key_falls_back_to_env() {
        assert_eq!(resolve_api_key(Some("garbage"), Some("sk-ant-b")), Some("sk-ant-b"));
        assert_eq!(resolve_api_key(Some("  "), Some(" sk-ant-b ")), Some("sk-ant-b"));
    }

    #[test]
    fn config_without_key_builds_disabled_responder() {
        if std::env::var(KEY_ENV_VAR).is_ok() {
            return;
        }
        let config = AnthropicConfig {
            api_key: Some("not-a-key".into()),
            ..AnthropicConfig::default()
        };
        let responder = AnthropicResponder::new(&config).unwrap();
        assert!(!responder.is_enabled());
    }

    #[test]
    fn turns_are_merged_and_alternating() {
        let p = prompt(vec![
            PromptTurn::assistant("Olá! Como posso ajudar?"),
            PromptTurn::user("A impressora travou"),
            PromptTurn::user("e não imprime"),
            PromptTurn::assistant("Já tentou reiniciar?"),
            PromptTurn::user("Sim"),
        ]);
        let messages = to_api_messages(&p);
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "user"]);
        assert_eq!(messages[0].content, "A impressora travou\n\ne não imprime");
    }

    #[tokio::test]
    async fn respond_fills_cost_and_confidence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "Tente reconectar a VPN. [STATUS:3]"}],
                "model": "claude-sonnet-4-20250514",
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 1000, "output_tokens": 500}
            })))
            .mount(&server)
            .await;

        let response = responder_for(&server)
            .respond(
                &prompt(vec![PromptTurn::user("VPN caiu")]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(response.provider, "anthropic");
        assert_eq!(response.text, "Tente reconectar a VPN. [STATUS:3]");
        assert!((response.cost_usd - 0.0105).abs() < 1e-12);
        assert!((response.confidence - CONFIDENCE_COMPLETE).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn blank_completion_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_2",
                "content": [{"type": "text", "text": "   "}],
                "model": "claude-sonnet-4-20250514",
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 1, "output_tokens": 0}
            })))
            .mount(&server)
            .await;

        let err = responder_for(&server)
            .respond(&prompt(vec![PromptTurn::user("oi")]), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "empty_response");
    }

    #[tokio::test]
    async fn cancellation_wins_over_slow_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = responder_for(&server)
            .respond(&prompt(vec![PromptTurn::user("oi")]), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, AiError::Cancelled);
    }
}
