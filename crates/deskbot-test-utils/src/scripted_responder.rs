// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted AI responder for deterministic testing.
//!
//! Replies are popped from a FIFO queue. When the queue is empty the
//! fallback behavior applies: a fixed text, a fixed error, or waiting for
//! cancellation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use deskbot_core::traits::{AiResponder, PluginAdapter};
use deskbot_core::types::{AdapterType, AiResponse, HealthStatus, Prompt};
use deskbot_core::{AiError, DeskbotError};

/// Model name reported by scripted replies.
pub const SCRIPTED_MODEL: &str = "scripted-model";

enum Fallback {
    Text(String),
    Error(AiError),
    Hang,
}

pub struct ScriptedResponder {
    name: String,
    enabled: bool,
    script: Mutex<VecDeque<Result<String, AiError>>>,
    fallback: Fallback,
    calls: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedResponder {
    fn build(name: &str, enabled: bool, fallback: Fallback) -> Self {
        Self {
            name: name.to_string(),
            enabled,
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers "mock response" once the queue is empty.
    pub fn new(name: &str) -> Self {
        Self::build(name, true, Fallback::Text("mock response".to_string()))
    }

    /// Pre-loaded with successful replies.
    pub fn with_replies(name: &str, replies: &[&str]) -> Self {
        let mut responder = Self::new(name);
        responder
            .script
            .get_mut()
            .extend(replies.iter().map(|r| Ok(r.to_string())));
        responder
    }

    /// Always fails with `error`.
    pub fn failing(name: &str, error: AiError) -> Self {
        Self::build(name, true, Fallback::Error(error))
    }

    /// Reports itself disabled. Calling it anyway fails.
    pub fn disabled(name: &str) -> Self {
        Self::build(
            name,
            false,
            Fallback::Error(AiError::Unknown {
                provider: name.to_string(),
                message: "disabled responder called".to_string(),
            }),
        )
    }

    /// Never answers; returns [`AiError::Cancelled`] once cancelled.
    pub fn hanging(name: &str) -> Self {
        Self::build(name, true, Fallback::Hang)
    }

    pub async fn push_reply(&self, text: &str) {
        self.script.lock().await.push_back(Ok(text.to_string()));
    }

    pub async fn push_error(&self, error: AiError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Number of `respond` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn last_prompt(&self) -> Option<Prompt> {
        self.prompts.lock().await.last().cloned()
    }

    fn response(&self, text: String) -> AiResponse {
        AiResponse {
            provider: self.name.clone(),
            model: SCRIPTED_MODEL.to_string(),
            text,
            confidence: 0.9,
            reasoning_summary: Some("scripted".to_string()),
            input_tokens: 10,
            output_tokens: 5,
            cost_usd: 0.001,
        }
    }
}

#[async_trait]
impl PluginAdapter for ScriptedResponder {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Responder
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl AiResponder for ScriptedResponder {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn respond(
        &self,
        prompt: &Prompt,
        cancel: &CancellationToken,
    ) -> Result<AiResponse, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.clone());
        if cancel.is_cancelled() {
            return Err(AiError::Cancelled);
        }

        if let Some(next) = self.script.lock().await.pop_front() {
            return next.map(|text| self.response(text));
        }

        match &self.fallback {
            Fallback::Text(text) => Ok(self.response(text.clone())),
            Fallback::Error(error) => Err(error.clone()),
            Fallback::Hang => {
                cancel.cancelled().await;
                Err(AiError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_default() {
        let responder = ScriptedResponder::with_replies("p", &["one"]);
        let cancel = CancellationToken::new();
        let prompt = Prompt {
            system: String::new(),
            turns: vec![],
        };
        assert_eq!(responder.respond(&prompt, &cancel).await.unwrap().text, "one");
        assert_eq!(responder.respond(&prompt, &cancel).await.unwrap().text, "mock response");
        assert_eq!(responder.calls(), 2);
    }

    #[tokio::test]
    async fn hanging_responder_honors_cancellation() {
        let responder = ScriptedResponder::hanging("p");
        let cancel = CancellationToken::new();
        let prompt = Prompt {
            system: String::new(),
            turns: vec![],
        };
        let child = cancel.clone();
        tokio::spawn(async move { child.cancel() });
        assert_eq!(responder.respond(&prompt, &cancel).await, Err(AiError::Cancelled));
    }
}
