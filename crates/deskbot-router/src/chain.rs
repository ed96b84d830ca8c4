// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered fallback across [`AiResponder`]s.
//!
//! The order is fixed at construction. Disabled responders are skipped
//! silently; every [`AiError`] except cancellation moves on to the next
//! responder.

use std::sync::Arc;
use std::time::{Duration, Instant};

use deskbot_core::types::{AiResponse, Prompt};
use deskbot_core::{AiError, AiResponder};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A successful chain call.
#[derive(Debug, Clone)]
pub struct ChainResponse {
    pub response: AiResponse,
    /// `provider:error_kind` for each responder that failed first.
    pub attempts: Vec<String>,
    /// Wall time across all attempts.
    pub latency: Duration,
}

impl ChainResponse {
    /// Whether an earlier responder failed before this one answered.
    pub fn fell_back(&self) -> bool {
        !self.attempts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Every enabled responder failed (or none was enabled).
    #[error("all responders failed: [{}]", attempts.join(", "))]
    Exhausted {
        attempts: Vec<String>,
        latency: Duration,
    },

    #[error("responder chain cancelled")]
    Cancelled { attempts: Vec<String>, latency: Duration },
}

/// Responders tried in order until one answers.
#[derive(Clone)]
pub struct ResponderChain {
    responders: Vec<Arc<dyn AiResponder>>,
}

impl ResponderChain {
    pub fn new(responders: Vec<Arc<dyn AiResponder>>) -> Self {
        Self { responders }
    }

    /// Names in chain order.
    pub fn names(&self) -> Vec<&str> {
        self.responders.iter().map(|r| r.name()).collect()
    }

    pub fn responders(&self) -> &[Arc<dyn AiResponder>] {
        &self.responders
    }

    /// Whether at least one responder is enabled.
    pub fn has_enabled(&self) -> bool {
        self.responders.iter().any(|r| r.is_enabled())
    }

    pub async fn respond(
        &self,
        prompt: &Prompt,
        cancel: &CancellationToken,
    ) -> Result<ChainResponse, ChainError> {
        let started = Instant::now();
        let mut attempts = Vec::new();

        for responder in &self.responders {
            if cancel.is_cancelled() {
                return Err(ChainError::Cancelled {
                    attempts,
                    latency: started.elapsed(),
                });
            }
            if !responder.is_enabled() {
                debug!(provider = responder.name(), "responder disabled, skipping");
                continue;
            }

            match responder.respond(prompt, cancel).await {
                Ok(response) => {
                    if !attempts.is_empty() {
                        info!(
                            provider = responder.name(),
                            failed = %attempts.join(","),
                            "fallback responder answered"
                        );
                    }
                    return Ok(ChainResponse {
                        response,
                        attempts,
                        latency: started.elapsed(),
                    });
                }
                Err(AiError::Cancelled) => {
                    return Err(ChainError::Cancelled {
                        attempts,
                        latency: started.elapsed(),
                    });
                }
                Err(e) => {
                    warn!(provider = responder.name(), kind = e.kind(), error = %e, "responder failed, falling back");
                    attempts.push(format!("{}:{}", responder.name(), e.kind()));
                }
            }
        }

        warn!(attempts = %attempts.join(","), "responder chain exhausted");
        Err(ChainError::Exhausted {
            attempts,
            latency: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use deskbot_core::traits::PluginAdapter;
    use deskbot_core::types::{AdapterType, HealthStatus};
    use deskbot_core::{DeskbotError, PromptTurn};

    struct Stub {
        name: &'static str,
        enabled: bool,
        result: Result<&'static str, AiError>,
        calls: AtomicUsize,
    }

    impl Stub {
        fn new(name: &'static str, result: Result<&'static str, AiError>) -> Arc<Self> {
            Arc::new(Self {
                name,
                enabled: true,
                result,
                calls: AtomicUsize::new(0),
            })
        }

        fn disabled(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                enabled: false,
                result: Ok("should not be called"),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PluginAdapter for Stub {
        fn name(&self) -> &str {
            self.name
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 1)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Responder
        }
        async fn health_check(&self) -> Result<HealthStatus, DeskbotError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl AiResponder for Stub {
        fn is_enabled(&self) -> bool {
            self.enabled
        }

        async fn respond(
            &self,
            _prompt: &Prompt,
            _cancel: &CancellationToken,
        ) -> Result<AiResponse, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map(|text| AiResponse {
                provider: self.name.to_string(),
                model: format!("{}-model", self.name),
                text: text.to_string(),
                confidence: 0.5,
                reasoning_summary: None,
                input_tokens: 1,
                output_tokens: 1,
                cost_usd: 0.0,
            })
        }
    }

    fn prompt() -> Prompt {
        Prompt {
            system: String::new(),
            turns: vec![PromptTurn::user("oi")],
        }
    }

    fn unauthorized(provider: &str) -> AiError {
        AiError::Unauthorized {
            provider: provider.into(),
            message: "bad key".into(),
        }
    }

    #[tokio::test]
    async fn first_enabled_responder_answers() {
        let primary = Stub::new("primary", Ok("from primary"));
        let secondary = Stub::new("secondary", Ok("from secondary"));
        let chain = ResponderChain::new(vec![primary.clone(), secondary.clone()]);

        let result = chain.respond(&prompt(), &CancellationToken::new()).await.unwrap();
        assert_eq!(result.response.text, "from primary");
        assert!(!result.fell_back());
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unauthorized_primary_falls_back_transparently() {
        let primary = Stub::new("primary", Err(unauthorized("primary")));
        let secondary = Stub::new("secondary", Ok("from secondary"));
        let chain = ResponderChain::new(vec![primary, secondary]);

        let result = chain.respond(&prompt(), &CancellationToken::new()).await.unwrap();
        assert_eq!(result.response.provider, "secondary");
        assert_eq!(result.attempts, vec!["primary:unauthorized"]);
    }

    #[tokio::test]
    async fn disabled_responders_are_skipped_without_a_call() {
        let off = Stub::disabled("off");
        let on = Stub::new("on", Ok("hi"));
        let chain = ResponderChain::new(vec![off.clone(), on]);

        let result = chain.respond(&prompt(), &CancellationToken::new()).await.unwrap();
        assert_eq!(off.calls.load(Ordering::SeqCst), 0);
        assert!(result.attempts.is_empty());
    }

    #[tokio::test]
    async fn every_error_kind_falls_back() {
        let chain = ResponderChain::new(vec![
            Stub::new("a", Err(AiError::RateLimited { provider: "a".into(), message: String::new() })),
            Stub::new("b", Err(AiError::Unreachable { provider: "b".into(), message: String::new() })),
            Stub::new("c", Err(AiError::EmptyResponse { provider: "c".into() })),
            Stub::new("d", Err(AiError::Unknown { provider: "d".into(), message: String::new() })),
            Stub::new("e", Ok("finally")),
        ]);

        let result = chain.respond(&prompt(), &CancellationToken::new()).await.unwrap();
        assert_eq!(result.response.text, "finally");
        assert_eq!(
            result.attempts,
            vec!["a:rate_limited", "b:unreachable", "c:empty_response", "d:unknown"]
        );
    }

    #[tokio::test]
    async fn exhaustion_reports_the_trail() {
        let chain = ResponderChain::new(vec![
            Stub::new("a", Err(unauthorized("a"))),
            Stub::disabled("b"),
        ]);
        let err = chain.respond(&prompt(), &CancellationToken::new()).await.unwrap_err();
        match err {
            ChainError::Exhausted { attempts, .. } => assert_eq!(attempts, vec!["a:unauthorized"]),
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_or_all_disabled_chain_is_exhausted() {
        let chain = ResponderChain::new(vec![Stub::disabled("a")]);
        assert!(!chain.has_enabled());
        let err = chain.respond(&prompt(), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ChainError::Exhausted { ref attempts, .. } if attempts.is_empty()));
    }

    #[tokio::test]
    async fn cancellation_stops_the_chain() {
        let first = Stub::new("first", Err(AiError::Cancelled));
        let second = Stub::new("second", Ok("late"));
        let chain = ResponderChain::new(vec![first, second.clone()]);

        let err = chain.respond(&prompt(), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ChainError::Cancelled { .. }));
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pre_cancelled_token_calls_nothing() {
        let only = Stub::new("only", Ok("x"));
        let chain = ResponderChain::new(vec![only.clone()]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(chain.respond(&prompt(), &cancel).await.is_err());
        assert_eq!(only.calls.load(Ordering::SeqCst), 0);
    }
}
