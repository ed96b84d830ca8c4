// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort recording of AI invocations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use deskbot_core::traits::{AuditSink, PluginAdapter};
use deskbot_core::types::{
    AdapterType, AuditEntry, AuditFlow, AuditOutcome, HealthStatus, TenantId, TicketId,
};
use deskbot_core::{DeskbotError, Prompt};
use deskbot_router::{ChainError, ChainResponse};
use tracing::warn;

use crate::hash::prompt_hash;

/// The parts of an [`AuditEntry`] known before the responder chain runs.
#[derive(Debug, Clone)]
pub struct AuditDraft {
    pub tenant_id: TenantId,
    pub ticket_id: Option<TicketId>,
    pub conversation_key: String,
    pub flow: AuditFlow,
    pub prompt_hash: String,
}

impl AuditDraft {
    pub fn new(
        tenant_id: TenantId,
        ticket_id: Option<TicketId>,
        conversation_key: impl Into<String>,
        flow: AuditFlow,
        prompt: &Prompt,
    ) -> Self {
        Self {
            tenant_id,
            ticket_id,
            conversation_key: conversation_key.into(),
            flow,
            prompt_hash: prompt_hash(prompt),
        }
    }

    /// Completes the draft with the chain's result.
    pub fn finish(self, result: Result<&ChainResponse, &ChainError>) -> AuditEntry {
        let (outcome, attempts, latency) = match result {
            Ok(chain) => {
                let outcome = if chain.fell_back() {
                    AuditOutcome::Fallback
                } else {
                    AuditOutcome::Completed
                };
                (outcome, chain.attempts.clone(), chain.latency)
            }
            Err(ChainError::Exhausted { attempts, latency }) => {
                (AuditOutcome::Exhausted, attempts.clone(), *latency)
            }
            Err(ChainError::Cancelled { attempts, latency }) => {
                (AuditOutcome::Cancelled, attempts.clone(), *latency)
            }
        };
        let response = result.ok().map(|chain| &chain.response);

        AuditEntry {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id,
            ticket_id: self.ticket_id,
            conversation_key: self.conversation_key,
            flow: self.flow,
            provider: response.map(|r| r.provider.clone()),
            model: response.map(|r| r.model.clone()),
            prompt_hash: self.prompt_hash,
            input_tokens: response.map_or(0, |r| r.input_tokens),
            output_tokens: response.map_or(0, |r| r.output_tokens),
            latency_ms: duration_ms(latency),
            cost_usd: response.map_or(0.0, |r| r.cost_usd),
            outcome,
            attempts,
            created_at: Utc::now(),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Front of the audit pipeline used by the engine.
///
/// Sink failures never reach the caller: they are logged at warn.
#[derive(Clone)]
pub struct RunAuditLog {
    sink: Arc<dyn AuditSink>,
}

impl RunAuditLog {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// An audit log that discards everything.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopAuditSink))
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    pub async fn record(&self, entry: &AuditEntry) {
        if let Err(e) = self.sink.record(entry).await {
            warn!(
                entry_id = %entry.id,
                sink = self.sink.name(),
                error = %e,
                "audit record failed"
            );
        }
    }

    /// Builds the entry from `draft` and `result`, then records it.
    pub async fn record_chain(
        &self,
        draft: AuditDraft,
        result: Result<&ChainResponse, &ChainError>,
    ) -> AuditEntry {
        let entry = draft.finish(result);
        self.record(&entry).await;
        entry
    }
}

/// Sink used when `audit.enabled = false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

#[async_trait]
impl PluginAdapter for NoopAuditSink {
    fn name(&self) -> &str {
        "noop-audit"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AuditSink
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _entry: &AuditEntry) -> Result<(), DeskbotError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskbot_core::{AiResponse, PromptTurn};
    use tracing_test::traced_test;

    struct FailingSink;

    #[async_trait]
    impl PluginAdapter for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 1)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::AuditSink
        }
        async fn health_check(&self) -> Result<HealthStatus, DeskbotError> {
            Ok(HealthStatus::Unhealthy("always fails".into()))
        }
    }

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn record(&self, _entry: &AuditEntry) -> Result<(), DeskbotError> {
            Err(DeskbotError::Internal("disk full".into()))
        }
    }

    fn draft() -> AuditDraft {
        let prompt = Prompt {
            system: "sys".into(),
            turns: vec![PromptTurn::user("a impressora travou")],
        };
        AuditDraft::new(TenantId(1), Some(TicketId(9)), "1:2:9", AuditFlow::Ticket, &prompt)
    }

    fn chain_response(attempts: Vec<String>) -> ChainResponse {
        ChainResponse {
            response: AiResponse {
                provider: "openai".into(),
                model: "gpt-4o-mini".into(),
                text: "ok".into(),
                confidence: 0.8,
                reasoning_summary: None,
                input_tokens: 12,
                output_tokens: 3,
                cost_usd: 0.0001,
            },
            attempts,
            latency: Duration::from_millis(420),
        }
    }

    #[test]
    fn success_after_failure_is_fallback() {
        let chain = chain_response(vec!["anthropic:rate_limited".into()]);
        let entry = draft().finish(Ok(&chain));
        assert_eq!(entry.outcome, AuditOutcome::Fallback);
        assert_eq!(entry.provider.as_deref(), Some("openai"));
        assert_eq!(entry.input_tokens, 12);
        assert_eq!(entry.latency_ms, 420);
    }

    #[test]
    fn first_try_success_is_completed() {
        let entry = draft().finish(Ok(&chain_response(Vec::new())));
        assert_eq!(entry.outcome, AuditOutcome::Completed);
    }

    #[test]
    fn exhaustion_has_no_provider() {
        let err = ChainError::Exhausted {
            attempts: vec!["anthropic:unauthorized".into(), "openai:unreachable".into()],
            latency: Duration::from_millis(5),
        };
        let entry = draft().finish(Err(&err));
        assert_eq!(entry.outcome, AuditOutcome::Exhausted);
        assert_eq!(entry.provider, None);
        assert_eq!(entry.cost_usd, 0.0);
        assert_eq!(entry.attempts.len(), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn sink_failure_is_swallowed_and_logged() {
        let log = RunAuditLog::new(Arc::new(FailingSink));
        let entry = log.record_chain(draft(), Ok(&chain_response(Vec::new()))).await;
        assert_eq!(entry.flow, AuditFlow::Ticket);
        assert!(logs_contain("audit record failed"));
        assert!(logs_contain("disk full"));
    }

    #[tokio::test]
    async fn disabled_log_accepts_everything() {
        let log = RunAuditLog::disabled();
        assert_eq!(log.sink_name(), "noop-audit");
        log.record_chain(draft(), Ok(&chain_response(Vec::new()))).await;
    }
}
