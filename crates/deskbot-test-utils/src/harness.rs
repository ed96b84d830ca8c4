// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine tests.
//!
//! `TestHarness` assembles a complete [`Engine`] over a
//! [`RecordingTicketStore`] and a [`RecordingAuditSink`], with scripted
//! responders in place of real providers.

use std::sync::Arc;

use deskbot_agent::{ChatBotReply, Engine, EngineSettings, TurnOutcome};
use deskbot_audit::RunAuditLog;
use deskbot_core::types::{AuthorKind, Ticket, TicketStatus};
use deskbot_core::{AiResponder, DeskbotError, StoreError, TenantId, TicketId, UserId};
use tokio_util::sync::CancellationToken;

use crate::recording_sink::RecordingAuditSink;
use crate::recording_store::RecordingTicketStore;
use crate::scripted_responder::ScriptedResponder;

/// Tenant used by harness helpers.
pub const TENANT: TenantId = TenantId(1);
/// Requester used by harness helpers.
pub const USER: UserId = UserId(100);

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responders: Vec<Arc<dyn AiResponder>>,
    settings: EngineSettings,
    system_prompt: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responders: Vec::new(),
            settings: EngineSettings::default(),
            system_prompt: "Você é um assistente de testes.".to_string(),
        }
    }

    /// Appends a responder to the chain.
    pub fn with_responder(mut self, responder: Arc<dyn AiResponder>) -> Self {
        self.responders.push(responder);
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Builds the harness. Without explicit responders, a single
    /// [`ScriptedResponder`] named `primary` is used.
    pub fn build(self) -> TestHarness {
        let responders = if self.responders.is_empty() {
            vec![Arc::new(ScriptedResponder::new("primary")) as Arc<dyn AiResponder>]
        } else {
            self.responders
        };
        let store = Arc::new(RecordingTicketStore::new());
        let audit = Arc::new(RecordingAuditSink::new());

        let engine = Engine::builder(store.clone())
            .settings(self.settings)
            .system_prompt(self.system_prompt)
            .responders(responders)
            .audit(RunAuditLog::new(audit.clone()))
            .build();

        TestHarness {
            engine,
            store,
            audit,
            cancel: CancellationToken::new(),
        }
    }
}

/// A complete engine with recording adapters.
pub struct TestHarness {
    pub engine: Engine,
    pub store: Arc<RecordingTicketStore>,
    pub audit: Arc<RecordingAuditSink>,
    /// Token passed by the helper methods.
    pub cancel: CancellationToken,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Seeds a ticket for [`TENANT`]/[`USER`] in `status`.
    pub async fn open_ticket(&self, title: &str, status: TicketStatus) -> Result<Ticket, StoreError> {
        self.store
            .seed_ticket(TENANT, USER, title, &format!("{title} (descrição)"), status)
            .await
    }

    /// Stores the customer's interaction, as the embedding application
    /// would, then runs the AI turn.
    pub async fn customer_says(
        &self,
        ticket_id: TicketId,
        text: &str,
    ) -> Result<TurnOutcome, DeskbotError> {
        self.store
            .seed_interaction(ticket_id, AuthorKind::Customer, text)
            .await?;
        self.engine
            .process_customer_message(ticket_id, TENANT, text, &self.cancel)
            .await
    }

    pub async fn chat(&self, text: &str) -> Result<ChatBotReply, DeskbotError> {
        self.engine
            .process_freeform_message(TENANT, USER, text, None, &self.cancel)
            .await
    }

    pub async fn status_of(&self, ticket_id: TicketId) -> Option<TicketStatus> {
        self.store.ticket(ticket_id).await.map(|t| t.status)
    }
}
