// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine facade: the three upward operations behind one handle.

use std::sync::Arc;

use deskbot_anthropic::AnthropicResponder;
use deskbot_audit::{RunAuditLog, SqliteAuditLog};
use deskbot_config::model::DeskbotConfig;
use deskbot_core::{AiResponder, DeskbotError, TenantId, TicketId, TicketStore, UserId};
use deskbot_openai::OpenAiResponder;
use deskbot_router::{HeuristicResponder, ResponderChain};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chatbot::{ChatBotReply, ChatBotSession};
use crate::directive::{DirectiveParser, TagDirectiveParser};
use crate::lifecycle::{TicketLifecycleController, TurnOutcome};
use crate::prompt::load_system_prompt;
use crate::scope::ScopeGuard;
use crate::session::ConversationStateStore;
use crate::settings::EngineSettings;

/// Builds the responders named in `providers.order`, in that order.
pub fn build_responders(config: &DeskbotConfig) -> Result<Vec<Arc<dyn AiResponder>>, DeskbotError> {
    config
        .providers
        .order
        .iter()
        .map(|name| -> Result<Arc<dyn AiResponder>, DeskbotError> {
            match name.as_str() {
                "anthropic" => Ok(Arc::new(AnthropicResponder::new(&config.anthropic)?)),
                "openai" => Ok(Arc::new(OpenAiResponder::new(&config.openai)?)),
                "heuristic" => Ok(Arc::new(HeuristicResponder::new())),
                other => Err(DeskbotError::Config(format!("unknown provider `{other}`"))),
            }
        })
        .collect()
}

/// Opens the configured audit sink, or a no-op one when disabled.
pub async fn open_audit_log(config: &DeskbotConfig) -> Result<RunAuditLog, DeskbotError> {
    if !config.audit.enabled {
        return Ok(RunAuditLog::disabled());
    }
    let sink = SqliteAuditLog::open(&config.audit.database_path).await?;
    Ok(RunAuditLog::new(Arc::new(sink)))
}

/// Builder for [`Engine`]. Unset parts fall back to the configured or
/// default ones.
pub struct EngineBuilder {
    store: Arc<dyn TicketStore>,
    settings: EngineSettings,
    system_prompt: Option<String>,
    responders: Vec<Arc<dyn AiResponder>>,
    audit: RunAuditLog,
    parser: Arc<dyn DirectiveParser>,
    scope: ScopeGuard,
}

impl EngineBuilder {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self {
            store,
            settings: EngineSettings::default(),
            system_prompt: None,
            responders: vec![Arc::new(HeuristicResponder::new())],
            audit: RunAuditLog::disabled(),
            parser: Arc::new(TagDirectiveParser::new()),
            scope: ScopeGuard::new(),
        }
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Responder chain, tried in the given order.
    pub fn responders(mut self, responders: Vec<Arc<dyn AiResponder>>) -> Self {
        self.responders = responders;
        self
    }

    pub fn audit(mut self, audit: RunAuditLog) -> Self {
        self.audit = audit;
        self
    }

    pub fn parser(mut self, parser: Arc<dyn DirectiveParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn scope_guard(mut self, scope: ScopeGuard) -> Self {
        self.scope = scope;
        self
    }

    pub fn build(self) -> Engine {
        let chain = ResponderChain::new(self.responders);
        let sessions = Arc::new(ConversationStateStore::new(self.settings.session_ttl));
        let system_prompt = self
            .system_prompt
            .unwrap_or_else(|| "Você é um assistente de suporte técnico de TI.".to_string());

        let lifecycle = TicketLifecycleController::new(
            chain.clone(),
            Arc::clone(&self.store),
            Arc::clone(&sessions),
            self.audit.clone(),
            Arc::clone(&self.parser),
            self.scope,
            system_prompt.clone(),
            self.settings.clone(),
        );
        let chatbot = ChatBotSession::new(
            chain.clone(),
            self.store,
            Arc::clone(&sessions),
            self.audit.clone(),
            self.parser,
            system_prompt,
            self.settings,
        );

        Engine {
            lifecycle,
            chatbot,
            sessions,
            chain,
            audit: self.audit,
        }
    }
}

/// The triage engine.
pub struct Engine {
    lifecycle: TicketLifecycleController,
    chatbot: ChatBotSession,
    sessions: Arc<ConversationStateStore>,
    chain: ResponderChain,
    audit: RunAuditLog,
}

impl Engine {
    pub fn builder(store: Arc<dyn TicketStore>) -> EngineBuilder {
        EngineBuilder::new(store)
    }

    /// Assembles an engine from configuration: responders in
    /// `providers.order`, the audit sink, and the system prompt.
    pub async fn from_config(
        config: &DeskbotConfig,
        store: Arc<dyn TicketStore>,
    ) -> Result<Self, DeskbotError> {
        let responders = build_responders(config)?;
        let enabled: Vec<&str> = responders
            .iter()
            .filter(|r| r.is_enabled())
            .map(|r| r.name())
            .collect();
        if enabled.is_empty() {
            warn!("no AI responder is enabled; every turn will report unavailability");
        }
        let audit = open_audit_log(config).await?;
        let system_prompt = load_system_prompt(&config.engine).await;

        info!(
            providers = %config.providers.order.join(","),
            enabled = %enabled.join(","),
            audit = audit.sink_name(),
            "engine initialized"
        );

        Ok(EngineBuilder::new(store)
            .settings(EngineSettings::from(&config.engine))
            .system_prompt(system_prompt)
            .responders(responders)
            .audit(audit)
            .build())
    }

    pub async fn process_new_ticket(
        &self,
        ticket_id: TicketId,
        tenant_id: TenantId,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, DeskbotError> {
        self.lifecycle
            .process_new_ticket(ticket_id, tenant_id, cancel)
            .await
    }

    pub async fn process_customer_message(
        &self,
        ticket_id: TicketId,
        tenant_id: TenantId,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, DeskbotError> {
        self.lifecycle
            .process_customer_message(ticket_id, tenant_id, text, cancel)
            .await
    }

    pub async fn process_freeform_message(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        text: &str,
        ticket_id: Option<TicketId>,
        cancel: &CancellationToken,
    ) -> Result<ChatBotReply, DeskbotError> {
        self.chatbot
            .process_freeform_message(tenant_id, user_id, text, ticket_id, cancel)
            .await
    }

    pub fn sessions(&self) -> &ConversationStateStore {
        &self.sessions
    }

    pub fn chain(&self) -> &ResponderChain {
        &self.chain
    }

    pub fn audit(&self) -> &RunAuditLog {
        &self.audit
    }

    /// Drops expired conversation sessions.
    pub fn purge_expired_sessions(&self) -> usize {
        self.sessions.purge_expired()
    }
}
