// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI turn orchestration for existing tickets.
//!
//! One turn: load and guard the ticket, rebuild the conversation, call the
//! responder chain, interpret directives and scope, apply at most one status
//! change and one linked ticket, persist the reply, commit the session.

use std::sync::Arc;

use chrono::Utc;
use deskbot_audit::{AuditDraft, RunAuditLog};
use deskbot_core::error::UNAVAILABLE_MESSAGE;
use deskbot_core::types::{
    AiMetadata, AuditFlow, AuthorKind, NewTicket, Ticket, TicketStatus,
};
use deskbot_core::{DeskbotError, EligibilityError, StoreError, TenantId, TicketId, TicketStore};
use deskbot_router::classifier::fingerprint;
use deskbot_router::{ChainError, ResponderChain};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::directive::{ActionSet, DirectiveParser, LinkedTicketSpec};
use crate::prompt::ticket_prompt;
use crate::scope::{decorate_reply, ScopeGuard, ScopeVerdict};
use crate::session::{ConversationKey, ConversationSession, ConversationStateStore};
use crate::settings::{store_error, EngineSettings};

/// Result of one ticket turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// `false` when no responder could answer.
    pub success: bool,
    pub reply_text: String,
    pub status_changed: bool,
    /// The status applied in this turn, if any.
    pub new_status: Option<TicketStatus>,
}

impl TurnOutcome {
    fn unavailable() -> Self {
        Self {
            success: false,
            reply_text: UNAVAILABLE_MESSAGE.to_string(),
            status_changed: false,
            new_status: None,
        }
    }
}

/// Drives AI replies and status transitions on tickets.
pub struct TicketLifecycleController {
    chain: ResponderChain,
    store: Arc<dyn TicketStore>,
    sessions: Arc<ConversationStateStore>,
    audit: RunAuditLog,
    parser: Arc<dyn DirectiveParser>,
    scope: ScopeGuard,
    system_prompt: String,
    settings: EngineSettings,
}

impl TicketLifecycleController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: ResponderChain,
        store: Arc<dyn TicketStore>,
        sessions: Arc<ConversationStateStore>,
        audit: RunAuditLog,
        parser: Arc<dyn DirectiveParser>,
        scope: ScopeGuard,
        system_prompt: String,
        settings: EngineSettings,
    ) -> Self {
        Self {
            chain,
            store,
            sessions,
            audit,
            parser,
            scope,
            system_prompt,
            settings,
        }
    }

    /// First AI reply on a freshly created ticket. The title and description
    /// stand in for the customer's opening message.
    pub async fn process_new_ticket(
        &self,
        ticket_id: TicketId,
        tenant_id: TenantId,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, DeskbotError> {
        let ticket = self.load_eligible(ticket_id, tenant_id, cancel).await?;
        let opening = format!("{}\n\n{}", ticket.title.trim(), ticket.description.trim());
        self.run_turn(ticket, opening.trim().to_string(), cancel).await
    }

    /// AI reply to a customer message on an existing ticket.
    ///
    /// The caller is expected to have stored the customer's interaction;
    /// only the AI reply is appended here.
    pub async fn process_customer_message(
        &self,
        ticket_id: TicketId,
        tenant_id: TenantId,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, DeskbotError> {
        let text = self.settings.validate_message(text)?.to_string();
        let ticket = self.load_eligible(ticket_id, tenant_id, cancel).await?;
        self.run_turn(ticket, text, cancel).await
    }

    async fn load_eligible(
        &self,
        ticket_id: TicketId,
        tenant_id: TenantId,
        cancel: &CancellationToken,
    ) -> Result<Ticket, DeskbotError> {
        let ticket = self
            .store
            .get_ticket(ticket_id, cancel)
            .await
            .map_err(store_error)?
            .filter(|t| t.tenant_id == tenant_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "ticket",
                id: ticket_id.to_string(),
            })?;

        if !ticket.status.is_ai_eligible() {
            debug!(ticket_id = %ticket_id, status = %ticket.status, "ticket not eligible for AI");
            return Err(EligibilityError {
                ticket_id,
                status: ticket.status,
            }
            .into());
        }
        Ok(ticket)
    }

    /// Live session for the ticket, or a fresh one seeded from the stored
    /// interactions younger than the session TTL. Older history stays out
    /// so an idle conversation restarts its violation count.
    async fn load_session(
        &self,
        key: &ConversationKey,
        ticket_id: TicketId,
        cancel: &CancellationToken,
    ) -> Result<ConversationSession, DeskbotError> {
        if let Some(session) = self.sessions.get(key) {
            return Ok(session);
        }
        let interactions = self
            .store
            .list_interactions(ticket_id, cancel)
            .await
            .map_err(store_error)?;
        let now = Utc::now();
        let ttl = self.sessions.ttl();
        let mut session = ConversationSession::new(now);
        session.linked_ticket = Some(ticket_id);
        for interaction in interactions
            .into_iter()
            .filter(|i| now - i.created_at <= ttl)
        {
            session.push(interaction.author, interaction.text);
        }
        debug!(key = %key, seeded = session.messages.len(), "session seeded from recent interactions");
        Ok(session)
    }

    async fn run_turn(
        &self,
        ticket: Ticket,
        customer_text: String,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, DeskbotError> {
        let key = ConversationKey::new(ticket.tenant_id, ticket.requester_id, Some(ticket.id));
        let mut session = self.load_session(&key, ticket.id, cancel).await?;

        let already_seeded = session.last_message().is_some_and(|m| {
            m.author == AuthorKind::Customer && fingerprint(&m.text) == fingerprint(&customer_text)
        });
        if !already_seeded {
            session.push(AuthorKind::Customer, customer_text.clone());
        }
        session.last_interaction = Utc::now();

        let prompt = ticket_prompt(&self.system_prompt, &ticket, &session.messages);
        let draft = AuditDraft::new(
            ticket.tenant_id,
            Some(ticket.id),
            key.to_string(),
            AuditFlow::Ticket,
            &prompt,
        );
        let result = self.chain.respond(&prompt, cancel).await;
        self.audit.record_chain(draft, result.as_ref()).await;

        let chain = match result {
            Ok(chain) => chain,
            Err(ChainError::Cancelled { .. }) => return Err(DeskbotError::Cancelled),
            Err(ChainError::Exhausted { attempts, .. }) => {
                error!(
                    ticket_id = %ticket.id,
                    attempts = %attempts.join(","),
                    "no responder available for ticket turn"
                );
                self.sessions.put(key, session);
                return Ok(TurnOutcome::unavailable());
            }
        };
        if cancel.is_cancelled() {
            return Err(DeskbotError::Cancelled);
        }
        let response = chain.response;

        let parsed = self.parser.parse(&response.text, &customer_text);
        let verdict = self.scope.evaluate(&parsed.clean_text, &session.messages);
        let reply_text = decorate_reply(verdict, &parsed.clean_text);
        let target = resolve_status(&ticket, verdict, &parsed.actions);

        if let Some(status) = target {
            self.store
                .set_status(ticket.id, status, self.settings.ai_user_id, cancel)
                .await
                .map_err(store_error)?;
            info!(
                ticket_id = %ticket.id,
                from = %ticket.status,
                to = %status,
                ?verdict,
                "ticket status changed by AI"
            );
        }

        if let Some(spec) = parsed.actions.new_linked_ticket {
            self.create_linked_ticket(&ticket, spec, cancel).await;
        }

        let meta = AiMetadata {
            model: response.model.clone(),
            confidence: response.confidence,
            reasoning_summary: response.reasoning_summary.clone(),
        };
        if let Err(e) = self
            .store
            .append_interaction(ticket.id, AuthorKind::Ai, &reply_text, Some(meta), cancel)
            .await
        {
            error!(ticket_id = %ticket.id, error = %e, "failed to persist AI interaction");
        }

        session.push(AuthorKind::Ai, reply_text.clone());
        session.last_interaction = Utc::now();
        self.sessions.put(key, session);

        debug!(
            ticket_id = %ticket.id,
            provider = response.provider.as_str(),
            model = response.model.as_str(),
            "ticket turn completed"
        );

        Ok(TurnOutcome {
            success: true,
            reply_text,
            status_changed: target.is_some(),
            new_status: target,
        })
    }

    async fn create_linked_ticket(
        &self,
        parent: &Ticket,
        spec: LinkedTicketSpec,
        cancel: &CancellationToken,
    ) {
        let new_ticket = NewTicket {
            tenant_id: parent.tenant_id,
            requester_id: parent.requester_id,
            title: spec.title,
            description: spec.description,
            category_id: spec.category_id.unwrap_or(parent.category_id),
            priority_id: spec.priority_id.unwrap_or(parent.priority_id),
        };
        match self.store.create_ticket(new_ticket, cancel).await {
            Ok(linked) => {
                info!(ticket_id = %parent.id, linked_ticket_id = %linked.id, "linked ticket created");
            }
            Err(e) => {
                warn!(ticket_id = %parent.id, error = %e, "linked ticket creation failed");
            }
        }
    }
}

/// Status to apply this turn.
///
/// Forced closure beats human escalation, which beats the AI's own
/// directive. A directive naming the current status is a no-op.
fn resolve_status(
    ticket: &Ticket,
    verdict: ScopeVerdict,
    actions: &ActionSet,
) -> Option<TicketStatus> {
    if verdict == ScopeVerdict::ForceClose {
        return Some(TicketStatus::Closed);
    }
    if actions.human_requested && ticket.status == TicketStatus::Pending {
        return Some(TicketStatus::InProgress);
    }
    actions.new_status.filter(|s| *s != ticket.status)
}
