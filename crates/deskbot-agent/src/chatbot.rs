// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-ticket conversational flow.
//!
//! A free-form message that reads like a problem report gets an AI answer
//! plus an offer to open a ticket. The ticket is created only after the user
//! confirms.

use std::sync::Arc;

use chrono::Utc;
use deskbot_audit::{AuditDraft, RunAuditLog};
use deskbot_core::error::UNAVAILABLE_MESSAGE;
use deskbot_core::types::{AuditFlow, AuthorKind, NewTicket};
use deskbot_core::{DeskbotError, TenantId, TicketId, TicketStore, UserId};
use deskbot_router::classifier::{self, Intent};
use deskbot_router::{ChainError, ResponderChain};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::directive::DirectiveParser;
use crate::prompt::chat_prompt;
use crate::session::{
    ConversationKey, ConversationSession, ConversationStateStore, PendingAction, SessionMessage,
};
use crate::settings::{store_error, EngineSettings};

const CONFIRMATION_QUESTION: &str = "Deseja que eu abra um chamado para este problema?";
const REPROMPT: &str =
    "Desculpe, não entendi. Deseja que eu abra um chamado para este problema? Responda \"Sim\" ou \"Não\".";
const DECLINED: &str = "Tudo bem, não vou abrir um chamado. Posso ajudar com mais alguma coisa?";
const FALLBACK_TITLE: &str = "Solicitação de suporte";
const TITLE_MAX_WORDS: usize = 10;
const TITLE_MAX_CHARS: usize = 60;

/// Reply of the chatbot flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatBotReply {
    pub reply_text: String,
    /// Quick answers the client may render as buttons.
    pub suggestions: Vec<String>,
    pub awaiting_confirmation: bool,
    pub created_ticket_id: Option<TicketId>,
}

impl ChatBotReply {
    fn text(reply_text: impl Into<String>) -> Self {
        Self {
            reply_text: reply_text.into(),
            suggestions: Vec::new(),
            awaiting_confirmation: false,
            created_ticket_id: None,
        }
    }

    fn confirmation(reply_text: impl Into<String>) -> Self {
        Self {
            reply_text: reply_text.into(),
            suggestions: vec!["Sim".to_string(), "Não".to_string()],
            awaiting_confirmation: true,
            created_ticket_id: None,
        }
    }
}

pub struct ChatBotSession {
    chain: ResponderChain,
    store: Arc<dyn TicketStore>,
    sessions: Arc<ConversationStateStore>,
    audit: RunAuditLog,
    parser: Arc<dyn DirectiveParser>,
    system_prompt: String,
    settings: EngineSettings,
}

impl ChatBotSession {
    pub fn new(
        chain: ResponderChain,
        store: Arc<dyn TicketStore>,
        sessions: Arc<ConversationStateStore>,
        audit: RunAuditLog,
        parser: Arc<dyn DirectiveParser>,
        system_prompt: String,
        settings: EngineSettings,
    ) -> Self {
        Self {
            chain,
            store,
            sessions,
            audit,
            parser,
            system_prompt,
            settings,
        }
    }

    pub async fn process_freeform_message(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        text: &str,
        ticket_id: Option<TicketId>,
        cancel: &CancellationToken,
    ) -> Result<ChatBotReply, DeskbotError> {
        let text = self.settings.validate_message(text)?;
        let key = ConversationKey::new(tenant_id, user_id, ticket_id);
        let mut session = self
            .sessions
            .get(&key)
            .unwrap_or_else(|| ConversationSession::new(Utc::now()));
        if session.linked_ticket.is_none() {
            session.linked_ticket = ticket_id;
        }

        if session.awaiting_confirmation {
            return self.handle_confirmation(key, session, text, cancel).await;
        }

        let intent = classifier::classify(text);
        session.push(AuthorKind::Customer, text);
        session.last_interaction = Utc::now();

        let prompt = chat_prompt(&self.system_prompt, &session.messages);
        let draft = AuditDraft::new(tenant_id, ticket_id, key.to_string(), AuditFlow::Chatbot, &prompt);
        let result = self.chain.respond(&prompt, cancel).await;
        self.audit.record_chain(draft, result.as_ref()).await;

        let chain = match result {
            Ok(chain) => chain,
            Err(ChainError::Cancelled { .. }) => return Err(DeskbotError::Cancelled),
            Err(ChainError::Exhausted { .. }) => {
                self.sessions.put(key, session);
                return Ok(ChatBotReply::text(UNAVAILABLE_MESSAGE));
            }
        };
        if cancel.is_cancelled() {
            return Err(DeskbotError::Cancelled);
        }
        let answer = self.parser.parse(&chain.response.text, text).clean_text;

        let offer_ticket = intent.warrants_ticket() && session.linked_ticket.is_none();
        let reply = if offer_ticket {
            session.awaiting_confirmation = true;
            session.pending_action = Some(PendingAction::CreateTicket {
                trigger_message: text.to_string(),
            });
            session.topic = match intent {
                Intent::ProblemReport { topic } => topic,
                _ => classifier::detect_topic(text),
            };
            debug!(key = %key, topic = ?session.topic, "offering ticket creation");
            ChatBotReply::confirmation(format!("{answer}\n\n{CONFIRMATION_QUESTION}"))
        } else {
            ChatBotReply::text(answer)
        };

        session.push(AuthorKind::Ai, reply.reply_text.clone());
        self.sessions.put(key, session);
        Ok(reply)
    }

    async fn handle_confirmation(
        &self,
        key: ConversationKey,
        mut session: ConversationSession,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ChatBotReply, DeskbotError> {
        let reply = match classifier::confirmation(text) {
            Some(true) => {
                let trigger = match &session.pending_action {
                    Some(PendingAction::CreateTicket { trigger_message }) => trigger_message.clone(),
                    None => session
                        .messages
                        .iter()
                        .rev()
                        .find(|m| m.author == AuthorKind::Customer)
                        .map(|m| m.text.clone())
                        .unwrap_or_default(),
                };
                let spec = NewTicket {
                    tenant_id: key.tenant_id,
                    requester_id: key.user_id,
                    title: ticket_title(&trigger),
                    description: transcript(&session.messages),
                    category_id: session
                        .topic
                        .map_or(self.settings.default_category_id, |t| t.category_id()),
                    priority_id: self.settings.default_priority_id,
                };
                let ticket = self
                    .store
                    .create_ticket(spec, cancel)
                    .await
                    .map_err(store_error)?;
                info!(
                    ticket_id = %ticket.id,
                    tenant_id = %ticket.tenant_id,
                    category_id = ticket.category_id,
                    "ticket created from chatbot conversation"
                );

                let greeting = format!(
                    "Olá! Recebemos seu chamado #{} e já estamos analisando. Você pode acompanhar e responder por aqui.",
                    ticket.id
                );
                if let Err(e) = self
                    .store
                    .append_interaction(ticket.id, AuthorKind::Ai, &greeting, None, cancel)
                    .await
                {
                    error!(ticket_id = %ticket.id, error = %e, "failed to persist greeting interaction");
                }

                session.linked_ticket = Some(ticket.id);
                session.settle();
                ChatBotReply {
                    created_ticket_id: Some(ticket.id),
                    ..ChatBotReply::text(format!(
                        "Pronto! Abri o chamado #{}: \"{}\". Um atendente dará continuidade por lá.",
                        ticket.id, ticket.title
                    ))
                }
            }
            Some(false) => {
                session.settle();
                ChatBotReply::text(DECLINED)
            }
            None => ChatBotReply::confirmation(REPROMPT),
        };

        session.push(AuthorKind::Customer, text);
        session.push(AuthorKind::Ai, reply.reply_text.clone());
        session.last_interaction = Utc::now();
        self.sessions.put(key, session);
        Ok(reply)
    }
}

/// First words of the triggering message, capped in length.
pub fn ticket_title(message: &str) -> String {
    let joined = message
        .split_whitespace()
        .take(TITLE_MAX_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    let title: String = joined.chars().take(TITLE_MAX_CHARS).collect();
    let title = title.trim_end();
    if title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title.to_string()
    }
}

/// Conversation rendered as labelled lines.
pub fn transcript(messages: &[SessionMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            let label = match m.author {
                AuthorKind::Customer => "Usuário",
                AuthorKind::Ai => "Assistente",
                AuthorKind::Human => "Atendente",
            };
            format!("{label}: {}", m.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
