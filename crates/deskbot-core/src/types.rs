// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the adapter traits and the triage engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a tenant (customer organisation).
    TenantId
);
id_newtype!(
    /// Identifier of a user within a tenant.
    UserId
);
id_newtype!(
    /// Identifier of a support ticket.
    TicketId
);
id_newtype!(
    /// Identifier of a ticket interaction.
    InteractionId
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Responder,
    TicketStore,
    AuditSink,
}

/// Ticket lifecycle status. Numeric codes are the ones used by the
/// `[STATUS:n]` directive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open = 1,
    InProgress = 2,
    Pending = 3,
    Resolved = 4,
    Closed = 5,
    Cancelled = 6,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 6] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Pending,
        TicketStatus::Resolved,
        TicketStatus::Closed,
        TicketStatus::Cancelled,
    ];

    /// Numeric status code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Maps a numeric code back to a status. Unknown codes yield `None`.
    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| u64::from(s.code()) == code)
    }

    /// Whether the AI engine may read or mutate a ticket in this status.
    ///
    /// `InProgress` means a human agent has claimed the ticket.
    pub fn is_ai_eligible(self) -> bool {
        !matches!(
            self,
            TicketStatus::Resolved
                | TicketStatus::Closed
                | TicketStatus::Cancelled
                | TicketStatus::InProgress
        )
    }
}

/// Who authored an interaction or a session message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuthorKind {
    Customer,
    Ai,
    Human,
}

/// A support ticket as owned by the [`TicketStore`](crate::TicketStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub tenant_id: TenantId,
    pub requester_id: UserId,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub category_id: i64,
    pub priority_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Specification for a ticket to be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    pub tenant_id: TenantId,
    pub requester_id: UserId,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub priority_id: i64,
}

/// Provenance attached to AI-authored interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMetadata {
    pub model: String,
    pub confidence: f32,
    pub reasoning_summary: Option<String>,
}

/// One immutable message in a ticket's conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub ticket_id: TicketId,
    pub author: AuthorKind,
    pub text: String,
    pub ai_meta: Option<AiMetadata>,
    pub created_at: DateTime<Utc>,
}

/// A user known to the ticket store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub name: String,
    pub email: String,
}

/// Role of a turn inside a provider prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    User,
    Assistant,
}

/// One turn of conversation history sent to a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTurn {
    pub role: PromptRole,
    pub text: String,
}

impl PromptTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            text: text.into(),
        }
    }
}

/// A provider-agnostic prompt: system instructions plus ordered history.
///
/// The last turn is always the message being answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub turns: Vec<PromptTurn>,
}

impl Prompt {
    /// Text of the most recent user turn, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == PromptRole::User)
            .map(|t| t.text.as_str())
    }

    /// Flattens the prompt into a single string (used for hashing and by
    /// backends that accept only plain text).
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(
            self.system.len() + self.turns.iter().map(|t| t.text.len() + 12).sum::<usize>(),
        );
        out.push_str("system: ");
        out.push_str(&self.system);
        for turn in &self.turns {
            out.push('\n');
            out.push_str(&turn.role.to_string());
            out.push_str(": ");
            out.push_str(&turn.text);
        }
        out
    }
}

/// The result of a successful provider call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub provider: String,
    pub model: String,
    pub text: String,
    pub confidence: f32,
    pub reasoning_summary: Option<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: f64,
}

/// Which engine flow triggered an AI invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditFlow {
    Ticket,
    Chatbot,
}

/// Outcome of one AI invocation as seen by the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The first enabled provider answered.
    Completed,
    /// A later provider answered after earlier ones failed.
    Fallback,
    /// No provider answered.
    Exhausted,
    /// The caller cancelled the turn.
    Cancelled,
}

/// Provenance of one AI invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub tenant_id: TenantId,
    pub ticket_id: Option<TicketId>,
    pub conversation_key: String,
    pub flow: AuditFlow,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub prompt_hash: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub latency_ms: u64,
    pub cost_usd: f64,
    pub outcome: AuditOutcome,
    /// Ordered `provider:error_kind` trail of failed attempts.
    pub attempts: Vec<String>,
    pub created_at: DateTime<Utc>,
}
