// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Deskbot triage engine.
//!
//! Provider failures ([`AiError`]) are caught by the responder chain and
//! trigger fallback; everything else is wrapped in [`DeskbotError`] and
//! surfaced to the caller of the engine operations.

use thiserror::Error;

use crate::types::{TicketId, TicketStatus};

/// User-visible text returned when every AI provider failed.
pub const UNAVAILABLE_MESSAGE: &str =
    "O assistente está temporariamente indisponível. Por favor, tente novamente em instantes.";

/// User-visible text returned when a ticket is no longer eligible for AI replies.
pub const HUMAN_REQUIRED_MESSAGE: &str =
    "Este chamado requer um atendente humano e não pode mais ser respondido pelo assistente virtual.";

/// Provider-level failure returned by an [`AiResponder`](crate::AiResponder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    /// Credentials were rejected (HTTP 401/403).
    #[error("{provider}: unauthorized: {message}")]
    Unauthorized { provider: String, message: String },

    /// The provider throttled the request (HTTP 429).
    #[error("{provider}: rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// Transport failure, timeout, or 5xx response.
    #[error("{provider}: unreachable: {message}")]
    Unreachable { provider: String, message: String },

    /// The provider answered successfully but produced no text.
    #[error("{provider}: empty response")]
    EmptyResponse { provider: String },

    /// Any other failure (unexpected status, undecodable body).
    #[error("{provider}: {message}")]
    Unknown { provider: String, message: String },

    /// The caller cancelled the request. Stops the fallback chain.
    #[error("request cancelled")]
    Cancelled,
}

impl AiError {
    /// Short, stable name of the error kind, used in audit trails.
    pub fn kind(&self) -> &'static str {
        match self {
            AiError::Unauthorized { .. } => "unauthorized",
            AiError::RateLimited { .. } => "rate_limited",
            AiError::Unreachable { .. } => "unreachable",
            AiError::EmptyResponse { .. } => "empty_response",
            AiError::Unknown { .. } => "unknown",
            AiError::Cancelled => "cancelled",
        }
    }

    /// Classifies a non-success HTTP status returned by a provider.
    pub fn from_status(provider: &str, status: u16, message: impl Into<String>) -> Self {
        let provider = provider.to_string();
        let message = message.into();
        match status {
            401 | 403 => AiError::Unauthorized { provider, message },
            429 => AiError::RateLimited { provider, message },
            500..=599 => AiError::Unreachable { provider, message },
            _ => AiError::Unknown { provider, message },
        }
    }
}

/// The ticket is in a status the AI must not touch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ticket {ticket_id} is {status} and requires a human agent")]
pub struct EligibilityError {
    pub ticket_id: TicketId,
    pub status: TicketStatus,
}

/// Malformed inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message is empty")]
    Empty,

    #[error("message has {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// Failure reported by a [`TicketStore`](crate::TicketStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity does not exist (or belongs to another tenant).
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Backend failure (database, network, serialization).
    #[error("store backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The caller cancelled the operation.
    #[error("store operation cancelled")]
    Cancelled,
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend {
            message: message.into(),
            source: None,
        }
    }
}

/// The primary error type returned by the engine operations.
#[derive(Debug, Error)]
pub enum DeskbotError {
    /// Configuration errors (invalid values, unusable provider setup).
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation was cancelled before it could commit.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DeskbotError {
    /// Text safe to show to an end user. Never leaks internal detail.
    pub fn user_message(&self) -> String {
        match self {
            DeskbotError::Eligibility(_) => HUMAN_REQUIRED_MESSAGE.to_string(),
            DeskbotError::Validation(ValidationError::Empty) => {
                "A mensagem não pode estar vazia.".to_string()
            }
            DeskbotError::Validation(ValidationError::TooLong { max, .. }) => {
                format!("A mensagem excede o limite de {max} caracteres.")
            }
            _ => UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}
