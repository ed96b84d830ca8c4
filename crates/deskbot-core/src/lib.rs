// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Deskbot ticket-triage engine.
//!
//! This crate provides the error taxonomy, the domain types, and the adapter
//! traits through which the engine reaches its external collaborators: AI
//! providers, the ticket store, and the audit sink.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AiError, DeskbotError, EligibilityError, StoreError, ValidationError};
pub use types::{
    AdapterType, AiResponse, HealthStatus, Prompt, PromptRole, PromptTurn, TenantId, TicketId,
    TicketStatus, UserId,
};

pub use traits::{AiResponder, AuditSink, PluginAdapter, TicketStore};
