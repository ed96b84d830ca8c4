// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational ticket-triage engine.
//!
//! [`Engine`] bundles the upward operations:
//!
//! - [`Engine::process_new_ticket`] and [`Engine::process_customer_message`]
//!   drive the [`TicketLifecycleController`] on existing tickets.
//! - [`Engine::process_freeform_message`] drives the pre-ticket
//!   [`ChatBotSession`].
//!
//! Both share one [`ConversationStateStore`], one responder chain and one
//! audit log.

pub mod chatbot;
pub mod directive;
pub mod engine;
pub mod lifecycle;
pub mod prompt;
pub mod scope;
pub mod session;
pub mod settings;

pub use chatbot::{ChatBotReply, ChatBotSession};
pub use directive::{ActionSet, DirectiveParser, LinkedTicketSpec, ParsedReply, TagDirectiveParser};
pub use engine::{Engine, EngineBuilder};
pub use lifecycle::{TicketLifecycleController, TurnOutcome};
pub use scope::{ScopeGuard, ScopeVerdict, OUT_OF_SCOPE_MARKER};
pub use session::{ConversationKey, ConversationSession, ConversationStateStore, SessionMessage};
pub use settings::EngineSettings;
