// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the engine's external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod audit;
pub mod responder;
pub mod store;

pub use adapter::PluginAdapter;
pub use audit::AuditSink;
pub use responder::AiResponder;
pub use store::TicketStore;
