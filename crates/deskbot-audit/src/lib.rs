// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provenance of AI invocations for the Deskbot triage engine.
//!
//! [`RunAuditLog`] turns responder-chain results into [`AuditEntry`]
//! records and hands them to an [`AuditSink`](deskbot_core::AuditSink),
//! swallowing sink failures. [`SqliteAuditLog`] is the persistent sink.
//!
//! [`AuditEntry`]: deskbot_core::types::AuditEntry

pub mod hash;
pub mod log;
pub mod sqlite;

pub use hash::prompt_hash;
pub use log::{AuditDraft, NoopAuditSink, RunAuditLog};
pub use sqlite::{SqliteAuditLog, TenantTotals};
