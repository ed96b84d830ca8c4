// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sink for AI invocation provenance records.

use async_trait::async_trait;

use crate::error::DeskbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::AuditEntry;

/// Destination for [`AuditEntry`] records.
///
/// Callers treat failures as non-fatal: they are logged and swallowed.
#[async_trait]
pub trait AuditSink: PluginAdapter {
    async fn record(&self, entry: &AuditEntry) -> Result<(), DeskbotError>;
}
