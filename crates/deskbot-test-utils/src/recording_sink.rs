// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit sink that keeps every entry in memory.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use deskbot_core::traits::{AuditSink, PluginAdapter};
use deskbot_core::types::{AdapterType, AuditEntry, HealthStatus};
use deskbot_core::DeskbotError;

#[derive(Default)]
pub struct RecordingAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
    fail: AtomicBool,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }

    /// Makes every subsequent `record` fail (entries are not kept).
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for RecordingAuditSink {
    fn name(&self) -> &str {
        "recording-audit"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AuditSink
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), DeskbotError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeskbotError::Internal("injected audit failure".to_string()));
        }
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }
}
