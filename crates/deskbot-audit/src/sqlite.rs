// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed [`AuditSink`].
//!
//! Entries are written to the `audit_log` table, created on open. All
//! operations go through the single tokio-rusqlite background thread.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskbot_core::traits::{AuditSink, PluginAdapter};
use deskbot_core::types::{
    AdapterType, AuditEntry, AuditFlow, AuditOutcome, HealthStatus, TenantId, TicketId,
};
use deskbot_core::{DeskbotError, StoreError};
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS audit_log (
        id TEXT PRIMARY KEY NOT NULL,
        tenant_id INTEGER NOT NULL,
        ticket_id INTEGER,
        conversation_key TEXT NOT NULL,
        flow TEXT NOT NULL,
        provider TEXT,
        model TEXT,
        prompt_hash TEXT NOT NULL,
        input_tokens INTEGER NOT NULL DEFAULT 0,
        output_tokens INTEGER NOT NULL DEFAULT 0,
        latency_ms INTEGER NOT NULL DEFAULT 0,
        cost_usd REAL NOT NULL DEFAULT 0.0,
        outcome TEXT NOT NULL,
        attempts TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_audit_log_tenant ON audit_log(tenant_id);
    CREATE INDEX IF NOT EXISTS idx_audit_log_created ON audit_log(created_at);";

const COLUMNS: &str = "id, tenant_id, ticket_id, conversation_key, flow, provider, model, \
     prompt_hash, input_tokens, output_tokens, latency_ms, cost_usd, outcome, attempts, created_at";

/// Aggregate figures for one tenant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TenantTotals {
    pub invocations: u64,
    pub cost_usd: f64,
}

fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> DeskbotError {
    DeskbotError::Store(StoreError::Backend {
        message: format!("audit database: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Persistent audit log backed by SQLite.
pub struct SqliteAuditLog {
    conn: tokio_rusqlite::Connection,
}

impl SqliteAuditLog {
    /// Opens (creating if needed) the database file and its parent directory.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DeskbotError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DeskbotError::Store(StoreError::Backend {
                    message: format!("cannot create {}: {e}", parent.display()),
                    source: Some(Box::new(e)),
                })
            })?;
        }
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;
        Self::with_connection(conn).await
    }

    /// In-memory database, used by tests and by the shell when audit
    /// persistence is not wanted.
    pub async fn open_in_memory() -> Result<Self, DeskbotError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self, DeskbotError> {
        conn.call(|conn| conn.execute_batch(SCHEMA))
            .await
            .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Most recent entries first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, DeskbotError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM audit_log ORDER BY created_at DESC, rowid DESC LIMIT ?1"
                ))?;
                let entries = stmt
                    .query_map(rusqlite::params![limit], row_to_entry)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Invocation count and summed cost for a tenant.
    pub async fn tenant_totals(&self, tenant_id: TenantId) -> Result<TenantTotals, DeskbotError> {
        self.conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(cost_usd), 0.0) FROM audit_log WHERE tenant_id = ?1",
                    rusqlite::params![tenant_id.0],
                    |row| {
                        Ok(TenantTotals {
                            invocations: row.get::<_, i64>(0)?.max(0) as u64,
                            cost_usd: row.get(1)?,
                        })
                    },
                )
            })
            .await
            .map_err(map_tr_err)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let flow: String = row.get(4)?;
    let outcome: String = row.get(12)?;
    let attempts: String = row.get(13)?;
    let created_at: String = row.get(14)?;

    Ok(AuditEntry {
        id: row.get(0)?,
        tenant_id: TenantId(row.get(1)?),
        ticket_id: row.get::<_, Option<i64>>(2)?.map(TicketId),
        conversation_key: row.get(3)?,
        flow: AuditFlow::from_str(&flow).map_err(|e| conversion_error(4, e))?,
        provider: row.get(5)?,
        model: row.get(6)?,
        prompt_hash: row.get(7)?,
        input_tokens: row.get(8)?,
        output_tokens: row.get(9)?,
        latency_ms: row.get::<_, i64>(10)?.max(0) as u64,
        cost_usd: row.get(11)?,
        outcome: AuditOutcome::from_str(&outcome).map_err(|e| conversion_error(12, e))?,
        attempts: serde_json::from_str(&attempts).map_err(|e| conversion_error(13, e))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| conversion_error(14, e))?
            .with_timezone(&Utc),
    })
}

fn conversion_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

#[async_trait]
impl PluginAdapter for SqliteAuditLog {
    fn name(&self) -> &str {
        "sqlite-audit"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AuditSink
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskbotError> {
        let result = self
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get::<_, i64>(0)))
            .await;
        Ok(match result {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl AuditSink for SqliteAuditLog {
    async fn record(&self, entry: &AuditEntry) -> Result<(), DeskbotError> {
        let entry = entry.clone();
        let attempts = serde_json::to_string(&entry.attempts)
            .map_err(|e| DeskbotError::Internal(format!("cannot encode attempts: {e}")))?;
        let created_at = entry.created_at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        let latency_ms = i64::try_from(entry.latency_ms).unwrap_or(i64::MAX);
        let id = entry.id.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO audit_log ({COLUMNS}) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
                    ),
                    rusqlite::params![
                        entry.id,
                        entry.tenant_id.0,
                        entry.ticket_id.map(|t| t.0),
                        entry.conversation_key,
                        entry.flow.to_string(),
                        entry.provider,
                        entry.model,
                        entry.prompt_hash,
                        entry.input_tokens,
                        entry.output_tokens,
                        latency_ms,
                        entry.cost_usd,
                        entry.outcome.to_string(),
                        attempts,
                        created_at,
                    ],
                )
            })
            .await
            .map_err(map_tr_err)?;

        debug!(id, "audit entry recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tenant: i64, cost_usd: f64, outcome: AuditOutcome) -> AuditEntry {
        AuditEntry {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: TenantId(tenant),
            ticket_id: Some(TicketId(42)),
            conversation_key: format!("{tenant}:7:42"),
            flow: AuditFlow::Ticket,
            provider: Some("openai".into()),
            model: Some("gpt-4o-mini".into()),
            prompt_hash: "ab".repeat(32),
            input_tokens: 100,
            output_tokens: 20,
            latency_ms: 350,
            cost_usd,
            outcome,
            attempts: vec!["anthropic:unauthorized".into()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn record_and_read_back() {
        let log = SqliteAuditLog::open_in_memory().await.unwrap();
        let original = entry(1, 0.002, AuditOutcome::Fallback);
        log.record(&original).await.unwrap();

        let recent = log.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        let stored = &recent[0];
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.ticket_id, Some(TicketId(42)));
        assert_eq!(stored.outcome, AuditOutcome::Fallback);
        assert_eq!(stored.attempts, vec!["anthropic:unauthorized"]);
        assert_eq!(stored.latency_ms, 350);
    }

    #[tokio::test]
    async fn totals_are_per_tenant() {
        let log = SqliteAuditLog::open_in_memory().await.unwrap();
        log.record(&entry(1, 0.5, AuditOutcome::Completed)).await.unwrap();
        log.record(&entry(1, 0.25, AuditOutcome::Completed)).await.unwrap();
        log.record(&entry(2, 9.0, AuditOutcome::Completed)).await.unwrap();

        let totals = log.tenant_totals(TenantId(1)).await.unwrap();
        assert_eq!(totals.invocations, 2);
        assert!((totals.cost_usd - 0.75).abs() < 1e-10);

        let empty = log.tenant_totals(TenantId(99)).await.unwrap();
        assert_eq!(empty.invocations, 0);
        assert_eq!(empty.cost_usd, 0.0);
    }

    #[tokio::test]
    async fn exhausted_entry_without_provider_round_trips() {
        let log = SqliteAuditLog::open_in_memory().await.unwrap();
        let mut e = entry(3, 0.0, AuditOutcome::Exhausted);
        e.provider = None;
        e.model = None;
        e.ticket_id = None;
        log.record(&e).await.unwrap();

        let stored = log.recent(1).await.unwrap().remove(0);
        assert_eq!(stored.provider, None);
        assert_eq!(stored.ticket_id, None);
        assert_eq!(stored.outcome, AuditOutcome::Exhausted);
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/audit.db");
        let log = SqliteAuditLog::open(&path).await.unwrap();
        assert_eq!(log.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn recent_respects_limit() {
        let log = SqliteAuditLog::open_in_memory().await.unwrap();
        for _ in 0..5 {
            log.record(&entry(1, 0.1, AuditOutcome::Completed)).await.unwrap();
        }
        assert_eq!(log.recent(3).await.unwrap().len(), 3);
    }
}
