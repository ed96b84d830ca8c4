// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket store wrapper that counts mutations and injects failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use deskbot_core::traits::{PluginAdapter, TicketStore};
use deskbot_core::types::{
    AdapterType, AiMetadata, AuthorKind, HealthStatus, Interaction, NewTicket, TenantId, Ticket,
    TicketId, TicketStatus, User, UserId,
};
use deskbot_core::{DeskbotError, StoreError};
use deskbot_storage::MemoryTicketStore;

/// Wraps a [`MemoryTicketStore`]. Counters track calls made through the
/// [`TicketStore`] trait; the seeding helpers bypass them.
#[derive(Default)]
pub struct RecordingTicketStore {
    inner: MemoryTicketStore,
    set_status_calls: AtomicUsize,
    append_calls: AtomicUsize,
    create_calls: AtomicUsize,
    fail_set_status: AtomicBool,
    fail_append: AtomicBool,
    fail_create: AtomicBool,
}

fn injected(op: &str) -> StoreError {
    StoreError::backend(format!("injected {op} failure"))
}

impl RecordingTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryTicketStore {
        &self.inner
    }

    /// Creates a ticket directly in `status`, without touching the counters.
    pub async fn seed_ticket(
        &self,
        tenant_id: TenantId,
        requester_id: UserId,
        title: &str,
        description: &str,
        status: TicketStatus,
    ) -> Result<Ticket, StoreError> {
        let cancel = CancellationToken::new();
        let spec = NewTicket {
            tenant_id,
            requester_id,
            title: title.to_string(),
            description: description.to_string(),
            category_id: 1,
            priority_id: 2,
        };
        let ticket = self.inner.create_ticket(spec, &cancel).await?;
        if status == ticket.status {
            return Ok(ticket);
        }
        self.inner
            .set_status(ticket.id, status, requester_id, &cancel)
            .await
    }

    /// Appends an interaction without touching the counters.
    pub async fn seed_interaction(
        &self,
        ticket_id: TicketId,
        author: AuthorKind,
        text: &str,
    ) -> Result<Interaction, StoreError> {
        self.inner
            .append_interaction(ticket_id, author, text, None, &CancellationToken::new())
            .await
    }

    pub async fn ticket(&self, id: TicketId) -> Option<Ticket> {
        self.inner
            .get_ticket(id, &CancellationToken::new())
            .await
            .ok()
            .flatten()
    }

    pub async fn interactions(&self, id: TicketId) -> Vec<Interaction> {
        self.inner
            .list_interactions(id, &CancellationToken::new())
            .await
            .unwrap_or_default()
    }

    pub fn set_status_calls(&self) -> usize {
        self.set_status_calls.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn fail_set_status(&self, fail: bool) {
        self.fail_set_status.store(fail, Ordering::SeqCst);
    }

    pub fn fail_append(&self, fail: bool) {
        self.fail_append.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for RecordingTicketStore {
    fn name(&self) -> &str {
        "recording-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TicketStore
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl TicketStore for RecordingTicketStore {
    async fn get_ticket(
        &self,
        id: TicketId,
        cancel: &CancellationToken,
    ) -> Result<Option<Ticket>, StoreError> {
        self.inner.get_ticket(id, cancel).await
    }

    async fn list_interactions(
        &self,
        ticket_id: TicketId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Interaction>, StoreError> {
        self.inner.list_interactions(ticket_id, cancel).await
    }

    async fn append_interaction(
        &self,
        ticket_id: TicketId,
        author: AuthorKind,
        text: &str,
        ai_meta: Option<AiMetadata>,
        cancel: &CancellationToken,
    ) -> Result<Interaction, StoreError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(injected("append_interaction"));
        }
        self.inner
            .append_interaction(ticket_id, author, text, ai_meta, cancel)
            .await
    }

    async fn set_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        acting_user: UserId,
        cancel: &CancellationToken,
    ) -> Result<Ticket, StoreError> {
        self.set_status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_set_status.load(Ordering::SeqCst) {
            return Err(injected("set_status"));
        }
        self.inner
            .set_status(ticket_id, status, acting_user, cancel)
            .await
    }

    async fn create_ticket(
        &self,
        spec: NewTicket,
        cancel: &CancellationToken,
    ) -> Result<Ticket, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(injected("create_ticket"));
        }
        self.inner.create_ticket(spec, cancel).await
    }

    async fn get_user(
        &self,
        id: UserId,
        cancel: &CancellationToken,
    ) -> Result<Option<User>, StoreError> {
        self.inner.get_user(id, cancel).await
    }
}
