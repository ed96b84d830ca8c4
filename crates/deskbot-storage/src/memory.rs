// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use deskbot_core::traits::{PluginAdapter, TicketStore};
use deskbot_core::types::{
    AdapterType, AiMetadata, AuthorKind, HealthStatus, Interaction, InteractionId, NewTicket,
    TenantId, Ticket, TicketId, TicketStatus, User, UserId,
};
use deskbot_core::{DeskbotError, StoreError};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Default)]
struct State {
    tickets: BTreeMap<TicketId, Ticket>,
    interactions: HashMap<TicketId, Vec<Interaction>>,
    users: HashMap<UserId, User>,
    last_ticket_id: i64,
    last_interaction_id: i64,
}

/// Ticket store holding everything behind one async `RwLock`.
#[derive(Default)]
pub struct MemoryTicketStore {
    state: RwLock<State>,
}

fn check(cancel: &CancellationToken) -> Result<(), StoreError> {
    if cancel.is_cancelled() {
        Err(StoreError::Cancelled)
    } else {
        Ok(())
    }
}

fn ticket_not_found(id: TicketId) -> StoreError {
    StoreError::NotFound {
        entity: "ticket",
        id: id.to_string(),
    }
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a user.
    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Tickets opened by `requester` within `tenant`, oldest first.
    pub async fn tickets_for(&self, tenant: TenantId, requester: UserId) -> Vec<Ticket> {
        self.state
            .read()
            .await
            .tickets
            .values()
            .filter(|t| t.tenant_id == tenant && t.requester_id == requester)
            .cloned()
            .collect()
    }

    pub async fn ticket_count(&self) -> usize {
        self.state.read().await.tickets.len()
    }
}

#[async_trait]
impl PluginAdapter for MemoryTicketStore {
    fn name(&self) -> &str {
        "memory"
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
impl TicketStore for MemoryTicketStore {
    async fn get_ticket(
        &self,
        id: TicketId,
        cancel: &CancellationToken,
    ) -> Result<Option<Ticket>, StoreError> {
        check(cancel)?;
        Ok(self.state.read().await.tickets.get(&id).cloned())
    }

    async fn list_interactions(
        &self,
        ticket_id: TicketId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Interaction>, StoreError> {
        check(cancel)?;
        let state = self.state.read().await;
        if !state.tickets.contains_key(&ticket_id) {
            return Err(ticket_not_found(ticket_id));
        }
        Ok(state
            .interactions
            .get(&ticket_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_interaction(
        &self,
        ticket_id: TicketId,
        author: AuthorKind,
        text: &str,
        ai_meta: Option<AiMetadata>,
        cancel: &CancellationToken,
    ) -> Result<Interaction, StoreError> {
        check(cancel)?;
        let mut state = self.state.write().await;
        if !state.tickets.contains_key(&ticket_id) {
            return Err(ticket_not_found(ticket_id));
        }
        state.last_interaction_id += 1;
        let interaction = Interaction {
            id: InteractionId(state.last_interaction_id),
            ticket_id,
            author,
            text: text.to_string(),
            ai_meta,
            created_at: Utc::now(),
        };
        state
            .interactions
            .entry(ticket_id)
            .or_default()
            .push(interaction.clone());
        debug!(ticket_id = %ticket_id, author = %author, "interaction appended");
        Ok(interaction)
    }

    async fn set_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        acting_user: UserId,
        cancel: &CancellationToken,
    ) -> Result<Ticket, StoreError> {
        check(cancel)?;
        let mut state = self.state.write().await;
        let ticket = state
            .tickets
            .get_mut(&ticket_id)
            .ok_or_else(|| ticket_not_found(ticket_id))?;
        let from = ticket.status;
        ticket.status = status;
        debug!(ticket_id = %ticket_id, %from, to = %status, acting_user = %acting_user, "status changed");
        Ok(ticket.clone())
    }

    async fn create_ticket(
        &self,
        spec: NewTicket,
        cancel: &CancellationToken,
    ) -> Result<Ticket, StoreError> {
        check(cancel)?;
        let mut state = self.state.write().await;
        state.last_ticket_id += 1;
        let ticket = Ticket {
            id: TicketId(state.last_ticket_id),
            tenant_id: spec.tenant_id,
            requester_id: spec.requester_id,
            title: spec.title,
            description: spec.description,
            status: TicketStatus::Open,
            category_id: spec.category_id,
            priority_id: spec.priority_id,
            created_at: Utc::now(),
        };
        state.tickets.insert(ticket.id, ticket.clone());
        debug!(ticket_id = %ticket.id, tenant_id = %ticket.tenant_id, "ticket created");
        Ok(ticket)
    }

    async fn get_user(
        &self,
        id: UserId,
        cancel: &CancellationToken,
    ) -> Result<Option<User>, StoreError> {
        check(cancel)?;
        Ok(self.state.read().await.users.get(&id).cloned())
    }
}
