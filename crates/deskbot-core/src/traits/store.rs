// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket persistence contract consumed by the engine.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AiMetadata, AuthorKind, Interaction, NewTicket, Ticket, TicketId, TicketStatus, User, UserId,
};

/// Persistence of tickets, interactions, and users.
///
/// Every call accepts a cancellation token; implementations should return
/// [`StoreError::Cancelled`] without side effects once it fires.
#[async_trait]
pub trait TicketStore: PluginAdapter {
    async fn get_ticket(
        &self,
        id: TicketId,
        cancel: &CancellationToken,
    ) -> Result<Option<Ticket>, StoreError>;

    /// Interactions of a ticket in creation order.
    async fn list_interactions(
        &self,
        ticket_id: TicketId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Interaction>, StoreError>;

    async fn append_interaction(
        &self,
        ticket_id: TicketId,
        author: AuthorKind,
        text: &str,
        ai_meta: Option<AiMetadata>,
        cancel: &CancellationToken,
    ) -> Result<Interaction, StoreError>;

    async fn set_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        acting_user: UserId,
        cancel: &CancellationToken,
    ) -> Result<Ticket, StoreError>;

    async fn create_ticket(
        &self,
        spec: NewTicket,
        cancel: &CancellationToken,
    ) -> Result<Ticket, StoreError>;

    async fn get_user(
        &self,
        id: UserId,
        cancel: &CancellationToken,
    ) -> Result<Option<User>, StoreError>;
}
