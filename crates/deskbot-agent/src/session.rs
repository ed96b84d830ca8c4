// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation state with inactivity expiry.
//!
//! The store is a sharded concurrent map owned by the engine. A turn reads a
//! snapshot with [`ConversationStateStore::get`], works on it, and commits it
//! with [`ConversationStateStore::put`] once every side effect succeeded.
//! Concurrent turns for the same key are last-writer-wins.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use deskbot_core::types::{AuthorKind, TenantId, TicketId, UserId};
use deskbot_router::Topic;
use tracing::debug;

/// Identity of a conversation: `(tenant, user, ticket | 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub ticket_id: Option<TicketId>,
}

impl ConversationKey {
    pub fn new(tenant_id: TenantId, user_id: UserId, ticket_id: Option<TicketId>) -> Self {
        Self {
            tenant_id,
            user_id,
            ticket_id,
        }
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.tenant_id,
            self.user_id,
            self.ticket_id.map_or(0, |t| t.0)
        )
    }
}

/// One message remembered by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMessage {
    pub author: AuthorKind,
    pub text: String,
}

impl SessionMessage {
    pub fn new(author: AuthorKind, text: impl Into<String>) -> Self {
        Self {
            author,
            text: text.into(),
        }
    }
}

/// Action waiting for the user's yes/no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    CreateTicket { trigger_message: String },
}

#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub messages: Vec<SessionMessage>,
    pub linked_ticket: Option<TicketId>,
    pub last_interaction: DateTime<Utc>,
    pub awaiting_confirmation: bool,
    pub pending_action: Option<PendingAction>,
    pub topic: Option<Topic>,
}

impl ConversationSession {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            messages: Vec::new(),
            linked_ticket: None,
            last_interaction: now,
            awaiting_confirmation: false,
            pending_action: None,
            topic: None,
        }
    }

    pub fn push(&mut self, author: AuthorKind, text: impl Into<String>) {
        self.messages.push(SessionMessage::new(author, text));
    }

    pub fn last_message(&self) -> Option<&SessionMessage> {
        self.messages.last()
    }

    /// Whether the session has been idle for longer than `ttl` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.last_interaction > ttl
    }

    /// Clears any pending confirmation.
    pub fn settle(&mut self) {
        self.awaiting_confirmation = false;
        self.pending_action = None;
    }
}

/// Concurrent map from [`ConversationKey`] to [`ConversationSession`].
pub struct ConversationStateStore {
    sessions: DashMap<ConversationKey, ConversationSession>,
    ttl: TimeDelta,
}

impl ConversationStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Snapshot of the live session for `key`.
    pub fn get(&self, key: &ConversationKey) -> Option<ConversationSession> {
        self.get_at(key, Utc::now())
    }

    /// Like [`get`](Self::get) with an explicit clock. An expired session
    /// is removed and reported as absent.
    pub fn get_at(&self, key: &ConversationKey, now: DateTime<Utc>) -> Option<ConversationSession> {
        if self
            .sessions
            .remove_if(key, |_, s| s.is_expired(now, self.ttl))
            .is_some()
        {
            debug!(key = %key, "session expired");
            return None;
        }
        self.sessions.get(key).map(|s| s.clone())
    }

    /// Commits `session`, replacing whatever was stored for `key`.
    pub fn put(&self, key: ConversationKey, session: ConversationSession) {
        self.sessions.insert(key, session);
    }

    pub fn evict(&self, key: &ConversationKey) -> Option<ConversationSession> {
        self.sessions.remove(key).map(|(_, s)| s)
    }

    /// Drops every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now, self.ttl));
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            debug!(purged, "expired sessions purged");
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ticket: Option<i64>) -> ConversationKey {
        ConversationKey::new(TenantId(1), UserId(2), ticket.map(TicketId))
    }

    #[test]
    fn key_display_uses_zero_without_ticket() {
        assert_eq!(key(None).to_string(), "1:2:0");
        assert_eq!(key(Some(9)).to_string(), "1:2:9");
    }

    #[test]
    fn put_then_get() {
        let store = ConversationStateStore::new(Duration::from_secs(3600));
        let mut session = ConversationSession::new(Utc::now());
        session.push(AuthorKind::Customer, "oi");
        store.put(key(None), session);

        let loaded = store.get(&key(None)).unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert!(store.get(&key(Some(1))).is_none());
    }

    #[test]
    fn idle_session_expires_after_ttl() {
        let store = ConversationStateStore::new(Duration::from_secs(3600));
        let start = Utc::now();
        store.put(key(None), ConversationSession::new(start));

        assert!(store.get_at(&key(None), start + TimeDelta::minutes(60)).is_some());
        assert!(store.get_at(&key(None), start + TimeDelta::minutes(61)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn purge_removes_only_expired() {
        let store = ConversationStateStore::new(Duration::from_secs(60));
        let now = Utc::now();
        store.put(key(Some(1)), ConversationSession::new(now - TimeDelta::minutes(5)));
        store.put(key(Some(2)), ConversationSession::new(now));
        assert_eq!(store.purge_expired_at(now), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get_at(&key(Some(2)), now).is_some());
    }

    #[test]
    fn evict_returns_session() {
        let store = ConversationStateStore::new(Duration::from_secs(60));
        store.put(key(None), ConversationSession::new(Utc::now()));
        assert!(store.evict(&key(None)).is_some());
        assert!(store.evict(&key(None)).is_none());
    }

    #[test]
    fn settle_clears_confirmation() {
        let mut session = ConversationSession::new(Utc::now());
        session.awaiting_confirmation = true;
        session.pending_action = Some(PendingAction::CreateTicket {
            trigger_message: "vpn".into(),
        });
        session.settle();
        assert!(!session.awaiting_confirmation);
        assert!(session.pending_action.is_none());
    }
}
