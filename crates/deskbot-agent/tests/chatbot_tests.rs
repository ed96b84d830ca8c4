// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-ticket chatbot conversations.

use std::time::Duration;

use deskbot_agent::{ConversationKey, EngineSettings};
use deskbot_core::types::{AuditFlow, AuthorKind, TicketStatus};
use deskbot_core::{DeskbotError, StoreError};
use deskbot_test_utils::{TestHarness, TENANT, USER};

fn harness() -> TestHarness {
    TestHarness::builder().build()
}

#[tokio::test]
async fn problem_report_asks_for_confirmation() {
    let h = harness();

    let reply = h.chat("Minha VPN não conecta desde ontem").await.unwrap();
    assert!(reply.awaiting_confirmation);
    assert_eq!(reply.suggestions, vec!["Sim".to_string(), "Não".to_string()]);
    assert!(reply.reply_text.starts_with("mock response"));
    assert!(reply.reply_text.ends_with("?"));
    assert_eq!(reply.created_ticket_id, None);
    assert_eq!(h.store.create_calls(), 0);

    let entries = h.audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].flow, AuditFlow::Chatbot);
    assert_eq!(entries[0].ticket_id, None);
}

#[tokio::test]
async fn greeting_does_not_offer_a_ticket() {
    let h = harness();
    let reply = h.chat("Bom dia!").await.unwrap();
    assert!(!reply.awaiting_confirmation);
    assert!(reply.suggestions.is_empty());
}

#[tokio::test]
async fn yes_creates_ticket_from_conversation() {
    let h = harness();
    h.chat("Minha VPN não conecta desde ontem à noite no escritório da filial sul")
        .await
        .unwrap();

    let reply = h.chat("Sim, por favor").await.unwrap();
    let ticket_id = reply.created_ticket_id.unwrap();
    assert!(!reply.awaiting_confirmation);

    let ticket = h.store.ticket(ticket_id).await.unwrap();
    assert_eq!(ticket.title, "Minha VPN não conecta desde ontem à noite no escritório");
    assert_eq!(ticket.category_id, 3);
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.tenant_id, TENANT);
    assert_eq!(ticket.requester_id, USER);
    assert!(ticket.description.starts_with("Usuário: Minha VPN"));
    assert!(ticket.description.contains("\nAssistente: mock response"));

    let interactions = h.store.interactions(ticket_id).await;
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].author, AuthorKind::Ai);
    assert!(interactions[0].text.contains(&format!("#{ticket_id}")));

    // Linked session: further problems are answered without a new offer.
    let follow_up = h.chat("a impressora também travou").await.unwrap();
    assert!(!follow_up.awaiting_confirmation);
    assert_eq!(h.store.create_calls(), 1);
}

#[tokio::test]
async fn no_declines_and_returns_to_free_state() {
    let h = harness();
    h.chat("O Outlook está com erro").await.unwrap();

    let reply = h.chat("não").await.unwrap();
    assert!(!reply.awaiting_confirmation);
    assert_eq!(reply.created_ticket_id, None);
    assert_eq!(h.store.create_calls(), 0);

    let key = ConversationKey::new(TENANT, USER, None);
    let session = h.engine.sessions().get(&key).unwrap();
    assert!(!session.awaiting_confirmation);
    assert!(session.pending_action.is_none());
}

#[tokio::test]
async fn idle_offer_expires_before_confirmation() {
    let h = TestHarness::builder()
        .with_settings(EngineSettings {
            session_ttl: Duration::from_secs(1),
            ..EngineSettings::default()
        })
        .build();

    let offer = h.chat("A impressora está com erro").await.unwrap();
    assert!(offer.awaiting_confirmation);

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let reply = h.chat("sim").await.unwrap();
    assert!(!reply.awaiting_confirmation);
    assert_eq!(reply.created_ticket_id, None);
    assert_eq!(h.store.create_calls(), 0);

    let key = ConversationKey::new(TENANT, USER, None);
    let session = h.engine.sessions().get(&key).unwrap();
    assert!(!session.awaiting_confirmation);
    assert!(session.pending_action.is_none());
}

#[tokio::test]
async fn unclear_answer_reprompts() {
    let h = harness();
    h.chat("Esqueci minha senha").await.unwrap();

    let reply = h.chat("talvez amanhã eu veja isso com calma").await.unwrap();
    assert!(reply.awaiting_confirmation);
    assert_eq!(reply.suggestions.len(), 2);
    assert_eq!(h.store.create_calls(), 0);

    let reply = h.chat("sim").await.unwrap();
    let ticket = h.store.ticket(reply.created_ticket_id.unwrap()).await.unwrap();
    assert_eq!(ticket.title, "Esqueci minha senha");
    assert_eq!(ticket.category_id, 4);
}

#[tokio::test]
async fn generic_problem_uses_default_category() {
    let h = harness();
    h.chat("Está dando erro quando clico em salvar").await.unwrap();
    let reply = h.chat("sim").await.unwrap();
    let ticket = h.store.ticket(reply.created_ticket_id.unwrap()).await.unwrap();
    assert_eq!(ticket.category_id, 1);
    assert_eq!(ticket.priority_id, 2);
}

#[tokio::test]
async fn creation_failure_keeps_the_offer_open() {
    let h = harness();
    h.chat("O notebook não liga").await.unwrap();
    h.store.fail_create(true);

    let err = h.chat("sim").await.unwrap_err();
    assert!(matches!(err, DeskbotError::Store(StoreError::Backend { .. })));

    let key = ConversationKey::new(TENANT, USER, None);
    assert!(h.engine.sessions().get(&key).unwrap().awaiting_confirmation);

    h.store.fail_create(false);
    let reply = h.chat("sim").await.unwrap();
    assert!(reply.created_ticket_id.is_some());
}

#[tokio::test]
async fn supplied_ticket_id_never_offers_creation() {
    let h = harness();
    let ticket = h.open_ticket("VPN", TicketStatus::Open).await.unwrap();

    let reply = h
        .engine
        .process_freeform_message(TENANT, USER, "a VPN caiu de novo", Some(ticket.id), &h.cancel)
        .await
        .unwrap();
    assert!(!reply.awaiting_confirmation);
    assert_eq!(h.store.create_calls(), 0);
}
