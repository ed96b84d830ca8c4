// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detection of off-topic conversations.
//!
//! The assistant answers off-topic requests with fixed refusal wording. The
//! guard recognizes that wording and counts how many of the most recent AI
//! replies were refusals.

use deskbot_core::types::AuthorKind;
use deskbot_router::text::{contains_phrase, words};

use crate::session::SessionMessage;

/// Prefix added to the reply that closes a ticket for repeated off-topic use.
pub const OUT_OF_SCOPE_MARKER: &str = "⚠️ ATENÇÃO:";

/// Appended to the second consecutive off-topic reply.
pub const SCOPE_WARNING: &str = "Aviso: se as próximas mensagens continuarem fora do escopo de suporte técnico, este chamado será encerrado automaticamente.";

/// Appended to the reply that closes the ticket.
pub const CLOSURE_NOTICE: &str = "Este chamado foi encerrado por conter repetidas solicitações fora do escopo de suporte técnico.";

const REFUSAL_PHRASES: &[&str] = &[
    "não posso ajudar",
    "nao posso ajudar",
    "não consigo ajudar com",
    "fora do escopo",
    "fora do meu escopo",
    "questões não técnicas",
    "questoes nao tecnicas",
    "assuntos não relacionados",
    "apenas com questões de ti",
    "somente com suporte técnico",
    "i can't help with",
    "i cannot help with",
    "outside the scope",
    "out of scope",
    "non-technical questions",
    "only help with it",
];

/// What the controller must do with the current reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeVerdict {
    InScope,
    /// First off-topic reply in a row.
    Violation,
    /// Second in a row: warn the customer.
    Warning,
    /// Third or later: close the ticket.
    ForceClose,
}

/// Phrase classifier plus the consecutive-violation policy.
#[derive(Debug, Clone)]
pub struct ScopeGuard {
    phrases: Vec<String>,
}

impl Default for ScopeGuard {
    fn default() -> Self {
        Self::with_phrases(REFUSAL_PHRASES)
    }
}

impl ScopeGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a guard over custom refusal phrases.
    pub fn with_phrases(phrases: &[&str]) -> Self {
        let mut normalized: Vec<String> = phrases
            .iter()
            .map(|p| words(p).join(" "))
            .filter(|p| !p.is_empty())
            .collect();
        normalized.dedup();
        Self { phrases: normalized }
    }

    pub fn is_out_of_scope(&self, ai_text: &str) -> bool {
        let w = words(ai_text);
        self.phrases.iter().any(|p| contains_phrase(&w, p))
    }

    /// Number of trailing AI replies in `history` that were off-topic.
    ///
    /// Walks backward and stops at the first in-scope AI reply. Customer
    /// and human messages between replies are skipped.
    pub fn count_consecutive_violations(&self, history: &[SessionMessage]) -> usize {
        history
            .iter()
            .rev()
            .filter(|m| m.author == AuthorKind::Ai)
            .take_while(|m| self.is_out_of_scope(&m.text))
            .count()
    }

    /// Classifies `ai_text` given the prior conversation.
    pub fn evaluate(&self, ai_text: &str, history: &[SessionMessage]) -> ScopeVerdict {
        if !self.is_out_of_scope(ai_text) {
            return ScopeVerdict::InScope;
        }
        match self.count_consecutive_violations(history) {
            0 => ScopeVerdict::Violation,
            1 => ScopeVerdict::Warning,
            _ => ScopeVerdict::ForceClose,
        }
    }
}

/// Rewrites the visible reply for the verdict.
pub fn decorate_reply(verdict: ScopeVerdict, text: &str) -> String {
    match verdict {
        ScopeVerdict::InScope | ScopeVerdict::Violation => text.to_string(),
        ScopeVerdict::Warning => format!("{text}\n\n{SCOPE_WARNING}"),
        ScopeVerdict::ForceClose => format!("{OUT_OF_SCOPE_MARKER} {text}\n\n{CLOSURE_NOTICE}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const REFUSAL: &str = "Desculpe, não posso ajudar com isso. Atendo apenas questões técnicas.";
    const ANSWER: &str = "Tente reiniciar o cliente VPN.";

    fn customer(text: &str) -> SessionMessage {
        SessionMessage::new(AuthorKind::Customer, text)
    }

    fn ai(text: &str) -> SessionMessage {
        SessionMessage::new(AuthorKind::Ai, text)
    }

    #[test]
    fn recognizes_refusal_wording() {
        let guard = ScopeGuard::new();
        assert!(guard.is_out_of_scope(REFUSAL));
        assert!(guard.is_out_of_scope("Isso está FORA DO ESCOPO do suporte."));
        assert!(guard.is_out_of_scope("Sorry, I can't help with recipes."));
        assert!(guard.is_out_of_scope("Nao posso ajudar com isso"));
        assert!(!guard.is_out_of_scope(ANSWER));
    }

    #[test]
    fn counts_trailing_violations_only() {
        let guard = ScopeGuard::new();
        let history = vec![
            customer("receita de bolo?"),
            ai(REFUSAL),
            customer("vpn caiu"),
            ai(ANSWER),
            customer("e futebol?"),
            ai(REFUSAL),
            customer("e política?"),
            ai(REFUSAL),
            customer("e cinema?"),
        ];
        assert_eq!(guard.count_consecutive_violations(&history), 2);
        assert_eq!(guard.count_consecutive_violations(&history[..4]), 0);
        assert_eq!(guard.count_consecutive_violations(&[]), 0);
    }

    #[test]
    fn verdict_escalates_with_prior_violations() {
        let guard = ScopeGuard::new();
        let mut history = vec![customer("piada?")];
        assert_eq!(guard.evaluate(REFUSAL, &history), ScopeVerdict::Violation);
        history.extend([ai(REFUSAL), customer("outra piada?")]);
        assert_eq!(guard.evaluate(REFUSAL, &history), ScopeVerdict::Warning);
        history.extend([ai(REFUSAL), customer("mais uma?")]);
        assert_eq!(guard.evaluate(REFUSAL, &history), ScopeVerdict::ForceClose);
        assert_eq!(guard.evaluate(ANSWER, &history), ScopeVerdict::InScope);
    }

    #[test]
    fn decoration() {
        assert_eq!(decorate_reply(ScopeVerdict::InScope, "a"), "a");
        assert!(decorate_reply(ScopeVerdict::Warning, "a").ends_with(SCOPE_WARNING));
        assert!(decorate_reply(ScopeVerdict::ForceClose, "a").starts_with("⚠️ ATENÇÃO: a"));
    }

    proptest! {
        #[test]
        fn count_is_bounded_by_ai_replies(pattern in prop::collection::vec(0u8..3, 0..30)) {
            let guard = ScopeGuard::new();
            let history: Vec<SessionMessage> = pattern
                .iter()
                .map(|p| match p {
                    0 => customer("pergunta"),
                    1 => ai(REFUSAL),
                    _ => ai(ANSWER),
                })
                .collect();
            let ai_replies = history.iter().filter(|m| m.author == AuthorKind::Ai).count();
            let count = guard.count_consecutive_violations(&history);
            prop_assert!(count <= ai_replies);

            let last_ai = history.iter().rev().find(|m| m.author == AuthorKind::Ai);
            if last_ai.is_some_and(|m| m.text == ANSWER) {
                prop_assert_eq!(count, 0);
            }
        }
    }
}
