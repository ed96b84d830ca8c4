// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword intent classification for free-form customer messages.
//!
//! Zero-cost heuristic rules over normalized words: no LLM pre-call, no
//! network, no latency. Used by the chatbot flow to decide when to offer a
//! ticket, and by the keyword responder to pick a canned answer.

use crate::text::{contains_phrase, normalize, words};

/// Support topic detected in a problem report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Vpn,
    Password,
    Printer,
    Email,
    Network,
    Hardware,
    Software,
}

impl Topic {
    /// Ticket category assigned to tickets about this topic.
    pub fn category_id(self) -> i64 {
        match self {
            Topic::Hardware | Topic::Printer => 2,
            Topic::Vpn | Topic::Network => 3,
            Topic::Password => 4,
            Topic::Email => 5,
            Topic::Software => 6,
        }
    }

    /// Short label stored as the conversation topic.
    pub fn label(self) -> &'static str {
        match self {
            Topic::Vpn => "vpn",
            Topic::Password => "senha",
            Topic::Printer => "impressora",
            Topic::Email => "email",
            Topic::Network => "rede",
            Topic::Hardware => "hardware",
            Topic::Software => "software",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classified intent of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Thanks,
    /// The user describes something broken. `topic` is `None` when only
    /// generic problem wording matched.
    ProblemReport { topic: Option<Topic> },
    /// The user asks for a human agent.
    HumanRequest,
    Unrecognized,
}

impl Intent {
    /// Whether the chatbot should offer to open a ticket.
    pub fn warrants_ticket(self) -> bool {
        matches!(self, Intent::ProblemReport { .. } | Intent::HumanRequest)
    }
}

/// Words and phrases that mean the customer wants a person. Words that
/// also describe problems ("técnico", "alguém") only count inside a request.
pub const HUMAN_KEYWORDS: &[&str] = &[
    "human",
    "humano",
    "humana",
    "agent",
    "agente",
    "operator",
    "operador",
    "someone",
    "person",
    "pessoa",
    "atendente",
    "representative",
    "falar com alguem",
    "falar com um tecnico",
    "falar com o tecnico",
    "chamar um tecnico",
    "falar com um analista",
];

const GREETINGS: &[&str] = &[
    "oi", "ola", "bom dia", "boa tarde", "boa noite", "hello", "hi", "hey", "e ai",
];

const THANKS: &[&str] = &["obrigado", "obrigada", "valeu", "thanks", "thank you", "agradeco"];

const YES_WORDS: &[&str] = &[
    "sim", "s", "yes", "y", "claro", "ok", "pode", "confirmo", "isso", "quero", "certo",
];

const NO_WORDS: &[&str] = &["nao", "n", "no", "cancelar", "cancela", "nope", "negativo"];

/// Generic problem wording (phrases match on word boundaries).
const PROBLEM_PHRASES: &[&str] = &[
    "problema",
    "erro",
    "error",
    "falha",
    "travou",
    "travando",
    "quebrou",
    "quebrado",
    "lento",
    "nao funciona",
    "parou",
    "nao consigo",
    "nao abre",
    "nao liga",
    "broken",
    "not working",
    "cannot",
    "cant",
    "issue",
    "crash",
    "ajuda",
    "help",
];

const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (Topic::Vpn, &["vpn", "forticlient", "anyconnect"]),
    (Topic::Password, &["senha", "password", "login", "bloqueado", "bloqueada", "mfa", "2fa"]),
    (Topic::Printer, &["impressora", "imprimir", "imprime", "printer", "toner"]),
    (Topic::Email, &["email", "e mail", "outlook", "caixa de entrada", "gmail"]),
    (Topic::Network, &["rede", "internet", "wifi", "wi fi", "network", "conexao", "cabo"]),
    (Topic::Hardware, &["computador", "notebook", "monitor", "teclado", "mouse", "laptop", "tela"]),
    (Topic::Software, &["sistema", "programa", "aplicativo", "software", "instalar", "atualizacao", "excel", "teams"]),
];

/// Classify a message into an [`Intent`].
///
/// Precedence: human request > topic problem > generic problem > thanks >
/// greeting. A greeting that also describes a problem is a problem report.
pub fn classify(message: &str) -> Intent {
    let w = words(message);
    if w.is_empty() {
        return Intent::Unrecognized;
    }
    if mentions_human_words(&w) {
        return Intent::HumanRequest;
    }
    if let Some(topic) = detect_topic_words(&w) {
        return Intent::ProblemReport { topic: Some(topic) };
    }
    if PROBLEM_PHRASES.iter().any(|p| contains_phrase(&w, p)) {
        return Intent::ProblemReport { topic: None };
    }
    if THANKS.iter().any(|p| contains_phrase(&w, p)) {
        return Intent::Thanks;
    }
    if GREETINGS.iter().any(|p| contains_phrase(&w, p)) {
        return Intent::Greeting;
    }
    Intent::Unrecognized
}

/// Detects the support topic of a message, if any.
pub fn detect_topic(message: &str) -> Option<Topic> {
    detect_topic_words(&words(message))
}

fn detect_topic_words(w: &[String]) -> Option<Topic> {
    TOPIC_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_phrase(w, k)))
        .map(|(topic, _)| *topic)
}

/// Whole-word, case- and accent-insensitive scan for [`HUMAN_KEYWORDS`].
pub fn mentions_human(message: &str) -> bool {
    mentions_human_words(&words(message))
}

fn mentions_human_words(w: &[String]) -> bool {
    HUMAN_KEYWORDS.iter().any(|k| contains_phrase(w, k))
}

/// Interprets an answer to a yes/no question.
///
/// The whole message must be a vocabulary word, or start with one and stay
/// short ("sim, por favor"). A message containing both kinds of word is
/// treated as unrecognized.
pub fn confirmation(message: &str) -> Option<bool> {
    let w = words(message);
    let first = w.first()?;
    if w.len() > 4 {
        return None;
    }
    let yes = YES_WORDS.contains(&first.as_str());
    let no = NO_WORDS.contains(&first.as_str());
    let mixed = w.iter().skip(1).any(|word| {
        let word = word.as_str();
        (yes && NO_WORDS.contains(&word)) || (no && YES_WORDS.contains(&word))
    });
    match (yes, no, mixed) {
        (_, _, true) => None,
        (true, false, _) => Some(true),
        (false, true, _) => Some(false),
        _ => None,
    }
}

/// Normalized form used for equality checks between messages.
pub fn fingerprint(message: &str) -> String {
    normalize(message.trim())
}
