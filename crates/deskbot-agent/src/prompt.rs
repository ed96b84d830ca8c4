// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for the ticket and chatbot flows.

use deskbot_config::model::EngineConfig;
use deskbot_core::types::{AuthorKind, Prompt, PromptTurn, Ticket};
use tracing::{info, warn};

use crate::session::SessionMessage;

/// Loads the system prompt following config priority: file > inline > default.
pub async fn load_system_prompt(config: &EngineConfig) -> String {
    if let Some(ref file_path) = config.system_prompt_file {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) => {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    info!(path = file_path.as_str(), "loaded system prompt from file");
                    return trimmed.to_string();
                }
            }
            Err(e) => {
                warn!(
                    path = file_path.as_str(),
                    error = %e,
                    "failed to read system prompt file, falling back"
                );
            }
        }
    }

    if let Some(ref prompt) = config.system_prompt
        && !prompt.trim().is_empty()
    {
        return prompt.clone();
    }

    default_system_prompt(&config.name)
}

fn default_system_prompt(name: &str) -> String {
    format!(
        "Você é {name}, assistente virtual de suporte técnico de TI. \
Responda em português, de forma breve e objetiva, apenas sobre questões técnicas. \
Para pedidos fora do escopo de suporte técnico responda que não pode ajudar com questões não técnicas. \
Para alterar o status do chamado inclua [STATUS:n] (1=aberto, 2=em atendimento, 3=pendente, 4=resolvido, 5=fechado, 6=cancelado). \
Para abrir um chamado relacionado inclua [NEW_TICKET:título|descrição|categoria|prioridade]."
    )
}

/// Maps session history to provider turns. Human agent messages are shown
/// to the model as assistant turns prefixed with their origin.
fn history_turns(history: &[SessionMessage]) -> Vec<PromptTurn> {
    history
        .iter()
        .map(|m| match m.author {
            AuthorKind::Customer => PromptTurn::user(m.text.clone()),
            AuthorKind::Ai => PromptTurn::assistant(m.text.clone()),
            AuthorKind::Human => PromptTurn::assistant(format!("[Atendente humano] {}", m.text)),
        })
        .collect()
}

/// Prompt for a turn on an existing ticket.
pub fn ticket_prompt(system: &str, ticket: &Ticket, history: &[SessionMessage]) -> Prompt {
    Prompt {
        system: format!(
            "{system}\n\nChamado #{id}: {title}\nDescrição: {description}\nStatus atual: {status} ({code})",
            id = ticket.id,
            title = ticket.title,
            description = ticket.description,
            status = ticket.status,
            code = ticket.status.code(),
        ),
        turns: history_turns(history),
    }
}

/// Prompt for the pre-ticket chatbot flow.
pub fn chat_prompt(system: &str, history: &[SessionMessage]) -> Prompt {
    Prompt {
        system: format!(
            "{system}\n\nO usuário ainda não abriu um chamado. Ajude com orientações iniciais."
        ),
        turns: history_turns(history),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use deskbot_core::types::{TenantId, TicketId, TicketStatus, UserId};

    fn engine_config() -> EngineConfig {
        EngineConfig {
            name: "Ana".into(),
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn default_prompt_names_the_assistant() {
        let prompt = load_system_prompt(&engine_config()).await;
        assert!(prompt.starts_with("Você é Ana"));
        assert!(prompt.contains("[STATUS:n]"));
    }

    #[tokio::test]
    async fn inline_prompt_used() {
        let config = EngineConfig {
            system_prompt: Some("Inline.".into()),
            ..engine_config()
        };
        assert_eq!(load_system_prompt(&config).await, "Inline.");
    }

    #[tokio::test]
    async fn file_overrides_inline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.md");
        std::fs::write(&path, "  Do arquivo.\n").unwrap();
        let config = EngineConfig {
            system_prompt: Some("Inline.".into()),
            system_prompt_file: Some(path.to_string_lossy().into_owned()),
            ..engine_config()
        };
        assert_eq!(load_system_prompt(&config).await, "Do arquivo.");
    }

    #[tokio::test]
    async fn missing_file_falls_back() {
        let config = EngineConfig {
            system_prompt: Some("Reserva.".into()),
            system_prompt_file: Some("/nonexistent/deskbot/prompt.md".into()),
            ..engine_config()
        };
        assert_eq!(load_system_prompt(&config).await, "Reserva.");
    }

    #[test]
    fn ticket_prompt_carries_context_and_history() {
        let ticket = Ticket {
            id: TicketId(42),
            tenant_id: TenantId(1),
            requester_id: UserId(2),
            title: "VPN".into(),
            description: "Não conecta".into(),
            status: TicketStatus::Pending,
            category_id: 3,
            priority_id: 2,
            created_at: Utc::now(),
        };
        let history = vec![
            SessionMessage::new(AuthorKind::Customer, "oi"),
            SessionMessage::new(AuthorKind::Human, "verificando"),
        ];
        let prompt = ticket_prompt("sys", &ticket, &history);
        assert!(prompt.system.contains("Chamado #42: VPN"));
        assert!(prompt.system.contains("pending (3)"));
        assert_eq!(prompt.turns[0], PromptTurn::user("oi"));
        assert_eq!(prompt.turns[1], PromptTurn::assistant("[Atendente humano] verificando"));
    }
}
