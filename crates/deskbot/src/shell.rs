// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `deskbot shell` command implementation.
//!
//! Interactive REPL against an in-memory ticket store. Messages go through
//! the chatbot flow until a ticket is opened, then through the ticket flow
//! of that ticket. Ctrl+C during a turn cancels it; at the prompt it exits.

use std::sync::Arc;

use colored::Colorize;
use deskbot_agent::{ChatBotReply, Engine, EngineSettings, TurnOutcome};
use deskbot_config::DeskbotConfig;
use deskbot_core::types::{AuthorKind, Ticket, User};
use deskbot_core::{DeskbotError, TenantId, TicketId, TicketStore, UserId};
use deskbot_storage::MemoryTicketStore;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const SHELL_TENANT: TenantId = TenantId(1);
const SHELL_USER: UserId = UserId(1000);

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum ShellCommand<'a> {
    Quit,
    Help,
    /// Leave the current ticket and start a fresh conversation.
    New,
    Status,
    Unknown(&'a str),
    Message(&'a str),
}

impl<'a> ShellCommand<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed {
            "/quit" | "/exit" => ShellCommand::Quit,
            "/help" => ShellCommand::Help,
            "/new" => ShellCommand::New,
            "/status" => ShellCommand::Status,
            other if other.starts_with('/') => ShellCommand::Unknown(other),
            other => ShellCommand::Message(other),
        })
    }
}

/// Result of one turn, from whichever flow handled it.
#[derive(Debug)]
enum ShellReply {
    Chat(ChatBotReply),
    Ticket(TicketId, TurnOutcome),
}

/// Conversation state of one shell invocation.
struct Shell {
    engine: Engine,
    store: Arc<MemoryTicketStore>,
    settings: EngineSettings,
    ticket: Option<TicketId>,
}

impl Shell {
    fn new(engine: Engine, store: Arc<MemoryTicketStore>, settings: EngineSettings) -> Self {
        Self {
            engine,
            store,
            settings,
            ticket: None,
        }
    }

    async fn handle_message(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ShellReply, DeskbotError> {
        let Some(ticket_id) = self.ticket else {
            let reply = self
                .engine
                .process_freeform_message(SHELL_TENANT, SHELL_USER, text, None, cancel)
                .await?;
            if let Some(created) = reply.created_ticket_id {
                debug!(ticket_id = %created, "shell switched to ticket flow");
                self.ticket = Some(created);
            }
            return Ok(ShellReply::Chat(reply));
        };

        // The help desk records the customer message before the AI turn.
        let text = self.settings.validate_message(text)?;
        self.store
            .append_interaction(ticket_id, AuthorKind::Customer, text, None, cancel)
            .await?;
        let outcome = self
            .engine
            .process_customer_message(ticket_id, SHELL_TENANT, text, cancel)
            .await?;
        Ok(ShellReply::Ticket(ticket_id, outcome))
    }

    async fn current_ticket(&self) -> Result<Option<Ticket>, DeskbotError> {
        match self.ticket {
            Some(id) => Ok(self.store.get_ticket(id, &CancellationToken::new()).await?),
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.ticket = None;
        self.engine
            .sessions()
            .evict(&deskbot_agent::ConversationKey::new(SHELL_TENANT, SHELL_USER, None));
    }
}

/// Runs the `deskbot shell` interactive REPL.
pub async fn run_shell(config: &DeskbotConfig) -> Result<(), DeskbotError> {
    let store = Arc::new(MemoryTicketStore::new());
    store
        .insert_user(User {
            id: SHELL_USER,
            tenant_id: SHELL_TENANT,
            name: "Shell user".to_string(),
            email: "shell@localhost".to_string(),
        })
        .await;

    let engine = Engine::from_config(config, store.clone()).await?;
    let mut shell = Shell::new(engine, store, EngineSettings::from(&config.engine));

    let mut rl = DefaultEditor::new()
        .map_err(|e| DeskbotError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "deskbot shell".bold().green());
    println!(
        "Describe an IT problem. Type {} for commands, {} to exit.\n",
        "/help".yellow(),
        "/quit".yellow()
    );

    loop {
        let prompt = match shell.ticket {
            Some(id) => format!("{}> ", format!("deskbot #{id}").green()),
            None => format!("{}> ", "deskbot".green()),
        };
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        let Some(command) = ShellCommand::parse(&line) else {
            continue;
        };
        let _ = rl.add_history_entry(line.as_str());

        match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => print_help(),
            ShellCommand::New => {
                shell.reset();
                println!("{}", "started a new conversation".dimmed());
            }
            ShellCommand::Status => match shell.current_ticket().await {
                Ok(Some(ticket)) => println!(
                    "{}",
                    format!("ticket #{}: {} [{}]", ticket.id, ticket.title, ticket.status).dimmed()
                ),
                Ok(None) => println!("{}", "no ticket opened yet".dimmed()),
                Err(e) => eprintln!("{}: {e}", "error".red()),
            },
            ShellCommand::Unknown(name) => {
                eprintln!("{} {name}; try {}", "unknown command".yellow(), "/help".yellow());
            }
            ShellCommand::Message(text) => {
                let cancel = CancellationToken::new();
                let watcher = {
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            cancel.cancel();
                        }
                    })
                };
                let result = shell.handle_message(text, &cancel).await;
                watcher.abort();
                match result {
                    Ok(reply) => print_reply(&reply),
                    Err(e) => print_error(&e),
                }
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!("  {}    leave the current ticket and start over", "/new".yellow());
    println!("  {} show the current ticket", "/status".yellow());
    println!("  {}   exit the shell", "/quit".yellow());
}

fn print_reply(reply: &ShellReply) {
    match reply {
        ShellReply::Chat(chat) => {
            println!("{}\n", chat.reply_text);
            if !chat.suggestions.is_empty() {
                println!("{}", format!("[{}]", chat.suggestions.join(" / ")).dimmed());
            }
            if let Some(id) = chat.created_ticket_id {
                println!(
                    "{}",
                    format!("ticket #{id} opened; further messages go to this ticket").green()
                );
            }
        }
        ShellReply::Ticket(id, outcome) => {
            if outcome.success {
                println!("{}\n", outcome.reply_text);
            } else {
                println!("{}\n", outcome.reply_text.yellow());
            }
            if let Some(status) = outcome.new_status {
                println!("{}", format!("ticket #{id} is now {status}").dimmed());
            }
        }
    }
}

fn print_error(error: &DeskbotError) {
    match error {
        DeskbotError::Cancelled => eprintln!("{}", "cancelled".yellow()),
        DeskbotError::Eligibility(_) | DeskbotError::Validation(_) => {
            eprintln!("{}", error.user_message().yellow());
        }
        _ => eprintln!("{}: {error}", "error".red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskbot_core::TicketStatus;

    fn shell() -> Shell {
        let store = Arc::new(MemoryTicketStore::new());
        let engine = Engine::builder(store.clone()).build();
        Shell::new(engine, store, EngineSettings::default())
    }

    #[test]
    fn parses_commands_and_messages() {
        assert_eq!(ShellCommand::parse("  "), None);
        assert_eq!(ShellCommand::parse("/exit"), Some(ShellCommand::Quit));
        assert_eq!(ShellCommand::parse(" /new "), Some(ShellCommand::New));
        assert_eq!(ShellCommand::parse("/foo"), Some(ShellCommand::Unknown("/foo")));
        assert_eq!(
            ShellCommand::parse("a VPN caiu\n"),
            Some(ShellCommand::Message("a VPN caiu"))
        );
    }

    #[tokio::test]
    async fn confirmed_offer_switches_to_ticket_flow() {
        let mut shell = shell();
        let cancel = CancellationToken::new();

        let reply = shell.handle_message("a impressora travou", &cancel).await.unwrap();
        let ShellReply::Chat(chat) = reply else {
            panic!("expected chatbot reply");
        };
        assert!(chat.awaiting_confirmation);
        assert!(shell.ticket.is_none());

        let reply = shell.handle_message("sim", &cancel).await.unwrap();
        let ShellReply::Chat(chat) = reply else {
            panic!("expected chatbot reply");
        };
        let ticket_id = chat.created_ticket_id.unwrap();
        assert_eq!(shell.ticket, Some(ticket_id));

        let reply = shell.handle_message("continua sem imprimir", &cancel).await.unwrap();
        let ShellReply::Ticket(id, outcome) = reply else {
            panic!("expected ticket reply");
        };
        assert_eq!(id, ticket_id);
        assert!(outcome.success);

        let interactions = shell.store.list_interactions(ticket_id, &cancel).await.unwrap();
        let authors: Vec<_> = interactions.iter().map(|i| i.author).collect();
        assert_eq!(authors.last(), Some(&AuthorKind::Ai));
        assert!(authors.contains(&AuthorKind::Customer));

        let ticket = shell.current_ticket().await.unwrap().unwrap();
        assert_eq!(ticket.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn reset_returns_to_chatbot_flow() {
        let mut shell = shell();
        let cancel = CancellationToken::new();
        shell.handle_message("a VPN não conecta", &cancel).await.unwrap();
        shell.reset();
        assert!(shell.ticket.is_none());
        assert!(shell.engine.sessions().is_empty());
    }

    #[tokio::test]
    async fn blank_ticket_message_is_not_recorded() {
        let mut shell = shell();
        let cancel = CancellationToken::new();
        shell.handle_message("o teclado quebrou", &cancel).await.unwrap();
        shell.handle_message("sim", &cancel).await.unwrap();
        let ticket_id = shell.ticket.unwrap();
        let before = shell.store.list_interactions(ticket_id, &cancel).await.unwrap().len();

        let err = shell.handle_message("   ", &cancel).await.unwrap_err();
        assert!(matches!(err, DeskbotError::Validation(_)));
        let after = shell.store.list_interactions(ticket_id, &cancel).await.unwrap().len();
        assert_eq!(before, after);
    }
}
