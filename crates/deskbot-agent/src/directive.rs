// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control directives embedded in AI replies.
//!
//! Two tags are recognized anywhere in the text:
//!
//! - `[STATUS:n]` requests a transition to the status with code `n`.
//! - `[NEW_TICKET:title|description|categoryId|priorityId]` requests a
//!   linked ticket. The two trailing ids are optional.
//!
//! Recognized tags are removed from the user-facing text. When a tag occurs
//! more than once, the last valid occurrence wins.

use std::sync::LazyLock;

use deskbot_core::TicketStatus;
use deskbot_router::classifier::mentions_human;
use regex::{Captures, Regex};
use tracing::warn;

static STATUS_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[STATUS:(\d+)\]").unwrap());

static NEW_TICKET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[NEW_TICKET:([^\]]+)\]").unwrap());

/// A ticket the AI asked to open alongside the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedTicketSpec {
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub priority_id: Option<i64>,
}

/// Structured actions derived from one AI reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet {
    pub new_status: Option<TicketStatus>,
    pub new_linked_ticket: Option<LinkedTicketSpec>,
    /// The customer's latest message asks for a person.
    pub human_requested: bool,
}

impl ActionSet {
    pub fn is_empty(&self) -> bool {
        self.new_status.is_none() && self.new_linked_ticket.is_none() && !self.human_requested
    }
}

/// Result of [`DirectiveParser::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub clean_text: String,
    pub actions: ActionSet,
}

/// Extracts control directives from AI free text.
pub trait DirectiveParser: Send + Sync {
    /// Parses `ai_text` and scans `customer_text` (the message being
    /// answered) for a human-agent request.
    fn parse(&self, ai_text: &str, customer_text: &str) -> ParsedReply;
}

/// Bracket-tag grammar parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagDirectiveParser;

impl TagDirectiveParser {
    pub fn new() -> Self {
        Self
    }
}

impl DirectiveParser for TagDirectiveParser {
    fn parse(&self, ai_text: &str, customer_text: &str) -> ParsedReply {
        let mut actions = ActionSet {
            human_requested: mentions_human(customer_text),
            ..ActionSet::default()
        };
        let mut removed = false;

        let without_status = STATUS_TAG.replace_all(ai_text, |caps: &Captures<'_>| {
            removed = true;
            match caps[1].parse::<u64>().ok().and_then(TicketStatus::from_code) {
                Some(status) => actions.new_status = Some(status),
                None => warn!(tag = &caps[0], "ignoring status directive with unknown code"),
            }
            String::new()
        });

        let cleaned = NEW_TICKET_TAG.replace_all(&without_status, |caps: &Captures<'_>| {
            match parse_linked_ticket(&caps[1]) {
                Some(spec) => {
                    removed = true;
                    actions.new_linked_ticket = Some(spec);
                    String::new()
                }
                None => caps[0].to_string(),
            }
        });

        let clean_text = if removed {
            cleaned.trim().to_string()
        } else {
            ai_text.to_string()
        };

        ParsedReply {
            clean_text,
            actions,
        }
    }
}

/// Parses the body of a `[NEW_TICKET:...]` tag. Title and description are
/// required; non-numeric ids are dropped.
fn parse_linked_ticket(body: &str) -> Option<LinkedTicketSpec> {
    let mut fields = body.splitn(4, '|').map(str::trim);
    let title = fields.next().filter(|s| !s.is_empty())?;
    let description = fields.next().filter(|s| !s.is_empty())?;
    let category_id = fields.next().and_then(|s| s.parse().ok());
    let priority_id = fields.next().and_then(|s| s.parse().ok());

    Some(LinkedTicketSpec {
        title: title.to_string(),
        description: description.to_string(),
        category_id,
        priority_id,
    })
}
