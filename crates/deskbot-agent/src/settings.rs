// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use deskbot_config::model::EngineConfig;
use deskbot_core::{DeskbotError, StoreError, UserId, ValidationError};

/// Engine knobs shared by the ticket and chatbot flows.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Recorded as the actor of AI-driven status changes.
    pub ai_user_id: UserId,
    pub max_message_chars: usize,
    pub session_ttl: Duration,
    pub default_category_id: i64,
    pub default_priority_id: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            ai_user_id: UserId(config.ai_user_id),
            max_message_chars: config.max_message_chars,
            session_ttl: Duration::from_secs(config.session_ttl_secs),
            default_category_id: config.default_category_id,
            default_priority_id: config.default_priority_id,
        }
    }
}

impl EngineSettings {
    /// Trims an inbound message and checks it against the length limit.
    pub fn validate_message<'a>(&self, text: &'a str) -> Result<&'a str, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }
        let len = trimmed.chars().count();
        if len > self.max_message_chars {
            return Err(ValidationError::TooLong {
                len,
                max: self.max_message_chars,
            });
        }
        Ok(trimmed)
    }
}

/// Store cancellation surfaces as engine cancellation.
pub(crate) fn store_error(e: StoreError) -> DeskbotError {
    match e {
        StoreError::Cancelled => DeskbotError::Cancelled,
        other => DeskbotError::Store(other),
    }
}
