// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as provider names, positive limits, and non-empty paths.

use std::collections::HashSet;

use crate::diagnostic::{suggest_key, ConfigError};
use crate::model::{DeskbotConfig, KNOWN_PROVIDERS};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DeskbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.providers.order.is_empty() {
        errors.push(ConfigError::Validation {
            message: "providers.order must list at least one provider".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for name in &config.providers.order {
        if !KNOWN_PROVIDERS.contains(&name.as_str()) {
            let hint = suggest_key(name, KNOWN_PROVIDERS)
                .map(|s| format!(" (did you mean `{s}`?)"))
                .unwrap_or_default();
            errors.push(ConfigError::Validation {
                message: format!(
                    "providers.order contains unknown provider `{name}`{hint}; known providers: {}",
                    KNOWN_PROVIDERS.join(", ")
                ),
            });
        }
        if !seen.insert(name.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!("providers.order lists `{name}` more than once"),
            });
        }
    }

    if config.engine.session_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.session_ttl_secs must be greater than zero".to_string(),
        });
    }

    if config.engine.max_message_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.max_message_chars must be greater than zero".to_string(),
        });
    }

    for (section, timeout, max_tokens) in [
        ("anthropic", config.anthropic.timeout_secs, config.anthropic.max_tokens),
        ("openai", config.openai.timeout_secs, config.openai.max_tokens),
    ] {
        if timeout == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{section}.timeout_secs must be greater than zero"),
            });
        }
        if max_tokens == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{section}.max_tokens must be greater than zero"),
            });
        }
    }

    if config.openai.base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "openai.base_url must not be empty".to_string(),
        });
    }

    if config.audit.enabled && config.audit.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "audit.database_path must not be empty when audit is enabled".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
