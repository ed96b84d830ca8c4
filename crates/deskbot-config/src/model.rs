// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Deskbot triage engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Names accepted in `providers.order`.
pub const KNOWN_PROVIDERS: &[&str] = &["anthropic", "openai", "heuristic"];

/// Top-level Deskbot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeskbotConfig {
    /// Engine identity, limits, and session behavior.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Fallback chain policy.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Anthropic API settings (primary responder).
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI-compatible API settings (secondary responder).
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Run audit log settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Engine identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Display name of the assistant, used in the default system prompt.
    #[serde(default = "default_engine_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the system prompt.
    /// Takes precedence over `system_prompt` if both are set.
    #[serde(default)]
    pub system_prompt_file: Option<String>,

    /// User id recorded as the actor of AI-driven status transitions.
    #[serde(default = "default_ai_user_id")]
    pub ai_user_id: i64,

    /// Maximum accepted length of an inbound message, in characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Inactivity after which a conversation session is treated as fresh.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Category assigned to chatbot-created tickets when no topic matches.
    #[serde(default = "default_category_id")]
    pub default_category_id: i64,

    /// Priority assigned to chatbot-created tickets.
    #[serde(default = "default_priority_id")]
    pub default_priority_id: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_engine_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
            ai_user_id: default_ai_user_id(),
            max_message_chars: default_max_message_chars(),
            session_ttl_secs: default_session_ttl_secs(),
            default_category_id: default_category_id(),
            default_priority_id: default_priority_id(),
        }
    }
}

fn default_engine_name() -> String {
    "deskbot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ai_user_id() -> i64 {
    0
}

fn default_max_message_chars() -> usize {
    4000
}

fn default_session_ttl_secs() -> u64 {
    3600
}

fn default_category_id() -> i64 {
    1
}

fn default_priority_id() -> i64 {
    2
}

/// Fallback chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Responders tried in sequence until one answers.
    #[serde(default = "default_provider_order")]
    pub order: Vec<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            order: default_provider_order(),
        }
    }
}

fn default_provider_order() -> Vec<String> {
    KNOWN_PROVIDERS.iter().map(|s| s.to_string()).collect()
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` falls back to `ANTHROPIC_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model to use for triage replies.
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Client-side request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient HTTP errors before falling back.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_anthropic_model(),
            api_version: default_api_version(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    30
}

/// OpenAI-compatible chat completions configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model to use for triage replies.
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Base URL of the API (without `/chat/completions`).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Client-side request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient HTTP errors before falling back.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Run audit log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Record AI invocations. When false, a no-op sink is used.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,

    /// Path to the SQLite database holding the audit log.
    #[serde(default = "default_audit_path")]
    pub database_path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            database_path: default_audit_path(),
        }
    }
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("deskbot").join("audit.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("deskbot-audit.db"))
        .to_string_lossy()
        .into_owned()
}

impl DeskbotConfig {
    /// Returns a copy with API keys replaced by a fixed placeholder.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.anthropic.api_key.is_some() {
            copy.anthropic.api_key = Some("[REDACTED]".to_string());
        }
        if copy.openai.api_key.is_some() {
            copy.openai.api_key = Some("[REDACTED]".to_string());
        }
        copy
    }
}
