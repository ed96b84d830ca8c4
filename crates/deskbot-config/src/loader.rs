// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./deskbot.toml` > `~/.config/deskbot/deskbot.toml` > `/etc/deskbot/deskbot.toml`
//! with environment variable overrides via `DESKBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DeskbotConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/deskbot/deskbot.toml` (system-wide)
/// 3. `~/.config/deskbot/deskbot.toml` (user XDG config)
/// 4. `./deskbot.toml` (local directory)
/// 5. `DESKBOT_*` environment variables
pub fn load_config() -> Result<DeskbotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<DeskbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DeskbotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DeskbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DeskbotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DeskbotConfig::default()))
        .merge(Toml::file("/etc/deskbot/deskbot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("deskbot/deskbot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("deskbot.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")`: `DESKBOT_ENGINE_SESSION_TTL_SECS`
/// must map to `engine.session_ttl_secs`, not `engine.session.ttl.secs`.
fn env_provider() -> Env {
    Env::prefixed("DESKBOT_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env var name to a dotted config path.
///
/// Figment hands the name over with its original case, so it is lowercased
/// before the section lookup.
fn map_env_key(key: &str) -> String {
    const SECTIONS: &[&str] = &["engine", "providers", "anthropic", "openai", "audit"];

    let key = key.to_ascii_lowercase();
    SECTIONS
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|rest| format!("{section}.{rest}"))
        })
        .unwrap_or(key)
}
