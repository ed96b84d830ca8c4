// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Deskbot triage engine.
//!
//! Strict TOML parsing (`deny_unknown_fields`), an XDG file hierarchy,
//! `DESKBOT_*` environment overrides, and miette diagnostics with typo
//! suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use deskbot_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("providers: {:?}", config.providers.order);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::DeskbotConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Figment failures are converted to diagnostics carrying source spans
/// from whichever TOML files were present on disk.
pub fn load_and_validate() -> Result<DeskbotConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => validated(config),
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load configuration from an explicit file path (plus env) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<DeskbotConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => validated(config),
        Err(err) => {
            let sources = read_sources([path.to_path_buf()]);
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<DeskbotConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => validated(config),
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

fn validated(config: DeskbotConfig) -> Result<DeskbotConfig, Vec<ConfigError>> {
    validation::validate_config(&config)?;
    Ok(config)
}

fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::env::current_dir()
        .map(|d| d.join("deskbot.toml"))
        .unwrap_or_else(|_| PathBuf::from("deskbot.toml"))];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("deskbot/deskbot.toml"));
    }
    candidates.push(PathBuf::from("/etc/deskbot/deskbot.toml"));
    read_sources(candidates)
}

fn read_sources(paths: impl IntoIterator<Item = PathBuf>) -> Vec<(String, String)> {
    paths
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
