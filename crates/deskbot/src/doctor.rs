// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `deskbot doctor` command implementation.
//!
//! Reports whether the configuration loads, which responders of the
//! fallback chain are ready, and whether the audit database is reachable.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use deskbot_agent::engine::build_responders;
use deskbot_config::{ConfigError, DeskbotConfig};

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: impl Into<String>, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `deskbot doctor` command.
///
/// Checks that depend on a valid configuration are skipped when it fails
/// to load. With `plain`, colored output is disabled.
pub async fn run_doctor(loaded: Result<DeskbotConfig, Vec<ConfigError>>, plain: bool) {
    let use_color = !plain && std::io::stdout().is_terminal();

    let mut results = vec![check_config(&loaded)];
    if let Ok(config) = &loaded {
        results.extend(check_responders(config));
        results.push(check_system_prompt(config).await);
        results.push(check_audit_database(config).await);
    }

    println!();
    println!("  deskbot doctor");
    println!();
    print_results(&results, use_color);

    if let Err(errors) = loaded {
        deskbot_config::render_errors(&errors);
    }
}

fn print_results(results: &[CheckResult], use_color: bool) {
    use colored::Colorize;

    let mut issues = 0usize;
    for result in results {
        let duration_ms = result.duration.as_millis();
        let line = match (&result.status, use_color) {
            (CheckStatus::Pass, true) => format!(
                "    {} {:<20} {} ({duration_ms}ms)",
                "✓".green(),
                result.name,
                result.message
            ),
            (CheckStatus::Warn, true) => format!(
                "    {} {:<20} {} ({duration_ms}ms)",
                "!".yellow(),
                result.name,
                result.message.yellow()
            ),
            (CheckStatus::Fail, true) => format!(
                "    {} {:<20} {} ({duration_ms}ms)",
                "✗".red(),
                result.name,
                result.message.red()
            ),
            (status, false) => format!(
                "    {:<6} {:<20} {} ({duration_ms}ms)",
                plain_tag(status),
                result.name,
                result.message
            ),
        };
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{line}");
    }

    println!();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();
}

fn plain_tag(status: &CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "[OK]",
        CheckStatus::Warn => "[WARN]",
        CheckStatus::Fail => "[FAIL]",
    }
}

fn check_config(loaded: &Result<DeskbotConfig, Vec<ConfigError>>) -> CheckResult {
    let start = Instant::now();
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// One result per entry of `providers.order`, plus a failure when none of
/// them can answer.
fn check_responders(config: &DeskbotConfig) -> Vec<CheckResult> {
    let start = Instant::now();
    let responders = match build_responders(config) {
        Ok(responders) => responders,
        Err(e) => {
            return vec![CheckResult::new(
                "Responders",
                CheckStatus::Fail,
                e.to_string(),
                start,
            )];
        }
    };

    let mut results: Vec<CheckResult> = responders
        .iter()
        .map(|responder| {
            let (status, message) = if responder.is_enabled() {
                (CheckStatus::Pass, "ready")
            } else {
                (CheckStatus::Warn, "disabled (no valid API key)")
            };
            CheckResult::new(format!("Responder {}", responder.name()), status, message, start)
        })
        .collect();

    if !responders.iter().any(|r| r.is_enabled()) {
        results.push(CheckResult::new(
            "Fallback chain",
            CheckStatus::Fail,
            "no responder enabled; every turn will report unavailability",
            start,
        ));
    }
    results
}

async fn check_system_prompt(config: &DeskbotConfig) -> CheckResult {
    let start = Instant::now();
    let engine = &config.engine;
    match &engine.system_prompt_file {
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(content) if !content.trim().is_empty() => {
                CheckResult::new("System prompt", CheckStatus::Pass, format!("file {path}"), start)
            }
            Ok(_) => CheckResult::new(
                "System prompt",
                CheckStatus::Warn,
                format!("{path} is empty, falling back"),
                start,
            ),
            Err(e) => CheckResult::new(
                "System prompt",
                CheckStatus::Warn,
                format!("cannot read {path}: {e}"),
                start,
            ),
        },
        None if engine.system_prompt.as_deref().is_some_and(|p| !p.trim().is_empty()) => {
            CheckResult::new("System prompt", CheckStatus::Pass, "inline", start)
        }
        None => CheckResult::new("System prompt", CheckStatus::Pass, "built-in default", start),
    }
}

async fn check_audit_database(config: &DeskbotConfig) -> CheckResult {
    let start = Instant::now();
    if !config.audit.enabled {
        return CheckResult::new("Audit database", CheckStatus::Warn, "audit disabled", start);
    }

    let db_path = config.audit.database_path.as_str();
    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Audit database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "Audit database",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };

    let query_result: Result<(), tokio_rusqlite::Error<rusqlite::Error>> =
        conn.call(|conn| conn.execute_batch("SELECT 1")).await;
    match query_result {
        Ok(()) => CheckResult::new("Audit database", CheckStatus::Pass, "connected", start),
        Err(e) => CheckResult::new(
            "Audit database",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic_only() -> DeskbotConfig {
        let mut config = DeskbotConfig::default();
        config.providers.order = vec!["heuristic".into()];
        config
    }

    #[test]
    fn failed_config_is_reported() {
        let loaded = Err(vec![ConfigError::Validation {
            message: "bad".into(),
        }]);
        let result = check_config(&loaded);
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.message, "1 error(s)");
    }

    #[test]
    fn heuristic_responder_is_always_ready() {
        let results = check_responders(&heuristic_only());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Responder heuristic");
        assert_eq!(results[0].status, CheckStatus::Pass);
    }

    #[test]
    fn keyless_openai_only_chain_fails() {
        if std::env::var("OPENAI_API_KEY").is_ok() {
            return;
        }
        let mut config = DeskbotConfig::default();
        config.providers.order = vec!["openai".into()];
        config.openai.api_key = Some("not-a-key".into());
        let results = check_responders(&config);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, CheckStatus::Warn);
        assert_eq!(results[1].name, "Fallback chain");
        assert_eq!(results[1].status, CheckStatus::Fail);
    }

    #[tokio::test]
    async fn disabled_audit_warns() {
        let mut config = heuristic_only();
        config.audit.enabled = false;
        let result = check_audit_database(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn missing_audit_database_warns() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = heuristic_only();
        config.audit.database_path = dir.path().join("audit.db").display().to_string();
        let result = check_audit_database(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("not found"));
    }

    #[tokio::test]
    async fn existing_audit_database_connects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");
        std::fs::write(&path, b"").unwrap();
        let mut config = heuristic_only();
        config.audit.database_path = path.display().to_string();
        let result = check_audit_database(&config).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
    }

    #[tokio::test]
    async fn unreadable_prompt_file_warns() {
        let mut config = heuristic_only();
        config.engine.system_prompt_file = Some("/nonexistent/deskbot-prompt.md".into());
        let result = check_system_prompt(&config).await;
        assert_eq!(result.status, CheckStatus::Warn);
    }
}
