// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deskbot - AI ticket triage for IT help desks.
//!
//! This is the binary entry point.

mod doctor;
mod shell;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use deskbot_config::{ConfigError, DeskbotConfig};

/// Deskbot - AI ticket triage for IT help desks.
#[derive(Parser, Debug)]
#[command(name = "deskbot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the engine in an interactive REPL.
    Shell,
    /// Check configuration, providers, and the audit database.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Doctor { plain }) => {
            // Doctor reports config failures itself instead of aborting.
            let loaded = load(cli.config.as_deref());
            init_tracing(loaded.as_ref().map_or("info", |c| c.engine.log_level.as_str()));
            doctor::run_doctor(loaded, plain).await;
        }
        Some(Commands::Shell) => {
            let config = load_or_exit(cli.config.as_deref());
            init_tracing(&config.engine.log_level);
            if let Err(e) = shell::run_shell(&config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            let config = load_or_exit(cli.config.as_deref());
            match render_config(&config) {
                Ok(text) => print!("{text}"),
                Err(e) => {
                    eprintln!("error: failed to serialize config: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("deskbot: use --help for available commands");
        }
    }
}

fn load(path: Option<&Path>) -> Result<DeskbotConfig, Vec<ConfigError>> {
    match path {
        Some(path) => deskbot_config::load_and_validate_path(path),
        None => deskbot_config::load_and_validate(),
    }
}

fn load_or_exit(path: Option<&Path>) -> DeskbotConfig {
    match load(path) {
        Ok(config) => config,
        Err(errors) => {
            deskbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Effective configuration as TOML, API keys masked.
fn render_config(config: &DeskbotConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&config.redacted())
}

/// Logs go to stderr so they never interleave with REPL output on stdout.
/// `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("deskbot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["deskbot", "doctor", "--plain"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Doctor { plain: true })));

        let cli = Cli::try_parse_from(["deskbot", "shell", "--config", "/tmp/d.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Shell)));
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/d.toml")));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["deskbot", "serve"]).is_err());
    }

    #[test]
    fn rendered_config_masks_keys() {
        let mut config = DeskbotConfig::default();
        config.anthropic.api_key = Some("sk-ant-secret".into());
        let text = render_config(&config).unwrap();
        assert!(!text.contains("sk-ant-secret"));
        assert!(text.contains("[REDACTED]"));
        assert!(text.contains("[providers]"));
    }

    #[test]
    fn explicit_config_path_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deskbot.toml");
        std::fs::write(&path, "[providers]\norder = [\"heuristic\"]\n").unwrap();
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.providers.order, ["heuristic"]);
    }
}
