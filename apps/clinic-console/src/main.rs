mod commands;
mod config;
mod humantime_serde;
mod logging;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use clinic_auth::SecretString;

use crate::commands::Command;
use crate::config::ConsoleConfig;

/// Clinic console - list and manage clinic records from the terminal
#[derive(Parser)]
#[command(name = "clinic-console", version)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API root override, e.g. `http://localhost:8080/api`
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token override
    #[arg(long)]
    token: Option<String>,

    /// Allow plain-HTTP backends
    #[arg(long)]
    insecure: bool,

    /// Print effective configuration (JSON, token omitted) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut ConsoleConfig) {
        if let Some(base_url) = &self.base_url {
            config.api.base_url.clone_from(base_url);
        }
        if let Some(token) = &self.token {
            config.token = Some(SecretString::new(token.as_str()));
        }
        if self.insecure {
            config.http.allow_insecure_http = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) defaults -> 2) YAML (if provided) -> 3) env (CLINIC__*) -> 4) CLI overrides
    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    logging::init(&config.logging, cli.verbose);
    tracing::debug!(base_url = %config.api.base_url, "configuration loaded");

    if cli.print_config {
        println!("{}", config.to_pretty_json()?);
        return Ok(());
    }

    let Some(command) = cli.command else {
        bail!("no command given; see `clinic-console --help`");
    };
    commands::run(command, &config).await
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_win_over_config() {
        let cli = Cli::try_parse_from([
            "clinic-console",
            "--base-url",
            "http://127.0.0.1:9000/api",
            "--token",
            "abc.def.ghi",
            "--insecure",
            "-vv",
            "whoami",
        ])
        .unwrap();
        let mut config = ConsoleConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.api.base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.token.as_ref().map(SecretString::expose), Some("abc.def.ghi"));
        assert!(config.http.allow_insecure_http);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn config_only_invocation_needs_no_command() {
        let cli = Cli::try_parse_from(["clinic-console", "--print-config"]).unwrap();
        assert!(cli.print_config);
        assert!(cli.command.is_none());
    }
}
