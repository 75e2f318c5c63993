//! Fairscope CLI
//!
//! Command-line front-end for the subgroup-fairness backend: submit an
//! evaluation, follow it to completion and print the resulting views.

mod commands;
mod config;
mod controller;
mod render;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fairscope")]
#[command(about = "Subgroup fairness analysis CLI", long_about = None)]
struct Cli {
    /// Backend URL
    #[arg(long, env = "FAIRSCOPE_BASE_URL", default_value = "http://localhost:5000")]
    base_url: String,

    /// Delay between status polls, in milliseconds
    #[arg(long, env = "FAIRSCOPE_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// HTTP request timeout, in seconds
    #[arg(long, env = "FAIRSCOPE_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Response header carrying the status URL (repeatable, tried in order)
    #[arg(long = "status-header", value_name = "NAME")]
    status_headers: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new(&self.base_url);
        config.poll_interval = Duration::from_millis(self.poll_interval_ms);
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        if !self.status_headers.is_empty() {
            config.status_headers = self.status_headers.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with rendered output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fairscope_cli=info,fairscope_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate()?;

    tracing::debug!("Using backend at {}", config.base_url);
    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "fairscope",
            "--base-url",
            "http://fairness:8000",
            "--poll-interval-ms",
            "500",
            "--status-header",
            "status",
            "algorithms",
        ])
        .unwrap();
        let config = cli.config();

        assert_eq!(config.base_url, "http://fairness:8000");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.status_headers, vec!["status"]);
        assert!(matches!(cli.command, Commands::Algorithms));
    }

    #[test]
    fn test_default_status_headers() {
        let cli = Cli::try_parse_from(["fairscope", "columns", "d1"]).unwrap();
        assert_eq!(cli.config().status_headers, vec!["Location", "status"]);
    }
}
