//! Foreman CLI application
//!
//! Operator surface over the Foreman core: working memory, terminal
//! sessions, run start, and the read-only trace queries.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/foreman-cli
//! ```
//!
//! Commands act on the data directory from `--data-dir`, `FOREMAN_DATA_DIR`
//! or `~/.foreman/foreman.toml`. Session commands record their traces under
//! `--run-id` / `FOREMAN_RUN_ID` when given; `foreman run start` prints the
//! id of the run it begins.

mod args;
mod commands;
mod console;
mod router;

use clap::Parser;
use foreman_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = router::load(&cli)?;
    init_logging(&config.logging, cli.verbose);

    router::route(cli, config).await
}

/// `RUST_LOG` wins over the configured level; `--verbose` forces debug
fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        _ => builder.pretty().init(),
    }
}
