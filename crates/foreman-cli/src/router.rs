//! Command routing logic for CLI

use crate::args::{Cli, Commands, RunAction};
use crate::commands;
use crate::console::CliConsole;
use foreman_core::{Config, ConfigOverrides, Foreman, load_config};

/// Resolve the configuration from file, environment and global flags
pub fn load(cli: &Cli) -> anyhow::Result<Config> {
    let overrides = ConfigOverrides {
        data_dir: cli.data_dir.clone(),
        sandbox: cli.sandbox.clone(),
        run_id: cli.run_id.clone(),
        log_level: None,
    };
    Ok(load_config(cli.config.as_deref(), overrides)?)
}

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: Config) -> anyhow::Result<()> {
    let console = CliConsole::new(cli.verbose);
    match cli.command {
        Commands::Memory { action } => commands::memory::execute(action, &config, &console),
        Commands::Runs { action } => commands::runs::execute(action, &config, &console),
        Commands::Session { action } => {
            let foreman = build(config)?;
            commands::session::execute(action, &foreman, &console).await
        }
        Commands::Run {
            action: RunAction::Start { request },
        } => {
            let foreman = build(config)?;
            commands::run::start(&foreman, &request, &console).await
        }
        Commands::Tools => commands::tools::show_tools(config),
    }
}

fn build(config: Config) -> anyhow::Result<Foreman> {
    Ok(Foreman::builder().with_config(config).build()?)
}
