//! Environment variable-based configuration loading

use crate::config::model::Config;
use crate::error::ForemanResult;
use std::path::PathBuf;

/// Apply `FOREMAN_*` variables from the process environment
pub fn apply_process_env(config: &mut Config) -> ForemanResult<()> {
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Apply `FOREMAN_*` overrides using `lookup` as the variable source
///
/// Supported variables: `FOREMAN_DATA_DIR`, `FOREMAN_SANDBOX`,
/// `FOREMAN_LOG_LEVEL`, `FOREMAN_LOG_FORMAT`, `FOREMAN_RUN_ID`,
/// `FOREMAN_TMUX_SOCKET`.
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> ForemanResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(data_dir) = get("FOREMAN_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(data_dir);
    }

    if let Some(sandbox) = get("FOREMAN_SANDBOX") {
        config.terminal.sandbox = sandbox.parse()?;
    }

    if let Some(level) = get("FOREMAN_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Some(format) = get("FOREMAN_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Some(run_id) = get("FOREMAN_RUN_ID") {
        config.run_id = Some(run_id);
    }

    if let Some(socket) = get("FOREMAN_TMUX_SOCKET") {
        config.terminal.tmux_socket = Some(socket);
    }

    Ok(())
}
