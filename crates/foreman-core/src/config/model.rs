//! Configuration data models

use crate::config::logging_config::LoggingConfig;
use crate::config::timeouts;
use crate::error::{ForemanError, ForemanResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Timestamp layout written by the capture filter and parsed by `observe`
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// Default look-back for observations when the caller gives none
pub const DEFAULT_OFFSET_SECS: u64 = 5;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub terminal: TerminalConfig,
    pub logging: LoggingConfig,
    /// Join this run instead of starting a new one
    pub run_id: Option<String>,
}

impl Config {
    /// Path of the default config file (`~/.foreman/foreman.toml`)
    pub fn default_path() -> PathBuf {
        default_data_dir().join("foreman.toml")
    }

    /// Validate the configuration
    pub fn validate(&self) -> ForemanResult<()> {
        if self.terminal.timestamp_format.trim().is_empty() {
            return Err(ForemanError::config(
                "terminal.timestamp_format must not be empty",
            ));
        }
        if self.terminal.default_offset_secs > timeouts::observe::MAX_WINDOW_SECS {
            return Err(ForemanError::config(format!(
                "terminal.default_offset_secs must be at most {}",
                timeouts::observe::MAX_WINDOW_SECS
            )));
        }
        if let Some(run_id) = &self.run_id {
            if run_id.trim().is_empty() {
                return Err(ForemanError::config("run_id must not be empty"));
            }
        }
        Ok(())
    }
}

/// Where durable state lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Module store database, defaults to `<data_dir>/memory.db`
    pub memory_db: Option<PathBuf>,
    /// Trace log database, defaults to `<data_dir>/traces.db`
    pub trace_db: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            memory_db: None,
            trace_db: None,
        }
    }
}

impl StorageConfig {
    pub fn memory_db_path(&self) -> PathBuf {
        self.memory_db
            .clone()
            .unwrap_or_else(|| self.data_dir.join("memory.db"))
    }

    pub fn trace_db_path(&self) -> PathBuf {
        self.trace_db
            .clone()
            .unwrap_or_else(|| self.data_dir.join("traces.db"))
    }
}

/// Terminal session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Directory holding one `<session_id>.log` per session, defaults to `<data_dir>/logs`
    pub logs_dir: Option<PathBuf>,
    pub sandbox: SandboxSpec,
    pub timestamp_format: String,
    /// Filter that prefixes each output line with a timestamp.
    /// Defaults to moreutils `ts` with `timestamp_format`.
    pub stamp_command: Option<String>,
    pub default_offset_secs: u64,
    /// tmux server socket name (`tmux -L`); the default server when unset
    pub tmux_socket: Option<String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            logs_dir: None,
            sandbox: SandboxSpec::Local,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            stamp_command: None,
            default_offset_secs: DEFAULT_OFFSET_SECS,
            tmux_socket: None,
        }
    }
}

impl TerminalConfig {
    pub fn logs_dir(&self, storage: &StorageConfig) -> PathBuf {
        self.logs_dir
            .clone()
            .unwrap_or_else(|| storage.data_dir.join("logs"))
    }

    pub fn stamp_command(&self) -> String {
        self.stamp_command
            .clone()
            .unwrap_or_else(|| format!("ts \"{}\"", self.timestamp_format))
    }
}

/// Which sandbox hosts the terminal sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SandboxSpec {
    /// `/bin/bash` on the host
    Local,
    /// A running docker container resolved by name filter
    Docker { label: String },
}

impl FromStr for SandboxSpec {
    type Err = ForemanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        match s.split_once(':') {
            Some(("docker", label)) if !label.trim().is_empty() => Ok(Self::Docker {
                label: label.trim().to_string(),
            }),
            _ => Err(ForemanError::config_with_context(
                format!("Unknown sandbox '{}'", s),
                "expected 'local' or 'docker:<label>'",
            )),
        }
    }
}

impl TryFrom<String> for SandboxSpec {
    type Error = ForemanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SandboxSpec> for String {
    fn from(spec: SandboxSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for SandboxSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Docker { label } => write!(f, "docker:{}", label),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".foreman"))
        .unwrap_or_else(|| PathBuf::from(".foreman"))
}
