//! Configuration loading and management

use crate::config::env_loader::{apply_env_overrides, apply_process_env};
use crate::config::file_loader::load_from_file;
use crate::config::model::{Config, SandboxSpec};
use crate::error::ForemanResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of configuration data
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Configuration from a file
    File(PathBuf),
    /// Configuration from the process environment
    Environment,
    /// Configuration from a fixed variable map (tests, embedding)
    EnvironmentMap(HashMap<String, String>),
    /// Configuration from command line flags
    CommandLine(ConfigOverrides),
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub sandbox: Option<SandboxSpec>,
    pub run_id: Option<String>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if let Some(sandbox) = &self.sandbox {
            config.terminal.sandbox = sandbox.clone();
        }
        if let Some(run_id) = &self.run_id {
            config.run_id = Some(run_id.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

/// Configuration loader with support for multiple sources
///
/// Sources are applied in the order they were added; later sources win.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration source
    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add default configuration source
    pub fn with_defaults(self) -> Self {
        self.add_source(ConfigSource::Default)
    }

    /// Add a file source
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.add_source(ConfigSource::File(path.as_ref().to_path_buf()))
    }

    /// Add environment variables source
    pub fn with_env(self) -> Self {
        self.add_source(ConfigSource::Environment)
    }

    /// Add command line overrides
    pub fn with_overrides(self, overrides: ConfigOverrides) -> Self {
        self.add_source(ConfigSource::CommandLine(overrides))
    }

    /// Load configuration from all sources
    pub fn load(self) -> ForemanResult<Config> {
        let mut config = Config::default();

        for source in &self.sources {
            match source {
                ConfigSource::Default => config = Config::default(),
                ConfigSource::File(path) => {
                    debug!("Loading configuration from {}", path.display());
                    config = load_from_file(path)?;
                }
                ConfigSource::Environment => apply_process_env(&mut config)?,
                ConfigSource::EnvironmentMap(vars) => {
                    apply_env_overrides(&mut config, |k| vars.get(k).cloned())?
                }
                ConfigSource::CommandLine(overrides) => overrides.apply(&mut config),
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Load configuration with the standard precedence:
/// defaults, then the config file, then `FOREMAN_*` variables, then flags.
pub fn load_config(path: Option<&Path>, overrides: ConfigOverrides) -> ForemanResult<Config> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);

    ConfigLoader::new()
        .with_defaults()
        .with_file(path)
        .with_env()
        .with_overrides(overrides)
        .load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_precedence_file_then_env_then_flags() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("foreman.toml");
        fs::write(
            &path,
            "run_id = \"file-run\"\n[logging]\nlevel = \"warn\"\nformat = \"compact\"\n",
        )
        .unwrap();

        let mut vars = HashMap::new();
        vars.insert("FOREMAN_RUN_ID".to_string(), "env-run".to_string());
        vars.insert("FOREMAN_LOG_LEVEL".to_string(), "debug".to_string());

        let config = ConfigLoader::new()
            .with_defaults()
            .with_file(&path)
            .add_source(ConfigSource::EnvironmentMap(vars))
            .with_overrides(ConfigOverrides {
                run_id: Some("flag-run".to_string()),
                ..Default::default()
            })
            .load()
            .unwrap();

        assert_eq!(config.run_id.as_deref(), Some("flag-run"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "compact");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::new()
            .with_file(temp_dir.path().join("nope.toml"))
            .load()
            .unwrap();
        assert_eq!(config.logging.level, "info");
    }
}
