//! Configuration management for Foreman

mod env_loader;
mod file_loader;
mod logging_config;

pub mod loader;
pub mod model;
pub mod timeouts;

pub use env_loader::{apply_env_overrides, apply_process_env};
pub use file_loader::load_from_file;
pub use loader::{ConfigLoader, ConfigOverrides, ConfigSource, load_config};
pub use logging_config::LoggingConfig;
pub use model::{
    Config, DEFAULT_OFFSET_SECS, DEFAULT_TIMESTAMP_FORMAT, SandboxSpec, StorageConfig,
    TerminalConfig,
};
