//! Terminal multiplexer control

use crate::config::timeouts;
use crate::error::{ForemanError, ForemanResult};
use async_trait::async_trait;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Named, detachable terminal sessions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Multiplexer: Send + Sync {
    /// Start a detached session running `shell_command`
    async fn new_session(&self, name: &str, shell_command: &str) -> ForemanResult<()>;

    /// Type `keys` literally into the session, then press Enter
    async fn send_keys(&self, name: &str, keys: &str) -> ForemanResult<()>;

    /// Destroy the session; `Ok(false)` if it did not exist
    async fn kill_session(&self, name: &str) -> ForemanResult<bool>;

    /// Whether a session with exactly this name is running
    async fn has_session(&self, name: &str) -> ForemanResult<bool>;
}

/// [`Multiplexer`] driving the `tmux` command line
#[derive(Debug, Clone)]
pub struct TmuxMultiplexer {
    binary: String,
    socket: Option<String>,
    timeout: Duration,
}

impl Default for TmuxMultiplexer {
    fn default() -> Self {
        Self {
            binary: "tmux".to_string(),
            socket: None,
            timeout: timeouts::multiplexer::command_timeout(),
        }
    }
}

impl TmuxMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Talk to a dedicated tmux server instead of the user's default one
    pub fn with_socket(mut self, socket: Option<String>) -> Self {
        self.socket = socket;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, args: &[&str]) -> ForemanResult<Output> {
        debug!("Executing multiplexer command: {} {}", self.binary, args.join(" "));

        let mut cmd = Command::new(&self.binary);
        if let Some(socket) = &self.socket {
            cmd.arg("-L").arg(socket);
        }
        cmd.args(args).kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ForemanError::io(format!(
                "Failed to execute {}: {}",
                self.binary, e
            ))),
            Err(_) => Err(ForemanError::other(format!(
                "{} {} timed out after {}s",
                self.binary,
                args.first().copied().unwrap_or_default(),
                self.timeout.as_secs()
            ))),
        }
    }

    async fn run_checked(&self, args: &[&str]) -> ForemanResult<()> {
        let output = self.run(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ForemanError::other(format!(
                "{} {} failed: {}",
                self.binary,
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

// `=` makes tmux match the session name exactly instead of by prefix.
fn session_target(name: &str) -> String {
    format!("={}", name)
}

fn pane_target(name: &str) -> String {
    format!("={}:", name)
}

#[async_trait]
impl Multiplexer for TmuxMultiplexer {
    async fn new_session(&self, name: &str, shell_command: &str) -> ForemanResult<()> {
        self.run_checked(&["new-session", "-d", "-s", name, shell_command])
            .await
    }

    async fn send_keys(&self, name: &str, keys: &str) -> ForemanResult<()> {
        let target = pane_target(name);
        self.run_checked(&["send-keys", "-t", &target, "-l", "--", keys])
            .await?;
        self.run_checked(&["send-keys", "-t", &target, "Enter"]).await
    }

    async fn kill_session(&self, name: &str) -> ForemanResult<bool> {
        let output = self
            .run(&["kill-session", "-t", &session_target(name)])
            .await?;
        Ok(output.status.success())
    }

    async fn has_session(&self, name: &str) -> ForemanResult<bool> {
        let output = self
            .run(&["has-session", "-t", &session_target(name)])
            .await?;
        Ok(output.status.success())
    }
}
