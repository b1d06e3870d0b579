//! Sandboxes that host terminal sessions

use crate::config::{SandboxSpec, timeouts};
use crate::error::{ForemanError, ForemanResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

/// An isolated environment a session's shell runs in
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Human-readable name for logs
    fn describe(&self) -> String;

    /// Shell command line that starts an interactive shell inside the sandbox
    async fn shell_command(&self) -> ForemanResult<String>;
}

/// Runs the shell directly on the host
#[derive(Debug, Clone, Default)]
pub struct LocalSandbox;

#[async_trait]
impl Sandbox for LocalSandbox {
    fn describe(&self) -> String {
        "local".to_string()
    }

    async fn shell_command(&self) -> ForemanResult<String> {
        Ok("/bin/bash 2>&1".to_string())
    }
}

/// Runs the shell in a running docker container found by name filter
#[derive(Debug, Clone)]
pub struct DockerSandbox {
    label: String,
}

impl DockerSandbox {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Id of the first running container whose name matches the label
    pub async fn resolve(&self) -> ForemanResult<String> {
        let filter = format!("name={}", self.label);
        let args = ["ps", "--filter", filter.as_str(), "--format", "{{.ID}}"];
        debug!("Executing docker command: docker {}", args.join(" "));

        let output = tokio::time::timeout(
            timeouts::sandbox::resolve_timeout(),
            Command::new("docker").args(args).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| self.unreachable("docker ps timed out"))?
        .map_err(|e| self.unreachable(format!("failed to execute docker: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.unreachable(format!("docker ps failed: {}", stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let id = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| self.unreachable("no running container found"))?;

        if !is_container_id(id) {
            return Err(self.unreachable(format!("unexpected container id '{}'", id)));
        }
        Ok(id.to_string())
    }

    fn unreachable(&self, message: impl Into<String>) -> ForemanError {
        ForemanError::other(message)
            .with_context(format!("Resolving docker sandbox '{}'", self.label))
    }
}

#[async_trait]
impl Sandbox for DockerSandbox {
    fn describe(&self) -> String {
        format!("docker:{}", self.label)
    }

    async fn shell_command(&self) -> ForemanResult<String> {
        let id = self.resolve().await?;
        Ok(format!("docker exec -it {} /bin/bash", id))
    }
}

fn is_container_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Build the sandbox selected by configuration
pub fn sandbox_for(spec: &SandboxSpec) -> Arc<dyn Sandbox> {
    match spec {
        SandboxSpec::Local => Arc::new(LocalSandbox),
        SandboxSpec::Docker { label } => Arc::new(DockerSandbox::new(label.clone())),
    }
}
