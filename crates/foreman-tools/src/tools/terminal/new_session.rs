//! Open a new terminal session

use super::{SharedManager, TERMINAL_UNIT};
use async_trait::async_trait;
use foreman_core::tools::{Tool, ToolCall, ToolError, ToolResult, ToolSchema};

/// Start a sandboxed shell and return its session id
pub struct NewTerminalSessionTool {
    manager: SharedManager,
}

impl NewTerminalSessionTool {
    pub fn new(manager: SharedManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for NewTerminalSessionTool {
    fn name(&self) -> &str {
        "new_terminal_session"
    }

    fn description(&self) -> &str {
        "Creates a new terminal session and returns its session ID."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name(), self.description(), vec![])
    }

    fn unit(&self) -> &str {
        TERMINAL_UNIT
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let session_id = self.manager.create().await?;
        Ok(ToolResult::success(&call.id, self.name(), &session_id)
            .with_metadata("session_id", session_id))
    }
}
