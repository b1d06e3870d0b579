//! Type a command into a terminal session

use super::{SharedManager, TERMINAL_UNIT, session_id_arg};
use async_trait::async_trait;
use foreman_core::tools::{Tool, ToolCall, ToolError, ToolParameter, ToolResult, ToolSchema};
use tracing::debug;

pub struct SendTerminalCommandTool {
    manager: SharedManager,
}

impl SendTerminalCommandTool {
    pub fn new(manager: SharedManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for SendTerminalCommandTool {
    fn name(&self) -> &str {
        "send_terminal_command"
    }

    fn description(&self) -> &str {
        "Sends a command to the specified terminal session and records it in the session's action history."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            self.name(),
            self.description(),
            vec![
                ToolParameter::string(
                    "session_id",
                    "The session ID to which the command will be sent.",
                ),
                ToolParameter::string(
                    "command",
                    "The command to be executed in the terminal session.",
                ),
            ],
        )
    }

    fn unit(&self) -> &str {
        TERMINAL_UNIT
    }

    fn validate(&self, call: &ToolCall) -> Result<(), ToolError> {
        session_id_arg(call)?;
        call.require_string("command")?;
        Ok(())
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let session_id = session_id_arg(call)?;
        let command = call.require_string("command")?;

        let receipt = self.manager.send(&session_id, &command).await?;
        debug!(
            session_id = %session_id,
            snapshot_bytes = receipt.snapshot.len(),
            "Command dispatched"
        );

        Ok(ToolResult::success(&call.id, self.name(), "Command executed")
            .with_metadata("session_id", receipt.session_id)
            .with_metadata("dispatched_at", receipt.dispatched_at.to_rfc3339())
            .with_metadata("snapshot", receipt.snapshot))
    }
}
