//! Close a terminal session

use super::{SharedManager, TERMINAL_UNIT, session_id_arg};
use async_trait::async_trait;
use foreman_core::terminal::CloseOutcome;
use foreman_core::tools::{Tool, ToolCall, ToolError, ToolParameter, ToolResult, ToolSchema};

/// Kill a session and drop it from the registry
///
/// An unknown id is a failed result, not an error; the log file stays.
pub struct ControlCTerminalSessionTool {
    manager: SharedManager,
}

impl ControlCTerminalSessionTool {
    pub fn new(manager: SharedManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for ControlCTerminalSessionTool {
    fn name(&self) -> &str {
        "control_c_terminal_session"
    }

    fn description(&self) -> &str {
        "Closes the specified terminal session and reports whether it existed."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            self.name(),
            self.description(),
            vec![ToolParameter::string(
                "session_id",
                "The session ID of the terminal session to close.",
            )],
        )
    }

    fn unit(&self) -> &str {
        TERMINAL_UNIT
    }

    fn validate(&self, call: &ToolCall) -> Result<(), ToolError> {
        session_id_arg(call).map(|_| ())
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let session_id = session_id_arg(call)?;
        let outcome = self.manager.close(&session_id).await?;

        let result = match &outcome {
            CloseOutcome::Closed(_) => ToolResult::success(&call.id, self.name(), outcome.to_string()),
            CloseOutcome::NotFound => ToolResult::error(&call.id, self.name(), outcome.to_string()),
        };
        Ok(result.with_metadata("outcome", serde_json::to_value(&outcome)?))
    }
}
