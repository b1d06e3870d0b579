//! Core Tool trait definition

use super::error::ToolError;
use crate::tools::types::{ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;
use std::time::Instant;

/// One callable operation exposed to the orchestrator
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name the orchestrator calls (e.g. "send_terminal_command")
    fn name(&self) -> &str;

    /// Description for the model
    fn description(&self) -> &str;

    /// JSON function schema for the arguments
    fn schema(&self) -> ToolSchema;

    /// Unit this tool belongs to; tools of one unit share a trace call stack
    fn unit(&self) -> &str {
        self.name()
    }

    /// Execute the tool with the given arguments
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if arguments are invalid or the operation fails.
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError>;

    /// Validate the tool call arguments before `execute()`
    fn validate(&self, call: &ToolCall) -> Result<(), ToolError> {
        let _ = call;
        Ok(())
    }

    /// Validate, execute, time, and fold errors into a failed `ToolResult`
    async fn execute_with_timing(&self, call: &ToolCall) -> ToolResult {
        let start_time = Instant::now();

        let outcome = match self.validate(call) {
            Ok(()) => self.execute(call).await,
            Err(err) => Err(err),
        };

        let elapsed = start_time.elapsed().as_millis() as u64;
        match outcome {
            Ok(result) => result.with_execution_time(elapsed),
            Err(err) => ToolResult::error(&call.id, self.name(), err.to_string())
                .with_execution_time(elapsed),
        }
    }
}
