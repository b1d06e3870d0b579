//! Time-windowed read of a terminal session

use super::{SharedManager, TERMINAL_UNIT, session_id_arg};
use async_trait::async_trait;
use foreman_core::config::DEFAULT_OFFSET_SECS;
use foreman_core::terminal::Observation;
use foreman_core::tools::{Tool, ToolCall, ToolError, ToolParameter, ToolResult, ToolSchema};
use tokio_util::sync::CancellationToken;

/// Wait, then return the session output stamped inside the window
///
/// Unknown sessions and sessions without output yet succeed with the
/// corresponding sentinel text, so the orchestrator can read them as output.
pub struct ObserveTerminalSessionTool {
    manager: SharedManager,
    default_offset_secs: u64,
    cancel: CancellationToken,
}

impl ObserveTerminalSessionTool {
    pub fn new(manager: SharedManager) -> Self {
        Self {
            manager,
            default_offset_secs: DEFAULT_OFFSET_SECS,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_default_offset(mut self, secs: u64) -> Self {
        self.default_offset_secs = secs;
        self
    }

    /// Abandon in-flight observations when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn window(&self, call: &ToolCall) -> Result<(u64, u64), ToolError> {
        let offset = match call.arguments.get("offset_start_time_by_in_seconds") {
            None => self.default_offset_secs,
            Some(_) => call.get_u64("offset_start_time_by_in_seconds").ok_or_else(|| {
                ToolError::InvalidArguments(
                    "offset_start_time_by_in_seconds must be a non-negative integer".to_string(),
                )
            })?,
        };
        let duration = call.get_u64("observation_time_in_seconds").ok_or_else(|| {
            ToolError::InvalidArguments(
                "Missing or invalid 'observation_time_in_seconds' parameter".to_string(),
            )
        })?;
        Ok((offset, duration))
    }
}

#[async_trait]
impl Tool for ObserveTerminalSessionTool {
    fn name(&self) -> &str {
        "observe_terminal_session"
    }

    fn description(&self) -> &str {
        "Observes the terminal session for a specified duration and returns the logs."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            self.name(),
            self.description(),
            vec![
                ToolParameter::string(
                    "session_id",
                    "The session ID of the terminal session to observe.",
                ),
                ToolParameter::integer(
                    "offset_start_time_by_in_seconds",
                    "The number of seconds to offset the start time of the observation output.",
                )
                .optional()
                .with_default(self.default_offset_secs),
                ToolParameter::integer(
                    "observation_time_in_seconds",
                    "The duration in seconds for which the terminal session will be observed.",
                ),
            ],
        )
    }

    fn unit(&self) -> &str {
        TERMINAL_UNIT
    }

    fn validate(&self, call: &ToolCall) -> Result<(), ToolError> {
        session_id_arg(call)?;
        self.window(call).map(|_| ())
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let session_id = session_id_arg(call)?;
        let (offset, duration) = self.window(call)?;

        let observation = self
            .manager
            .observe(&session_id, offset, duration, &self.cancel)
            .await?;

        let status = match &observation {
            Observation::Lines(_) => "lines",
            Observation::NoOutputYet => "no_output_yet",
            Observation::SessionNotFound => "session_not_found",
        };
        Ok(ToolResult::success(&call.id, self.name(), observation.text())
            .with_metadata("status", status))
    }
}
