//! Terminal session tools
//!
//! The orchestrator-facing surface of [`TerminalSessionManager`]: open a
//! sandboxed shell, type into it, watch its output over a time window, and
//! tear it down. All four tools report under the `TerminalTool` unit.

mod control_c;
mod new_session;
mod observe;
mod send_command;


pub use control_c::ControlCTerminalSessionTool;
pub use new_session::NewTerminalSessionTool;
pub use observe::ObserveTerminalSessionTool;
pub use send_command::SendTerminalCommandTool;

use foreman_core::terminal::TerminalSessionManager;
use foreman_core::tools::ToolError;
use std::sync::Arc;

/// Trace unit shared by the terminal tools
pub const TERMINAL_UNIT: &str = "TerminalTool";

pub(crate) type SharedManager = Arc<TerminalSessionManager>;

pub(crate) fn session_id_arg(call: &foreman_core::ToolCall) -> Result<String, ToolError> {
    let session_id = call.require_string("session_id")?;
    if session_id.trim().is_empty() {
        return Err(ToolError::InvalidArguments(
            "session_id cannot be empty".to_string(),
        ));
    }
    Ok(session_id)
}
