//! Base trait and error type for tools
//!
//! ```no_run
//! use foreman_core::tools::{Tool, ToolError, ToolSchema};
//! use foreman_core::tools::types::{ToolCall, ToolResult};
//! use async_trait::async_trait;
//!
//! struct Ping;
//!
//! #[async_trait]
//! impl Tool for Ping {
//!     fn name(&self) -> &str { "ping" }
//!     fn description(&self) -> &str { "Answers pong" }
//!     fn schema(&self) -> ToolSchema {
//!         ToolSchema::new(self.name(), self.description(), vec![])
//!     }
//!     async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
//!         Ok(ToolResult::success(&call.id, self.name(), "pong"))
//!     }
//! }
//! ```

pub mod error;
pub mod tool_trait;

pub use error::ToolError;
pub use tool_trait::Tool;
