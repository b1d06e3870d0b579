//! Tool layer
//!
//! Tools are the operations an external orchestrator may call. Every tool is
//! registered through [`ToolRegistry`], which wraps it in a [`TracedTool`] so
//! each call is recorded in the run's trace without the tool opting in.

pub mod base;
pub mod registry;
pub mod traced;
pub mod types;

pub use base::{Tool, ToolError};
pub use registry::ToolRegistry;
pub use traced::TracedTool;
pub use types::{ToolCall, ToolParameter, ToolResult, ToolSchema};
