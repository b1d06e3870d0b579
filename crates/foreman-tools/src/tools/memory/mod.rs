//! Working memory tools
//!
//! Named JSON modules the orchestrator reads and writes between turns,
//! stored in the [`ModuleStore`](foreman_core::ModuleStore). All five tools
//! report under the `WorkingMemory` unit.

mod working_memory;

#[cfg(test)]
mod memory_tests;

pub use working_memory::{
    AddOrUpdateModuleTool, ClearMemoryTool, DeleteModuleTool, ExportMemoryTool, GetModuleTool,
};

/// Trace unit shared by the working memory tools
pub const MEMORY_UNIT: &str = "WorkingMemory";
