//! Foreman Tools
//!
//! Tools available to the orchestrator, organized by unit:
//!
//! - `terminal`: sandboxed terminal sessions (new, send, observe, control-c)
//! - `memory`: working memory modules (add/update, get, delete, export, clear)

pub mod memory;
pub mod terminal;

pub use memory::{
    AddOrUpdateModuleTool, ClearMemoryTool, DeleteModuleTool, ExportMemoryTool, GetModuleTool,
    MEMORY_UNIT,
};
pub use terminal::{
    ControlCTerminalSessionTool, NewTerminalSessionTool, ObserveTerminalSessionTool,
    SendTerminalCommandTool, TERMINAL_UNIT,
};

use foreman_core::{Foreman, ToolRegistry};
use tokio_util::sync::CancellationToken;

/// Register every tool against `foreman`'s stores and session manager
///
/// Observations in flight are abandoned when `cancel` fires.
pub fn register_default_tools(
    registry: &mut ToolRegistry,
    foreman: &Foreman,
    cancel: CancellationToken,
) {
    let terminals = foreman.terminals().clone();
    registry.register(NewTerminalSessionTool::new(terminals.clone()));
    registry.register(ControlCTerminalSessionTool::new(terminals.clone()));
    registry.register(SendTerminalCommandTool::new(terminals.clone()));
    registry.register(
        ObserveTerminalSessionTool::new(terminals)
            .with_default_offset(foreman.config().terminal.default_offset_secs)
            .with_cancellation(cancel),
    );

    let store = foreman.store().clone();
    registry.register(AddOrUpdateModuleTool::new(store.clone()));
    registry.register(GetModuleTool::new(store.clone()));
    registry.register(DeleteModuleTool::new(store.clone()));
    registry.register(ExportMemoryTool::new(store.clone()));
    registry.register(ClearMemoryTool::new(store));
}

/// A registry over `foreman`'s run with every tool registered
pub fn default_registry(foreman: &Foreman, cancel: CancellationToken) -> ToolRegistry {
    let mut registry = ToolRegistry::new(foreman.context());
    register_default_tools(&mut registry, foreman, cancel);
    registry
}
