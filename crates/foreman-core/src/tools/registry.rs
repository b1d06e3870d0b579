//! Tool registry that instruments every tool it holds

use crate::tools::base::Tool;
use crate::tools::traced::TracedTool;
use crate::tools::types::{ToolCall, ToolResult, ToolSchema};
use crate::trace::{ExecutionTracer, RunContext};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry for the tools of one run
///
/// Registration wraps the tool in a [`TracedTool`]; there is no way to add
/// an uninstrumented tool. Tools that report the same [`Tool::unit`] share
/// one tracer and therefore one call stack.
pub struct ToolRegistry {
    context: RunContext,
    tracers: HashMap<String, ExecutionTracer>,
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new(context: &RunContext) -> Self {
        Self {
            context: context.clone(),
            tracers: HashMap::new(),
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Register a tool, replacing any tool of the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        let tracer = self
            .tracers
            .entry(tool.unit().to_string())
            .or_insert_with(|| self.context.tracer(tool.unit()))
            .clone();

        debug!("Registering tool {} (unit {})", name, tool.unit());
        if self
            .tools
            .insert(name.clone(), Arc::new(TracedTool::new(tool, tracer)))
            .is_none()
        {
            self.order.push(name);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Schemas in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.schema())
            .collect()
    }

    /// Dispatch `call` by name; unknown tools yield a failed result
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        match self.tools.get(&call.name) {
            Some(tool) => tool.execute_with_timing(call).await,
            None => {
                warn!("Unknown tool requested: {}", call.name);
                ToolResult::error(&call.id, &call.name, format!("Tool not found: {}", call.name))
            }
        }
    }
}
