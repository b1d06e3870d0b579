use super::MEMORY_UNIT;
use async_trait::async_trait;
use foreman_core::ModuleStore;
use foreman_core::terminal::REGISTRY_KEYS;
use foreman_core::tools::{Tool, ToolCall, ToolError, ToolParameter, ToolResult, ToolSchema};
use serde_json::Value;

fn module_name(call: &ToolCall) -> Result<String, ToolError> {
    let name = call.require_string("module_name")?;
    if name.trim().is_empty() {
        return Err(ToolError::InvalidArguments(
            "module_name cannot be empty".to_string(),
        ));
    }
    Ok(name)
}

fn module_name_param() -> ToolParameter {
    ToolParameter::string("module_name", "Name of the memory module.")
}

/// Insert or replace a module
pub struct AddOrUpdateModuleTool {
    store: ModuleStore,
}

impl AddOrUpdateModuleTool {
    pub fn new(store: ModuleStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AddOrUpdateModuleTool {
    fn name(&self) -> &str {
        "add_or_update_module"
    }

    fn description(&self) -> &str {
        "Stores a JSON document under a module name, replacing any previous content."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            self.name(),
            self.description(),
            vec![
                module_name_param(),
                ToolParameter::any("data", "JSON content of the module."),
            ],
        )
    }

    fn unit(&self) -> &str {
        MEMORY_UNIT
    }

    fn validate(&self, call: &ToolCall) -> Result<(), ToolError> {
        module_name(call)?;
        call.require_value("data")?;
        Ok(())
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let name = module_name(call)?;
        let data = call.require_value("data")?;
        self.store.put(&name, data)?;
        Ok(ToolResult::success(
            &call.id,
            self.name(),
            format!("Module '{}' stored", name),
        ))
    }
}

/// Read a module; a missing module is a successful `null`
pub struct GetModuleTool {
    store: ModuleStore,
}

impl GetModuleTool {
    pub fn new(store: ModuleStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetModuleTool {
    fn name(&self) -> &str {
        "get_module"
    }

    fn description(&self) -> &str {
        "Returns the JSON content of a module, or null if it does not exist."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name(), self.description(), vec![module_name_param()])
    }

    fn unit(&self) -> &str {
        MEMORY_UNIT
    }

    fn validate(&self, call: &ToolCall) -> Result<(), ToolError> {
        module_name(call).map(|_| ())
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let name = module_name(call)?;
        let data = self.store.get(&name)?.unwrap_or(Value::Null);
        Ok(
            ToolResult::success(&call.id, self.name(), serde_json::to_string(&data)?)
                .with_metadata("module", data),
        )
    }
}

/// Remove a module; removing a missing one still succeeds
pub struct DeleteModuleTool {
    store: ModuleStore,
}

impl DeleteModuleTool {
    pub fn new(store: ModuleStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DeleteModuleTool {
    fn name(&self) -> &str {
        "delete_module"
    }

    fn description(&self) -> &str {
        "Deletes a module from working memory."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name(), self.description(), vec![module_name_param()])
    }

    fn unit(&self) -> &str {
        MEMORY_UNIT
    }

    fn validate(&self, call: &ToolCall) -> Result<(), ToolError> {
        module_name(call).map(|_| ())
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let name = module_name(call)?;
        let existed = self.store.delete(&name)?;
        let message = if existed {
            format!("Module '{}' deleted", name)
        } else {
            format!("Module '{}' did not exist", name)
        };
        Ok(ToolResult::success(&call.id, self.name(), message).with_metadata("existed", existed))
    }
}

/// Every module as one JSON object
pub struct ExportMemoryTool {
    store: ModuleStore,
}

impl ExportMemoryTool {
    pub fn new(store: ModuleStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ExportMemoryTool {
    fn name(&self) -> &str {
        "export_memory"
    }

    fn description(&self) -> &str {
        "Returns all modules of working memory as a single JSON object."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name(), self.description(), vec![])
    }

    fn unit(&self) -> &str {
        MEMORY_UNIT
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let modules = self.store.export_all()?;
        Ok(ToolResult::success(
            &call.id,
            self.name(),
            serde_json::to_string_pretty(&modules)?,
        )
        .with_metadata("module_count", modules.len()))
    }
}

/// Drop every module
pub struct ClearMemoryTool {
    store: ModuleStore,
}

impl ClearMemoryTool {
    pub fn new(store: ModuleStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ClearMemoryTool {
    fn name(&self) -> &str {
        "clear_memory"
    }

    fn description(&self) -> &str {
        "Removes every module from working memory. Terminal session bookkeeping is kept."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name(), self.description(), vec![])
    }

    fn unit(&self) -> &str {
        MEMORY_UNIT
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let removed = self.store.clear_except(&REGISTRY_KEYS)?;
        Ok(ToolResult::success(
            &call.id,
            self.name(),
            format!("Cleared {} modules", removed),
        )
        .with_metadata("removed", removed))
    }
}
