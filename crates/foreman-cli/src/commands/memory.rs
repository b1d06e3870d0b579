//! Working memory commands

use crate::args::MemoryAction;
use crate::console::CliConsole;
use anyhow::Context;
use foreman_core::terminal::REGISTRY_KEYS;
use foreman_core::{Config, ModuleStore};
use serde_json::Value;

pub fn execute(action: MemoryAction, config: &Config, console: &CliConsole) -> anyhow::Result<()> {
    let path = config.storage.memory_db_path();
    let store = ModuleStore::open(&path)
        .with_context(|| format!("Opening working memory at {}", path.display()))?;
    console.info(&format!("Working memory: {}", path.display()));

    match action {
        MemoryAction::Put { name, data } => {
            store.put(&name, &parse_data(data))?;
            console.success(&format!("Stored module '{}'", name));
        }
        MemoryAction::Get { name } => match store.get(&name)? {
            Some(data) => console.plain(&serde_json::to_string_pretty(&data)?),
            None => console.warn(&format!("Module '{}' not found", name)),
        },
        MemoryAction::Delete { name } => {
            if store.delete(&name)? {
                console.success(&format!("Deleted module '{}'", name));
            } else {
                console.warn(&format!("Module '{}' did not exist", name));
            }
        }
        MemoryAction::Export => {
            console.plain(&serde_json::to_string_pretty(&store.export_all()?)?);
        }
        MemoryAction::Clear => {
            let removed = store.clear_except(&REGISTRY_KEYS)?;
            console.success(&format!("Cleared {} modules", removed));
        }
    }
    Ok(())
}

/// JSON when it parses, otherwise the raw text as a JSON string
fn parse_data(data: String) -> Value {
    serde_json::from_str(&data).unwrap_or(Value::String(data))
}
