//! Tools command implementation

use foreman_core::{Config, Foreman};
use foreman_tools::default_registry;
use tokio_util::sync::CancellationToken;

/// Print the JSON function schema of every tool
pub fn show_tools(config: Config) -> anyhow::Result<()> {
    // Schemas only; keep the databases untouched.
    let foreman = Foreman::builder().with_config(config).in_memory().build()?;
    let registry = default_registry(&foreman, CancellationToken::new());

    let schemas: Vec<_> = registry
        .schemas()
        .into_iter()
        .map(|schema| {
            serde_json::json!({
                "type": "function",
                "function": schema,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}
