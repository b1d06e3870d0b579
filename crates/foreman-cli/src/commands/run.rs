//! Run lifecycle commands

use crate::console::CliConsole;
use foreman_core::Foreman;

/// Reset working state and store `request` as the run objective
pub async fn start(
    foreman: &Foreman,
    request: &str,
    console: &CliConsole,
) -> anyhow::Result<()> {
    let closed = foreman.start_run(request).await?;

    if !closed.is_empty() {
        console.warn(&format!("Closed stale sessions: {}", closed.join(", ")));
    }
    console.success(&format!("Started run {}", foreman.context().run_id()));
    console.plain(&format!(
        "export FOREMAN_RUN_ID={}",
        foreman.context().run_id()
    ));
    Ok(())
}
