//! Terminal session commands

use crate::args::SessionAction;
use crate::console::CliConsole;
use foreman_core::{CloseOutcome, Foreman, ForemanError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub async fn execute(
    action: SessionAction,
    foreman: &Foreman,
    console: &CliConsole,
) -> anyhow::Result<()> {
    let terminals = foreman.terminals();
    console.info(&format!("Run: {}", foreman.context().run_id()));

    match action {
        SessionAction::New => {
            let session_id = terminals.create().await?;
            console.success(&format!("Created {}", session_id));
        }
        SessionAction::Send {
            session_id,
            command,
        } => {
            let receipt = terminals.send(&session_id, &command).await?;
            console.success(&format!("Command executed in {}", receipt.session_id));
            if !receipt.snapshot.is_empty() {
                console.plain(&receipt.snapshot);
            }
        }
        SessionAction::Close { session_id } => match terminals.close(&session_id).await? {
            outcome @ CloseOutcome::Closed(_) => console.success(&outcome.to_string()),
            outcome @ CloseOutcome::NotFound => console.warn(&outcome.to_string()),
        },
        SessionAction::Observe {
            session_id,
            offset,
            duration,
        } => {
            let offset = offset.unwrap_or(foreman.config().terminal.default_offset_secs);
            let cancel = cancel_on_ctrl_c();
            match terminals
                .observe(&session_id, offset, duration, &cancel)
                .await
            {
                Ok(observation) => console.plain(observation.text()),
                Err(ForemanError::Cancelled) => console.warn("Observation cancelled"),
                Err(e) => return Err(e.into()),
            }
        }
        SessionAction::List => {
            let sessions = terminals.list()?;
            console.print_header("Terminal Sessions");
            if sessions.is_empty() {
                console.plain("No sessions registered");
            }
            for session in sessions {
                console.print_table_row(&[
                    &session.session_id,
                    &session.created_at.to_rfc3339(),
                    &session.log_path.display().to_string(),
                ]);
                for entry in &session.action_history {
                    console.plain(&format!("    {}", entry));
                }
            }
        }
    }
    Ok(())
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling observation");
            trigger.cancel();
        }
    });
    cancel
}
