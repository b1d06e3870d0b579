//! Trace query commands

use crate::args::RunsAction;
use crate::console::{CliConsole, colored_level};
use anyhow::Context;
use colored::*;
use foreman_core::trace::{TraceNode, TraceQueryService};
use foreman_core::{Config, SqliteTraceLog};
use std::sync::Arc;

pub fn execute(action: RunsAction, config: &Config, console: &CliConsole) -> anyhow::Result<()> {
    let path = config.storage.trace_db_path();
    let log = SqliteTraceLog::open(&path)
        .with_context(|| format!("Opening trace log at {}", path.display()))?;
    let queries = TraceQueryService::new(Arc::new(log));

    match action {
        RunsAction::List => {
            console.print_header("Runs");
            console.print_table_header(&["Run", "Started", "Records"]);
            for run in queries.list_runs()? {
                console.print_table_row(&[
                    &run.run_id,
                    &run.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                    &run.record_count.to_string(),
                ]);
            }
        }
        RunsAction::Logs { run_id } => {
            for record in queries.records(&run_id)? {
                console.plain(&format!(
                    "{} {} [{}] {}",
                    record.timestamp.format("%H:%M:%S%.3f").to_string().dimmed(),
                    colored_level(record.level),
                    record.unit_name.magenta(),
                    record.message
                ));
            }
        }
        RunsAction::Tree { run_id } => {
            for root in queries.tree(&run_id)? {
                print_node(console, &root, 0);
            }
        }
        RunsAction::Export { run_id, output } => {
            let json = serde_json::to_string_pretty(&queries.export(&run_id)?)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Writing {}", path.display()))?;
                    console.success(&format!("Exported {} to {}", run_id, path.display()));
                }
                None => console.plain(&json),
            }
        }
        RunsAction::Purge { run_id } => {
            let removed = queries.purge(&run_id)?;
            console.success(&format!("Purged {} records of {}", removed, run_id));
        }
    }
    Ok(())
}

fn print_node(console: &CliConsole, node: &TraceNode, depth: usize) {
    console.plain(&format!(
        "{}{} [{}] {}",
        "  ".repeat(depth),
        colored_level(node.record.level),
        node.record.unit_name.magenta(),
        node.record.message
    ));
    for child in &node.children {
        print_node(console, child, depth + 1);
    }
}
