//! SQLite connection setup shared by every durable store

use crate::error::{ForemanError, ForemanResult};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tracing::debug;

const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = FULL;
     PRAGMA foreign_keys = ON;
     PRAGMA busy_timeout = 5000;";

/// Open or create a SQLite database and configure durability pragmas
pub fn open_database(path: &Path) -> ForemanResult<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ForemanError::storage(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let conn = Connection::open(path).map_err(|e| {
        ForemanError::storage(e.to_string())
            .with_context(format!("Opening sqlite database at {}", path.display()))
    })?;

    conn.execute_batch(PRAGMAS).map_err(|e| {
        ForemanError::storage(e.to_string()).with_context("Configuring sqlite pragmas")
    })?;

    debug!("Opened sqlite database at {}", path.display());
    Ok(conn)
}

/// Open a private in-memory database (tests, dry runs)
pub fn open_in_memory() -> ForemanResult<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}
