//! Keyed JSON document store ("working memory")

use super::schema::{Migration, MigrationRunner};
use super::sqlite::{open_database, open_in_memory};
use crate::error::{ForemanError, ForemanResult};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params, params_from_iter};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

fn migrations() -> Vec<Migration> {
    vec![Migration::new(
        1,
        "create_modules",
        "CREATE TABLE IF NOT EXISTS modules (
            name TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )]
}

/// Durable name → JSON document map
///
/// Writes are whole-document upserts. Cloning is cheap and every clone shares
/// the same connection, so in-process writers are serialised by its lock;
/// writers in other processes are serialised by SQLite's write lock.
#[derive(Clone)]
pub struct ModuleStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ModuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleStore")
            .field("path", &self.path)
            .finish()
    }
}

impl ModuleStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> ForemanResult<Self> {
        let path = path.as_ref();
        let mut conn = open_database(path)?;
        MigrationRunner::new()
            .with_migrations(migrations())
            .migrate(&mut conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create a private in-memory store
    pub fn in_memory() -> ForemanResult<Self> {
        let mut conn = open_in_memory()?;
        MigrationRunner::new()
            .with_migrations(migrations())
            .migrate(&mut conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Database file backing this store, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create or replace the document stored under `name`
    #[instrument(skip(self, data))]
    pub fn put(&self, name: &str, data: &Value) -> ForemanResult<()> {
        let conn = self.conn.lock();
        put_row(&conn, name, data)
    }

    /// Current document for `name`, or `None` if absent
    pub fn get(&self, name: &str) -> ForemanResult<Option<Value>> {
        let conn = self.conn.lock();
        get_row(&conn, name)
    }

    /// Serialize `data` and store it under `name`
    pub fn put_as<T: Serialize>(&self, name: &str, data: &T) -> ForemanResult<()> {
        self.put(name, &serde_json::to_value(data)?)
    }

    /// Read the document under `name` as `T`
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> ForemanResult<Option<T>> {
        self.get(name)?
            .map(|value| serde_json::from_value(value).map_err(ForemanError::from))
            .transpose()
    }

    /// Remove `name`; returns false if nothing was stored there
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> ForemanResult<bool> {
        let conn = self.conn.lock();
        delete_row(&conn, name)
    }

    /// Snapshot of every document, ordered by name
    pub fn export_all(&self) -> ForemanResult<BTreeMap<String, Value>> {
        let conn = self.conn.lock();
        export_rows(&conn)
    }

    /// Remove every document; returns how many were removed
    #[instrument(skip(self))]
    pub fn clear_all(&self) -> ForemanResult<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM modules", [])?;
        debug!("Cleared {} modules", removed);
        Ok(removed)
    }

    /// Remove every document except those named in `keep`
    #[instrument(skip(self))]
    pub fn clear_except(&self, keep: &[&str]) -> ForemanResult<usize> {
        if keep.is_empty() {
            return self.clear_all();
        }
        let placeholders = (1..=keep.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("DELETE FROM modules WHERE name NOT IN ({})", placeholders);

        let conn = self.conn.lock();
        let removed = conn.execute(&sql, params_from_iter(keep.iter().copied()))?;
        debug!(kept = keep.len(), "Cleared {} modules", removed);
        Ok(removed)
    }

    /// Run `f` inside one `BEGIN IMMEDIATE` transaction
    ///
    /// The write lock is taken up front, so a read-modify-write inside `f`
    /// cannot interleave with another writer. Returning `Err` from `f` rolls
    /// every change back.
    pub fn transact<T, F>(&self, f: F) -> ForemanResult<T>
    where
        F: FnOnce(&ModuleTxn<'_>) -> ForemanResult<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&ModuleTxn { conn: &tx })?;
        tx.commit()?;
        Ok(out)
    }
}

/// Module operations bound to an open transaction
pub struct ModuleTxn<'a> {
    conn: &'a Connection,
}

impl ModuleTxn<'_> {
    pub fn get(&self, name: &str) -> ForemanResult<Option<Value>> {
        get_row(self.conn, name)
    }

    pub fn put(&self, name: &str, data: &Value) -> ForemanResult<()> {
        put_row(self.conn, name, data)
    }

    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> ForemanResult<Option<T>> {
        self.get(name)?
            .map(|value| serde_json::from_value(value).map_err(ForemanError::from))
            .transpose()
    }

    pub fn put_as<T: Serialize>(&self, name: &str, data: &T) -> ForemanResult<()> {
        self.put(name, &serde_json::to_value(data)?)
    }

    pub fn delete(&self, name: &str) -> ForemanResult<bool> {
        delete_row(self.conn, name)
    }
}

fn put_row(conn: &Connection, name: &str, data: &Value) -> ForemanResult<()> {
    let encoded = serde_json::to_string(data)?;
    conn.execute(
        "INSERT INTO modules (name, data, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        params![name, encoded, Utc::now().to_rfc3339()],
    )
    .map_err(|e| {
        ForemanError::storage(e.to_string()).with_context(format!("Writing module '{}'", name))
    })?;
    Ok(())
}

fn get_row(conn: &Connection, name: &str) -> ForemanResult<Option<Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT data FROM modules WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|raw| decode(name, &raw)).transpose()
}

fn delete_row(conn: &Connection, name: &str) -> ForemanResult<bool> {
    let removed = conn.execute("DELETE FROM modules WHERE name = ?1", params![name])?;
    Ok(removed > 0)
}

fn export_rows(conn: &Connection) -> ForemanResult<BTreeMap<String, Value>> {
    let mut stmt = conn.prepare("SELECT name, data FROM modules ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut modules = BTreeMap::new();
    for row in rows {
        let (name, raw) = row?;
        let value = decode(&name, &raw)?;
        modules.insert(name, value);
    }
    Ok(modules)
}

fn decode(name: &str, raw: &str) -> ForemanResult<Value> {
    serde_json::from_str(raw).map_err(|e| {
        ForemanError::storage(format!("Corrupt document for module '{}': {}", name, e))
    })
}
