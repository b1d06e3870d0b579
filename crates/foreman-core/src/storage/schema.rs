//! Database schema and migration management

use crate::error::{ForemanError, ForemanResult};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

/// Schema version identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaVersion(pub u32);

impl SchemaVersion {
    /// Create a new version
    pub fn new(version: u32) -> Self {
        Self(version)
    }

    /// Get version number
    pub fn version(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version this migration upgrades to
    pub version: SchemaVersion,
    /// Migration name/description
    pub name: String,
    /// SQL batch for upgrading
    pub up_sql: String,
}

impl Migration {
    /// Create a new migration
    pub fn new(version: u32, name: impl Into<String>, up_sql: impl Into<String>) -> Self {
        Self {
            version: SchemaVersion::new(version),
            name: name.into(),
            up_sql: up_sql.into(),
        }
    }
}

/// A record of an applied migration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub version: SchemaVersion,
    pub name: String,
    pub applied_at: String,
}

/// Migration runner for applying database migrations
#[derive(Debug, Default)]
pub struct MigrationRunner {
    migrations: Vec<Migration>,
}

impl MigrationRunner {
    /// Create a new migration runner
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a migration
    pub fn add_migration(&mut self, migration: Migration) {
        self.migrations.push(migration);
        self.migrations.sort_by_key(|m| m.version);
    }

    /// Add multiple migrations
    pub fn with_migrations(mut self, migrations: Vec<Migration>) -> Self {
        for m in migrations {
            self.add_migration(m);
        }
        self
    }

    /// Get current schema version from database
    pub fn current_version(&self, conn: &Connection) -> ForemanResult<Option<SchemaVersion>> {
        ensure_migrations_table(conn)?;

        let version: Option<i64> = conn
            .query_row(
                "SELECT version FROM schema_migrations ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        version
            .map(|v| {
                u32::try_from(v).map(SchemaVersion::new).map_err(|_| {
                    ForemanError::storage(format!(
                        "Invalid schema version in database: {} (expected non-negative u32)",
                        v
                    ))
                })
            })
            .transpose()
    }

    /// Run all pending migrations, each in its own transaction
    pub fn migrate(&self, conn: &mut Connection) -> ForemanResult<usize> {
        let current = self.current_version(conn)?.map(|v| v.0).unwrap_or(0);
        let mut applied = 0;

        for migration in self.migrations.iter().filter(|m| m.version.0 > current) {
            tracing::info!("Running migration {} ({})", migration.version, migration.name);

            let tx = conn.transaction()?;
            tx.execute_batch(&migration.up_sql).map_err(|e| {
                ForemanError::storage(e.to_string())
                    .with_context(format!("Applying migration {}", migration.name))
            })?;
            tx.execute(
                "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![
                    i64::from(migration.version.0),
                    migration.name,
                    Utc::now().to_rfc3339()
                ],
            )?;
            tx.commit()?;
            applied += 1;
        }

        if applied > 0 {
            tracing::info!("Applied {} migrations", applied);
        }

        Ok(applied)
    }

    /// Get migration history
    pub fn history(&self, conn: &Connection) -> ForemanResult<Vec<MigrationRecord>> {
        ensure_migrations_table(conn)?;

        let mut stmt = conn.prepare(
            "SELECT version, name, applied_at FROM schema_migrations ORDER BY version",
        )?;
        let rows = stmt.query_map([], |row| {
            let version: i64 = row.get(0)?;
            Ok((version, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (version, name, applied_at) = row?;
            let version = u32::try_from(version).map_err(|_| {
                ForemanError::storage(format!("Invalid migration history version: {}", version))
            })?;
            records.push(MigrationRecord {
                version: SchemaVersion::new(version),
                name,
                applied_at,
            });
        }

        Ok(records)
    }
}

fn ensure_migrations_table(conn: &Connection) -> ForemanResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::open_in_memory;

    #[test]
    fn test_schema_version() {
        let v1 = SchemaVersion::new(1);
        let v2 = SchemaVersion::new(2);

        assert!(v1 < v2);
        assert_eq!(v1.to_string(), "v1");
    }

    #[test]
    fn test_migration_runner_ordering() {
        let mut runner = MigrationRunner::new();

        runner.add_migration(Migration::new(3, "third", "SQL3"));
        runner.add_migration(Migration::new(1, "first", "SQL1"));
        runner.add_migration(Migration::new(2, "second", "SQL2"));

        assert_eq!(runner.migrations[0].version.0, 1);
        assert_eq!(runner.migrations[1].version.0, 2);
        assert_eq!(runner.migrations[2].version.0, 3);
    }

    #[test]
    fn test_migration_runner_migrate() {
        let mut conn = open_in_memory().unwrap();

        let runner = MigrationRunner::new().with_migrations(vec![
            Migration::new(1, "create_users", "CREATE TABLE users (id INTEGER, name TEXT)"),
            Migration::new(2, "create_posts", "CREATE TABLE posts (id INTEGER, title TEXT)"),
        ]);

        assert_eq!(runner.migrate(&mut conn).unwrap(), 2);
        // Running again should apply 0 migrations
        assert_eq!(runner.migrate(&mut conn).unwrap(), 0);

        let history = runner.history(&conn).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].name, "create_posts");
        assert_eq!(
            runner.current_version(&conn).unwrap(),
            Some(SchemaVersion::new(2))
        );
    }

    #[test]
    fn test_failed_migration_is_not_recorded() {
        let mut conn = open_in_memory().unwrap();
        let runner = MigrationRunner::new()
            .with_migrations(vec![Migration::new(1, "broken", "CREATE TABLE (")]);

        assert!(runner.migrate(&mut conn).is_err());
        assert_eq!(runner.current_version(&conn).unwrap(), None);
    }
}
