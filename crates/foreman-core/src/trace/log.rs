//! Durable sink for runs and trace records

use super::types::{RunRecord, RunSummary, TraceLevel, TraceRecord};
use crate::error::{ForemanError, ForemanResult};
use crate::storage::{Migration, MigrationRunner, open_database, open_in_memory};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use uuid::Uuid;

/// Append-only store of runs and their trace records
///
/// Records for a run come back in the order they were appended.
pub trait TraceLog: Send + Sync {
    /// Persist a run; appending an existing run id is a no-op
    fn append_run(&self, run: &RunRecord) -> ForemanResult<()>;

    /// Append one record
    fn append(&self, record: &TraceRecord) -> ForemanResult<()>;

    fn get_run(&self, run_id: &str) -> ForemanResult<Option<RunRecord>>;

    /// Every run, oldest first
    fn list_runs(&self) -> ForemanResult<Vec<RunSummary>>;

    /// All records of `run_id` in append order
    fn records_for_run(&self, run_id: &str) -> ForemanResult<Vec<TraceRecord>>;

    /// Delete every record of `run_id`; the run itself is kept
    fn purge_run(&self, run_id: &str) -> ForemanResult<usize>;
}

const SCHEMA_V1: &str = r"
CREATE TABLE IF NOT EXISTS runs (
  run_id TEXT PRIMARY KEY,
  start_time TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS trace_records (
  seq INTEGER PRIMARY KEY AUTOINCREMENT,
  record_id TEXT NOT NULL UNIQUE,
  run_id TEXT NOT NULL,
  timestamp TEXT NOT NULL,
  level TEXT NOT NULL CHECK (level IN ('TRACE','DEBUG','INFO','WARN','ERROR')),
  message TEXT NOT NULL,
  unit_name TEXT NOT NULL,
  parent_id TEXT,
  FOREIGN KEY (run_id) REFERENCES runs(run_id)
);

CREATE INDEX IF NOT EXISTS idx_trace_records_run ON trace_records(run_id, seq);

CREATE TRIGGER IF NOT EXISTS trg_runs_no_update
BEFORE UPDATE ON runs
BEGIN
  SELECT RAISE(FAIL, 'runs is append-only');
END;
CREATE TRIGGER IF NOT EXISTS trg_runs_no_delete
BEFORE DELETE ON runs
BEGIN
  SELECT RAISE(FAIL, 'runs is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_trace_records_no_update
BEFORE UPDATE ON trace_records
BEGIN
  SELECT RAISE(FAIL, 'trace_records is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_trace_records_parent_in_run
BEFORE INSERT ON trace_records
WHEN NEW.parent_id IS NOT NULL
  AND NOT EXISTS (
    SELECT 1 FROM trace_records
    WHERE record_id = NEW.parent_id AND run_id = NEW.run_id
  )
BEGIN
  SELECT RAISE(FAIL, 'trace record parent must be an earlier record of the same run');
END;
";

/// SQLite-backed [`TraceLog`]
pub struct SqliteTraceLog {
    conn: Mutex<Connection>,
}

impl SqliteTraceLog {
    /// Open (or create) the trace database at `path`
    pub fn open(path: &Path) -> ForemanResult<Self> {
        Self::with_connection(open_database(path)?)
    }

    pub fn in_memory() -> ForemanResult<Self> {
        Self::with_connection(open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> ForemanResult<Self> {
        MigrationRunner::new()
            .with_migrations(vec![Migration::new(1, "create_trace_log", SCHEMA_V1)])
            .migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl TraceLog for SqliteTraceLog {
    fn append_run(&self, run: &RunRecord) -> ForemanResult<()> {
        self.conn.lock().execute(
            "INSERT OR IGNORE INTO runs (run_id, start_time) VALUES (?1, ?2)",
            params![run.run_id, run.start_time.to_rfc3339()],
        )?;
        Ok(())
    }

    fn append(&self, record: &TraceRecord) -> ForemanResult<()> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO trace_records
                   (record_id, run_id, timestamp, level, message, unit_name, parent_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.record_id.to_string(),
                    record.run_id,
                    record.timestamp.to_rfc3339(),
                    record.level.as_str(),
                    record.message,
                    record.unit_name,
                    record.parent_id.map(|id| id.to_string()),
                ],
            )
            .map_err(|e| {
                ForemanError::storage(e.to_string())
                    .with_context(format!("Appending trace record {}", record.record_id))
            })?;
        Ok(())
    }

    fn get_run(&self, run_id: &str) -> ForemanResult<Option<RunRecord>> {
        let conn = self.conn.lock();
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT run_id, start_time FROM runs WHERE run_id = ?1",
                params![run_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(run_id, start_time)| {
            Ok(RunRecord {
                run_id,
                start_time: parse_time(&start_time)?,
            })
        })
        .transpose()
    }

    fn list_runs(&self) -> ForemanResult<Vec<RunSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT r.run_id, r.start_time, COUNT(t.seq)
             FROM runs r LEFT JOIN trace_records t ON t.run_id = r.run_id
             GROUP BY r.run_id
             ORDER BY r.start_time, r.run_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut runs = Vec::new();
        for row in rows {
            let (run_id, start_time, count) = row?;
            runs.push(RunSummary {
                run_id,
                start_time: parse_time(&start_time)?,
                record_count: u64::try_from(count).unwrap_or_default(),
            });
        }
        Ok(runs)
    }

    fn records_for_run(&self, run_id: &str) -> ForemanResult<Vec<TraceRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT record_id, run_id, timestamp, level, message, unit_name, parent_id
             FROM trace_records WHERE run_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![run_id], raw_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.decode()?);
        }
        Ok(records)
    }

    fn purge_run(&self, run_id: &str) -> ForemanResult<usize> {
        let removed = self
            .conn
            .lock()
            .execute("DELETE FROM trace_records WHERE run_id = ?1", params![run_id])?;
        Ok(removed)
    }
}

struct RawRecord {
    record_id: String,
    run_id: String,
    timestamp: String,
    level: String,
    message: String,
    unit_name: String,
    parent_id: Option<String>,
}

fn raw_record(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        record_id: row.get(0)?,
        run_id: row.get(1)?,
        timestamp: row.get(2)?,
        level: row.get(3)?,
        message: row.get(4)?,
        unit_name: row.get(5)?,
        parent_id: row.get(6)?,
    })
}

impl RawRecord {
    fn decode(self) -> ForemanResult<TraceRecord> {
        Ok(TraceRecord {
            record_id: parse_uuid(&self.record_id)?,
            run_id: self.run_id,
            timestamp: parse_time(&self.timestamp)?,
            level: self
                .level
                .parse::<TraceLevel>()
                .map_err(|e| ForemanError::storage(e.to_string()))?,
            message: self.message,
            unit_name: self.unit_name,
            parent_id: self.parent_id.as_deref().map(parse_uuid).transpose()?,
        })
    }
}

fn parse_uuid(value: &str) -> ForemanResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| ForemanError::storage(format!("Corrupt record id '{}': {}", value, e)))
}

fn parse_time(value: &str) -> ForemanResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ForemanError::storage(format!("Corrupt timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run(id: &str) -> RunRecord {
        RunRecord {
            run_id: id.to_string(),
            start_time: Utc::now(),
        }
    }

    #[test]
    fn test_records_come_back_in_append_order() {
        let log = SqliteTraceLog::in_memory().unwrap();
        log.append_run(&run("r1")).unwrap();

        let a = TraceRecord::new("r1", "Unit", TraceLevel::Debug, "a", None);
        let b = TraceRecord::new("r1", "Unit", TraceLevel::Info, "b", Some(a.record_id));
        let c = TraceRecord::new("r1", "Unit", TraceLevel::Error, "c", Some(a.record_id));
        for record in [&a, &b, &c] {
            log.append(record).unwrap();
        }

        let stored = log.records_for_run("r1").unwrap();
        let messages: Vec<_> = stored.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
        assert_eq!(stored[2].parent_id, Some(a.record_id));
        assert_eq!(stored[2].level, TraceLevel::Error);
    }

    #[test]
    fn test_parent_must_belong_to_same_run() {
        let log = SqliteTraceLog::in_memory().unwrap();
        log.append_run(&run("r1")).unwrap();
        log.append_run(&run("r2")).unwrap();

        let root = TraceRecord::new("r1", "Unit", TraceLevel::Debug, "root", None);
        log.append(&root).unwrap();

        let foreign = TraceRecord::new("r2", "Unit", TraceLevel::Debug, "x", Some(root.record_id));
        assert!(log.append(&foreign).is_err());

        let dangling = TraceRecord::new("r1", "Unit", TraceLevel::Debug, "y", Some(Uuid::new_v4()));
        assert!(log.append(&dangling).is_err());
    }

    #[test]
    fn test_records_are_append_only() {
        let log = SqliteTraceLog::in_memory().unwrap();
        log.append_run(&run("r1")).unwrap();
        log.append(&TraceRecord::new("r1", "Unit", TraceLevel::Info, "m", None))
            .unwrap();

        let mutated = log
            .conn
            .lock()
            .execute("UPDATE trace_records SET message = 'mutated' WHERE seq = 1", []);
        assert!(mutated.is_err());
    }

    #[test]
    fn test_record_requires_known_run() {
        let log = SqliteTraceLog::in_memory().unwrap();
        let orphan = TraceRecord::new("missing", "Unit", TraceLevel::Info, "m", None);
        assert!(log.append(&orphan).is_err());
    }

    #[test]
    fn test_purge_keeps_run_and_other_runs() {
        let log = SqliteTraceLog::in_memory().unwrap();
        log.append_run(&run("r1")).unwrap();
        log.append_run(&run("r2")).unwrap();
        for _ in 0..3 {
            log.append(&TraceRecord::new("r1", "U", TraceLevel::Info, "m", None))
                .unwrap();
        }
        log.append(&TraceRecord::new("r2", "U", TraceLevel::Info, "m", None))
            .unwrap();

        assert_eq!(log.purge_run("r1").unwrap(), 3);
        assert!(log.records_for_run("r1").unwrap().is_empty());
        assert_eq!(log.records_for_run("r2").unwrap().len(), 1);
        assert!(log.get_run("r1").unwrap().is_some());

        let runs = log.list_runs().unwrap();
        assert_eq!(runs.len(), 2);
        let r1 = runs.iter().find(|r| r.run_id == "r1").unwrap();
        assert_eq!(r1.record_count, 0);
    }

    #[test]
    fn test_append_run_is_idempotent_and_durable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("traces.db");
        {
            let log = SqliteTraceLog::open(&path).unwrap();
            log.append_run(&run("r1")).unwrap();
            log.append_run(&run("r1")).unwrap();
        }
        let log = SqliteTraceLog::open(&path).unwrap();
        assert_eq!(log.list_runs().unwrap().len(), 1);
    }
}
