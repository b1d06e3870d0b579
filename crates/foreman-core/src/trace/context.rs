//! Explicit run context shared by every tracer of one invocation

use super::log::TraceLog;
use super::tracer::ExecutionTracer;
use super::types::RunRecord;
use crate::error::{ForemanError, ForemanResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Handle to one run
///
/// Passed by value to whatever needs to trace. Two contexts for different
/// runs in the same process never share records.
#[derive(Clone)]
pub struct RunContext {
    run_id: Arc<str>,
    start_time: DateTime<Utc>,
    log: Arc<dyn TraceLog>,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("start_time", &self.start_time)
            .finish()
    }
}

impl RunContext {
    /// Start a new run with a fresh id and persist it
    pub fn start(log: Arc<dyn TraceLog>) -> ForemanResult<Self> {
        let run = RunRecord {
            run_id: Uuid::new_v4().to_string(),
            start_time: Utc::now(),
        };
        log.append_run(&run)?;
        info!(run_id = %run.run_id, "Started run");

        Ok(Self {
            run_id: Arc::from(run.run_id),
            start_time: run.start_time,
            log,
        })
    }

    /// Attach to `run_id`, persisting it first if the log has never seen it
    pub fn join(log: Arc<dyn TraceLog>, run_id: &str) -> ForemanResult<Self> {
        let run_id = run_id.trim();
        if run_id.is_empty() {
            return Err(ForemanError::invalid_field("run_id", "run id must not be empty"));
        }

        let run = match log.get_run(run_id)? {
            Some(run) => run,
            None => {
                let run = RunRecord {
                    run_id: run_id.to_string(),
                    start_time: Utc::now(),
                };
                log.append_run(&run)?;
                info!(run_id = %run.run_id, "Registered joined run");
                run
            }
        };

        Ok(Self {
            run_id: Arc::from(run.run_id),
            start_time: run.start_time,
            log,
        })
    }

    /// Join `run_id` when given, otherwise start a new run
    pub fn resolve(log: Arc<dyn TraceLog>, run_id: Option<&str>) -> ForemanResult<Self> {
        match run_id {
            Some(id) => Self::join(log, id),
            None => Self::start(log),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn log(&self) -> &Arc<dyn TraceLog> {
        &self.log
    }

    /// Tracer for one unit in this run
    pub fn tracer(&self, unit_name: impl Into<String>) -> ExecutionTracer {
        ExecutionTracer::new(unit_name, self)
    }
}
