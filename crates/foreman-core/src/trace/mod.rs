//! Hierarchical execution tracing
//!
//! A [`RunContext`] names one end-to-end invocation and is passed explicitly
//! to every [`ExecutionTracer`] created for it. Each tracer belongs to one
//! unit (a named component); the call stack travels with the traced future, and every
//! `enter`/exit/`log` becomes an append-only [`TraceRecord`] whose
//! `parent_id` points at the enclosing call. [`TraceQueryService`] turns a
//! run's flat record log back into a call tree.

mod context;
mod log;
mod query;
mod tracer;
mod types;

pub use context::RunContext;
pub use log::{SqliteTraceLog, TraceLog};
pub use query::{RunExport, TraceNode, TraceQueryService, build_forest};
pub use tracer::{ExecutionTracer, TraceScope};
pub use types::{RunRecord, RunSummary, TraceLevel, TraceRecord};
