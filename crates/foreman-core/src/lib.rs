//! Foreman Core Library
//!
//! Session orchestration and execution tracing for LLM coding agents:
//! a durable module store, per-unit execution tracing with run-scoped
//! queries, and sandboxed terminal sessions with time-windowed output
//! capture.

pub mod builder;
pub mod config;
pub mod error;
pub mod storage;
pub mod terminal;
pub mod tools;
pub mod trace;

// Re-export commonly used types
pub use builder::{Foreman, ForemanBuilder, OBJECTIVE_KEY};
pub use config::{Config, ConfigOverrides, SandboxSpec, load_config};
pub use error::{ForemanError, ForemanResult, UnifiedError};
pub use storage::ModuleStore;
pub use terminal::{
    CloseOutcome, Observation, SendReceipt, SessionDescriptor, SessionRegistry,
    TerminalSessionManager,
};
pub use tools::{Tool, ToolCall, ToolError, ToolRegistry, ToolResult, ToolSchema};
pub use trace::{
    ExecutionTracer, RunContext, SqliteTraceLog, TraceLevel, TraceLog, TraceQueryService,
    TraceRecord,
};
