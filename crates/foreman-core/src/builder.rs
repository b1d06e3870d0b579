//! ForemanBuilder - assembles the stores, run context and session manager
//!
//! A [`Foreman`] is what the CLI and the tool layer operate on: one module
//! store, one trace log, the run every record is tagged with, and the
//! terminal session manager built over them.

use crate::config::{Config, ConfigOverrides, load_config};
use crate::error::ForemanResult;
use crate::storage::ModuleStore;
use crate::terminal::{
    ManagerSettings, Multiplexer, REGISTRY_KEYS, Sandbox, TerminalSessionManager, TmuxMultiplexer,
    sandbox_for,
};
use crate::trace::{RunContext, SqliteTraceLog, TraceLog, TraceQueryService};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Module holding the user request of the current run
pub const OBJECTIVE_KEY: &str = "OverarchingObjective";

/// Builder for [`Foreman`]
#[derive(Default)]
pub struct ForemanBuilder {
    config: Option<Config>,
    run_id: Option<String>,
    multiplexer: Option<Arc<dyn Multiplexer>>,
    sandbox: Option<Arc<dyn Sandbox>>,
    in_memory: bool,
}

impl ForemanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already loaded configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the configuration from a file, the environment and `overrides`
    pub fn with_config_file(
        mut self,
        path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> ForemanResult<Self> {
        self.config = Some(load_config(path, overrides)?);
        Ok(self)
    }

    /// Attach to this run instead of the configured one or a fresh one
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_multiplexer(mut self, multiplexer: Arc<dyn Multiplexer>) -> Self {
        self.multiplexer = Some(multiplexer);
        self
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn Sandbox>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Keep both databases in memory (logs still go to `terminal.logs_dir`)
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    pub fn build(self) -> ForemanResult<Foreman> {
        let config = self.config.unwrap_or_default();

        let (store, trace_log): (ModuleStore, Arc<dyn TraceLog>) = if self.in_memory {
            (
                ModuleStore::in_memory()?,
                Arc::new(SqliteTraceLog::in_memory()?),
            )
        } else {
            (
                ModuleStore::open(config.storage.memory_db_path())?,
                Arc::new(SqliteTraceLog::open(&config.storage.trace_db_path())?),
            )
        };

        let run_id = self.run_id.or_else(|| config.run_id.clone());
        let context = RunContext::resolve(trace_log.clone(), run_id.as_deref())?;

        let multiplexer = self
            .multiplexer
            .unwrap_or_else(|| {
                Arc::new(TmuxMultiplexer::new().with_socket(config.terminal.tmux_socket.clone()))
            });
        let sandbox = self
            .sandbox
            .unwrap_or_else(|| sandbox_for(&config.terminal.sandbox));

        let terminals = TerminalSessionManager::new(
            store.clone(),
            multiplexer,
            sandbox,
            ManagerSettings::from_config(&config),
            &context,
        )?;

        info!(run_id = %context.run_id(), "Foreman ready");

        Ok(Foreman {
            config,
            store,
            trace_log,
            context,
            terminals: Arc::new(terminals),
        })
    }
}

/// Stores, run context and session manager of one process
pub struct Foreman {
    config: Config,
    store: ModuleStore,
    trace_log: Arc<dyn TraceLog>,
    context: RunContext,
    terminals: Arc<TerminalSessionManager>,
}

impl Foreman {
    pub fn builder() -> ForemanBuilder {
        ForemanBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ModuleStore {
        &self.store
    }

    pub fn trace_log(&self) -> &Arc<dyn TraceLog> {
        &self.trace_log
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn terminals(&self) -> &Arc<TerminalSessionManager> {
        &self.terminals
    }

    pub fn queries(&self) -> TraceQueryService {
        TraceQueryService::new(self.trace_log.clone())
    }

    /// Reset working state for a new user request
    ///
    /// Closes every registered session, clears working memory, recreates
    /// the session registry and stores `request` under [`OBJECTIVE_KEY`].
    /// The session counter survives, so the next run never reuses an id.
    /// Returns the ids of the sessions that were closed.
    pub async fn start_run(&self, request: &str) -> ForemanResult<Vec<String>> {
        let closed = self.terminals.shutdown_all().await?;
        let cleared = self.store.clear_except(&REGISTRY_KEYS)?;
        self.terminals.registry().bootstrap()?;
        self.store
            .put(OBJECTIVE_KEY, &Value::String(request.to_string()))?;

        info!(
            run_id = %self.context.run_id(),
            closed = closed.len(),
            cleared,
            "Started run"
        );
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::{LocalSandbox, MockMultiplexer, SESSIONS_KEY};
    use serde_json::json;
    use tempfile::TempDir;

    fn foreman(dir: &TempDir) -> Foreman {
        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_path_buf();

        let mut mux = MockMultiplexer::new();
        mux.expect_kill_session().returning(|_| Ok(true));
        mux.expect_new_session().returning(|_, _| Ok(()));

        Foreman::builder()
            .with_config(config)
            .with_multiplexer(Arc::new(mux))
            .with_sandbox(Arc::new(LocalSandbox))
            .in_memory()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_run_resets_working_state() {
        let dir = TempDir::new().unwrap();
        let foreman = foreman(&dir);

        foreman.store().put("Plan", &json!(["a", "b"])).unwrap();
        foreman.terminals().create().await.unwrap();

        let closed = foreman.start_run("fix the build").await.unwrap();
        assert_eq!(closed, vec!["session_1"]);

        let exported = foreman.store().export_all().unwrap();
        assert_eq!(exported.get(OBJECTIVE_KEY), Some(&json!("fix the build")));
        assert_eq!(exported.get(SESSIONS_KEY), Some(&json!([])));
        assert!(!exported.contains_key("Plan"));

        assert_eq!(foreman.terminals().create().await.unwrap(), "session_2");
    }

    #[test]
    fn test_builder_joins_requested_run() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_path_buf();

        let foreman = Foreman::builder()
            .with_config(config)
            .with_run_id("run-42")
            .with_multiplexer(Arc::new(MockMultiplexer::new()))
            .in_memory()
            .build()
            .unwrap();
        assert_eq!(foreman.context().run_id(), "run-42");
        assert_eq!(foreman.queries().list_runs().unwrap().len(), 1);
    }
}
