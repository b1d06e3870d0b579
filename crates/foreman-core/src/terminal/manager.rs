//! Terminal session lifecycle and windowed observation

use super::capture::{TimeWindow, scan_window};
use super::multiplexer::Multiplexer;
use super::registry::SessionRegistry;
use super::sandbox::Sandbox;
use super::types::{CloseOutcome, Observation, SendReceipt, SessionDescriptor};
use crate::config::{Config, timeouts};
use crate::error::{ForemanError, ForemanResult, UnifiedError};
use crate::storage::ModuleStore;
use crate::trace::{ExecutionTracer, RunContext};
use chrono::{Local, Utc};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Where session logs go and how their lines are stamped
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub logs_dir: PathBuf,
    /// chrono format of the leading timestamp on each log line
    pub timestamp_format: String,
    /// Filter the shell output is piped through before reaching the log
    pub stamp_command: String,
}

impl ManagerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            logs_dir: config.terminal.logs_dir(&config.storage),
            timestamp_format: config.terminal.timestamp_format.clone(),
            stamp_command: config.terminal.stamp_command(),
        }
    }
}

/// Owns the sandboxed shell sessions of one store
///
/// `send` and `close` on the same session id are serialised; calls on
/// different ids run concurrently. `observe` takes no lock: closing a
/// session while it is being observed still returns the captured lines.
pub struct TerminalSessionManager {
    registry: SessionRegistry,
    multiplexer: Arc<dyn Multiplexer>,
    sandbox: Arc<dyn Sandbox>,
    settings: ManagerSettings,
    locks: DashMap<String, Arc<Mutex<()>>>,
    tracer: ExecutionTracer,
}

impl TerminalSessionManager {
    /// Create the manager, its log directory, and the registry module
    pub fn new(
        store: ModuleStore,
        multiplexer: Arc<dyn Multiplexer>,
        sandbox: Arc<dyn Sandbox>,
        settings: ManagerSettings,
        context: &RunContext,
    ) -> ForemanResult<Self> {
        std::fs::create_dir_all(&settings.logs_dir).map_err(|e| {
            ForemanError::io_with_path(
                format!("Failed to create logs directory: {}", e),
                settings.logs_dir.display().to_string(),
            )
        })?;

        let registry = SessionRegistry::new(store);
        registry.bootstrap()?;

        Ok(Self {
            registry,
            multiplexer,
            sandbox,
            settings,
            locks: DashMap::new(),
            tracer: context.tracer("TerminalSessionManager"),
        })
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn logs_dir(&self) -> &Path {
        &self.settings.logs_dir
    }

    /// Start a new session and return its id
    #[instrument(skip(self), fields(sandbox = %self.sandbox.describe()))]
    pub async fn create(&self) -> ForemanResult<String> {
        self.tracer
            .scope("create", async {
                let descriptor = self.registry.allocate_and_register(&self.settings.logs_dir)?;
                let session_id = descriptor.session_id.clone();
                let lock = self.lock_for(&session_id);
                let _guard = lock.lock().await;

                if let Err(e) = self.spawn(&descriptor).await {
                    if let Err(cleanup) = self.registry.unregister(&session_id) {
                        warn!(
                            session_id = %session_id,
                            "Failed to unregister session after failed spawn: {}",
                            cleanup
                        );
                    }
                    return Err(e);
                }

                info!(session_id = %session_id, "Created terminal session");
                Ok(session_id)
            })
            .await
    }

    async fn spawn(&self, descriptor: &SessionDescriptor) -> ForemanResult<()> {
        let id = descriptor.session_id.as_str();

        // A stale multiplexer session may survive a cleared store.
        match self.multiplexer.kill_session(id).await {
            Ok(true) => debug!(session_id = %id, "Killed stale multiplexer session"),
            Ok(false) => {}
            Err(e) => debug!(session_id = %id, "Stale session cleanup failed: {}", e),
        }

        if let Some(rotated) = rotate_log(&descriptor.log_path)
            .await
            .map_err(|e| rewrap(ForemanError::session_creation(id, e.to_string()), &e))?
        {
            info!(session_id = %id, rotated = %rotated.display(), "Rotated previous session log");
        }

        let shell = self
            .sandbox
            .shell_command()
            .await
            .map_err(|e| rewrap(ForemanError::session_creation(id, e.to_string()), &e))?;

        let command = format!(
            "{} | {} >> {}",
            shell,
            self.settings.stamp_command,
            shell_quote(&descriptor.log_path.display().to_string())
        );

        self.multiplexer
            .new_session(id, &command)
            .await
            .map_err(|e| rewrap(ForemanError::session_creation(id, e.to_string()), &e))
    }

    /// Type `command` into the session and press Enter
    ///
    /// Fails with `CommandDispatch` if the session is not registered or the
    /// multiplexer rejects the keys. The receipt carries a zero-length
    /// observation taken right after dispatch.
    #[instrument(skip(self, command), fields(session_id = %session_id))]
    pub async fn send(&self, session_id: &str, command: &str) -> ForemanResult<SendReceipt> {
        self.tracer
            .scope("send", async {
                let lock = self.lock_for(session_id);
                let guard = lock.lock().await;

                if self.registry.get(session_id)?.is_none() {
                    return Err(ForemanError::command_dispatch(
                        session_id,
                        "session does not exist",
                    ));
                }

                self.multiplexer
                    .send_keys(session_id, command)
                    .await
                    .map_err(|e| {
                        rewrap(ForemanError::command_dispatch(session_id, e.to_string()), &e)
                    })?;
                let dispatched_at = Utc::now();
                self.registry.append_history(session_id, command)?;
                drop(guard);

                let snapshot = self
                    .observe_window(session_id, 0, 0, &CancellationToken::new())
                    .await?;

                Ok(SendReceipt {
                    session_id: session_id.to_string(),
                    command: command.to_string(),
                    dispatched_at,
                    snapshot: snapshot.text().to_string(),
                })
            })
            .await
    }

    /// Terminate the session and unregister it
    ///
    /// Closing an unknown or already closed id is `CloseOutcome::NotFound`.
    /// The session log is left in place.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn close(&self, session_id: &str) -> ForemanResult<CloseOutcome> {
        let outcome = self
            .tracer
            .scope::<_, ForemanError, _>("close", async {
                let lock = self.lock_for(session_id);
                let _guard = lock.lock().await;

                if self.registry.get(session_id)?.is_none() {
                    return Ok(CloseOutcome::NotFound);
                }

                self.terminate(session_id).await?;

                Ok(match self.registry.unregister(session_id)? {
                    Some(descriptor) => CloseOutcome::Closed(descriptor),
                    None => CloseOutcome::NotFound,
                })
            })
            .await?;

        if outcome.is_closed() {
            self.locks.remove(session_id);
            info!(session_id = %session_id, "Closed terminal session");
        }
        Ok(outcome)
    }

    /// Kill the multiplexer session, accepting one that is already gone
    async fn terminate(&self, session_id: &str) -> ForemanResult<()> {
        let kill_error = match self.multiplexer.kill_session(session_id).await {
            Ok(true) => return Ok(()),
            Ok(false) => None,
            Err(e) => Some(e),
        };

        let still_running = self.multiplexer.has_session(session_id).await;
        match (still_running, kill_error) {
            (Ok(false), _) => {
                warn!(session_id = %session_id, "Multiplexer session was already gone");
                Ok(())
            }
            (Ok(true), None) => Err(ForemanError::command_dispatch(
                session_id,
                "failed to terminate session: still running",
            )),
            (Ok(true), Some(e)) | (Err(_), Some(e)) | (Err(e), None) => Err(rewrap(
                ForemanError::command_dispatch(
                    session_id,
                    format!("failed to terminate session: {}", e),
                ),
                &e,
            )),
        }
    }

    /// Wait `duration_secs`, then return the log lines stamped within
    /// `[start - offset_secs, start + duration_secs]`, where `start` is the
    /// moment of the call
    ///
    /// Unknown sessions and sessions without a log yet are reported through
    /// [`Observation`], not as errors. Cancelling `cancel` abandons the wait
    /// with `ForemanError::Cancelled`.
    #[instrument(skip(self, cancel), fields(session_id = %session_id))]
    pub async fn observe(
        &self,
        session_id: &str,
        offset_secs: u64,
        duration_secs: u64,
        cancel: &CancellationToken,
    ) -> ForemanResult<Observation> {
        self.tracer
            .scope(
                "observe",
                self.observe_window(session_id, offset_secs, duration_secs, cancel),
            )
            .await
    }

    async fn observe_window(
        &self,
        session_id: &str,
        offset_secs: u64,
        duration_secs: u64,
        cancel: &CancellationToken,
    ) -> ForemanResult<Observation> {
        for (field, value) in [
            ("offset_secs", offset_secs),
            ("duration_secs", duration_secs),
        ] {
            if value > timeouts::observe::MAX_WINDOW_SECS {
                return Err(ForemanError::invalid_field(
                    field,
                    format!(
                        "must be at most {} seconds",
                        timeouts::observe::MAX_WINDOW_SECS
                    ),
                ));
            }
        }

        let Some(descriptor) = self.registry.get(session_id)? else {
            return Ok(Observation::SessionNotFound);
        };

        let window = TimeWindow::around(Local::now(), offset_secs, duration_secs);

        if duration_secs > 0 {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(session_id = %session_id, "Observation cancelled");
                    return Err(ForemanError::Cancelled);
                }
                _ = tokio::time::sleep(Duration::from_secs(duration_secs)) => {}
            }
        }

        let bytes = match tokio::fs::read(&descriptor.log_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Observation::NoOutputYet);
            }
            Err(e) => {
                return Err(ForemanError::io_with_path(
                    format!("Failed to read session log: {}", e),
                    descriptor.log_path.display().to_string(),
                ));
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        let lines = scan_window(&content, &window, &self.settings.timestamp_format);
        debug!(session_id = %session_id, lines = lines.len(), "Observed session log");
        Ok(Observation::Lines(lines.join("\n")))
    }

    /// Registered sessions in creation order
    pub fn list(&self) -> ForemanResult<Vec<SessionDescriptor>> {
        self.registry.list()
    }

    /// Close every registered session; returns the ids that were closed
    #[instrument(skip(self))]
    pub async fn shutdown_all(&self) -> ForemanResult<Vec<String>> {
        let mut closed = Vec::new();
        for session in self.registry.list()? {
            match self.close(&session.session_id).await {
                Ok(CloseOutcome::Closed(descriptor)) => closed.push(descriptor.session_id),
                Ok(CloseOutcome::NotFound) => {}
                Err(e) => {
                    warn!(session_id = %session.session_id, "Failed to close session: {}", e);
                    // Forget it anyway so a fresh run does not inherit it
                    self.registry.unregister(&session.session_id)?;
                }
            }
        }
        Ok(closed)
    }

    fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }
}

fn rewrap(err: ForemanError, source: &ForemanError) -> ForemanError {
    match source.context() {
        Some(context) => err.with_context(context.to_string()),
        None => err,
    }
}

/// Move an existing log aside so a reused id starts from an empty log
async fn rotate_log(path: &Path) -> ForemanResult<Option<PathBuf>> {
    match tokio::fs::metadata(path).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ForemanError::io_with_path(
                format!("Failed to inspect session log: {}", e),
                path.display().to_string(),
            ));
        }
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let rotated = path.with_file_name(format!(
        "{}.{}.log",
        stem,
        Utc::now().format("%Y%m%dT%H%M%S%.6f")
    ));
    tokio::fs::rename(path, &rotated).await.map_err(|e| {
        ForemanError::io_with_path(
            format!("Failed to rotate session log: {}", e),
            path.display().to_string(),
        )
    })?;
    Ok(Some(rotated))
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
