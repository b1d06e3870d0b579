//! Persistent registry of open terminal sessions

use super::types::{HistoryEntry, SessionDescriptor};
use crate::error::{ForemanError, ForemanResult};
use crate::storage::{ModuleStore, ModuleTxn};
use chrono::Utc;
use std::path::Path;
use tracing::debug;

/// Module holding the ordered list of open sessions
pub const SESSIONS_KEY: &str = "TerminalSessions";

/// Module holding how many sessions were ever created
pub const CREATED_COUNTER_KEY: &str = "TerminalSessionsCreated";

/// Modules that belong to the session registry rather than working memory
pub const REGISTRY_KEYS: [&str; 2] = [SESSIONS_KEY, CREATED_COUNTER_KEY];

const ID_PREFIX: &str = "session_";

/// Facade over the module store for session descriptors
///
/// Holds no cached state; every call re-reads the store, and every mutation
/// is one store transaction.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    store: ModuleStore,
}

impl SessionRegistry {
    pub fn new(store: ModuleStore) -> Self {
        Self { store }
    }

    /// Create the sessions module as an empty list if it is absent
    pub fn bootstrap(&self) -> ForemanResult<()> {
        self.store.transact(|txn| {
            if txn.get(SESSIONS_KEY)?.is_none() {
                txn.put_as(SESSIONS_KEY, &Vec::<SessionDescriptor>::new())?;
            }
            Ok(())
        })
    }

    pub fn list(&self) -> ForemanResult<Vec<SessionDescriptor>> {
        Ok(self
            .store
            .get_as::<Vec<SessionDescriptor>>(SESSIONS_KEY)?
            .unwrap_or_default())
    }

    pub fn get(&self, session_id: &str) -> ForemanResult<Option<SessionDescriptor>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|s| s.session_id == session_id))
    }

    /// Add `descriptor`; its id must not already be registered
    pub fn register(&self, descriptor: SessionDescriptor) -> ForemanResult<()> {
        self.store.transact(|txn| {
            let mut sessions = read_sessions(txn)?;
            if sessions.iter().any(|s| s.session_id == descriptor.session_id) {
                return Err(ForemanError::invalid_field(
                    "session_id",
                    format!("Session {} is already registered", descriptor.session_id),
                ));
            }
            sessions.push(descriptor);
            txn.put_as(SESSIONS_KEY, &sessions)
        })
    }

    /// Remove a session, returning its descriptor if it was registered
    pub fn unregister(&self, session_id: &str) -> ForemanResult<Option<SessionDescriptor>> {
        self.store.transact(|txn| {
            let mut sessions = read_sessions(txn)?;
            let Some(pos) = sessions.iter().position(|s| s.session_id == session_id) else {
                return Ok(None);
            };
            let removed = sessions.remove(pos);
            txn.put_as(SESSIONS_KEY, &sessions)?;
            Ok(Some(removed))
        })
    }

    /// Append `command` to a session's history; false if it is not registered
    pub fn append_history(&self, session_id: &str, command: &str) -> ForemanResult<bool> {
        self.store.transact(|txn| {
            let mut sessions = read_sessions(txn)?;
            let Some(session) = sessions.iter_mut().find(|s| s.session_id == session_id) else {
                return Ok(false);
            };
            session.action_history.push(HistoryEntry {
                timestamp: Utc::now(),
                command: command.to_string(),
            });
            txn.put_as(SESSIONS_KEY, &sessions)?;
            Ok(true)
        })
    }

    /// Allocate the next `session_<n>` id and register it, atomically
    ///
    /// The created-counter only moves forward, so an id is never handed out
    /// twice while the store is not cleared.
    pub fn allocate_and_register(&self, logs_dir: &Path) -> ForemanResult<SessionDescriptor> {
        self.store.transact(|txn| {
            let mut sessions = read_sessions(txn)?;
            let created: u64 = txn.get_as(CREATED_COUNTER_KEY)?.unwrap_or(0);
            // Stores written before the counter existed
            let highest = sessions
                .iter()
                .filter_map(|s| s.session_id.strip_prefix(ID_PREFIX)?.parse::<u64>().ok())
                .max()
                .unwrap_or(0);
            let next = created.max(highest) + 1;

            let session_id = format!("{}{}", ID_PREFIX, next);
            let descriptor = SessionDescriptor {
                log_path: logs_dir.join(format!("{}.log", session_id)),
                session_id,
                created_at: Utc::now(),
                action_history: Vec::new(),
            };

            sessions.push(descriptor.clone());
            txn.put_as(SESSIONS_KEY, &sessions)?;
            txn.put_as(CREATED_COUNTER_KEY, &next)?;
            debug!("Allocated terminal session {}", descriptor.session_id);
            Ok(descriptor)
        })
    }
}

fn read_sessions(txn: &ModuleTxn<'_>) -> ForemanResult<Vec<SessionDescriptor>> {
    Ok(txn
        .get_as::<Vec<SessionDescriptor>>(SESSIONS_KEY)?
        .unwrap_or_default())
}
