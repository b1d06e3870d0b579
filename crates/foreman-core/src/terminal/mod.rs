//! Terminal sessions inside a sandbox
//!
//! Each session is a detached tmux session whose shell runs in the configured
//! sandbox. Its output is piped through a timestamp filter into
//! `<logs_dir>/<session_id>.log`, and [`TerminalSessionManager::observe`]
//! replays the part of that log that falls inside a time window.
//!
//! Session state (id, history, log path) lives in the module store under
//! [`SESSIONS_KEY`], managed by [`SessionRegistry`].

mod capture;
mod manager;
mod multiplexer;
mod registry;
mod sandbox;
mod types;


pub use capture::{TimeWindow, scan_window};
pub use manager::{ManagerSettings, TerminalSessionManager};
pub use multiplexer::{Multiplexer, TmuxMultiplexer};
pub use registry::{CREATED_COUNTER_KEY, REGISTRY_KEYS, SESSIONS_KEY, SessionRegistry};
pub use sandbox::{DockerSandbox, LocalSandbox, Sandbox, sandbox_for};
pub use types::{
    CloseOutcome, HistoryEntry, LOG_NOT_FOUND_MESSAGE, Observation, SESSION_NOT_FOUND_MESSAGE,
    SendReceipt, SessionDescriptor,
};

#[cfg(test)]
pub(crate) use multiplexer::MockMultiplexer;
#[cfg(test)]
pub(crate) use sandbox::MockSandbox;
