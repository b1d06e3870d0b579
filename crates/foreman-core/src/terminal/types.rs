//! Terminal session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Text returned when a session has not written its log yet
pub const LOG_NOT_FOUND_MESSAGE: &str =
    "Log file not found. It's possible the session has not generated any output yet.";

/// Text returned when observing an unknown session
pub const SESSION_NOT_FOUND_MESSAGE: &str = "Session not found or no history available.";

/// One command sent to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub command: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.timestamp.to_rfc3339(), self.command)
    }
}

/// A registered terminal session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub log_path: PathBuf,
    #[serde(default)]
    pub action_history: Vec<HistoryEntry>,
}

/// Acknowledgement of a dispatched command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub session_id: String,
    pub command: String,
    pub dispatched_at: DateTime<Utc>,
    /// Output captured in the current second, right after dispatch
    pub snapshot: String,
}

/// Result of closing a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "session", rename_all = "snake_case")]
pub enum CloseOutcome {
    Closed(SessionDescriptor),
    NotFound,
}

impl CloseOutcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl fmt::Display for CloseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed(session) => write!(f, "CLOSED session_id: {}", session.session_id),
            Self::NotFound => write!(f, "Session ID not found"),
        }
    }
}

/// Result of a time-windowed observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Observation {
    /// Log lines inside the window, newline-joined (may be empty)
    Lines(String),
    /// The session exists but its log file does not yet
    NoOutputYet,
    /// The session id is not registered
    SessionNotFound,
}

impl Observation {
    /// Text handed to the orchestrator: the lines or a sentinel message
    pub fn text(&self) -> &str {
        match self {
            Self::Lines(text) => text,
            Self::NoOutputYet => LOG_NOT_FOUND_MESSAGE,
            Self::SessionNotFound => SESSION_NOT_FOUND_MESSAGE,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
