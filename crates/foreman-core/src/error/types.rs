//! Core error types and traits for Foreman

use thiserror::Error;

/// Result type alias for Foreman operations
pub type ForemanResult<T> = Result<T, ForemanError>;

/// Unified error trait that all Foreman errors implement.
///
/// - error_code(): Unique code for programmatic error identification
/// - message(): Human-readable error message
/// - context(): Optional additional context
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C: std::fmt::Display>(self, context: C) -> ForemanResult<T>;

    /// Add context lazily (only evaluated on error)
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> ForemanResult<T>;
}

impl<T> ResultExt<T> for ForemanResult<T> {
    fn context<C: std::fmt::Display>(self, context: C) -> ForemanResult<T> {
        self.map_err(|e| e.with_context(context.to_string()))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> ForemanResult<T> {
        self.map_err(|e| e.with_context(f().to_string()))
    }
}

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with context message
    fn context<C: std::fmt::Display>(self, context: C) -> ForemanResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context<C: std::fmt::Display>(self, context: C) -> ForemanResult<T> {
        self.ok_or_else(|| ForemanError::other(context.to_string()))
    }
}

/// Main error type for Foreman
#[derive(Error, Debug, Clone)]
pub enum ForemanError {
    /// Durable store unavailable or corrupt
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        context: Option<String>,
    },

    /// Sandbox unreachable or multiplexer could not start the session
    #[error("Failed to create terminal session {session_id}: {message}")]
    SessionCreation {
        session_id: String,
        message: String,
        context: Option<String>,
    },

    /// Keystrokes could not be delivered to the session
    #[error("Failed to dispatch command to {session_id}: {message}")]
    CommandDispatch {
        session_id: String,
        message: String,
        context: Option<String>,
    },

    /// No trace records exist for the run
    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    /// The terminal session is not registered
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
        context: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },

    /// Operation was cancelled by its caller
    #[error("Operation was cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}

impl ForemanError {
    /// Whether this error is a "does not exist" answer rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RunNotFound { .. } | Self::SessionNotFound { .. }
        )
    }
}
