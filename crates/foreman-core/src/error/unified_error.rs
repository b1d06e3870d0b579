//! UnifiedError trait implementation for ForemanError

use super::types::{ForemanError, UnifiedError};

impl UnifiedError for ForemanError {
    fn error_code(&self) -> &str {
        match self {
            Self::Storage { .. } => "FOREMAN_STORAGE",
            Self::SessionCreation { .. } => "FOREMAN_SESSION_CREATION",
            Self::CommandDispatch { .. } => "FOREMAN_COMMAND_DISPATCH",
            Self::RunNotFound { .. } => "FOREMAN_RUN_NOT_FOUND",
            Self::SessionNotFound { .. } => "FOREMAN_SESSION_NOT_FOUND",
            Self::Config { .. } => "FOREMAN_CONFIG",
            Self::Io { .. } => "FOREMAN_IO",
            Self::Json { .. } => "FOREMAN_JSON",
            Self::InvalidInput { .. } => "FOREMAN_INVALID_INPUT",
            Self::Cancelled => "FOREMAN_CANCELLED",
            Self::Other { .. } => "FOREMAN_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Storage { message, .. } => message,
            Self::SessionCreation { message, .. } => message,
            Self::CommandDispatch { message, .. } => message,
            Self::RunNotFound { run_id } => run_id,
            Self::SessionNotFound { session_id } => session_id,
            Self::Config { message, .. } => message,
            Self::Io { message, .. } => message,
            Self::Json { message, .. } => message,
            Self::InvalidInput { message, .. } => message,
            Self::Cancelled => "Operation was cancelled",
            Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Storage { context, .. } => context.as_deref(),
            Self::SessionCreation { context, .. } => context.as_deref(),
            Self::CommandDispatch { context, .. } => context.as_deref(),
            Self::Config { context, .. } => context.as_deref(),
            Self::Io { context, .. } => context.as_deref(),
            Self::Json { context, .. } => context.as_deref(),
            Self::InvalidInput { context, .. } => context.as_deref(),
            Self::Other { context, .. } => context.as_deref(),
            Self::RunNotFound { .. } | Self::SessionNotFound { .. } | Self::Cancelled => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SessionCreation { .. } | Self::CommandDispatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            ForemanError::storage("disk full"),
            ForemanError::session_creation("session_1", "tmux missing"),
            ForemanError::command_dispatch("session_1", "gone"),
            ForemanError::run_not_found("run"),
            ForemanError::session_not_found("session_9"),
            ForemanError::config("bad"),
            ForemanError::Cancelled,
        ];
        let codes: std::collections::HashSet<_> =
            errors.iter().map(|e| e.error_code().to_string()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_context_attached() {
        let err = ForemanError::storage("locked").with_context("writing module 'TaskList'");
        assert_eq!(err.context(), Some("writing module 'TaskList'"));
        assert_eq!(err.message(), "locked");
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        let err = ForemanError::session_not_found("session_3");
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Session not found: session_3");
    }
}
