//! Context management for ForemanError

use super::types::ForemanError;

impl ForemanError {
    /// Add context to any error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let ctx = Some(context.into());
        match &mut self {
            Self::Storage { context: c, .. } => *c = ctx,
            Self::SessionCreation { context: c, .. } => *c = ctx,
            Self::CommandDispatch { context: c, .. } => *c = ctx,
            Self::Config { context: c, .. } => *c = ctx,
            Self::Io { context: c, .. } => *c = ctx,
            Self::Json { context: c, .. } => *c = ctx,
            Self::InvalidInput { context: c, .. } => *c = ctx,
            Self::Other { context: c, .. } => *c = ctx,
            Self::RunNotFound { .. } | Self::SessionNotFound { .. } | Self::Cancelled => {}
        }
        self
    }
}
