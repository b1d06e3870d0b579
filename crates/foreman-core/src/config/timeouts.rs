//! Centralized timeout configuration
//!
//! Default timeout values for external process calls and observation windows.

use std::time::Duration;

/// Timeouts for multiplexer control commands
pub mod multiplexer {
    use super::*;

    /// Default timeout for a single tmux control command (10 seconds)
    pub const COMMAND_SECS: u64 = 10;

    /// Get multiplexer command timeout as Duration
    pub fn command_timeout() -> Duration {
        Duration::from_secs(COMMAND_SECS)
    }
}

/// Timeouts for sandbox resolution
pub mod sandbox {
    use super::*;

    /// Default timeout for resolving a container by label (15 seconds)
    pub const RESOLVE_SECS: u64 = 15;

    /// Get sandbox resolve timeout as Duration
    pub fn resolve_timeout() -> Duration {
        Duration::from_secs(RESOLVE_SECS)
    }
}

/// Limits for time-windowed observation
pub mod observe {
    /// Longest observation window or offset accepted (10 minutes)
    pub const MAX_WINDOW_SECS: u64 = 600;
}
