//! Error types for Foreman
//!
//! Every public operation in `foreman-core` returns a [`ForemanResult`]. The
//! variants mirror the failure classes callers need to tell apart:
//! - storage failures (fatal to the calling operation, never retried automatically)
//! - sandbox / multiplexer failures while creating sessions or dispatching commands
//! - "does not exist" outcomes for runs and sessions, which are ordinary negative answers
//!
//! All variants implement [`UnifiedError`] which provides a stable error code.

mod constructors;
mod context;
mod conversions;
mod types;
mod unified_error;

pub use types::{ForemanError, ForemanResult, OptionExt, ResultExt, UnifiedError};
