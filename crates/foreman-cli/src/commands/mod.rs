//! Command handlers

pub mod memory;
pub mod run;
pub mod runs;
pub mod session;
pub mod tools;
