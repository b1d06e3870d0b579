//! Tool implementations for Foreman

pub mod tools;

pub use tools::*;
