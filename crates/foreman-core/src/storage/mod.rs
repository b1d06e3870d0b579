//! Durable storage for Foreman
//!
//! Everything durable lives in SQLite files opened through [`open_database`]:
//! - the module store ("working memory"): one JSON document per module name
//! - the trace log: append-only runs and trace records (see [`crate::trace`])
//!
//! Every mutating call commits before it returns (`synchronous = FULL`), so a
//! crash after a successful call never loses that write.

mod module_store;
mod schema;
mod sqlite;


pub use module_store::{ModuleStore, ModuleTxn};
pub use schema::{Migration, MigrationRecord, MigrationRunner, SchemaVersion};
pub use sqlite::{open_database, open_in_memory};
