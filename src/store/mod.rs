//! Persistence layer: libSQL-backed ledger, sink and sync checkpoint.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{EntrySource, LedgerStore, LedgerTransaction, NewTransaction};
