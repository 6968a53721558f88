//! Bank SMS sync: extracts transactions from bank SMS and appends them to a
//! local ledger, resuming from a persisted checkpoint.

pub mod channels;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod store;
