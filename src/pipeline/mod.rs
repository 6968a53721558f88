//! Bank message extraction pipeline and incremental sync.
//!
//! Inbox messages flow through:
//! 1. `BankDirectory::is_bank_sender()`: drop everything not from a bank header
//! 2. `KeywordClassifier::classify()`: debit, credit, or not a transaction
//! 3. `FieldExtractor`: amount, account suffix, merchant description
//! 4. `TransactionSink::append()`: storage is somebody else's problem
//!
//! `SyncCoordinator` drives the whole thing and owns the checkpoint logic.

pub mod banks;
pub mod extract;
pub mod parser;
pub mod rules;
pub mod sync;
pub mod types;

pub use banks::{BankDirectory, BankIdentity};
pub use parser::MessageParser;
pub use sync::{SyncCoordinator, spawn_sync_loop};
pub use types::{
    CheckpointStore, MessageFilter, MessageSource, ParsedTransaction, RawMessage, SyncResult,
    TransactionKind, TransactionSink,
};
