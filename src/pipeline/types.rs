//! Shared types for the extraction pipeline and sync coordinator.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, SourceError};

// ── Raw message ─────────────────────────────────────────────────────

/// An inbox message as delivered by the message source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Sender header (e.g. "VM-HDFCBK").
    pub sender: String,
    /// Message text.
    pub body: String,
    /// Delivery time in milliseconds since the Unix epoch.
    pub timestamp_millis: i64,
}

impl RawMessage {
    pub fn new(sender: impl Into<String>, body: impl Into<String>, timestamp_millis: i64) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
            timestamp_millis,
        }
    }
}

// ── Parsed transaction ──────────────────────────────────────────────

/// Direction of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Debit,
    Credit,
}

impl TransactionKind {
    /// Stable label used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }

    /// Ledger category assigned to SMS-derived rows of this kind.
    pub fn ledger_category(&self) -> &'static str {
        match self {
            Self::Debit => "Bank Related",
            Self::Credit => "Income",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBIT" => Ok(Self::Debit),
            "CREDIT" => Ok(Self::Credit),
            other => Err(format!("unknown transaction kind: {other}")),
        }
    }
}

/// Transaction extracted from a bank message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    /// Always strictly positive.
    pub amount: Decimal,
    pub kind: TransactionKind,
    /// Trailing digits of the masked account number, if the message names one.
    pub account_suffix: Option<String>,
    /// UTC calendar date of the message timestamp.
    pub occurred_on: NaiveDate,
    pub bank_name: String,
    pub description: String,
    /// SHA-256 hex digest of sender, body and timestamp.
    pub fingerprint: String,
}

// ── Source filter ───────────────────────────────────────────────────

/// Mailbox a source query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mailbox {
    Inbox,
}

/// Bounds for one message source query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFilter {
    #[serde(rename = "box")]
    pub mailbox: Mailbox,
    /// Oldest timestamp (inclusive) the source may return.
    pub since_timestamp_millis: i64,
    pub max_count: usize,
}

// ── Sync result ─────────────────────────────────────────────────────

/// Counters from a single sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Transactions appended to the sink.
    pub accepted: usize,
    /// Bank messages the parser declined, plus failed appends.
    pub rejected: usize,
    /// Messages skipped because the sink already held their fingerprint.
    pub duplicates: usize,
    /// Messages dropped before parsing (non-bank sender or older than the checkpoint).
    pub filtered: usize,
    /// New checkpoint value, when the cycle advanced it.
    pub checkpoint: Option<i64>,
}

// ── Collaborator traits ─────────────────────────────────────────────

/// Source of inbox messages. Pure I/O, no parsing.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Return up to `filter.max_count` messages no older than
    /// `filter.since_timestamp_millis`. May repeat messages across calls.
    async fn list(&self, filter: &MessageFilter) -> Result<Vec<RawMessage>, SourceError>;
}

/// Destination for accepted transactions.
#[async_trait]
pub trait TransactionSink: Send + Sync {
    /// Store a transaction, returning the identifier the sink assigned.
    async fn append(&self, transaction: &ParsedTransaction) -> Result<i64, DatabaseError>;

    /// Whether a transaction with this fingerprint was already appended.
    async fn contains_fingerprint(&self, _fingerprint: &str) -> Result<bool, DatabaseError> {
        Ok(false)
    }
}

/// Persisted sync watermark.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Current checkpoint in epoch milliseconds, 0 if never set.
    async fn get(&self) -> Result<i64, DatabaseError>;

    async fn set(&self, value: i64) -> Result<(), DatabaseError>;
}
