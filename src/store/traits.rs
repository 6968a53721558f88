//! `LedgerStore` trait and ledger row types.
//!
//! The ledger is the persisted transaction list the app displays. Rows come
//! from two places: bank SMS accepted by the sync coordinator, and entries
//! the user types in by hand.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;
use crate::pipeline::types::{ParsedTransaction, TransactionKind};

/// Where a ledger row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntrySource {
    Sms,
    Manual,
}

impl EntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "SMS",
            Self::Manual => "MANUAL",
        }
    }
}

impl std::str::FromStr for EntrySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SMS" => Ok(Self::Sms),
            "MANUAL" => Ok(Self::Manual),
            other => Err(format!("unknown entry source: {other}")),
        }
    }
}

/// A ledger row that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub notes: String,
    pub bank_name: Option<String>,
    pub kind: TransactionKind,
    pub source: EntrySource,
    pub account_suffix: Option<String>,
    /// Dedup key; only SMS-derived rows carry one.
    pub fingerprint: Option<String>,
}

impl NewTransaction {
    /// Ledger row for a transaction extracted from a bank SMS.
    pub fn from_parsed(tx: &ParsedTransaction) -> Self {
        Self {
            amount: tx.amount,
            category: tx.kind.ledger_category().to_string(),
            date: tx.occurred_on,
            notes: tx.description.clone(),
            bank_name: Some(tx.bank_name.clone()),
            kind: tx.kind,
            source: EntrySource::Sms,
            account_suffix: tx.account_suffix.clone(),
            fingerprint: Some(tx.fingerprint.clone()),
        }
    }

    /// Ledger row entered by hand.
    pub fn manual(
        amount: Decimal,
        kind: TransactionKind,
        category: impl Into<String>,
        date: NaiveDate,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            category: category.into(),
            date,
            notes: notes.into(),
            bank_name: None,
            kind,
            source: EntrySource::Manual,
            account_suffix: None,
            fingerprint: None,
        }
    }
}

/// A stored ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: i64,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub notes: String,
    pub bank_name: Option<String>,
    pub kind: TransactionKind,
    pub source: EntrySource,
    pub account_suffix: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Backend-agnostic ledger persistence.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a row. Returns the auto-assigned ID.
    async fn insert_transaction(&self, tx: &NewTransaction) -> Result<i64, DatabaseError>;

    /// Get a row by ID.
    async fn get_transaction(&self, id: i64) -> Result<Option<LedgerTransaction>, DatabaseError>;

    /// All rows, most recent date first (ties broken by newest ID).
    async fn list_transactions(&self) -> Result<Vec<LedgerTransaction>, DatabaseError>;

    /// Overwrite the editable fields of an existing row.
    ///
    /// Returns `DatabaseError::NotFound` if no row has this ID.
    async fn update_transaction(&self, tx: &LedgerTransaction) -> Result<(), DatabaseError>;

    /// Delete a row. Returns `true` if it existed.
    async fn delete_transaction(&self, id: i64) -> Result<bool, DatabaseError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn sms_row_uses_kind_category_and_description() {
        let parsed = ParsedTransaction {
            amount: dec!(2500.00),
            kind: TransactionKind::Debit,
            account_suffix: Some("1234".into()),
            occurred_on: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            bank_name: "HDFC Bank".into(),
            description: "AMAZON".into(),
            fingerprint: "abc".into(),
        };
        let row = NewTransaction::from_parsed(&parsed);
        assert_eq!(row.category, "Bank Related");
        assert_eq!(row.notes, "AMAZON");
        assert_eq!(row.bank_name.as_deref(), Some("HDFC Bank"));
        assert_eq!(row.source, EntrySource::Sms);
        assert_eq!(row.fingerprint.as_deref(), Some("abc"));
    }

    #[test]
    fn manual_row_has_no_fingerprint() {
        let row = NewTransaction::manual(
            dec!(120),
            TransactionKind::Debit,
            "Food",
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            "lunch",
        );
        assert_eq!(row.source, EntrySource::Manual);
        assert!(row.fingerprint.is_none());
        assert!(row.bank_name.is_none());
    }

    #[test]
    fn entry_source_labels() {
        assert_eq!("SMS".parse::<EntrySource>().unwrap(), EntrySource::Sms);
        assert_eq!(EntrySource::Manual.as_str(), "MANUAL");
        assert!("EMAIL".parse::<EntrySource>().is_err());
    }
}
