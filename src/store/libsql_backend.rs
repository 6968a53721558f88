//! libSQL backend for ledger rows, sync checkpoint, and the sink the sync
//! coordinator appends to. Supports local file and in-memory databases.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::pipeline::types::{CheckpointStore, ParsedTransaction, TransactionKind, TransactionSink};
use crate::store::migrations;
use crate::store::traits::{EntrySource, LedgerStore, LedgerTransaction, NewTransaction};

/// Settings key holding the last successful sync time (epoch ms).
pub const LAST_SYNC_KEY: &str = "last_sms_sync_time";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT value FROM settings WHERE key = ?1", params![key])
            .await
            .map_err(|e| DatabaseError::Query(format!("get_setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get_setting row: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_setting: {e}"))),
        }
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, value, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_setting: {e}")))?;
        Ok(())
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

fn column_err(name: &str, e: libsql::Error) -> DatabaseError {
    DatabaseError::Query(format!("transactions.{name}: {e}"))
}

fn parse_column<T>(raw: &str, name: &str) -> Result<T, DatabaseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| DatabaseError::Serialization(format!("transactions.{name} {raw:?}: {e}")))
}

/// Map a libsql Row to a LedgerTransaction.
///
/// Column order matches TRANSACTION_COLUMNS.
fn row_to_transaction(row: &libsql::Row) -> Result<LedgerTransaction, DatabaseError> {
    let amount: String = row.get(1).map_err(|e| column_err("amount", e))?;
    let date: String = row.get(3).map_err(|e| column_err("date", e))?;
    let kind: String = row.get(6).map_err(|e| column_err("kind", e))?;
    let source: String = row.get(7).map_err(|e| column_err("source", e))?;
    let created_at: String = row.get(9).map_err(|e| column_err("created_at", e))?;

    Ok(LedgerTransaction {
        id: row.get(0).map_err(|e| column_err("id", e))?,
        amount: parse_column(&amount, "amount")?,
        category: row.get(2).map_err(|e| column_err("category", e))?,
        date: parse_column(&date, "date")?,
        notes: row.get(4).unwrap_or_default(),
        bank_name: row.get(5).ok(),
        kind: parse_column(&kind, "kind")?,
        source: parse_column(&source, "source")?,
        account_suffix: row.get(8).ok(),
        created_at: parse_datetime(&created_at),
    })
}

// ── Trait implementations ───────────────────────────────────────────

const TRANSACTION_COLUMNS: &str =
    "id, amount, category, date, notes, bank_name, kind, source, account_suffix, created_at";

#[async_trait]
impl LedgerStore for LibSqlBackend {
    async fn insert_transaction(&self, tx: &NewTransaction) -> Result<i64, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let mut rows = self
            .conn()
            .query(
                "INSERT INTO transactions (amount, category, date, notes, bank_name, kind,
                    source, account_suffix, fingerprint, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 RETURNING id",
                params![
                    tx.amount.to_string(),
                    tx.category.as_str(),
                    tx.date.format("%Y-%m-%d").to_string(),
                    tx.notes.as_str(),
                    opt_text(tx.bank_name.as_deref()),
                    tx.kind.as_str(),
                    tx.source.as_str(),
                    opt_text(tx.account_suffix.as_deref()),
                    opt_text(tx.fingerprint.as_deref()),
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_transaction: {e}")))?;

        let id: i64 = match rows.next().await {
            Ok(Some(row)) => row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("insert_transaction id: {e}")))?,
            Ok(None) => {
                return Err(DatabaseError::Query(
                    "insert_transaction: no id returned".into(),
                ));
            }
            Err(e) => return Err(DatabaseError::Query(format!("insert_transaction: {e}"))),
        };

        debug!(id, source = tx.source.as_str(), "Transaction inserted into DB");
        Ok(id)
    }

    async fn get_transaction(&self, id: i64) -> Result<Option<LedgerTransaction>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_transaction: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_transaction(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_transaction: {e}"))),
        }
    }

    async fn list_transactions(&self) -> Result<Vec<LedgerTransaction>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY date DESC, id DESC"
                ),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_transactions: {e}")))?;

        let mut transactions = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_transaction(&row) {
                Ok(tx) => transactions.push(tx),
                Err(e) => {
                    tracing::warn!("Skipping transaction row: {e}");
                }
            }
        }
        Ok(transactions)
    }

    async fn update_transaction(&self, tx: &LedgerTransaction) -> Result<(), DatabaseError> {
        let count = self
            .conn()
            .execute(
                "UPDATE transactions
                 SET amount = ?1, category = ?2, date = ?3, notes = ?4, bank_name = ?5, kind = ?6
                 WHERE id = ?7",
                params![
                    tx.amount.to_string(),
                    tx.category.as_str(),
                    tx.date.format("%Y-%m-%d").to_string(),
                    tx.notes.as_str(),
                    opt_text(tx.bank_name.as_deref()),
                    tx.kind.as_str(),
                    tx.id,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_transaction: {e}")))?;

        if count == 0 {
            return Err(DatabaseError::NotFound {
                entity: "transaction".into(),
                id: tx.id.to_string(),
            });
        }
        debug!(id = tx.id, "Transaction updated in DB");
        Ok(())
    }

    async fn delete_transaction(&self, id: i64) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_transaction: {e}")))?;
        Ok(count > 0)
    }
}

#[async_trait]
impl TransactionSink for LibSqlBackend {
    async fn append(&self, transaction: &ParsedTransaction) -> Result<i64, DatabaseError> {
        self.insert_transaction(&NewTransaction::from_parsed(transaction))
            .await
    }

    async fn contains_fingerprint(&self, fingerprint: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT 1 FROM transactions WHERE fingerprint = ?1 LIMIT 1",
                params![fingerprint],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("contains_fingerprint: {e}")))?;

        match rows.next().await {
            Ok(row) => Ok(row.is_some()),
            Err(e) => Err(DatabaseError::Query(format!("contains_fingerprint: {e}"))),
        }
    }
}

#[async_trait]
impl CheckpointStore for LibSqlBackend {
    async fn get(&self) -> Result<i64, DatabaseError> {
        match self.get_setting(LAST_SYNC_KEY).await? {
            None => Ok(0),
            Some(raw) => raw.parse().map_err(|e| {
                DatabaseError::Serialization(format!("{LAST_SYNC_KEY} = {raw:?}: {e}"))
            }),
        }
    }

    async fn set(&self, value: i64) -> Result<(), DatabaseError> {
        self.set_setting(LAST_SYNC_KEY, &value.to_string()).await?;
        debug!(value, "Sync checkpoint stored");
        Ok(())
    }
}
