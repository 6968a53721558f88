//! Error types for the bank SMS sync engine.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Message source error: {0}")]
    Source(#[from] SourceError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors (ledger rows, checkpoint, migrations).
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures of the inbox message source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Message source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cycle-level failures of the sync coordinator.
///
/// Per-message problems (unparsable text, a failed append) never show up
/// here; they are counted in `SyncResult` instead.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("A sync cycle is already in progress")]
    CycleInProgress,

    #[error("Message source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    #[error("Failed to read sync checkpoint: {0}")]
    CheckpointReadFailed(#[source] DatabaseError),

    #[error("Failed to persist sync checkpoint after {accepted} accepted transaction(s): {source}")]
    CheckpointWriteFailed {
        accepted: usize,
        #[source]
        source: DatabaseError,
    },
}

/// Why the parser pipeline declined a message.
///
/// These are expected, high-frequency outcomes rather than failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("message is not a recognized debit or credit notification")]
    ClassificationRejected,

    #[error("extraction failed: {reason}")]
    ExtractionFailed { reason: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_write_failure_mentions_accepted_count() {
        let err = SyncError::CheckpointWriteFailed {
            accepted: 3,
            source: DatabaseError::Query("disk full".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 accepted"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn source_error_converts_into_top_level() {
        let err: Error = SourceError::Unavailable {
            reason: "inbox locked".into(),
        }
        .into();
        assert!(matches!(err, Error::Source(_)));
    }

    #[test]
    fn question_mark_lifts_layer_errors() {
        fn cycle() -> Result<()> {
            Err(SyncError::CycleInProgress)?
        }
        fn ledger() -> Result<()> {
            Err(DatabaseError::Query("locked".into()))?
        }

        assert!(matches!(cycle(), Err(Error::Sync(SyncError::CycleInProgress))));
        assert!(matches!(ledger(), Err(Error::Database(DatabaseError::Query(_)))));
    }
}
