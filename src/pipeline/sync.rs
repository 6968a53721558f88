//! Sync coordinator: checkpointed, single-flight ingestion of bank SMS.
//!
//! One cycle:
//! 1. Read the checkpoint (epoch ms, 0 when never synced) and sample "now"
//! 2. Ask the source for at most `max_count` inbox messages since the checkpoint
//! 3. Drop non-bank senders (and anything older than the checkpoint)
//! 4. Parse each remaining message in source order and append accepted ones
//! 5. If anything was accepted, advance the checkpoint to the sampled "now"
//!
//! The checkpoint never moves backwards and is left untouched by cycles that
//! accept nothing, so a window whose messages all failed is retried as-is.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::pipeline::parser::MessageParser;
use crate::pipeline::types::{
    CheckpointStore, Mailbox, MessageFilter, MessageSource, SyncResult, TransactionSink,
};

/// Interval used by `spawn_sync_loop` when asked for a zero interval.
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Runs sync cycles against abstract source, sink and checkpoint store.
pub struct SyncCoordinator {
    source: Arc<dyn MessageSource>,
    sink: Arc<dyn TransactionSink>,
    checkpoint: Arc<dyn CheckpointStore>,
    parser: MessageParser,
    max_count: usize,
    dedup: bool,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the cycle ends, on every exit path.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncCoordinator {
    pub fn new(
        source: Arc<dyn MessageSource>,
        sink: Arc<dyn TransactionSink>,
        checkpoint: Arc<dyn CheckpointStore>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            source,
            sink,
            checkpoint,
            parser: MessageParser::with_description_max_len(config.description_max_len),
            max_count: config.max_count,
            dedup: config.dedup,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Replace the default parser (custom bank headers or keyword rules).
    pub fn with_parser(mut self, parser: MessageParser) -> Self {
        self.parser = parser;
        self
    }

    /// Whether a cycle is currently running.
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one sync cycle.
    ///
    /// Fails fast with `CycleInProgress` if another cycle is running.
    pub async fn run_sync_cycle(&self) -> Result<SyncResult, SyncError> {
        let _guard = self.try_begin()?;

        let last_sync = self
            .checkpoint
            .get()
            .await
            .map_err(SyncError::CheckpointReadFailed)?;
        let started_at = Utc::now().timestamp_millis();

        let filter = MessageFilter {
            mailbox: Mailbox::Inbox,
            since_timestamp_millis: last_sync,
            max_count: self.max_count,
        };
        let messages = self.source.list(&filter).await.map_err(|e| {
            error!(error = %e, last_sync, "Message source failed, aborting sync cycle");
            SyncError::SourceUnavailable(e)
        })?;

        let mut result = SyncResult::default();
        let total = messages.len();
        let banks = self.parser.banks();

        let candidates: Vec<_> = messages
            .into_iter()
            .filter(|msg| {
                if msg.timestamp_millis < last_sync {
                    warn!(
                        sender = %msg.sender,
                        timestamp = msg.timestamp_millis,
                        last_sync,
                        "Source returned a message older than the checkpoint, skipping"
                    );
                    result.filtered += 1;
                    return false;
                }
                if !banks.is_bank_sender(&msg.sender) {
                    result.filtered += 1;
                    return false;
                }
                true
            })
            .collect();

        debug!(
            total,
            bank_messages = candidates.len(),
            "Found potential bank messages"
        );

        for msg in &candidates {
            let transaction = match self.parser.parse(msg) {
                Ok(tx) => tx,
                Err(rejection) => {
                    debug!(sender = %msg.sender, reason = %rejection, "Message rejected");
                    result.rejected += 1;
                    continue;
                }
            };

            if self.dedup {
                match self.sink.contains_fingerprint(&transaction.fingerprint).await {
                    Ok(true) => {
                        debug!(
                            fingerprint = %transaction.fingerprint,
                            "Transaction already stored, skipping"
                        );
                        result.duplicates += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(error = %e, "Dedup lookup failed, appending anyway");
                    }
                }
            }

            match self.sink.append(&transaction).await {
                Ok(id) => {
                    debug!(
                        id,
                        kind = transaction.kind.as_str(),
                        amount = %transaction.amount,
                        "Transaction appended"
                    );
                    result.accepted += 1;
                }
                Err(e) => {
                    warn!(sender = %msg.sender, error = %e, "Failed to append transaction");
                    result.rejected += 1;
                }
            }
        }

        if result.accepted > 0 {
            let next = started_at.max(last_sync);
            self.checkpoint.set(next).await.map_err(|source| {
                error!(error = %source, accepted = result.accepted, "Failed to persist checkpoint");
                SyncError::CheckpointWriteFailed {
                    accepted: result.accepted,
                    source,
                }
            })?;
            result.checkpoint = Some(next);
        }

        info!(
            accepted = result.accepted,
            rejected = result.rejected,
            duplicates = result.duplicates,
            filtered = result.filtered,
            checkpoint = ?result.checkpoint,
            "Sync cycle complete"
        );

        Ok(result)
    }

    fn try_begin(&self) -> Result<CycleGuard<'_>, SyncError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| CycleGuard(&self.in_flight))
            .map_err(|_| SyncError::CycleInProgress)
    }
}

/// Spawn a background task that runs a sync cycle on every tick.
///
/// The first cycle runs immediately. Returns a `JoinHandle` and a shutdown
/// flag; set the flag to stop after the current tick. A zero interval is
/// replaced by `MIN_SYNC_INTERVAL`.
pub fn spawn_sync_loop(
    coordinator: Arc<SyncCoordinator>,
    interval: Duration,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let interval = if interval.is_zero() {
        warn!(
            "Zero sync interval requested, using {}s",
            MIN_SYNC_INTERVAL.as_secs()
        );
        MIN_SYNC_INTERVAL
    } else {
        interval
    };
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!("Sync loop started, syncing every {}s", interval.as_secs());

        let mut tick = tokio::time::interval(interval);

        loop {
            tick.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                info!("Sync loop shutting down");
                return;
            }

            if let Err(e) = coordinator.run_sync_cycle().await {
                error!(error = %e, "Sync cycle failed");
            }
        }
    });

    (handle, shutdown_flag)
}
