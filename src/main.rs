use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use bank_sms_sync::channels::JsonExportSource;
use bank_sms_sync::config::SyncConfig;
use bank_sms_sync::error::Result;
use bank_sms_sync::pipeline::{SyncCoordinator, spawn_sync_loop};
use bank_sms_sync::store::{LedgerStore, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_tracing();

    let config = SyncConfig::from_env()?;

    let Some(source_path) = config.source_path.clone() else {
        eprintln!("Error: SMS_SYNC_SOURCE not set");
        eprintln!("  export SMS_SYNC_SOURCE=./sms-inbox.json");
        std::process::exit(1);
    };

    eprintln!("📨 Bank SMS Sync v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Source: {}", source_path.display());
    eprintln!("   Database: {}", config.db_path.display());

    // ── Database ─────────────────────────────────────────────────────────
    let db = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    let source = Arc::new(JsonExportSource::new(source_path));
    let coordinator = Arc::new(SyncCoordinator::new(
        source,
        db.clone(),
        db.clone(),
        &config,
    ));

    // ── Loop mode ────────────────────────────────────────────────────────
    if let Some(interval) = config.interval {
        eprintln!("   Syncing every {}s. Ctrl-C to stop.\n", interval.as_secs());

        let (handle, shutdown) = spawn_sync_loop(Arc::clone(&coordinator), interval);
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;

        eprintln!("\nShutting down...");
        shutdown.store(true, Ordering::Relaxed);
        handle.abort();
        return Ok(());
    }

    // ── Single cycle ─────────────────────────────────────────────────────
    run_once(&coordinator, db.as_ref()).await?;
    Ok(())
}

/// Run one sync cycle, then print the whole ledger to stdout.
async fn run_once(coordinator: &SyncCoordinator, ledger: &dyn LedgerStore) -> Result<()> {
    let result = coordinator.run_sync_cycle().await?;
    eprintln!(
        "   Accepted {}, rejected {}, duplicates {}, filtered {}",
        result.accepted, result.rejected, result.duplicates, result.filtered
    );
    match result.checkpoint {
        Some(checkpoint) => eprintln!("   Checkpoint advanced to {checkpoint}\n"),
        None => eprintln!("   Checkpoint unchanged\n"),
    }

    for tx in ledger.list_transactions().await? {
        println!(
            "{}  {:<6}  {:>12}  {:<12}  {:<16}  {}",
            tx.date,
            tx.kind.as_str(),
            tx.amount,
            tx.category,
            tx.bank_name.as_deref().unwrap_or("-"),
            tx.notes
        );
    }

    Ok(())
}

/// Console logging filtered by `RUST_LOG` (default `info`), plus a daily
/// rolling file under `SMS_SYNC_LOG_DIR` when it is set.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_dir) = std::env::var_os("SMS_SYNC_LOG_DIR") else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(false)
            .init();
        return None;
    };

    let appender = tracing_appender::rolling::daily(log_dir, "bank-sms-sync.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}
