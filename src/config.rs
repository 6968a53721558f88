//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default number of inbox messages pulled per sync cycle.
pub const DEFAULT_MAX_COUNT: usize = 100;

/// Default maximum length (in characters) of an extracted merchant description.
pub const DEFAULT_DESCRIPTION_MAX_LEN: usize = 30;

/// Sync engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound on messages requested from the source per cycle.
    pub max_count: usize,
    /// Merchant descriptions are truncated to this many characters.
    pub description_max_len: usize,
    /// Skip messages whose fingerprint the sink already holds.
    pub dedup: bool,
    /// Run cycles on this interval. `None` runs a single cycle.
    pub interval: Option<Duration>,
    /// Ledger database location.
    pub db_path: PathBuf,
    /// Path to the SMS inbox export read by the message source.
    pub source_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_count: DEFAULT_MAX_COUNT,
            description_max_len: DEFAULT_DESCRIPTION_MAX_LEN,
            dedup: true,
            interval: None,
            db_path: PathBuf::from("./data/bank-sms.db"),
            source_path: None,
        }
    }
}

impl SyncConfig {
    /// Build configuration from `SMS_SYNC_*` environment variables.
    ///
    /// Unset variables fall back to the defaults; set-but-malformed values
    /// are errors rather than silently ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_count = parse_var(&lookup, "SMS_SYNC_MAX_COUNT")?.unwrap_or(defaults.max_count);
        if max_count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SMS_SYNC_MAX_COUNT".into(),
                message: "must be at least 1".into(),
            });
        }

        let description_max_len = parse_var(&lookup, "SMS_SYNC_DESCRIPTION_MAX_LEN")?
            .unwrap_or(defaults.description_max_len);
        if description_max_len == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SMS_SYNC_DESCRIPTION_MAX_LEN".into(),
                message: "must be at least 1".into(),
            });
        }

        let dedup = match lookup("SMS_SYNC_DEDUP") {
            None => defaults.dedup,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "SMS_SYNC_DEDUP".into(),
                message: format!("expected true/false, got {raw:?}"),
            })?,
        };

        let interval = parse_var::<u64>(&lookup, "SMS_SYNC_INTERVAL_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let db_path = lookup("SMS_SYNC_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let source_path = lookup("SMS_SYNC_SOURCE").map(PathBuf::from);

        Ok(Self {
            max_count,
            description_max_len,
            dedup,
            interval,
            db_path,
            source_path,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e} (got {raw:?})"),
            }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
