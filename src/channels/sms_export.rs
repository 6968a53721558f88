//! Message source backed by an Android SMS inbox export.
//!
//! The export is a JSON array in the shape the Android SMS content provider
//! returns:
//!
//! ```json
//! [{ "address": "VM-HDFCBK", "body": "Rs. 250 debited ...", "date": 1705055400000, "type": 1 }]
//! ```
//!
//! `date` is epoch milliseconds (number or numeric string). `type` 1 is the
//! inbox; rows without a `type` are treated as inbox messages. The file is
//! re-read on every query so a fresh export is picked up without restarting.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::SourceError;
use crate::pipeline::types::{Mailbox, MessageFilter, MessageSource, RawMessage};

/// Android `Telephony.Sms.MESSAGE_TYPE_INBOX`.
const MESSAGE_TYPE_INBOX: i64 = 1;

/// Integer field that exports sometimes write as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseInt {
    Int(i64),
    Text(String),
}

impl LooseInt {
    fn value(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ExportedSms {
    address: String,
    body: String,
    date: LooseInt,
    #[serde(rename = "type", default)]
    message_type: Option<LooseInt>,
}

impl ExportedSms {
    fn in_mailbox(&self, mailbox: Mailbox) -> bool {
        match mailbox {
            Mailbox::Inbox => self
                .message_type
                .as_ref()
                .is_none_or(|t| t.value() == Some(MESSAGE_TYPE_INBOX)),
        }
    }
}

/// Reads inbox messages from a JSON export on disk.
pub struct JsonExportSource {
    path: PathBuf,
}

impl JsonExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Apply a filter to exported rows: mailbox, minimum date, newest first,
/// at most `max_count`.
fn select(rows: Vec<ExportedSms>, filter: &MessageFilter) -> Vec<RawMessage> {
    let mut messages: Vec<RawMessage> = rows
        .into_iter()
        .filter(|row| row.in_mailbox(filter.mailbox))
        .filter_map(|row| {
            let timestamp = row.date.value()?;
            (timestamp >= filter.since_timestamp_millis)
                .then(|| RawMessage::new(row.address, row.body, timestamp))
        })
        .collect();

    messages.sort_by(|a, b| b.timestamp_millis.cmp(&a.timestamp_millis));
    messages.truncate(filter.max_count);
    messages
}

#[async_trait]
impl MessageSource for JsonExportSource {
    async fn list(&self, filter: &MessageFilter) -> Result<Vec<RawMessage>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SourceError::Unavailable {
                reason: format!("cannot read {}: {e}", self.path.display()),
            }
        })?;
        let rows: Vec<ExportedSms> = serde_json::from_str(&raw)?;
        let total = rows.len();
        let messages = select(rows, filter);

        debug!(
            path = %self.path.display(),
            total,
            selected = messages.len(),
            since = filter.since_timestamp_millis,
            "Listed SMS export"
        );
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn filter(since: i64, max_count: usize) -> MessageFilter {
        MessageFilter {
            mailbox: Mailbox::Inbox,
            since_timestamp_millis: since,
            max_count,
        }
    }

    fn export(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn lists_inbox_newest_first() {
        let file = export(
            r#"[
                {"address": "HDFCBK", "body": "old", "date": 100, "type": 1},
                {"address": "HDFCBK", "body": "new", "date": "300", "type": "1"},
                {"address": "ME", "body": "outgoing", "date": 400, "type": 2},
                {"address": "SBIINB", "body": "untyped", "date": 200}
            ]"#,
        );
        let source = JsonExportSource::new(file.path());

        let messages = source.list(&filter(0, 100)).await.unwrap();
        let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["new", "untyped", "old"]);
        assert_eq!(messages[0].timestamp_millis, 300);
    }

    #[tokio::test]
    async fn since_is_inclusive_and_max_count_bounds() {
        let file = export(
            r#"[
                {"address": "A", "body": "1", "date": 100},
                {"address": "A", "body": "2", "date": 200},
                {"address": "A", "body": "3", "date": 300},
                {"address": "A", "body": "4", "date": 400}
            ]"#,
        );
        let source = JsonExportSource::new(file.path());

        let messages = source.list(&filter(200, 2)).await.unwrap();
        let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["4", "3"]);

        let messages = source.list(&filter(200, 10)).await.unwrap();
        assert!(messages.iter().all(|m| m.timestamp_millis >= 200));
        assert_eq!(messages.len(), 3);
    }

    #[tokio::test]
    async fn unparsable_dates_are_skipped() {
        let file = export(r#"[{"address": "A", "body": "x", "date": "soon"}]"#);
        let source = JsonExportSource::new(file.path());
        assert!(source.list(&filter(0, 10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let source = JsonExportSource::new("/nonexistent/sms-export.json");
        let err = source.list(&filter(0, 10)).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let file = export("{ not json");
        let source = JsonExportSource::new(file.path());
        let err = source.list(&filter(0, 10)).await.unwrap_err();
        assert!(matches!(err, SourceError::Json(_)));
    }
}
