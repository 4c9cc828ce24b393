// CSV file implementation of FilteredMessageLog.
//
// One row per flagged message:
//   timestamp,author,content,predicted,allowed
// The file and its directory are created on first write. There is no header
// row and nothing in the bot reads the file back.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::SecondsFormat;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::core::topic_filter::{FilteredMessage, FilteredMessageLog, TopicFilterError};

pub struct CsvFilteredMessageLog {
    path: PathBuf,
    // Serializes appends from concurrent message tasks
    write_lock: Mutex<()>,
}

impl CsvFilteredMessageLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FilteredMessageLog for CsvFilteredMessageLog {
    async fn append(&self, record: &FilteredMessage) -> Result<(), TopicFilterError> {
        let row = format_row(record);
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| TopicFilterError::LogStore(e.to_string()))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| TopicFilterError::LogStore(e.to_string()))?;

        file.write_all(row.as_bytes())
            .await
            .map_err(|e| TopicFilterError::LogStore(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| TopicFilterError::LogStore(e.to_string()))
    }
}

/// Render a record as one CRLF-terminated CSV line.
fn format_row(record: &FilteredMessage) -> String {
    let timestamp = record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
    let fields = [
        timestamp.as_str(),
        record.author_name.as_str(),
        record.content.as_str(),
        record.predicted.as_str(),
        record.allowed.as_str(),
    ];

    let mut line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

/// Quote a field if it contains a delimiter, quote, or line break.
fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
