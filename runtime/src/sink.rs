//! JSON file transaction sink.
//!
//! Writes the log as a pretty-printed JSON array:
//!
//! ```json
//! [
//!   {
//!     "actionKind": "ADD",
//!     "actorName": "Vendor-1",
//!     "count": 7,
//!     "remainingAfter": 17
//!   }
//! ]
//! ```
//!
//! The file is written to a sibling temporary path and renamed into place,
//! so a reader never sees a half-written export.

use crate::retry::{RetryPolicy, retry_if};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use ticket_pool_core::TicketRecord;
use ticket_pool_core::persistence::{SinkError, TransactionSink};

/// Default export file name
pub const DEFAULT_TRANSACTIONS_FILE: &str = "transactions.json";

/// Sink that exports transactions to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    retry: RetryPolicy,
}

impl JsonFileSink {
    /// Create a sink writing to `path` with the default retry policy.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Export destination
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn write_once(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

impl TransactionSink for JsonFileSink {
    fn persist(
        &self,
        records: Vec<TicketRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
        Box::pin(async move {
            let bytes = serde_json::to_vec_pretty(&records)
                .map_err(|e| SinkError::Serialization(e.to_string()))?;

            retry_if(&self.retry, || self.write_once(&bytes), SinkError::is_transient).await?;

            tracing::info!(
                path = %self.path.display(),
                records = records.len(),
                "Transactions exported"
            );
            Ok(())
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ticket_pool_core::ActionKind;

    fn records() -> Vec<TicketRecord> {
        vec![
            TicketRecord::new(ActionKind::Add, "Vendor-1", 7, 17),
            TicketRecord::new(ActionKind::Retrieve, "Customer-2", 3, 14),
        ]
    }

    #[tokio::test]
    async fn test_writes_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_TRANSACTIONS_FILE);
        let sink = JsonFileSink::new(&path);

        sink.persist(records()).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  {"));
        assert!(text.contains("\"actionKind\": \"ADD\""));
        assert!(text.contains("\"remainingAfter\": 14"));

        let back: Vec<TicketRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, records());
        assert!(!sink.temp_path().exists());
    }

    #[tokio::test]
    async fn test_overwrites_previous_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let sink = JsonFileSink::new(&path);

        sink.persist(records()).await.unwrap();
        sink.persist(Vec::new()).await.unwrap();

        let back: Vec<TicketRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(back.is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("missing").join("out.json"))
            .with_retry(RetryPolicy::no_retries());

        let result = sink.persist(records()).await;

        assert!(matches!(result, Err(SinkError::Io(_))));
        assert!(sink.describe().ends_with("out.json"));
    }
}
