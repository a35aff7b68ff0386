//! Transaction persistence.
//!
//! When a simulation stops, the controller hands the full transaction log to
//! a [`TransactionSink`]. The pool keeps its own copy, so a failing sink never
//! loses in-memory history.

use crate::record::TicketRecord;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur while persisting transactions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Filesystem or other I/O failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Records could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The sink refused the write (for example a test sink set to fail).
    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

impl SinkError {
    /// Whether retrying the write could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}

impl From<std::io::Error> for SinkError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Durable destination for a run's transaction log.
///
/// Returns boxed futures so it can be held as `Arc<dyn TransactionSink>`.
pub trait TransactionSink: Send + Sync {
    /// Persist `records` in the order given.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the records could not be written.
    fn persist(
        &self,
        records: Vec<TicketRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>>;

    /// Human-readable destination, used in logs and summaries.
    fn describe(&self) -> String;
}
