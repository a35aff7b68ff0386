//! In-memory transaction sinks
//!
//! - [`InMemorySink`]: records every export for later assertions
//! - [`FailingSink`]: fails a set number of times, then accepts

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Locks are only poisoned by a panicking test

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use ticket_pool_core::persistence::{SinkError, TransactionSink};
use ticket_pool_core::record::TicketRecord;

/// Sink that keeps every export in memory.
///
/// Clones share storage, so a test can hand one clone to the controller and
/// inspect the other.
///
/// # Example
///
/// ```
/// use ticket_pool_core::persistence::TransactionSink;
/// use ticket_pool_core::{ActionKind, TicketRecord};
/// use ticket_pool_testing::InMemorySink;
///
/// # tokio_test::block_on(async {
/// let sink = InMemorySink::new();
/// sink.persist(vec![TicketRecord::new(ActionKind::Add, "Vendor-1", 3, 3)])
///     .await
///     .unwrap();
///
/// assert_eq!(sink.export_count(), 1);
/// assert_eq!(sink.last_export().unwrap().len(), 1);
/// # });
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemorySink {
    exports: Arc<Mutex<Vec<Vec<TicketRecord>>>>,
}

impl InMemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed exports
    #[must_use]
    pub fn export_count(&self) -> usize {
        self.exports.lock().unwrap().len()
    }

    /// Records from the most recent export
    #[must_use]
    pub fn last_export(&self) -> Option<Vec<TicketRecord>> {
        self.exports.lock().unwrap().last().cloned()
    }

    /// Every export in order
    #[must_use]
    pub fn exports(&self) -> Vec<Vec<TicketRecord>> {
        self.exports.lock().unwrap().clone()
    }
}

impl TransactionSink for InMemorySink {
    fn persist(
        &self,
        records: Vec<TicketRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
        Box::pin(async move {
            self.exports.lock().unwrap().push(records);
            Ok(())
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Sink that fails its first `failures` calls with
/// [`SinkError::Unavailable`], then stores like [`InMemorySink`].
#[derive(Clone, Debug)]
pub struct FailingSink {
    failures: usize,
    attempts: Arc<AtomicUsize>,
    inner: InMemorySink,
}

impl FailingSink {
    /// Fail the first `failures` calls
    #[must_use]
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            attempts: Arc::new(AtomicUsize::new(0)),
            inner: InMemorySink::new(),
        }
    }

    /// Fail every call
    #[must_use]
    pub fn always() -> Self {
        Self::new(usize::MAX)
    }

    /// Calls made so far, failed or not
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Exports that got through
    #[must_use]
    pub fn stored(&self) -> &InMemorySink {
        &self.inner
    }
}

impl TransactionSink for FailingSink {
    fn persist(
        &self,
        records: Vec<TicketRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + '_>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Box::pin(async move {
                Err(SinkError::Unavailable(format!("attempt {} refused", attempt + 1)))
            });
        }
        self.inner.persist(records)
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticket_pool_core::ActionKind;

    #[tokio::test]
    async fn test_clones_share_exports() {
        let sink = InMemorySink::new();
        let handle = sink.clone();

        sink.persist(Vec::new()).await.unwrap();
        sink.persist(vec![TicketRecord::new(ActionKind::Retrieve, "C", 1, 0)])
            .await
            .unwrap();

        assert_eq!(handle.export_count(), 2);
        assert_eq!(handle.exports()[0].len(), 0);
    }

    #[tokio::test]
    async fn test_failing_sink_recovers_after_failures() {
        let sink = FailingSink::new(2);

        assert!(sink.persist(Vec::new()).await.is_err());
        assert!(sink.persist(Vec::new()).await.is_err());
        assert!(sink.persist(Vec::new()).await.is_ok());

        assert_eq!(sink.attempts(), 3);
        assert_eq!(sink.stored().export_count(), 1);
    }
}
