//! # Ticket Pool Testing
//!
//! Testing utilities for the ticket pool simulation.
//!
//! This crate provides:
//! - Mock batch sources and transaction sinks
//! - Test helpers for configs and log assertions
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ticket_pool_runtime::SimulationController;
//! use ticket_pool_testing::{FixedBatches, InMemorySink, helpers::test_config};
//!
//! #[tokio::test]
//! async fn test_run_exports_log() {
//!     let sink = InMemorySink::new();
//!     let mut controller = SimulationController::new(
//!         test_config(),
//!         Arc::new(sink.clone()),
//!         Arc::new(FixedBatches::new(2)),
//!     )
//!     .unwrap();
//!
//!     controller.start();
//!     controller.stop().await;
//!     assert_eq!(sink.export_count(), 1);
//! }
//! ```

use ticket_pool_core::config::BatchRange;
use ticket_pool_core::environment::BatchSource;

/// Mock batch sources
pub mod mocks {
    use super::{BatchRange, BatchSource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always returns the same batch size, ignoring the range.
    ///
    /// # Example
    ///
    /// ```
    /// use ticket_pool_core::config::BatchRange;
    /// use ticket_pool_core::environment::BatchSource;
    /// use ticket_pool_testing::mocks::FixedBatches;
    ///
    /// let batches = FixedBatches::new(4);
    /// assert_eq!(batches.next_batch(BatchRange::CUSTOMER_DEFAULT), 4);
    /// ```
    #[derive(Debug, Clone, Copy)]
    pub struct FixedBatches {
        size: u32,
    }

    impl FixedBatches {
        /// Create a source that always yields `size`
        #[must_use]
        pub const fn new(size: u32) -> Self {
            Self { size }
        }
    }

    impl BatchSource for FixedBatches {
        fn next_batch(&self, _range: BatchRange) -> u32 {
            self.size
        }
    }

    /// Replays a script of batch sizes, cycling when it runs out.
    ///
    /// The script is shared by every actor holding the source, so the
    /// sequence is global rather than per actor.
    #[derive(Debug)]
    pub struct ScriptedBatches {
        script: Vec<u32>,
        next: AtomicUsize,
    }

    impl ScriptedBatches {
        /// Create a source from `script`. An empty script yields the range
        /// minimum.
        #[must_use]
        pub fn new(script: impl Into<Vec<u32>>) -> Self {
            Self {
                script: script.into(),
                next: AtomicUsize::new(0),
            }
        }

        /// Batches drawn so far
        #[must_use]
        pub fn drawn(&self) -> usize {
            self.next.load(Ordering::SeqCst)
        }
    }

    impl BatchSource for ScriptedBatches {
        fn next_batch(&self, range: BatchRange) -> u32 {
            let index = self.next.fetch_add(1, Ordering::SeqCst);
            if self.script.is_empty() {
                return range.min;
            }
            self.script[index % self.script.len()]
        }
    }
}

/// Test helpers and assertions
pub mod helpers {
    use std::time::Duration;
    use ticket_pool_core::config::SimulationConfig;
    use ticket_pool_core::log::replay;
    use ticket_pool_core::record::TicketRecord;

    /// Small, fast configuration: 10 initial tickets, capacity 30, 5 ms
    /// intervals, the default roster and a 2 s shutdown timeout.
    #[must_use]
    pub fn test_config() -> SimulationConfig {
        SimulationConfig::new(10, 5, 5, 30).with_shutdown_timeout(Duration::from_secs(2))
    }

    /// Assert that `records` replay cleanly from `initial` within
    /// `capacity` and end at `expected_final`.
    ///
    /// # Panics
    ///
    /// Panics with the replay error or the mismatched final count.
    #[allow(clippy::panic)]
    pub fn assert_log_replays(
        initial: u32,
        capacity: u32,
        records: &[TicketRecord],
        expected_final: u32,
    ) {
        match replay(initial, capacity, records) {
            Ok(final_count) => assert_eq!(
                final_count, expected_final,
                "replayed log ends at {final_count}, pool holds {expected_final}"
            ),
            Err(error) => panic!("transaction log failed replay: {error}"),
        }
    }

    /// Install a fmt subscriber honouring `RUST_LOG`, once per process.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing strategies using proptest.
pub mod properties {
    use proptest::prelude::*;
    use ticket_pool_core::config::{BatchRange, SimulationConfig};
    use ticket_pool_core::record::{ActionKind, TicketRecord};

    /// Either action kind
    pub fn arb_action_kind() -> impl Strategy<Value = ActionKind> {
        prop_oneof![Just(ActionKind::Add), Just(ActionKind::Retrieve)]
    }

    /// A record with a plausible actor name. `remaining_after` is arbitrary,
    /// so these records do not form a replayable log.
    pub fn arb_record() -> impl Strategy<Value = TicketRecord> {
        (arb_action_kind(), 1usize..=5, 1u32..=10, 0u32..=100).prop_map(
            |(kind, index, count, remaining)| {
                let name = match kind {
                    ActionKind::Add => format!("Vendor-{index}"),
                    ActionKind::Retrieve => format!("Customer-{index}"),
                };
                TicketRecord::new(kind, name, count, remaining)
            },
        )
    }

    /// A non-empty batch range starting at 1 or above
    pub fn arb_batch_range() -> impl Strategy<Value = BatchRange> {
        (1u32..=10, 0u32..=10).prop_map(|(min, extra)| BatchRange::new(min, min + extra))
    }

    /// A configuration that passes validation
    pub fn arb_valid_config() -> impl Strategy<Value = SimulationConfig> {
        (1u32..=500, 0u32..=500, 1u64..=5_000, 1u64..=5_000).prop_map(
            |(initial, headroom, release, retrieval)| {
                SimulationConfig::new(initial, release, retrieval, initial + headroom)
            },
        )
    }
}

/// In-memory sinks
pub mod sink_mocks;

// Re-export commonly used items
pub use mocks::{FixedBatches, ScriptedBatches};
pub use sink_mocks::{FailingSink, InMemorySink};
