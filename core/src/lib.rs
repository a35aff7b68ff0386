//! # Ticket Pool Core
//!
//! Shared state and primitives for the ticket pool simulation.
//!
//! Vendors release tickets into a [`BoundedTicketPool`] and customers buy
//! them out of it, all concurrently. The pool enforces a hard capacity,
//! suspends vendors while it is full, and records every committed mutation in
//! an ordered [`TransactionLog`].
//!
//! ## Modules
//!
//! - [`pool`]: the bounded pool and its add / retrieve operations
//! - [`record`] and [`log`]: transaction records and the append-only log
//! - [`shutdown`]: cooperative stop signal observed by waiting actors
//! - [`config`]: validated simulation configuration
//! - [`environment`]: injected dependencies (batch sizes)
//! - [`persistence`]: the transaction sink trait
//!
//! ## Example
//!
//! ```
//! use ticket_pool_core::{BoundedTicketPool, RetrieveOutcome, ShutdownListener};
//!
//! # tokio_test::block_on(async {
//! let pool = BoundedTicketPool::new(0, 50).expect("valid capacity");
//! let mut never = ShutdownListener::never();
//!
//! pool.add(10, "Vendor-1", &mut never).await.expect("valid count");
//! let outcome = pool.retrieve(4, "Customer-1").await.expect("valid count");
//!
//! assert_eq!(outcome, RetrieveOutcome::Retrieved { remaining_after: 6 });
//! assert_eq!(pool.snapshot_transactions().await.len(), 2);
//! # });
//! ```

pub mod config;
pub mod environment;
pub mod log;
pub mod persistence;
pub mod pool;
pub mod record;
pub mod shutdown;

pub use config::{BatchRange, ConfigError, SimulationConfig};
pub use environment::BatchSource;
pub use log::{ReplayError, TransactionLog, replay};
pub use persistence::{SinkError, TransactionSink};
pub use pool::{AddOutcome, BoundedTicketPool, PoolError, RetrieveOutcome};
pub use record::{ActionKind, TicketRecord};
pub use shutdown::{ShutdownListener, ShutdownSignal};
