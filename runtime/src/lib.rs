//! # Ticket Pool Runtime
//!
//! Runs the ticket pool simulation: vendor and customer actors on tokio
//! tasks, a controller that starts and stops them, and the JSON export of
//! the transaction log.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ticket_pool_core::SimulationConfig;
//! use ticket_pool_runtime::{JsonFileSink, RandomBatches, SimulationController, StopOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SimulationConfig::new(10, 500, 800, 50);
//! let mut controller = SimulationController::new(
//!     config,
//!     Arc::new(JsonFileSink::new("transactions.json")),
//!     Arc::new(RandomBatches),
//! )?;
//!
//! controller.start();
//! tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!
//! if let StopOutcome::Stopped(summary) = controller.stop().await {
//!     println!("{summary}");
//! }
//! # Ok(())
//! # }
//! ```

/// Vendor and customer actors
pub mod actor;

/// Production batch source
pub mod batches;

/// Prometheus metrics for observability
pub mod metrics;

/// Retry logic with exponential backoff
pub mod retry;

/// Simulation controller
pub mod simulation;

/// JSON file transaction sink
pub mod sink;

pub use actor::{Actor, ActorExit, ActorHandle, ActorReport, ActorRole, ActorStatus};
pub use batches::RandomBatches;
pub use simulation::{
    ExportStatus, SimulationController, SimulationError, SimulationSummary, StartOutcome,
    StopOutcome,
};
pub use sink::JsonFileSink;
