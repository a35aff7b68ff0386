//! Simulation controller.
//!
//! Owns one [`BoundedTicketPool`], spawns the vendor and customer roster
//! against it, and on stop halts every actor, verifies the transaction log
//! by replay and hands it to a [`TransactionSink`].
//!
//! # Lifecycle
//!
//! ```text
//! idle ──start()──► running ──stop()──► idle   (pool and log carry over)
//!  │                   │
//!  └─stop(): NotRunning └─start(): AlreadyRunning
//! ```

use crate::actor::{Actor, ActorExit, ActorHandle, ActorReport, ActorRole};
use crate::metrics::SimulationMetrics;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use ticket_pool_core::config::{ConfigError, SimulationConfig};
use ticket_pool_core::environment::BatchSource;
use ticket_pool_core::log::{ReplayError, replay};
use ticket_pool_core::persistence::TransactionSink;
use ticket_pool_core::pool::{BoundedTicketPool, PoolError};
use ticket_pool_core::record::TicketRecord;
use ticket_pool_core::shutdown::ShutdownSignal;

/// Errors building a controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// The configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The pool could not be created.
    #[error("Invalid pool: {0}")]
    Pool(#[from] PoolError),
}

/// Result of [`SimulationController::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Actors were spawned.
    Started {
        /// Vendors spawned
        vendors: usize,
        /// Customers spawned
        customers: usize,
    },
    /// A run is already in progress; nothing changed.
    AlreadyRunning,
}

/// Result of [`SimulationController::stop`].
#[derive(Debug)]
pub enum StopOutcome {
    /// No run was in progress; nothing changed.
    NotRunning,
    /// The run was stopped.
    Stopped(SimulationSummary),
}

/// What happened to the exported transaction log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    /// The sink accepted every record.
    Persisted {
        /// Records written
        records: usize,
        /// Sink destination
        destination: String,
    },
    /// The sink failed. The in-memory log is unaffected.
    Failed {
        /// Sink destination
        destination: String,
        /// Error description
        error: String,
    },
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct SimulationSummary {
    /// Reports from actors that stopped cleanly, vendors first
    pub reports: Vec<ActorReport>,
    /// Actors that had to be aborted or whose task failed
    pub unfinished: Vec<String>,
    /// Pool count after every actor stopped
    pub final_count: u32,
    /// Records in the transaction log
    pub transaction_count: usize,
    /// Replay failure, if the log did not reproduce the pool's history
    pub replay_error: Option<ReplayError>,
    /// Export result
    pub export: ExportStatus,
    /// Wall time from start to the end of stop
    pub elapsed: Duration,
}

impl SimulationSummary {
    /// Whether the log replayed cleanly
    #[must_use]
    pub const fn log_verified(&self) -> bool {
        self.replay_error.is_none()
    }

    /// Whether the export succeeded
    #[must_use]
    pub const fn exported(&self) -> bool {
        matches!(self.export, ExportStatus::Persisted { .. })
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Simulation stopped after {:.1}s: {} transactions, {} tickets left in the pool.",
            self.elapsed.as_secs_f64(),
            self.transaction_count,
            self.final_count
        )?;
        for report in &self.reports {
            writeln!(f, "  {report}")?;
        }
        for name in &self.unfinished {
            writeln!(f, "  {name}: did not stop cleanly")?;
        }
        match &self.export {
            ExportStatus::Persisted { records, destination } => {
                write!(f, "Saved {records} transactions to {destination}.")
            }
            ExportStatus::Failed { destination, error } => {
                write!(f, "Failed to save transactions to {destination}: {error}")
            }
        }
    }
}

struct RunningSimulation {
    signal: ShutdownSignal,
    actors: Vec<ActorHandle>,
    started_at: Instant,
}

/// Starts and stops simulation runs over one pool.
pub struct SimulationController {
    config: SimulationConfig,
    pool: Arc<BoundedTicketPool>,
    sink: Arc<dyn TransactionSink>,
    batches: Arc<dyn BatchSource>,
    running: Option<RunningSimulation>,
}

impl SimulationController {
    /// Validate `config` and build the pool.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfig`] if `config` fails
    /// validation. No pool or actor is created in that case.
    pub fn new(
        config: SimulationConfig,
        sink: Arc<dyn TransactionSink>,
        batches: Arc<dyn BatchSource>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let pool = BoundedTicketPool::new(config.initial_tickets, config.max_capacity)?;

        Ok(Self {
            config,
            pool: Arc::new(pool),
            sink,
            batches,
            running: None,
        })
    }

    /// Configuration the controller was built with
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The shared pool
    #[must_use]
    pub const fn pool(&self) -> &Arc<BoundedTicketPool> {
        &self.pool
    }

    /// Whether a run is in progress
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Spawn the configured roster. A no-op if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> StartOutcome {
        if self.running.is_some() {
            tracing::info!("Simulation already running");
            return StartOutcome::AlreadyRunning;
        }

        let signal = ShutdownSignal::new();
        let vendors = (1..=self.config.vendor_count).map(|index| {
            self.actor(ActorRole::Vendor, index, self.config.release_interval())
        });
        let customers = (1..=self.config.customer_count).map(|index| {
            self.actor(ActorRole::Customer, index, self.config.retrieval_interval())
        });
        let actors: Vec<ActorHandle> = vendors
            .chain(customers)
            .map(|actor| actor.spawn(signal.listener()))
            .collect();

        tracing::info!(
            vendors = self.config.vendor_count,
            customers = self.config.customer_count,
            capacity = self.pool.capacity(),
            "Simulation started"
        );

        self.running = Some(RunningSimulation {
            signal,
            actors,
            started_at: Instant::now(),
        });

        StartOutcome::Started {
            vendors: self.config.vendor_count,
            customers: self.config.customer_count,
        }
    }

    /// Stop every actor, verify the log and export it. A no-op if not
    /// running.
    ///
    /// Each actor gets the configured shutdown timeout to finish; actors
    /// that miss it are aborted and listed in the summary. A sink failure
    /// is reported in the summary, never returned as an error.
    pub async fn stop(&mut self) -> StopOutcome {
        let Some(running) = self.running.take() else {
            tracing::info!("Simulation not running");
            return StopOutcome::NotRunning;
        };

        tracing::info!(actors = running.actors.len(), "Stopping simulation");
        running.signal.trigger();

        let timeout = self.config.shutdown_timeout();
        let exits = join_all(running.actors.into_iter().map(|actor| actor.join(timeout))).await;

        let mut reports = Vec::new();
        let mut unfinished = Vec::new();
        for exit in exits {
            match exit {
                ActorExit::Finished(report) => reports.push(report),
                ActorExit::TimedOut { name } => unfinished.push(name),
                ActorExit::Failed { name, reason } => {
                    tracing::error!(actor = %name, reason = %reason, "Actor task failed");
                    unfinished.push(name);
                }
            }
        }

        let (final_count, records) = self.pool.snapshot().await;
        SimulationMetrics::record_pool_size(final_count);

        let replay_error =
            replay(self.pool.initial_count(), self.pool.capacity(), &records).err();
        if let Some(error) = &replay_error {
            tracing::error!(error = %error, "Transaction log failed replay verification");
        }

        let transaction_count = records.len();
        let export = self.export(records).await;

        let summary = SimulationSummary {
            reports,
            unfinished,
            final_count,
            transaction_count,
            replay_error,
            export,
            elapsed: running.started_at.elapsed(),
        };
        tracing::info!(
            transactions = summary.transaction_count,
            final_count = summary.final_count,
            exported = summary.exported(),
            "Simulation stopped"
        );

        StopOutcome::Stopped(summary)
    }

    fn actor(&self, role: ActorRole, index: usize, interval: Duration) -> Actor {
        let batch = match role {
            ActorRole::Vendor => self.config.vendor_batch,
            ActorRole::Customer => self.config.customer_batch,
        };
        Actor::new(
            role,
            index,
            interval,
            batch,
            Arc::clone(&self.pool),
            Arc::clone(&self.batches),
        )
    }

    async fn export(&self, records: Vec<TicketRecord>) -> ExportStatus {
        let destination = self.sink.describe();
        let count = records.len();

        match self.sink.persist(records).await {
            Ok(()) => {
                SimulationMetrics::record_persisted(count);
                ExportStatus::Persisted {
                    records: count,
                    destination,
                }
            }
            Err(error) => {
                SimulationMetrics::record_persist_failed();
                tracing::error!(
                    destination = %destination,
                    error = %error,
                    "Failed to persist transactions"
                );
                ExportStatus::Failed {
                    destination,
                    error: error.to_string(),
                }
            }
        }
    }
}

impl fmt::Debug for SimulationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationController")
            .field("config", &self.config)
            .field("sink", &self.sink.describe())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
