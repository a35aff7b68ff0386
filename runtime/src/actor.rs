//! Vendor and customer actors.
//!
//! Both roles share one loop shape:
//!
//! ```text
//! Created ─► Running ─┬─ wait interval (cancellable) ─► draw batch ─► pool op ─┐
//!                     └──────────────────────◄───────────────────────────────┘
//!                     │ shutdown observed, or add cancelled
//!                     ▼
//!                 Stopping ─► terminal line ─► Stopped (returns ActorReport)
//! ```
//!
//! A stop request is observed at the interval wait and inside a blocked
//! `add`. An actor never begins a new cycle once shutdown is visible.

use crate::metrics::{PoolMetrics, SimulationMetrics};
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use ticket_pool_core::config::BatchRange;
use ticket_pool_core::environment::BatchSource;
use ticket_pool_core::pool::{AddOutcome, BoundedTicketPool, RetrieveOutcome};
use ticket_pool_core::shutdown::ShutdownListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What an actor does to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorRole {
    /// Releases tickets into the pool
    Vendor,
    /// Purchases tickets from the pool
    Customer,
}

impl ActorRole {
    /// Lowercase label used in metrics and structured logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Customer => "customer",
        }
    }

    /// Name of the `index`-th actor of this role (1-based), e.g. `Vendor-1`.
    #[must_use]
    pub fn actor_name(self, index: usize) -> String {
        match self {
            Self::Vendor => format!("Vendor-{index}"),
            Self::Customer => format!("Customer-{index}"),
        }
    }

    const fn stopped_line(self) -> &'static str {
        match self {
            Self::Vendor => "Stopped adding tickets.",
            Self::Customer => "Stopped purchasing tickets.",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an actor. Each transition happens exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActorStatus {
    /// Built, not yet running
    Created,
    /// In its run loop
    Running,
    /// Shutdown observed, winding down
    Stopping,
    /// Run loop exited
    Stopped,
}

/// Totals an actor returns when it stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorReport {
    /// Actor name
    pub name: String,
    /// Actor role
    pub role: ActorRole,
    /// Committed adds or purchases
    pub actions_committed: u64,
    /// Tickets moved by committed actions
    pub tickets_moved: u64,
    /// Purchases refused for lack of tickets
    pub failed_retrievals: u64,
    /// Batches the pool rejected as invalid
    pub rejected_batches: u64,
    /// Whether the final add was abandoned because of shutdown
    pub add_cancelled: bool,
}

impl ActorReport {
    fn new(name: &str, role: ActorRole) -> Self {
        Self {
            name: name.to_string(),
            role,
            actions_committed: 0,
            tickets_moved: 0,
            failed_retrievals: 0,
            rejected_batches: 0,
            add_cancelled: false,
        }
    }
}

impl fmt::Display for ActorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.role {
            ActorRole::Vendor => "released",
            ActorRole::Customer => "purchased",
        };
        write!(
            f,
            "{}: {verb} {} tickets in {} actions",
            self.name, self.tickets_moved, self.actions_committed
        )?;
        if self.failed_retrievals > 0 {
            write!(f, ", {} failed purchases", self.failed_retrievals)?;
        }
        if self.rejected_batches > 0 {
            write!(f, ", {} rejected batches", self.rejected_batches)?;
        }
        Ok(())
    }
}

/// A vendor or customer bound to one pool.
pub struct Actor {
    name: String,
    role: ActorRole,
    interval: Duration,
    batch: BatchRange,
    pool: Arc<BoundedTicketPool>,
    batches: Arc<dyn BatchSource>,
    status: watch::Sender<ActorStatus>,
}

impl Actor {
    /// Build the `index`-th actor of `role` (1-based).
    ///
    /// Vendor batch ranges are capped at the pool capacity so a vendor never
    /// draws a batch the pool could not hold even when empty.
    #[must_use]
    pub fn new(
        role: ActorRole,
        index: usize,
        interval: Duration,
        batch: BatchRange,
        pool: Arc<BoundedTicketPool>,
        batches: Arc<dyn BatchSource>,
    ) -> Self {
        let batch = match role {
            ActorRole::Vendor => batch.capped_at(pool.capacity()),
            ActorRole::Customer => batch,
        };
        let (status, _) = watch::channel(ActorStatus::Created);

        Self {
            name: role.actor_name(index),
            role,
            interval,
            batch,
            pool,
            batches,
            status,
        }
    }

    /// Actor name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Actor role
    #[must_use]
    pub const fn role(&self) -> ActorRole {
        self.role
    }

    /// Effective batch range after capping
    #[must_use]
    pub const fn batch_range(&self) -> BatchRange {
        self.batch
    }

    /// Current lifecycle status
    #[must_use]
    pub fn status(&self) -> ActorStatus {
        *self.status.borrow()
    }

    /// Spawn the run loop on the current tokio runtime.
    #[must_use]
    pub fn spawn(self, shutdown: ShutdownListener) -> ActorHandle {
        let name = self.name.clone();
        let role = self.role;
        let status = self.status.subscribe();
        let task = tokio::spawn(self.run(shutdown));

        ActorHandle {
            name,
            role,
            status,
            task,
        }
    }

    /// Run until shutdown, then return the actor's totals.
    pub async fn run(self, mut shutdown: ShutdownListener) -> ActorReport {
        let mut report = ActorReport::new(&self.name, self.role);

        self.status.send_replace(ActorStatus::Running);
        SimulationMetrics::record_actor_started(self.role);
        tracing::debug!(
            actor = %self.name,
            role = %self.role,
            interval_ms = self.interval.as_millis(),
            "Actor started"
        );

        while !shutdown.is_triggered() {
            tokio::select! {
                biased;
                () = shutdown.triggered() => break,
                () = tokio::time::sleep(self.interval) => {}
            }

            let count = self.batches.next_batch(self.batch);
            let flow = match self.role {
                ActorRole::Vendor => self.release(count, &mut shutdown, &mut report).await,
                ActorRole::Customer => self.purchase(count, &mut report).await,
            };
            if flow.is_break() {
                break;
            }
        }

        self.status.send_replace(ActorStatus::Stopping);
        tracing::info!(actor = %self.name, "{}: {}", self.name, self.role.stopped_line());
        SimulationMetrics::record_actor_stopped(self.role);
        self.status.send_replace(ActorStatus::Stopped);

        report
    }

    async fn release(
        &self,
        count: u32,
        shutdown: &mut ShutdownListener,
        report: &mut ActorReport,
    ) -> ControlFlow<()> {
        let started = Instant::now();

        match self.pool.add(count, &self.name, shutdown).await {
            Ok(AddOutcome::Committed { remaining_after }) => {
                report.actions_committed += 1;
                report.tickets_moved += u64::from(count);
                PoolMetrics::record_added(count, remaining_after, started.elapsed());
                ControlFlow::Continue(())
            }
            Ok(AddOutcome::Cancelled) => {
                report.add_cancelled = true;
                PoolMetrics::record_add_cancelled();
                ControlFlow::Break(())
            }
            Err(error) => {
                report.rejected_batches += 1;
                PoolMetrics::record_rejected(self.role);
                tracing::warn!(actor = %self.name, count, error = %error, "Batch rejected");
                ControlFlow::Continue(())
            }
        }
    }

    async fn purchase(&self, count: u32, report: &mut ActorReport) -> ControlFlow<()> {
        match self.pool.retrieve(count, &self.name).await {
            Ok(RetrieveOutcome::Retrieved { remaining_after }) => {
                report.actions_committed += 1;
                report.tickets_moved += u64::from(count);
                PoolMetrics::record_retrieved(count, remaining_after);
            }
            Ok(RetrieveOutcome::Insufficient { .. }) => {
                report.failed_retrievals += 1;
                PoolMetrics::record_retrieve_failed();
            }
            Err(error) => {
                report.rejected_batches += 1;
                PoolMetrics::record_rejected(self.role);
                tracing::warn!(actor = %self.name, count, error = %error, "Batch rejected");
            }
        }
        ControlFlow::Continue(())
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("interval", &self.interval)
            .field("batch", &self.batch)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// How an actor's task ended when joined.
#[derive(Debug)]
pub enum ActorExit {
    /// The run loop returned normally.
    Finished(ActorReport),
    /// The task did not finish in time and was aborted.
    TimedOut {
        /// Actor name
        name: String,
    },
    /// The task panicked or was cancelled.
    Failed {
        /// Actor name
        name: String,
        /// Join error description
        reason: String,
    },
}

/// Handle to a spawned actor.
#[derive(Debug)]
pub struct ActorHandle {
    name: String,
    role: ActorRole,
    status: watch::Receiver<ActorStatus>,
    task: JoinHandle<ActorReport>,
}

impl ActorHandle {
    /// Actor name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Actor role
    #[must_use]
    pub const fn role(&self) -> ActorRole {
        self.role
    }

    /// Latest lifecycle status
    #[must_use]
    pub fn status(&self) -> ActorStatus {
        *self.status.borrow()
    }

    /// Wait up to `timeout` for the actor to finish, aborting it otherwise.
    ///
    /// An aborted task is awaited before returning, so it cannot commit to
    /// the pool afterwards.
    pub async fn join(mut self, timeout: Duration) -> ActorExit {
        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(Ok(report)) => ActorExit::Finished(report),
            Ok(Err(error)) => ActorExit::Failed {
                name: self.name,
                reason: error.to_string(),
            },
            Err(_) => {
                self.task.abort();
                let _ = (&mut self.task).await;
                tracing::warn!(
                    actor = %self.name,
                    timeout_ms = timeout.as_millis(),
                    "Actor did not stop in time, aborted"
                );
                ActorExit::TimedOut { name: self.name }
            }
        }
    }
}
