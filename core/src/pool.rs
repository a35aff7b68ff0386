//! The bounded ticket pool.
//!
//! # Synchronization
//!
//! The pool's ticket count and its [`TransactionLog`] sit behind one
//! `tokio::sync::Mutex`. Every read-check-mutate-append sequence runs under
//! that lock, so no other task can observe the count between the arithmetic
//! update and the record append.
//!
//! Producers that do not fit wait monitor-style:
//!
//! ```text
//! loop {
//!     subscribe to the change generation      (before checking, so no wakeup is lost)
//!     lock; if it fits { mutate, append, bump generation, return }
//!     unlock
//!     wait for generation change OR shutdown  (lock is not held here)
//! }
//! ```
//!
//! The generation is a `watch<u64>` bumped on every committed mutation, which
//! wakes every waiter at once. Each waiter re-validates its own predicate on
//! wake and never assumes the wakeup was meant for it.
//!
//! # Invariant
//!
//! `0 <= current <= capacity` holds at every point observable outside the
//! lock, and replaying the log from the initial count reproduces every
//! intermediate count.

use crate::log::TransactionLog;
use crate::record::{ActionKind, TicketRecord};
use crate::shutdown::ShutdownListener;
use thiserror::Error;
use tokio::sync::{Mutex, watch};

/// Errors from pool construction and invalid calls.
///
/// A full pool or an empty pool is never an error: adders wait, retrievers
/// get [`RetrieveOutcome::Insufficient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Capacity is zero or below the initial count.
    #[error("capacity {capacity} must be positive and >= initial count {initial}")]
    InvalidCapacity {
        /// Requested initial count
        initial: u32,
        /// Requested capacity
        capacity: u32,
    },

    /// A batch of zero tickets was requested.
    #[error("ticket count must be positive")]
    ZeroQuantity,

    /// An add that could never be admitted, even into an empty pool.
    #[error("cannot add {requested} tickets to a pool with capacity {capacity}")]
    ExceedsCapacity {
        /// Tickets requested
        requested: u32,
        /// Pool capacity
        capacity: u32,
    },
}

/// Result of a completed [`BoundedTicketPool::add`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Tickets were added and an ADD record was appended.
    Committed {
        /// Pool size right after the add
        remaining_after: u32,
    },
    /// Shutdown fired while waiting for room. Nothing was mutated or logged.
    Cancelled,
}

impl AddOutcome {
    /// Whether the add took effect
    #[must_use]
    pub const fn is_committed(self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Result of a [`BoundedTicketPool::retrieve`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieveOutcome {
    /// Tickets were removed and a RETRIEVE record was appended.
    Retrieved {
        /// Pool size right after the retrieval
        remaining_after: u32,
    },
    /// Not enough tickets. Nothing was mutated or logged.
    Insufficient {
        /// Tickets requested
        requested: u32,
        /// Tickets available at the time of the call
        available: u32,
    },
}

impl RetrieveOutcome {
    /// Whether the retrieval succeeded
    #[must_use]
    pub const fn is_retrieved(self) -> bool {
        matches!(self, Self::Retrieved { .. })
    }
}

#[derive(Debug)]
struct PoolState {
    current: u32,
    log: TransactionLog,
}

/// Shared bounded counter of tickets plus its transaction history.
///
/// Share it between actors with `Arc<BoundedTicketPool>`.
#[derive(Debug)]
pub struct BoundedTicketPool {
    initial: u32,
    capacity: u32,
    state: Mutex<PoolState>,
    generation: watch::Sender<u64>,
}

impl BoundedTicketPool {
    /// Create a pool holding `initial` tickets with a hard ceiling of
    /// `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidCapacity`] if `capacity` is zero or below
    /// `initial`.
    pub fn new(initial: u32, capacity: u32) -> Result<Self, PoolError> {
        if capacity == 0 || capacity < initial {
            return Err(PoolError::InvalidCapacity { initial, capacity });
        }

        let (generation, _) = watch::channel(0);
        Ok(Self {
            initial,
            capacity,
            state: Mutex::new(PoolState {
                current: initial,
                log: TransactionLog::new(),
            }),
            generation,
        })
    }

    /// Fixed capacity
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Count the pool was created with
    #[must_use]
    pub const fn initial_count(&self) -> u32 {
        self.initial
    }

    /// Add `count` tickets on behalf of `actor`, waiting for room if needed.
    ///
    /// While `current + count > capacity` the call suspends without holding
    /// the lock and re-checks after every committed mutation. If `shutdown`
    /// fires first, the call returns [`AddOutcome::Cancelled`] and leaves the
    /// pool untouched.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ZeroQuantity`] if `count == 0`
    /// - [`PoolError::ExceedsCapacity`] if `count > capacity`, since such an
    ///   add could never be admitted
    pub async fn add(
        &self,
        count: u32,
        actor: &str,
        shutdown: &mut ShutdownListener,
    ) -> Result<AddOutcome, PoolError> {
        if count == 0 {
            return Err(PoolError::ZeroQuantity);
        }
        if count > self.capacity {
            return Err(PoolError::ExceedsCapacity {
                requested: count,
                capacity: self.capacity,
            });
        }

        let mut announced = false;
        loop {
            let mut changes = self.generation.subscribe();

            {
                let mut state = self.state.lock().await;
                if self.capacity - state.current >= count {
                    state.current += count;
                    let remaining_after = state.current;
                    state
                        .log
                        .append(TicketRecord::new(ActionKind::Add, actor, count, remaining_after));
                    self.wake_all();

                    tracing::info!(
                        actor,
                        count,
                        remaining = remaining_after,
                        "{actor} added {count} tickets. Current Pool: {remaining_after}"
                    );
                    return Ok(AddOutcome::Committed { remaining_after });
                }
            }

            if !announced {
                tracing::info!(
                    actor,
                    count,
                    "{actor} waiting to add tickets. Pool is at max capacity."
                );
                announced = true;
            }

            tokio::select! {
                biased;
                () = shutdown.triggered() => {
                    tracing::debug!(actor, count, "Add cancelled while waiting for room");
                    return Ok(AddOutcome::Cancelled);
                }
                // The sender lives as long as `self`, so this never errors.
                _ = changes.changed() => {}
            }
        }
    }

    /// Retrieve `count` tickets on behalf of `actor`. Never waits.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ZeroQuantity`] if `count == 0`.
    pub async fn retrieve(&self, count: u32, actor: &str) -> Result<RetrieveOutcome, PoolError> {
        if count == 0 {
            return Err(PoolError::ZeroQuantity);
        }

        let mut state = self.state.lock().await;
        if state.current < count {
            let available = state.current;
            drop(state);

            tracing::info!(
                actor,
                count,
                available,
                "{actor} failed to purchase {count} tickets. Not enough tickets."
            );
            return Ok(RetrieveOutcome::Insufficient {
                requested: count,
                available,
            });
        }

        state.current -= count;
        let remaining_after = state.current;
        state.log.append(TicketRecord::new(
            ActionKind::Retrieve,
            actor,
            count,
            remaining_after,
        ));
        self.wake_all();
        drop(state);

        tracing::info!(
            actor,
            count,
            remaining = remaining_after,
            "{actor} purchased {count} tickets. Current Pool: {remaining_after}"
        );
        Ok(RetrieveOutcome::Retrieved { remaining_after })
    }

    /// Point-in-time ticket count.
    pub async fn current_count(&self) -> u32 {
        self.state.lock().await.current
    }

    /// Number of committed mutations so far.
    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.log.len()
    }

    /// Independent copy of the transaction log. The lock is held only for
    /// the copy.
    pub async fn snapshot_transactions(&self) -> Vec<TicketRecord> {
        self.state.lock().await.log.snapshot()
    }

    /// Ticket count and log copied under one lock acquisition, so the two
    /// are consistent with each other.
    pub async fn snapshot(&self) -> (u32, Vec<TicketRecord>) {
        let state = self.state.lock().await;
        (state.current, state.log.snapshot())
    }

    fn wake_all(&self) {
        self.generation.send_modify(|generation| *generation = generation.wrapping_add(1));
    }
}
