//! Simulation configuration.
//!
//! [`SimulationConfig`] is an immutable value built once, validated once and
//! handed to the controller. The four values an operator supplies (initial
//! tickets, the two intervals and the capacity) have no defaults; the roster
//! sizes, batch ranges and shutdown timeout default to the classic
//! five-vendor / three-customer simulation.
//!
//! # Example
//!
//! ```
//! use ticket_pool_core::config::{BatchRange, SimulationConfig};
//!
//! let config = SimulationConfig::new(10, 500, 800, 50)
//!     .with_vendor_count(2)
//!     .with_customer_batch(BatchRange::new(1, 3));
//!
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default number of vendor actors
pub const DEFAULT_VENDOR_COUNT: usize = 5;
/// Default number of customer actors
pub const DEFAULT_CUSTOMER_COUNT: usize = 3;
/// Default per-actor stop timeout in milliseconds
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 10_000;

/// Configuration errors. The only failures that reach the caller as hard
/// errors before any pool or actor exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value that must be strictly positive was zero.
    #[error("{field} must be greater than 0")]
    NotPositive {
        /// Offending field
        field: &'static str,
    },

    /// Capacity is below the initial ticket count.
    #[error("max capacity {capacity} must be >= initial tickets {initial}")]
    CapacityBelowInitial {
        /// Configured initial tickets
        initial: u32,
        /// Configured capacity
        capacity: u32,
    },

    /// A batch range is empty or starts at zero.
    #[error("{field} range [{min}, {max}] must satisfy 1 <= min <= max")]
    InvalidBatchRange {
        /// Offending field
        field: &'static str,
        /// Lower bound
        min: u32,
        /// Upper bound
        max: u32,
    },

    /// A batch range whose smallest batch could never fit in the pool.
    #[error("{field} minimum {min} exceeds max capacity {capacity}")]
    BatchExceedsCapacity {
        /// Offending field
        field: &'static str,
        /// Lower bound
        min: u32,
        /// Configured capacity
        capacity: u32,
    },
}

/// Inclusive range of batch sizes an actor draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRange {
    /// Smallest batch (inclusive)
    pub min: u32,
    /// Largest batch (inclusive)
    pub max: u32,
}

impl BatchRange {
    /// Vendors release 1 to 10 tickets at a time by default.
    pub const VENDOR_DEFAULT: Self = Self::new(1, 10);
    /// Customers buy 1 to 5 tickets at a time by default.
    pub const CUSTOMER_DEFAULT: Self = Self::new(1, 5);

    /// Create a range `[min, max]`.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the range
    #[must_use]
    pub const fn contains(self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp the upper bound to `limit`, keeping the range non-empty.
    ///
    /// Vendors use this so that they never draw a batch the pool could not
    /// hold even when empty.
    #[must_use]
    pub fn capped_at(self, limit: u32) -> Self {
        let max = self.max.min(limit).max(self.min);
        Self { min: self.min, max }
    }

    fn validate(self, field: &'static str) -> Result<(), ConfigError> {
        if self.min == 0 || self.min > self.max {
            return Err(ConfigError::InvalidBatchRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Immutable configuration for one simulation.
///
/// Field aliases accept the key names used by older configuration files
/// (`totalTickets`, `ticketReleaseRate`, `customerRetrievalRate`,
/// `maxTicketCapacity`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Tickets in the pool when it is created
    #[serde(alias = "totalTickets")]
    pub initial_tickets: u32,
    /// Milliseconds a vendor waits between releases
    #[serde(alias = "ticketReleaseRate")]
    pub release_interval_ms: u64,
    /// Milliseconds a customer waits between purchase attempts
    #[serde(alias = "customerRetrievalRate")]
    pub retrieval_interval_ms: u64,
    /// Hard ceiling on tickets in the pool
    #[serde(alias = "maxTicketCapacity")]
    pub max_capacity: u32,
    /// Number of vendor actors spawned on start
    #[serde(default = "default_vendor_count")]
    pub vendor_count: usize,
    /// Number of customer actors spawned on start
    #[serde(default = "default_customer_count")]
    pub customer_count: usize,
    /// Batch sizes vendors release
    #[serde(default = "default_vendor_batch")]
    pub vendor_batch: BatchRange,
    /// Batch sizes customers request
    #[serde(default = "default_customer_batch")]
    pub customer_batch: BatchRange,
    /// How long `stop` waits for each actor before aborting it
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

const fn default_vendor_count() -> usize {
    DEFAULT_VENDOR_COUNT
}

const fn default_customer_count() -> usize {
    DEFAULT_CUSTOMER_COUNT
}

const fn default_vendor_batch() -> BatchRange {
    BatchRange::VENDOR_DEFAULT
}

const fn default_customer_batch() -> BatchRange {
    BatchRange::CUSTOMER_DEFAULT
}

const fn default_shutdown_timeout_ms() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_MS
}

impl SimulationConfig {
    /// Create a configuration from the four operator-supplied values.
    ///
    /// The result is not yet validated; see [`validate`](Self::validate).
    #[must_use]
    pub const fn new(
        initial_tickets: u32,
        release_interval_ms: u64,
        retrieval_interval_ms: u64,
        max_capacity: u32,
    ) -> Self {
        Self {
            initial_tickets,
            release_interval_ms,
            retrieval_interval_ms,
            max_capacity,
            vendor_count: DEFAULT_VENDOR_COUNT,
            customer_count: DEFAULT_CUSTOMER_COUNT,
            vendor_batch: BatchRange::VENDOR_DEFAULT,
            customer_batch: BatchRange::CUSTOMER_DEFAULT,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }

    /// Set the number of vendors
    #[must_use]
    pub const fn with_vendor_count(mut self, count: usize) -> Self {
        self.vendor_count = count;
        self
    }

    /// Set the number of customers
    #[must_use]
    pub const fn with_customer_count(mut self, count: usize) -> Self {
        self.customer_count = count;
        self
    }

    /// Set the vendor batch range
    #[must_use]
    pub const fn with_vendor_batch(mut self, range: BatchRange) -> Self {
        self.vendor_batch = range;
        self
    }

    /// Set the customer batch range
    #[must_use]
    pub const fn with_customer_batch(mut self, range: BatchRange) -> Self {
        self.customer_batch = range;
        self
    }

    /// Set the per-actor stop timeout
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Check every constraint.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotPositive`] for a zero initial count, interval,
    ///   capacity, roster size or shutdown timeout
    /// - [`ConfigError::CapacityBelowInitial`] if `max_capacity < initial_tickets`
    /// - [`ConfigError::InvalidBatchRange`] for an empty or zero-based range
    /// - [`ConfigError::BatchExceedsCapacity`] if a range's smallest batch is
    ///   larger than `max_capacity`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("initial_tickets", u64::from(self.initial_tickets)),
            ("release_interval_ms", self.release_interval_ms),
            ("retrieval_interval_ms", self.retrieval_interval_ms),
            ("max_capacity", u64::from(self.max_capacity)),
            ("vendor_count", self.vendor_count as u64),
            ("customer_count", self.customer_count as u64),
            ("shutdown_timeout_ms", self.shutdown_timeout_ms),
        ];
        if let Some(&(field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::NotPositive { field });
        }

        if self.max_capacity < self.initial_tickets {
            return Err(ConfigError::CapacityBelowInitial {
                initial: self.initial_tickets,
                capacity: self.max_capacity,
            });
        }

        self.vendor_batch.validate("vendor_batch")?;
        self.customer_batch.validate("customer_batch")?;

        for (field, range) in [
            ("vendor_batch", self.vendor_batch),
            ("customer_batch", self.customer_batch),
        ] {
            if range.min > self.max_capacity {
                return Err(ConfigError::BatchExceedsCapacity {
                    field,
                    min: range.min,
                    capacity: self.max_capacity,
                });
            }
        }
        Ok(())
    }

    /// Interval between vendor releases
    #[must_use]
    pub const fn release_interval(&self) -> Duration {
        Duration::from_millis(self.release_interval_ms)
    }

    /// Interval between customer purchase attempts
    #[must_use]
    pub const fn retrieval_interval(&self) -> Duration {
        Duration::from_millis(self.retrieval_interval_ms)
    }

    /// Per-actor stop timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
