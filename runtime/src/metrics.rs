//! Prometheus metrics for the simulation.
//!
//! Actors and the controller record through the `metrics` facade. Without an
//! installed recorder every call is a no-op, so tests and runs without
//! `TICKETING_METRICS_ADDR` pay nothing.
//!
//! # Example
//!
//! ```rust,no_run
//! use ticket_pool_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("127.0.0.1:9090".parse()?);
//! server.start()?;
//! // Scrape http://127.0.0.1:9090/metrics
//! # Ok(())
//! # }
//! ```

use crate::actor::ActorRole;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build the exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install the global recorder
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Prometheus scrape endpoint.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a server that will listen on `addr` once started.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the global recorder and spawn the HTTP listener.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or another
    /// recorder is already installed.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .build()
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let handle = recorder.handle();
        metrics::set_global_recorder(recorder)
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        tokio::spawn(async move {
            if exporter.await.is_err() {
                tracing::error!("Metrics exporter stopped");
            }
        });

        self.handle = Some(handle);
        tracing::info!(
            addr = %self.addr,
            "Metrics available at http://{}/metrics",
            self.addr
        );
        Ok(())
    }

    /// Address the listener binds to
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if the server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(
        "ticketing_tickets_added_total",
        "Tickets released into the pool by vendors"
    );
    describe_counter!(
        "ticketing_tickets_retrieved_total",
        "Tickets purchased from the pool by customers"
    );
    describe_counter!(
        "ticketing_retrievals_failed_total",
        "Purchases refused because the pool held too few tickets"
    );
    describe_counter!(
        "ticketing_adds_cancelled_total",
        "Vendor adds abandoned because the simulation stopped while waiting"
    );
    describe_counter!(
        "ticketing_batches_rejected_total",
        "Batches the pool rejected as invalid"
    );
    describe_gauge!("ticketing_pool_tickets", "Tickets currently in the pool");
    describe_histogram!(
        "ticketing_add_duration_seconds",
        "Time from a vendor requesting an add to it committing"
    );
    describe_counter!("ticketing_actors_started_total", "Actors started, by role");
    describe_counter!("ticketing_actors_stopped_total", "Actors stopped, by role");
    describe_counter!(
        "ticketing_transactions_persisted_total",
        "Transaction records written by the sink"
    );
    describe_counter!(
        "ticketing_persist_failures_total",
        "Transaction exports that failed after retries"
    );
}

/// Recorders for actor-level events.
pub struct PoolMetrics;

impl PoolMetrics {
    /// A vendor's add committed after waiting `waited`.
    pub fn record_added(count: u32, remaining: u32, waited: Duration) {
        counter!("ticketing_tickets_added_total").increment(u64::from(count));
        gauge!("ticketing_pool_tickets").set(f64::from(remaining));
        histogram!("ticketing_add_duration_seconds").record(waited.as_secs_f64());
    }

    /// A customer's purchase succeeded.
    pub fn record_retrieved(count: u32, remaining: u32) {
        counter!("ticketing_tickets_retrieved_total").increment(u64::from(count));
        gauge!("ticketing_pool_tickets").set(f64::from(remaining));
    }

    /// A customer's purchase was refused.
    pub fn record_retrieve_failed() {
        counter!("ticketing_retrievals_failed_total").increment(1);
    }

    /// A vendor gave up waiting because of shutdown.
    pub fn record_add_cancelled() {
        counter!("ticketing_adds_cancelled_total").increment(1);
    }

    /// The pool rejected a batch.
    pub fn record_rejected(role: ActorRole) {
        counter!("ticketing_batches_rejected_total", "role" => role.as_str()).increment(1);
    }
}

/// Recorders for actor lifecycle and export.
pub struct SimulationMetrics;

impl SimulationMetrics {
    /// An actor entered its run loop.
    pub fn record_actor_started(role: ActorRole) {
        counter!("ticketing_actors_started_total", "role" => role.as_str()).increment(1);
    }

    /// An actor left its run loop.
    pub fn record_actor_stopped(role: ActorRole) {
        counter!("ticketing_actors_stopped_total", "role" => role.as_str()).increment(1);
    }

    /// The pool count observed at a start or stop.
    pub fn record_pool_size(current: u32) {
        gauge!("ticketing_pool_tickets").set(f64::from(current));
    }

    /// A sink accepted `records` records.
    pub fn record_persisted(records: usize) {
        counter!("ticketing_transactions_persisted_total")
            .increment(u64::try_from(records).unwrap_or(u64::MAX));
    }

    /// A sink failed after exhausting retries.
    pub fn record_persist_failed() {
        counter!("ticketing_persist_failures_total").increment(1);
    }
}
