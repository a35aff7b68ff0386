//! Cooperative shutdown signal.
//!
//! A [`ShutdownSignal`] is owned by whoever controls a set of actors; each
//! actor holds a [`ShutdownListener`]. The signal is a `watch<bool>`: once
//! triggered it stays triggered, so a listener that subscribes or checks late
//! still observes it.
//!
//! Listeners are checked at the two places an actor can be suspended: the
//! interval wait between actions and the admission wait inside
//! [`BoundedTicketPool::add`](crate::pool::BoundedTicketPool::add).

use tokio::sync::watch;

/// Sending half of a shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

impl ShutdownSignal {
    /// Create an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Create a listener bound to this signal.
    #[must_use]
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Whether shutdown has been requested
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of a shutdown signal.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: Option<watch::Receiver<bool>>,
}

impl ShutdownListener {
    /// A listener that never fires.
    ///
    /// Useful for callers of `add` that have nothing to cancel on.
    #[must_use]
    pub const fn never() -> Self {
        Self { rx: None }
    }

    /// Whether shutdown has been requested.
    ///
    /// A listener whose signal was dropped reports `true`: nobody is left
    /// who could stop the actor any other way.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        match &self.rx {
            Some(rx) => *rx.borrow() || rx.has_changed().is_err(),
            None => false,
        }
    }

    /// Resolve once shutdown has been requested.
    ///
    /// Cancel-safe: dropping the future loses nothing, the flag is sticky.
    pub async fn triggered(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };

        // Err means the signal was dropped, which counts as shutdown.
        let _ = rx.wait_for(|stop| *stop).await;
    }
}
