//! Connectivity tracking.
//!
//! The host environment feeds observed reachability into a
//! [`ConnectivityMonitor`]; the resolver probes it and the sync coordinator
//! subscribes to its transitions.

use async_trait::async_trait;
use tokio::sync::watch;

/// Connectivity probe and subscription surface
#[async_trait]
pub trait Connectivity: Send + Sync {
    /// Current reachability of the remote service
    async fn is_online(&self) -> bool;

    /// Subscribe to reachability changes. The receiver's current value is the
    /// last known state.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Watch-channel backed monitor
#[derive(Clone)]
pub struct ConnectivityMonitor {
    state: std::sync::Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the given initial state
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self {
            state: std::sync::Arc::new(tx),
        }
    }

    /// Record an observed connectivity change
    pub fn set_online(&self, online: bool) {
        let previous = self.state.send_replace(online);
        if previous != online {
            tracing::info!(online, "Connectivity changed");
        }
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[async_trait]
impl Connectivity for ConnectivityMonitor {
    async fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
