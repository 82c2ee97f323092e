//! Sync coordinator: reconciles the pending queue with the remote service.
//!
//! The coordinator is `Idle` or `Syncing`, never anything else. Every
//! trigger ends back at `Idle`; there is no persistent error state. The
//! in-flight flag is checked and set before the first await, so under the
//! cooperative scheduler no second task can slip into the critical section.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::connectivity::Connectivity;
use crate::error::Result;
use crate::remote::RemoteService;
use crate::store::RecordStore;

/// Delay between an offline→online transition and the automatic trigger,
/// so transient flapping doesn't fire a sync per blip.
const AUTO_SYNC_DEBOUNCE: Duration = Duration::from_millis(500);

/// Outcome of a sync trigger. None of these are errors; network and storage
/// failures surface as `Err` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A batch was submitted; `synced` of `total` records were accepted
    Completed { total: usize, synced: usize },
    /// The pending queue was empty; no network call was made
    NothingToSync,
    /// Last known connectivity is offline; no network call was made
    Offline,
    /// A sync is already in flight; this call did nothing
    AlreadyInProgress,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { total, synced } => {
                write!(f, "Synced {synced} of {total} records")
            }
            Self::NothingToSync => write!(f, "Nothing to sync"),
            Self::Offline => write!(f, "No internet connection"),
            Self::AlreadyInProgress => write!(f, "Sync already in progress"),
        }
    }
}

struct Shared {
    in_flight: AtomicBool,
    pending_count: AtomicUsize,
    /// Unix ms of the last attempt that reached the network; 0 = never
    last_attempt_ms: AtomicI64,
    scheduled: Mutex<Option<oneshot::Sender<()>>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

/// Connectivity-aware engine that batches pending records, submits them, and
/// applies per-record results back to the record store.
pub struct SyncCoordinator<R, C> {
    store: RecordStore,
    remote: Arc<R>,
    connectivity: Arc<C>,
    shared: Arc<Shared>,
}

impl<R, C> Clone for SyncCoordinator<R, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            remote: Arc::clone(&self.remote),
            connectivity: Arc::clone(&self.connectivity),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R, C> SyncCoordinator<R, C>
where
    R: RemoteService + 'static,
    C: Connectivity + 'static,
{
    /// Create an idle coordinator over the given store and remote service
    pub fn new(store: RecordStore, remote: Arc<R>, connectivity: Arc<C>) -> Self {
        Self {
            store,
            remote,
            connectivity,
            shared: Arc::new(Shared {
                in_flight: AtomicBool::new(false),
                pending_count: AtomicUsize::new(0),
                last_attempt_ms: AtomicI64::new(0),
                scheduled: Mutex::new(None),
                watcher: Mutex::new(None),
            }),
        }
    }

    /// Whether a sync is currently in flight
    pub fn is_syncing(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Cached size of the pending queue
    pub fn pending_count(&self) -> usize {
        self.shared.pending_count.load(Ordering::SeqCst)
    }

    /// Wall-clock time of the last attempt that reached the network
    pub fn last_sync_attempt(&self) -> Option<DateTime<Utc>> {
        let millis = self.shared.last_attempt_ms.load(Ordering::SeqCst);
        if millis == 0 {
            None
        } else {
            Utc.timestamp_millis_opt(millis).single()
        }
    }

    /// Recompute the cached pending count from the store. Call after any
    /// record mutation made outside the coordinator.
    pub async fn refresh_pending_count(&self) -> Result<usize> {
        let count = self.store.pending_count().await?;
        self.shared.pending_count.store(count, Ordering::SeqCst);
        Ok(count)
    }

    /// Run one sync pass.
    ///
    /// Returns immediately with `AlreadyInProgress` or `Offline` when the
    /// preconditions fail; neither performs network I/O. Network or server
    /// errors leave every record pending and propagate as `Err`.
    pub async fn trigger(&self) -> Result<SyncOutcome> {
        // Claimed before the first await; released on every exit path below.
        if self
            .shared
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Sync trigger rejected: already in progress");
            return Ok(SyncOutcome::AlreadyInProgress);
        }

        let result = self.run_sync().await;
        self.shared.in_flight.store(false, Ordering::SeqCst);

        match &result {
            Ok(outcome) => tracing::info!(%outcome, "Sync finished"),
            Err(error) => tracing::warn!(%error, "Sync failed; queue left pending"),
        }
        result
    }

    async fn run_sync(&self) -> Result<SyncOutcome> {
        if !self.connectivity.is_online().await {
            return Ok(SyncOutcome::Offline);
        }

        let pending = self.store.list_pending().await?;
        if pending.is_empty() {
            self.shared.pending_count.store(0, Ordering::SeqCst);
            return Ok(SyncOutcome::NothingToSync);
        }
        let total = pending.len();

        self.shared
            .last_attempt_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);

        let report = self.remote.submit_batch(&pending).await?;

        // Only ids the server listed as accepted transition; everything else
        // stays pending and is retried on the next trigger.
        let mut synced = 0;
        for accepted in &report.results.success {
            self.store.mark_synced(&accepted.id).await?;
            synced += 1;
        }

        self.refresh_pending_count().await?;
        Ok(SyncOutcome::Completed { total, synced })
    }

    /// Start the automatic trigger: an offline→online transition observed
    /// while records are pending and no sync is in flight schedules one
    /// trigger after a short debounce. A new transition reschedules, so at
    /// most one trigger is ever queued.
    pub fn watch_connectivity(&self) {
        let mut rx = self.connectivity.subscribe();
        let coordinator = self.clone();

        let watcher = tokio::spawn(async move {
            let mut was_online = *rx.borrow_and_update();
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                let came_online = online && !was_online;
                was_online = online;
                if !came_online {
                    continue;
                }

                let pending = coordinator
                    .refresh_pending_count()
                    .await
                    .unwrap_or_else(|_| coordinator.pending_count());
                if pending == 0 || coordinator.is_syncing() {
                    continue;
                }

                coordinator.schedule_trigger();
            }
        });

        if let Ok(mut slot) = self.shared.watcher.lock() {
            if let Some(previous) = slot.replace(watcher) {
                previous.abort();
            }
        }
    }

    fn schedule_trigger(&self) {
        let (cancel, cancelled) = oneshot::channel::<()>();
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(AUTO_SYNC_DEBOUNCE) => {
                    if let Err(error) = coordinator.trigger().await {
                        tracing::warn!(%error, "Automatic sync failed");
                    }
                }
                _ = cancelled => {}
            }
        });

        // Superseding cancels only the debounce wait. A timer that already
        // woke and entered `trigger` runs it to completion, so the in-flight
        // flag is always released.
        if let Ok(mut slot) = self.shared.scheduled.lock() {
            if let Some(previous) = slot.replace(cancel) {
                let _ = previous.send(());
            }
        }
    }

    /// Release the connectivity subscription and any queued trigger. Must be
    /// called when the owning context is torn down. A sync already in flight
    /// finishes on its own.
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.shared.watcher.lock() {
            if let Some(watcher) = slot.take() {
                watcher.abort();
            }
        }
        if let Ok(mut slot) = self.shared.scheduled.lock() {
            if let Some(timer) = slot.take() {
                let _ = timer.send(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityMonitor;
    use crate::error::Error;
    use crate::models::SyncStatus;
    use crate::store::StoreLocation;
    use crate::test_support::FakeRemote;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    async fn setup(
        online: bool,
    ) -> (
        RecordStore,
        Arc<FakeRemote>,
        Arc<ConnectivityMonitor>,
        SyncCoordinator<FakeRemote, ConnectivityMonitor>,
    ) {
        let store = RecordStore::new(StoreLocation::InMemory);
        store.initialize().await.unwrap();
        let remote = Arc::new(FakeRemote::default());
        let connectivity = Arc::new(ConnectivityMonitor::new(online));
        let coordinator = SyncCoordinator::new(
            store.clone(),
            Arc::clone(&remote),
            Arc::clone(&connectivity),
        );
        (store, remote, connectivity, coordinator)
    }

    #[tokio::test]
    async fn test_offline_trigger_makes_no_network_call() {
        let (store, remote, _connectivity, coordinator) = setup(false).await;
        store.upsert(None, BTreeMap::new()).await.unwrap();

        let outcome = coordinator.trigger().await.unwrap();
        assert_eq!(outcome, SyncOutcome::Offline);
        assert_eq!(remote.submit_calls(), 0);
        assert!(!coordinator.is_syncing());
    }

    #[tokio::test]
    async fn test_empty_queue_short_circuits() {
        let (_store, remote, _connectivity, coordinator) = setup(true).await;

        let outcome = coordinator.trigger().await.unwrap();
        assert_eq!(outcome, SyncOutcome::NothingToSync);
        assert_eq!(remote.submit_calls(), 0);
        assert!(coordinator.last_sync_attempt().is_none());
    }

    #[tokio::test]
    async fn test_partial_success_marks_only_accepted_ids() {
        let (store, remote, _connectivity, coordinator) = setup(true).await;

        let first = store.upsert(None, BTreeMap::new()).await.unwrap();
        let second = store.upsert(None, BTreeMap::new()).await.unwrap();
        let third = store.upsert(None, BTreeMap::new()).await.unwrap();
        remote.accept_only(&[first.id, second.id]);
        remote.reject(third.id, "validation failed upstream");

        let outcome = coordinator.trigger().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Completed {
                total: 3,
                synced: 2
            }
        );

        let fetch = |id| {
            let store = store.clone();
            async move { store.get(&id).await.unwrap().unwrap().sync_status }
        };
        assert_eq!(fetch(first.id).await, SyncStatus::Synced);
        assert_eq!(fetch(second.id).await, SyncStatus::Synced);
        assert_eq!(fetch(third.id).await, SyncStatus::Pending);
        assert_eq!(coordinator.pending_count(), 1);
        assert!(coordinator.last_sync_attempt().is_some());
    }

    #[tokio::test]
    async fn test_unreported_id_stays_pending() {
        let (store, remote, _connectivity, coordinator) = setup(true).await;

        let listed = store.upsert(None, BTreeMap::new()).await.unwrap();
        let _ghost = store.upsert(None, BTreeMap::new()).await.unwrap();
        // The server acknowledges only one id; the other appears in neither
        // the success nor the failed list.
        remote.accept_only(&[listed.id]);

        let outcome = coordinator.trigger().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Completed {
                total: 2,
                synced: 1
            }
        );
        assert_eq!(coordinator.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_network_error_leaves_queue_untouched() {
        let (store, remote, _connectivity, coordinator) = setup(true).await;
        store.upsert(None, BTreeMap::new()).await.unwrap();
        remote.fail_submissions();

        let result = coordinator.trigger().await;
        assert!(matches!(result, Err(Error::Remote { status: 503, .. })));
        assert_eq!(store.pending_count().await.unwrap(), 1);
        assert!(!coordinator.is_syncing());

        // The next trigger starts fresh
        remote.accept_all();
        let outcome = coordinator.trigger().await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Completed {
                total: 1,
                synced: 1
            }
        );
    }

    #[tokio::test]
    async fn test_reentrant_trigger_is_rejected() {
        let (store, remote, _connectivity, coordinator) = setup(true).await;
        store.upsert(None, BTreeMap::new()).await.unwrap();
        remote.accept_all();
        remote.delay_submissions(Duration::from_millis(200));

        let background = coordinator.clone();
        let first = tokio::spawn(async move { background.trigger().await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = coordinator.trigger().await.unwrap();
        assert_eq!(second, SyncOutcome::AlreadyInProgress);

        let first = first.await.unwrap().unwrap();
        assert_eq!(
            first,
            SyncOutcome::Completed {
                total: 1,
                synced: 1
            }
        );
        assert_eq!(remote.submit_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_coming_online_schedules_debounced_sync() {
        let (store, remote, connectivity, coordinator) = setup(false).await;
        store.upsert(None, BTreeMap::new()).await.unwrap();
        coordinator.refresh_pending_count().await.unwrap();
        remote.accept_all();

        coordinator.watch_connectivity();
        tokio::task::yield_now().await;

        connectivity.set_online(true);
        // Time is virtual: the loop jumps past the debounce delay instantly
        // while still letting the watcher and the queued trigger run.
        let mut waited = 0;
        while coordinator.pending_count() > 0 && waited < 200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }

        assert_eq!(remote.submit_calls(), 1);
        assert_eq!(coordinator.pending_count(), 0);
        coordinator.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_timer_releases_the_in_flight_flag() {
        let (store, remote, _connectivity, coordinator) = setup(true).await;
        let record = store.upsert(None, BTreeMap::new()).await.unwrap();
        coordinator.refresh_pending_count().await.unwrap();
        remote.accept_all();
        remote.delay_submissions(Duration::from_millis(2_000));

        coordinator.schedule_trigger();
        let mut waited = 0;
        while !coordinator.is_syncing() && waited < 200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }
        assert!(coordinator.is_syncing());

        // Rescheduling (and shutting down) while the debounced sync is
        // mid-submission must not cut it off still holding the flag.
        coordinator.schedule_trigger();
        coordinator.shutdown();

        let mut waited = 0;
        while coordinator.is_syncing() && waited < 600 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }
        assert!(!coordinator.is_syncing());
        assert_eq!(
            store.get(&record.id).await.unwrap().unwrap().sync_status,
            SyncStatus::Synced
        );
        assert_eq!(
            coordinator.trigger().await.unwrap(),
            SyncOutcome::NothingToSync
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_online_with_empty_queue_does_not_schedule() {
        let (_store, remote, connectivity, coordinator) = setup(false).await;

        coordinator.watch_connectivity();
        tokio::task::yield_now().await;

        connectivity.set_online(true);
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(remote.submit_calls(), 0);
        coordinator.shutdown();
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(
            SyncOutcome::Completed {
                total: 3,
                synced: 2
            }
            .to_string(),
            "Synced 2 of 3 records"
        );
        assert_eq!(SyncOutcome::Offline.to_string(), "No internet connection");
    }
}
