//! Wired local/cloud pairs for cross-crate tests.

use std::sync::Arc;
use std::time::{Duration, Instant};
use touchline_remote::{MemoryRemote, RemoteStore};
use touchline_store::LocalStore;
use touchline_sync::{RetryConfig, SyncConfig, SyncEngine, SyncQueue, SyncedStore};

/// A synchronized store wired to an in-memory cloud.
///
/// The local store is memory-backed, cloud mode is already enabled,
/// and the engine polls every 10ms but is **not** started; call
/// `engine.start()` for a background worker or
/// `engine.process_available()` to drain the queue inline.
pub struct SyncHarness {
    /// The store under test.
    pub store: SyncedStore,
    /// The fake cloud behind the store, with its failure knobs.
    pub remote: Arc<MemoryRemote>,
    /// The remote-facing store contract over `remote`.
    pub remote_store: RemoteStore,
    /// The replay engine over the store's queue.
    pub engine: SyncEngine,
}

impl SyncHarness {
    /// Wires a fresh harness with no retries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_retry(RetryConfig::no_retry())
    }

    /// Wires a fresh harness with a caller-chosen retry policy.
    #[must_use]
    pub fn with_retry(retry: RetryConfig) -> Self {
        let local = Arc::new(LocalStore::in_memory());
        let queue = Arc::new(SyncQueue::new(64));
        let remote = Arc::new(MemoryRemote::new());
        let remote_store = RemoteStore::new(remote.clone());
        let config = SyncConfig::new()
            .with_poll_timeout(Duration::from_millis(10))
            .with_retry(retry);
        let engine = SyncEngine::new(queue.clone(), remote_store.clone(), config);
        let store = SyncedStore::new(local, queue);
        store.set_cloud_enabled(true);
        Self {
            store,
            remote,
            remote_store,
            engine,
        }
    }
}

impl Default for SyncHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A bare fake cloud and the store contract over it.
#[must_use]
pub fn remote_pair() -> (Arc<MemoryRemote>, RemoteStore) {
    let remote = Arc::new(MemoryRemote::new());
    let store = RemoteStore::new(remote.clone());
    (remote, store)
}

/// Polls `cond` every few milliseconds until it holds or `timeout`
/// passes; returns the final answer.
pub fn wait_until(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_player;
    use touchline_remote::RemoteApi;
    use touchline_store::DataStore;

    #[test]
    fn harness_mirrors_writes_through_the_engine() {
        let harness = SyncHarness::new();
        harness.engine.start();

        harness.store.create_player(sample_player(1)).unwrap();
        assert!(wait_until(
            || harness.remote.counts().map(|c| c.players == 1).unwrap_or(false),
            Duration::from_secs(5),
        ));
        harness.engine.shutdown();
    }

    #[test]
    fn process_available_drains_inline() {
        let harness = SyncHarness::new();
        harness.store.create_player(sample_player(1)).unwrap();
        harness.store.create_player(sample_player(2)).unwrap();

        assert_eq!(harness.engine.process_available(), 2);
        assert_eq!(harness.remote.counts().unwrap().players, 2);
    }

    #[test]
    fn remote_pair_shares_the_same_backend() {
        let (remote, store) = remote_pair();
        remote.set_online(false);
        assert!(!store.is_online());
    }
}
