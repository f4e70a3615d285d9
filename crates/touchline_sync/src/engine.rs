//! The background engine replaying queued tasks against the cloud.

use crate::config::SyncConfig;
use crate::queue::{SyncQueue, SyncTask};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use touchline_remote::RemoteStore;
use touchline_store::{StoreError, StoreResult};
use tracing::{debug, warn};

/// Callback invoked when a task exhausts its retry budget.
pub type ErrorHandler = dyn Fn(&SyncTask, &StoreError) + Send + Sync;

/// Counters describing what the engine has done so far.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Tasks replayed successfully.
    pub replayed: u64,
    /// Tasks dropped after exhausting their retry budget.
    pub failed: u64,
    /// Individual retry attempts.
    pub retried: u64,
    /// Message of the most recent dropped task's error.
    pub last_error: Option<String>,
}

struct EngineShared {
    queue: Arc<SyncQueue>,
    remote: RemoteStore,
    config: SyncConfig,
    stats: Mutex<EngineStats>,
    paused: AtomicBool,
    running: AtomicBool,
    error_handler: RwLock<Option<Box<ErrorHandler>>>,
}

impl EngineShared {
    fn run(&self) {
        while self.running.load(Ordering::SeqCst) {
            if self.paused.load(Ordering::SeqCst) {
                std::thread::sleep(self.config.poll_timeout);
                continue;
            }
            let Some(task) = self.queue.pop_timeout(self.config.poll_timeout) else {
                continue;
            };
            self.replay_with_retry(&task);
        }
    }

    fn replay_with_retry(&self, task: &SyncTask) {
        let mut attempt = 0u32;
        loop {
            match self.replay(task) {
                Ok(()) => {
                    debug!(task = %task.describe(), "replayed task");
                    self.stats.lock().replayed += 1;
                    return;
                }
                Err(err) => {
                    attempt += 1;
                    if err.is_retryable() && attempt < self.config.retry.max_attempts {
                        self.stats.lock().retried += 1;
                        std::thread::sleep(self.config.retry.delay_for_attempt(attempt));
                        continue;
                    }
                    // One bad task never halts the queue: report it,
                    // count it, drop it.
                    warn!(task = %task.describe(), error = %err, "dropping task after failed replay");
                    {
                        let mut stats = self.stats.lock();
                        stats.failed += 1;
                        stats.last_error = Some(err.to_string());
                    }
                    if let Some(handler) = self.error_handler.read().as_ref() {
                        handler(task, &err);
                    }
                    return;
                }
            }
        }
    }

    fn replay(&self, task: &SyncTask) -> StoreResult<()> {
        match task {
            SyncTask::Upsert(record) => self.remote.replay_upsert(record.clone()),
            SyncTask::Delete { kind, id } => self.remote.replay_delete(*kind, id),
        }
    }
}

/// Replays queued mutations against the cloud on a worker thread.
///
/// The worker pops one task at a time and replays it, retrying
/// transient failures with exponential backoff. Pausing stops new
/// replays only; a replay already in flight completes. A task that
/// exhausts its retry budget is reported to the error handler and
/// dropped.
pub struct SyncEngine {
    shared: Arc<EngineShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    /// Creates an engine over a queue and a cloud store. No worker runs
    /// until [`SyncEngine::start`].
    pub fn new(queue: Arc<SyncQueue>, remote: RemoteStore, config: SyncConfig) -> Self {
        Self {
            shared: Arc::new(EngineShared {
                queue,
                remote,
                config,
                stats: Mutex::new(EngineStats::default()),
                paused: AtomicBool::new(false),
                running: AtomicBool::new(false),
                error_handler: RwLock::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Spawns the worker thread. Starting a running engine is a no-op.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return;
        }
        self.shared.running.store(true, Ordering::SeqCst);
        let shared = self.shared.clone();
        *worker = Some(std::thread::spawn(move || shared.run()));
    }

    /// Stops the worker from picking up new tasks.
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::SeqCst);
    }

    /// Lets the worker pick up tasks again.
    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::SeqCst);
    }

    /// Whether the engine is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    /// Stops and joins the worker thread. Queued tasks stay queued.
    pub fn shutdown(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                warn!("sync worker panicked");
            }
        }
    }

    /// Synchronously replays every task currently in the queue and
    /// returns how many were processed (replayed or dropped).
    ///
    /// Runs on the calling thread and ignores the pause flag, so it can
    /// quiesce the queue while the worker is paused.
    pub fn process_available(&self) -> usize {
        let mut processed = 0;
        while let Some(task) = self
            .shared
            .queue
            .pop_timeout(std::time::Duration::ZERO)
        {
            self.shared.replay_with_retry(&task);
            processed += 1;
        }
        processed
    }

    /// Registers the callback invoked when a task is dropped.
    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: Fn(&SyncTask, &StoreError) + Send + Sync + 'static,
    {
        *self.shared.error_handler.write() = Some(Box::new(handler));
    }

    /// A copy of the engine's counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.shared.stats.lock().clone()
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use std::time::Duration;
    use touchline_model::{EntityId, EntityKind, Player};
    use touchline_remote::{MemoryRemote, RemoteApi, RemoteRecord};

    fn upsert(id: &str) -> SyncTask {
        let mut p = Player::new("Engine");
        p.id = EntityId::from_raw(id);
        SyncTask::Upsert(RemoteRecord::Player(p))
    }

    fn engine_over(
        remote: &Arc<MemoryRemote>,
        retry: RetryConfig,
    ) -> (Arc<SyncQueue>, SyncEngine) {
        let queue = Arc::new(SyncQueue::new(32));
        let config = SyncConfig::new()
            .with_poll_timeout(Duration::from_millis(10))
            .with_retry(retry);
        let engine = SyncEngine::new(queue.clone(), RemoteStore::new(remote.clone()), config);
        (queue, engine)
    }

    #[test]
    fn process_available_replays_in_order() {
        let remote = Arc::new(MemoryRemote::new());
        let (queue, engine) = engine_over(&remote, RetryConfig::no_retry());

        queue.push(upsert("p1"));
        queue.push(upsert("p2"));
        queue.push(SyncTask::Delete {
            kind: EntityKind::Players,
            id: EntityId::from_raw("p1"),
        });

        assert_eq!(engine.process_available(), 3);
        assert_eq!(engine.stats().replayed, 3);
        assert_eq!(remote.counts().unwrap().players, 1);
    }

    #[test]
    fn exhausted_task_is_reported_and_dropped() {
        let remote = Arc::new(MemoryRemote::new());
        let retry = RetryConfig::new(2).with_initial_delay(Duration::from_millis(1));
        let (queue, engine) = engine_over(&remote, retry);

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        engine.set_error_handler(move |task, err| {
            sink.lock().push(format!("{}: {err}", task.describe()));
        });

        remote.fail_upserts_for(EntityId::from_raw("p1"));
        queue.push(upsert("p1"));
        queue.push(upsert("p2"));

        assert_eq!(engine.process_available(), 2);

        let stats = engine.stats();
        assert_eq!(stats.replayed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.retried, 1);
        assert!(stats.last_error.is_some());

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("upsert players p1"));

        // The bad task is gone; only the good one landed.
        assert_eq!(remote.counts().unwrap().players, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn replay_after_clearing_the_failure_succeeds() {
        let remote = Arc::new(MemoryRemote::new());
        let (queue, engine) = engine_over(&remote, RetryConfig::no_retry());

        remote.fail_upserts_for(EntityId::from_raw("p1"));
        queue.push(upsert("p1"));
        engine.process_available();
        assert_eq!(engine.stats().failed, 1);

        remote.clear_failures();
        queue.push(upsert("p1"));
        engine.process_available();
        assert_eq!(engine.stats().replayed, 1);
        assert_eq!(remote.counts().unwrap().players, 1);
    }
}
