//! The coordinating front door for all three migrations.

use crate::cloud_to_local::{migrate_cloud_to_local, CloudCleanup, ModeSwitch};
use crate::legacy::migrate_legacy;
use crate::local_to_cloud::{migrate_local_to_cloud, WriteMode};
use crate::progress::ProgressObserver;
use crate::result::{MigrationKind, MigrationReport};
use crate::single_flight::SingleFlight;
use parking_lot::RwLock;
use std::sync::Arc;
use touchline_remote::RemoteStore;
use touchline_store::LocalStore;
use touchline_sync::SyncEngine;
use tracing::debug;

/// Front door for the three migration flows.
///
/// Calls of the same kind are deduplicated while one is in flight: the
/// duplicate blocks and returns a clone of the running call's report
/// instead of starting a second run. Different kinds run independently
/// of each other.
///
/// When a sync engine is attached it is paused and its queue drained
/// before a flow touches either store, and resumed once the flow ends.
/// An engine the caller had already paused stays paused afterwards.
pub struct MigrationServices {
    local: Arc<LocalStore>,
    remote: RemoteStore,
    engine: Option<Arc<SyncEngine>>,
    flights: SingleFlight,
    observer: RwLock<Option<ProgressObserver>>,
}

impl MigrationServices {
    /// Creates services over a local store and a cloud store, with no
    /// sync engine to quiesce.
    #[must_use]
    pub fn new(local: Arc<LocalStore>, remote: RemoteStore) -> Self {
        Self {
            local,
            remote,
            engine: None,
            flights: SingleFlight::default(),
            observer: RwLock::new(None),
        }
    }

    /// Attaches the sync engine that must stand still during migrations.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<SyncEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Installs (or clears) the observer every flow reports progress to.
    pub fn set_observer(&self, observer: Option<ProgressObserver>) {
        *self.observer.write() = observer;
    }

    /// Uploads everything local into the cloud.
    pub fn migrate_to_cloud(&self, mode: WriteMode) -> MigrationReport {
        self.flights.run(MigrationKind::LocalToCloud, || {
            let observer = self.observer.read().clone();
            let _quiesced = self.quiesce();
            migrate_local_to_cloud(&*self.local, &self.remote, mode, observer.as_ref())
        })
    }

    /// Downloads the cloud back into the local store.
    pub fn migrate_to_local(
        &self,
        cleanup: CloudCleanup,
        mode_switch: &dyn ModeSwitch,
    ) -> MigrationReport {
        self.flights.run(MigrationKind::CloudToLocal, || {
            let observer = self.observer.read().clone();
            let _quiesced = self.quiesce();
            migrate_cloud_to_local(
                &self.remote,
                &*self.local,
                cleanup,
                mode_switch,
                observer.as_ref(),
            )
        })
    }

    /// Imports a version-1 archive into the local store.
    pub fn import_legacy(&self, archive_json: &str) -> MigrationReport {
        self.flights.run(MigrationKind::Legacy, || {
            let observer = self.observer.read().clone();
            let _quiesced = self.quiesce();
            migrate_legacy(archive_json, &*self.local, observer.as_ref())
        })
    }

    /// Pauses the attached engine and drains its queue, so nothing
    /// replays into the cloud while a migration rearranges it.
    fn quiesce(&self) -> Option<QuiesceGuard<'_>> {
        let engine = self.engine.as_deref()?;
        let was_paused = engine.is_paused();
        engine.pause();
        let drained = engine.process_available();
        if drained > 0 {
            debug!(drained, "drained pending sync work before migrating");
        }
        Some(QuiesceGuard { engine, was_paused })
    }
}

/// Resumes the engine when the migration ends, however it ends.
struct QuiesceGuard<'a> {
    engine: &'a SyncEngine,
    was_paused: bool,
}

impl Drop for QuiesceGuard<'_> {
    fn drop(&mut self) {
        if !self.was_paused {
            self.engine.resume();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;
    use touchline_remote::RemoteApi;
    use touchline_store::{DataStore, StoreResult};
    use touchline_sync::{RetryConfig, SyncConfig, SyncQueue, SyncedStore};
    use touchline_testkit::{remote_pair, sample_player, scenarios, TestStore};

    struct NoopSwitch;

    impl ModeSwitch for NoopSwitch {
        fn commit_local_mode(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[test]
    fn cloud_round_trip_through_services() {
        let source = scenarios::populated_store();
        let (_, remote) = remote_pair();
        let up = MigrationServices::new(source.shared(), remote.clone());
        assert!(up.migrate_to_cloud(WriteMode::Replace).success);

        let target = TestStore::memory();
        let down = MigrationServices::new(target.shared(), remote);
        let report = down.migrate_to_local(CloudCleanup::Keep, &NoopSwitch);

        assert!(report.success, "errors: {:?}", report.errors);
        assert_eq!(target.counts().unwrap(), source.counts().unwrap());
    }

    #[test]
    fn duplicate_concurrent_calls_share_one_run() {
        let source = scenarios::populated_store();
        let (_, remote) = remote_pair();
        let services = Arc::new(MigrationServices::new(source.shared(), remote));

        let preparing = Arc::new(AtomicUsize::new(0));
        let ticks = preparing.clone();
        services.set_observer(Some(Arc::new(move |p| {
            if p.stage == "preparing" {
                ticks.fetch_add(1, Ordering::SeqCst);
            }
            if p.stage == "exporting" {
                // Hold the runner so the duplicate call attaches to it.
                std::thread::sleep(Duration::from_millis(300));
            }
        })));

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for _ in 0..2 {
            let services = services.clone();
            let barrier = barrier.clone();
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                services.migrate_to_cloud(WriteMode::Replace)
            }));
        }
        let reports: Vec<MigrationReport> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(
            preparing.load(Ordering::SeqCst),
            1,
            "exactly one underlying run"
        );
        assert_eq!(reports[0], reports[1]);
        assert!(reports[0].success);
    }

    #[test]
    fn attached_engine_is_drained_and_resumed() {
        let local = Arc::new(touchline_store::LocalStore::in_memory());
        let queue = Arc::new(SyncQueue::new(64));
        let (api, remote) = remote_pair();
        let config = SyncConfig::new()
            .with_poll_timeout(Duration::from_millis(10))
            .with_retry(RetryConfig::no_retry());
        let engine = Arc::new(SyncEngine::new(queue.clone(), remote.clone(), config));
        let synced = SyncedStore::new(local.clone(), queue);
        synced.set_cloud_enabled(true);

        // Queue a mirrored write without a running worker, then migrate.
        synced.create_player(sample_player(1)).unwrap();
        let services = MigrationServices::new(local, remote).with_engine(engine.clone());
        let report = services.migrate_to_cloud(WriteMode::Replace);

        assert!(report.success, "errors: {:?}", report.errors);
        assert!(!engine.is_paused(), "engine resumes after the run");
        assert_eq!(engine.stats().replayed, 1, "queued task drained first");
        assert_eq!(api.counts().unwrap().players, 1);
    }

    #[test]
    fn an_engine_paused_by_the_caller_stays_paused() {
        let local = Arc::new(touchline_store::LocalStore::in_memory());
        let queue = Arc::new(SyncQueue::new(64));
        let (_, remote) = remote_pair();
        let engine = Arc::new(SyncEngine::new(
            queue,
            remote.clone(),
            SyncConfig::new().with_retry(RetryConfig::no_retry()),
        ));
        engine.pause();

        let services = MigrationServices::new(local, remote).with_engine(engine.clone());
        assert!(services.migrate_to_cloud(WriteMode::Replace).success);
        assert!(engine.is_paused(), "caller's pause is preserved");
    }

    #[test]
    fn legacy_import_runs_through_the_same_front_door() {
        let target = TestStore::memory();
        let (_, remote) = remote_pair();
        let services = MigrationServices::new(target.shared(), remote);

        let report = services.import_legacy(&touchline_testkit::legacy_archive_json());
        assert!(report.success, "errors: {:?}", report.errors);
        assert_eq!(target.counts().unwrap().players, 2);

        // The same archive a second time is a skip, not a failure.
        let rerun = services.import_legacy(&touchline_testkit::legacy_archive_json());
        assert!(rerun.success);
        assert!(rerun.skipped);
    }
}
