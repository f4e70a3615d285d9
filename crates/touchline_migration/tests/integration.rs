//! Cross-crate migration journeys: archive to cloud to second device,
//! and migrations running next to a live sync engine.

use std::sync::Arc;
use std::time::Duration;
use touchline_migration::{CloudCleanup, MigrationServices, ModeSwitch, WriteMode};
use touchline_model::EntityId;
use touchline_remote::{RemoteApi, OFFLINE_MESSAGE};
use touchline_store::{DataStore, LocalStore, StoreResult};
use touchline_sync::{RetryConfig, SyncConfig, SyncEngine, SyncQueue, SyncedStore};
use touchline_testkit::{
    legacy_archive_json, remote_pair, sample_player, scenarios, wait_until, TestStore,
};

struct AcceptSwitch;

impl ModeSwitch for AcceptSwitch {
    fn commit_local_mode(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[test]
fn legacy_archive_reaches_a_second_device_intact() {
    // Device one imports the old archive, then moves to the cloud.
    let device_one = TestStore::memory();
    let (api, cloud) = remote_pair();
    let services_one = MigrationServices::new(device_one.shared(), cloud.clone());
    assert!(services_one.import_legacy(&legacy_archive_json()).success);
    assert!(services_one.migrate_to_cloud(WriteMode::Replace).success);

    // Device two pulls everything down and goes local-only again.
    let device_two = TestStore::memory();
    let services_two = MigrationServices::new(device_two.shared(), cloud);
    let report = services_two.migrate_to_local(CloudCleanup::Delete, &AcceptSwitch);
    assert!(report.success, "errors: {:?}", report.errors);
    assert_eq!(report.cloud_deleted, Some(true));

    // The archive's content survived both hops, ids and all.
    assert_eq!(device_two.counts().unwrap(), device_one.counts().unwrap());
    let game = device_two
        .game(&EntityId::from_raw("g1"))
        .unwrap()
        .expect("g1 survived both hops");
    assert_eq!(game.events[0].time_seconds, 754);
    assert_eq!(game.season_id, Some(EntityId::from_raw("s1")));

    // And the cloud copy is gone.
    assert_eq!(api.counts().unwrap().total(), 0);
}

#[test]
fn a_live_engine_survives_a_migration() {
    let local = Arc::new(LocalStore::in_memory());
    let queue = Arc::new(SyncQueue::new(64));
    let (api, cloud) = remote_pair();
    let config = SyncConfig::new()
        .with_poll_timeout(Duration::from_millis(10))
        .with_retry(RetryConfig::no_retry());
    let engine = Arc::new(SyncEngine::new(queue.clone(), cloud.clone(), config));
    let synced = SyncedStore::new(local.clone(), queue);
    synced.set_cloud_enabled(true);
    engine.start();

    synced.create_player(sample_player(1)).unwrap();
    assert!(wait_until(
        || api.counts().map(|c| c.players == 1).unwrap_or(false),
        Duration::from_secs(5),
    ));

    let services = MigrationServices::new(local, cloud).with_engine(engine.clone());
    assert!(services.migrate_to_cloud(WriteMode::Replace).success);
    assert!(!engine.is_paused());

    // Mirroring keeps working once the engine is handed back.
    synced.create_player(sample_player(2)).unwrap();
    assert!(wait_until(
        || api.counts().map(|c| c.players == 2).unwrap_or(false),
        Duration::from_secs(5),
    ));
    engine.shutdown();
}

#[test]
fn offline_migration_reports_the_contract_message() {
    let device = scenarios::populated_store();
    let (api, cloud) = remote_pair();
    api.set_online(false);

    let services = MigrationServices::new(device.shared(), cloud);
    let report = services.migrate_to_cloud(WriteMode::Replace);
    assert!(!report.success);
    assert_eq!(report.errors, vec![OFFLINE_MESSAGE.to_owned()]);

    // Back online, the same services instance succeeds.
    api.set_online(true);
    assert!(services.migrate_to_cloud(WriteMode::Replace).success);
}

#[test]
fn pulling_an_empty_cloud_succeeds_with_nothing_migrated() {
    let (_, cloud) = remote_pair();
    let device = TestStore::memory();
    let services = MigrationServices::new(device.shared(), cloud);

    let report = services.migrate_to_local(CloudCleanup::Keep, &AcceptSwitch);
    assert!(report.success, "errors: {:?}", report.errors);
    assert_eq!(report.migrated.total(), 0);
    assert_eq!(device.counts().unwrap().total(), 0);
}
