//! Cloud migration command implementations.
//!
//! Both directions run the same flows the app embeds, pointed at an
//! in-memory demo cloud, with progress ticks printed to stdout.

use std::path::Path;
use std::sync::Arc;
use touchline_migration::{
    CloudCleanup, MigrationServices, ModeSwitch, ProgressObserver, WriteMode,
};
use touchline_model::StoreSnapshot;
use touchline_remote::{MemoryRemote, RemoteStore};
use touchline_store::{read_snapshot, StoreResult};

/// Runs the local-to-cloud migration into a fresh demo cloud.
pub fn to_cloud(path: &Path, replace: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(super::open_store(path)?);
    let services =
        MigrationServices::new(store, RemoteStore::new(Arc::new(MemoryRemote::new())));
    services.set_observer(Some(stdout_observer()));

    let mode = if replace {
        WriteMode::Replace
    } else {
        WriteMode::Merge
    };
    let report = services.migrate_to_cloud(mode);
    super::print_report(&report)
}

/// Runs the cloud-to-local migration from a seeded demo cloud.
pub fn to_local(
    path: &Path,
    snapshot_file: Option<&Path>,
    delete_cloud: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(super::open_or_create_store(path)?);

    let seed: StoreSnapshot = match snapshot_file {
        Some(file) => serde_json::from_str(&std::fs::read_to_string(file)?)?,
        None => read_snapshot(store.as_ref())?,
    };
    let api = Arc::new(MemoryRemote::new());
    api.seed(seed);

    let services = MigrationServices::new(store, RemoteStore::new(api));
    services.set_observer(Some(stdout_observer()));

    let cleanup = if delete_cloud {
        CloudCleanup::Delete
    } else {
        CloudCleanup::Keep
    };
    let report = services.migrate_to_local(cleanup, &AcknowledgeSwitch);
    super::print_report(&report)
}

/// The CLI has no app mode to flip; committing is a stdout note.
struct AcknowledgeSwitch;

impl ModeSwitch for AcknowledgeSwitch {
    fn commit_local_mode(&self) -> StoreResult<()> {
        println!("  local-only mode committed");
        Ok(())
    }
}

fn stdout_observer() -> ProgressObserver {
    Arc::new(|progress| {
        println!(
            "  [{:<11}] {} entities",
            progress.stage,
            progress.counts.total()
        );
    })
}
