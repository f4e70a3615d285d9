//! Pull command implementation.

use std::path::Path;
use std::sync::Arc;
use touchline_model::StoreSnapshot;
use touchline_remote::{MemoryRemote, RemoteStore};
use touchline_store::read_snapshot;
use touchline_sync::pull_all_from_cloud;
use tracing::info;

/// Runs the pull command through a demo cloud.
///
/// The cloud is seeded from `snapshot_file` when given (restoring an
/// earlier `export`), otherwise from the store's own snapshot, which
/// makes the command a lossless round trip.
pub fn run(path: &Path, snapshot_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_or_create_store(path)?;

    let seed: StoreSnapshot = match snapshot_file {
        Some(file) => {
            info!("seeding demo cloud from {:?}", file);
            serde_json::from_str(&std::fs::read_to_string(file)?)?
        }
        None => read_snapshot(&store)?,
    };

    let api = Arc::new(MemoryRemote::new());
    api.seed(seed);
    let remote = RemoteStore::new(api);

    let summary = pull_all_from_cloud(&store, &remote)?;

    let singletons = usize::from(summary.settings)
        + usize::from(summary.warmup_plan)
        + usize::from(summary.timer_state);

    println!("Pull Summary");
    println!("============");
    println!();
    println!("  Players:      {}", summary.players);
    println!("  Teams:        {}", summary.teams);
    println!("  Rosters:      {}", summary.rosters);
    println!("  Seasons:      {}", summary.seasons);
    println!("  Tournaments:  {}", summary.tournaments);
    println!("  Personnel:    {}", summary.personnel);
    println!("  Games:        {}", summary.games);
    println!("  Adjustments:  {}", summary.adjustments);
    println!("  Singletons:   {singletons}");
    println!();

    if summary.is_complete() {
        println!("✓ Pull complete");
        Ok(())
    } else {
        for failure in &summary.failures {
            println!("  ✗ {}: {}", failure.kind, failure.message);
        }
        println!();
        println!("✗ Pull incomplete");
        Err("Pull incomplete".into())
    }
}
