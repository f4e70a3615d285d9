//! Push command implementation.

use std::path::Path;
use std::sync::Arc;
use touchline_remote::{MemoryRemote, RemoteStore};
use touchline_store::DataStore;
use touchline_sync::{push_all_to_cloud, SyncConfig};
use tracing::info;

/// Runs the push command against a fresh demo cloud.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("pushing store at {:?}", path);

    let store = super::open_store(path)?;
    let remote = RemoteStore::new(Arc::new(MemoryRemote::new()));
    let summary = push_all_to_cloud(&store, &remote, &SyncConfig::default())?;

    let singletons = usize::from(summary.settings)
        + usize::from(summary.warmup_plan)
        + usize::from(summary.timer_state);

    println!("Push Summary");
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
    println!("  Demo cloud now holds {} entities", remote.counts()?.total());
    println!();

    if summary.is_complete() {
        println!("✓ Push complete ({} entities)", summary.pushed_total());
        Ok(())
    } else {
        println!("✗ {} instances failed to push", summary.failures.total());
        Err("Push incomplete".into())
    }
}
