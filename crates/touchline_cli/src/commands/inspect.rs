//! Inspect command implementation.

use serde::Serialize;
use std::path::Path;
use touchline_model::{EntityCounts, SCHEMA_VERSION};
use touchline_store::DataStore;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Snapshot schema version this build reads and writes.
    pub schema_version: u32,
    /// Per-kind entity counts.
    pub counts: EntityCounts,
    /// Total entities including singletons.
    pub total: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_store(path)?;
    let counts = store.counts()?;

    let result = InspectResult {
        path: path.display().to_string(),
        schema_version: SCHEMA_VERSION,
        counts,
        total: counts.total(),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Touchline Store Inspection");
    println!("==========================");
    println!();
    println!("Path:   {}", result.path);
    println!("Schema: v{}", result.schema_version);
    println!();
    println!("Collections:");
    println!("  Players:      {}", result.counts.players);
    println!("  Teams:        {}", result.counts.teams);
    println!("  Rosters:      {}", result.counts.rosters);
    println!("  Seasons:      {}", result.counts.seasons);
    println!("  Tournaments:  {}", result.counts.tournaments);
    println!("  Personnel:    {}", result.counts.personnel);
    println!("  Games:        {}", result.counts.games);
    println!("  Adjustments:  {}", result.counts.adjustments);
    println!();
    println!("Singletons:");
    println!("  Settings:     {}", presence(result.counts.has_settings));
    println!("  Warmup plan:  {}", presence(result.counts.has_warmup_plan));
    println!("  Timer state:  {}", presence(result.counts.has_timer_state));
    println!();
    println!("Total entities: {}", result.total);
}

fn presence(held: bool) -> &'static str {
    if held {
        "present"
    } else {
        "absent"
    }
}
