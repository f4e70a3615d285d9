//! Export command implementation.

use std::path::Path;
use touchline_store::read_snapshot;

/// Runs the export command.
pub fn run(path: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_store(path)?;
    let snapshot = read_snapshot(&store)?;
    let json = serde_json::to_string_pretty(&snapshot)?;

    match output {
        Some(file) => {
            std::fs::write(file, json)?;
            println!(
                "✓ Exported {} entities to {:?}",
                snapshot.counts().total(),
                file
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
