//! Legacy archive import command implementation.

use std::path::Path;
use touchline_migration::migrate_legacy;
use tracing::info;

/// Runs the import-legacy command.
pub fn run(store_path: &Path, archive: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("importing legacy archive {:?}", archive);

    let json = std::fs::read_to_string(archive)?;
    let store = super::open_or_create_store(store_path)?;
    let report = migrate_legacy(&json, &store, None);

    super::print_report(&report)
}
