//! CLI command implementations.

pub mod export;
pub mod import_legacy;
pub mod inspect;
pub mod migrate;
pub mod pull;
pub mod push;
pub mod verify;

use std::path::Path;
use touchline_migration::MigrationReport;
use touchline_store::{LocalStore, StoreConfig, StoreResult};

/// Opens an existing store directory, refusing to create one.
fn open_store(path: &Path) -> StoreResult<LocalStore> {
    LocalStore::open(path, &StoreConfig::new().create_if_missing(false))
}

/// Opens the store directory, creating it when absent. Used by the
/// restore-flavored commands that may target a fresh machine.
fn open_or_create_store(path: &Path) -> StoreResult<LocalStore> {
    LocalStore::open(path, &StoreConfig::default())
}

/// Prints a migration report; a failed run becomes a CLI error.
fn print_report(report: &MigrationReport) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("Migration Report");
    println!("================");
    println!();
    println!("  Flow:            {}", report.kind);
    println!("  Entities landed: {}", report.migrated.total());
    if report.skipped {
        println!("  Skipped:         destination already holds data");
    }
    if let Some(deleted) = report.cloud_deleted {
        println!("  Cloud deleted:   {}", if deleted { "yes" } else { "no" });
    }
    println!();
    for warning in &report.warnings {
        println!("  ⚠ {warning}");
    }
    for error in &report.errors {
        println!("  ✗ {error}");
    }
    if !report.warnings.is_empty() || !report.errors.is_empty() {
        println!();
    }

    if report.success {
        println!("✓ Migration succeeded");
        Ok(())
    } else {
        println!("✗ Migration failed");
        Err("Migration failed".into())
    }
}
