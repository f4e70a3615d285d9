//! Verify command implementation.

use std::path::Path;
use touchline_model::{integrity_warnings, validate_all};
use touchline_store::read_snapshot;

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying store at {:?}", path);
    println!();

    let store = super::open_store(path)?;
    let snapshot = read_snapshot(&store)?;
    println!("Entities checked: {}", snapshot.counts().total());
    println!();

    // The store only persists validated writes, so a validation error
    // here means the files were edited outside the app.
    let mut findings = Vec::new();
    if let Err(err) = validate_all(&snapshot) {
        findings.push(format!("validation: {err}"));
    }
    findings.extend(integrity_warnings(&snapshot));

    if findings.is_empty() {
        println!("✓ Store verification passed");
        Ok(())
    } else {
        for finding in &findings {
            println!("  ✗ {finding}");
        }
        println!();
        println!("✗ Store verification failed");
        Err("Verification failed".into())
    }
}
