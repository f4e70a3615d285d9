//! In-flight de-duplication of migration runs.
//!
//! A second request for a migration kind that is already running does
//! not start a second run; it blocks until the first finishes and
//! receives a clone of the same report. Requests for different kinds
//! run independently, and a request arriving after a run has finished
//! starts a fresh one.

use crate::result::{MigrationKind, MigrationReport};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One in-flight run that waiters can attach to.
#[derive(Debug, Default)]
struct Flight {
    outcome: Mutex<Option<MigrationReport>>,
    finished: Condvar,
}

/// The in-flight registry, keyed by migration kind.
#[derive(Debug, Default)]
pub struct SingleFlight {
    in_flight: Mutex<HashMap<MigrationKind, Arc<Flight>>>,
}

impl SingleFlight {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` for `kind`, unless a run for `kind` is already in
    /// flight, in which case this blocks and returns a clone of that
    /// run's report instead.
    pub fn run(
        &self,
        kind: MigrationKind,
        work: impl FnOnce() -> MigrationReport,
    ) -> MigrationReport {
        let (flight, runner) = {
            let mut flights = self.in_flight.lock();
            match flights.get(&kind) {
                Some(flight) => (Arc::clone(flight), false),
                None => {
                    let flight = Arc::new(Flight::default());
                    flights.insert(kind, Arc::clone(&flight));
                    (flight, true)
                }
            }
        };

        if runner {
            let report = work();
            *flight.outcome.lock() = Some(report.clone());
            flight.finished.notify_all();
            self.in_flight.lock().remove(&kind);
            report
        } else {
            debug!(kind = %kind, "joining in-flight migration");
            let mut outcome = flight.outcome.lock();
            loop {
                if let Some(report) = outcome.as_ref() {
                    return report.clone();
                }
                flight.finished.wait(&mut outcome);
            }
        }
    }
}
