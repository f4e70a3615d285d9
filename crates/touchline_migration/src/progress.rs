//! Progress reporting for migration flows.
//!
//! Each flow announces the stage it enters plus the counts landed so
//! far. Observers run on the migrating thread; one that panics is
//! logged and ignored so a broken progress bar can never abort a
//! migration.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use touchline_model::EntityCounts;
use tracing::warn;

/// Stages of a local→cloud run, in the order a run passes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    /// Checking connectivity and preconditions.
    Preparing,
    /// Reading the full local snapshot.
    Exporting,
    /// Checking referential integrity.
    Validating,
    /// Emptying the destination (replace mode only).
    Clearing,
    /// Uploading collection by collection.
    Uploading,
    /// Comparing source and destination counts.
    Verifying,
    /// Done.
    Complete,
}

impl UploadStage {
    /// Every stage in run order.
    pub const ALL: [UploadStage; 7] = [
        Self::Preparing,
        Self::Exporting,
        Self::Validating,
        Self::Clearing,
        Self::Uploading,
        Self::Verifying,
        Self::Complete,
    ];

    /// The label observers see.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Exporting => "exporting",
            Self::Validating => "validating",
            Self::Clearing => "clearing",
            Self::Uploading => "uploading",
            Self::Verifying => "verifying",
            Self::Complete => "complete",
        }
    }
}

/// Stages of a cloud→local run, in the order a run passes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStage {
    /// Checking connectivity and preconditions.
    Preparing,
    /// Fetching the full cloud snapshot.
    Downloading,
    /// Saving collection by collection into the local store.
    Saving,
    /// Comparing source and destination counts.
    Verifying,
    /// Done.
    Complete,
}

impl DownloadStage {
    /// Every stage in run order.
    pub const ALL: [DownloadStage; 5] = [
        Self::Preparing,
        Self::Downloading,
        Self::Saving,
        Self::Verifying,
        Self::Complete,
    ];

    /// The label observers see.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Downloading => "downloading",
            Self::Saving => "saving",
            Self::Verifying => "verifying",
            Self::Complete => "complete",
        }
    }
}

/// Stages of a legacy import, in the order a run passes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyStage {
    /// Parsing the archive and checking the destination is empty.
    Preparing,
    /// Converting the v1 document to the current schema.
    Converting,
    /// Writing collection by collection.
    Writing,
    /// Done.
    Complete,
}

impl LegacyStage {
    /// Every stage in run order.
    pub const ALL: [LegacyStage; 4] = [
        Self::Preparing,
        Self::Converting,
        Self::Writing,
        Self::Complete,
    ];

    /// The label observers see.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Converting => "converting",
            Self::Writing => "writing",
            Self::Complete => "complete",
        }
    }
}

/// One progress tick: the stage just entered and the counts landed in
/// the destination so far.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationProgress {
    /// Label from one of the stage enums.
    pub stage: &'static str,
    /// Entities landed so far.
    pub counts: EntityCounts,
}

/// Callback receiving progress ticks.
pub type ProgressObserver = Arc<dyn Fn(MigrationProgress) + Send + Sync>;

/// Sends one tick to the observer, swallowing any panic it raises.
pub(crate) fn emit(
    observer: Option<&ProgressObserver>,
    stage: &'static str,
    counts: EntityCounts,
) {
    let Some(observer) = observer else {
        return;
    };
    let progress = MigrationProgress { stage, counts };
    if catch_unwind(AssertUnwindSafe(|| observer(progress))).is_err() {
        warn!(stage, "progress observer panicked; continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn stage_labels_are_closed_sets() {
        let upload: Vec<_> = UploadStage::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(
            upload,
            [
                "preparing",
                "exporting",
                "validating",
                "clearing",
                "uploading",
                "verifying",
                "complete"
            ]
        );

        let download: Vec<_> = DownloadStage::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(
            download,
            ["preparing", "downloading", "saving", "verifying", "complete"]
        );

        let legacy: Vec<_> = LegacyStage::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(legacy, ["preparing", "converting", "writing", "complete"]);
    }

    #[test]
    fn emit_delivers_ticks() {
        let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: ProgressObserver = Arc::new(move |p| sink.lock().push(p.stage));

        emit(Some(&observer), UploadStage::Preparing.label(), EntityCounts::default());
        emit(Some(&observer), UploadStage::Complete.label(), EntityCounts::default());
        emit(None, "ignored", EntityCounts::default());

        assert_eq!(*seen.lock(), vec!["preparing", "complete"]);
    }

    #[test]
    fn panicking_observer_is_swallowed() {
        let observer: ProgressObserver = Arc::new(|_| panic!("broken progress bar"));
        // Must return normally; the panic stays inside.
        emit(Some(&observer), "preparing", EntityCounts::default());
    }
}
