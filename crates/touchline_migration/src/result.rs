//! Migration kinds and the structured report every flow returns.

use serde::Serialize;
use std::fmt;
use touchline_model::EntityCounts;

/// The three one-shot migration flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationKind {
    /// Upload everything local into the cloud.
    LocalToCloud,
    /// Download everything from the cloud into the local store.
    CloudToLocal,
    /// Import a schema-v1 legacy archive into the local store.
    Legacy,
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LocalToCloud => "local-to-cloud",
            Self::CloudToLocal => "cloud-to-local",
            Self::Legacy => "legacy",
        };
        f.write_str(label)
    }
}

/// The outcome of one migration run.
///
/// `success` is false exactly when `errors` is non-empty; warnings
/// never flip it. `migrated` counts what actually landed in the
/// destination, which on a partial failure is less than the source
/// held.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    /// Which flow produced this report.
    pub kind: MigrationKind,
    /// Whether the migration completed without errors.
    pub success: bool,
    /// Hard failures, each naming the step or entity that failed.
    pub errors: Vec<String>,
    /// Advisory findings that did not block completion.
    pub warnings: Vec<String>,
    /// What landed in the destination.
    pub migrated: EntityCounts,
    /// Whether cloud data was deleted afterwards. `None` when deletion
    /// was not requested or the run never got that far.
    pub cloud_deleted: Option<bool>,
    /// True when a legacy import found the destination already
    /// populated and touched nothing.
    pub skipped: bool,
}

impl MigrationReport {
    /// A fresh, successful, empty report for `kind`.
    #[must_use]
    pub fn new(kind: MigrationKind) -> Self {
        Self {
            kind,
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            migrated: EntityCounts::default(),
            cloud_deleted: None,
            skipped: false,
        }
    }

    /// Records a hard failure; the report can no longer succeed.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.success = false;
    }

    /// Records an advisory finding.
    pub fn record_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_flip_success_warnings_do_not() {
        let mut report = MigrationReport::new(MigrationKind::LocalToCloud);
        assert!(report.success);

        report.record_warning("destination already holds data");
        assert!(report.success);

        report.record_error("players p1: upload failed");
        assert!(!report.success);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn kind_labels_are_kebab_case() {
        assert_eq!(MigrationKind::LocalToCloud.to_string(), "local-to-cloud");
        assert_eq!(
            serde_json::to_string(&MigrationKind::CloudToLocal).unwrap(),
            "\"cloud-to-local\""
        );
    }

    #[test]
    fn report_serializes_for_display() {
        let report = MigrationReport::new(MigrationKind::Legacy);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "legacy");
        assert_eq!(json["success"], true);
        assert_eq!(json["skipped"], false);
    }
}
