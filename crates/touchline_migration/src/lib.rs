//! # Touchline Migration
//!
//! One-shot data moves between storage generations and locations.
//!
//! This crate provides:
//! - [`migrate_local_to_cloud`], uploading the whole local store with a
//!   count verification at the end
//! - [`migrate_cloud_to_local`], the reverse download with an optional
//!   cloud cleanup once the data is safely home
//! - [`migrate_legacy`], the importer for version-1 single-file
//!   archives
//! - [`MigrationServices`], the front door that deduplicates
//!   concurrent duplicate calls and quiesces the sync engine around
//!   every run
//!
//! ## Key invariants
//!
//! - Every flow returns a [`MigrationReport`] instead of an error;
//!   partial progress is visible in its counts
//! - In replace mode a failed destination clear aborts before a single
//!   upload
//! - A count mismatch after a transfer fails the run even when every
//!   individual write succeeded
//! - Two concurrent calls of the same kind produce one underlying run
//!   and structurally identical reports

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cloud_to_local;
mod legacy;
mod local_to_cloud;
mod progress;
mod result;
mod services;
mod single_flight;

pub use cloud_to_local::{migrate_cloud_to_local, CloudCleanup, ModeSwitch};
pub use legacy::{
    migrate_legacy, LegacyArchive, LegacyEvent, LegacyEventKind, LegacyGame, LegacyGrouping,
    LegacyPlayer, LegacyRosterEntry, LegacySettings, LegacyTeam, LEGACY_SCHEMA_VERSION,
};
pub use local_to_cloud::{migrate_local_to_cloud, WriteMode};
pub use progress::{
    DownloadStage, LegacyStage, MigrationProgress, ProgressObserver, UploadStage,
};
pub use result::{MigrationKind, MigrationReport};
pub use services::MigrationServices;
pub use single_flight::SingleFlight;
