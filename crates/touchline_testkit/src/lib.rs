//! # Touchline Testkit
//!
//! Test utilities shared across the Touchline data-layer crates.
//!
//! This crate provides:
//! - Store fixtures with automatic cleanup and deterministic sample
//!   entities
//! - A wired local/cloud harness for synchronization scenarios
//! - Property-based generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use touchline_store::DataStore;
//! use touchline_testkit::prelude::*;
//!
//! #[test]
//! fn seeding_populates_every_collection() {
//!     with_store(|store| {
//!         scenarios::seed_club(store);
//!         assert_eq!(store.counts().unwrap().players, 3);
//!     });
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod harness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::harness::*;
}

pub use fixtures::*;
pub use generators::*;
pub use harness::*;
