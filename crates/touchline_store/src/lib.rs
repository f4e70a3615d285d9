//! # Touchline Store
//!
//! The backend-agnostic store contract and the local implementation.
//!
//! This crate provides:
//! - The [`DataStore`] trait every backend implements
//! - The closed [`StoreError`] taxonomy backends map into
//! - Key-scoped locking with one global acquisition order
//! - A locked store directory with atomic writes and quarantine
//! - Persistence backends (file and in-memory)
//! - [`LocalStore`], the on-device store
//!
//! ## Key invariants
//!
//! - Absence is `None`/`false`, never an error
//! - Multi-key operations acquire keys in one global order
//! - A mutation that fails to persist leaves memory unchanged
//! - An unreadable data file is quarantined, never deleted
//! - One process per store directory, enforced by an advisory lock

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod contract;
mod dir;
mod error;
mod local;
mod locks;
mod persistence;

pub use config::StoreConfig;
pub use contract::{read_snapshot, DataStore, PersonnelRemoval};
pub use dir::StoreDir;
pub use error::{ErrorKind, StoreError, StoreResult};
pub use local::LocalStore;
pub use locks::{KeyLockGuard, KeyLockManager, StoreKey};
pub use persistence::{FilePersistence, MemoryPersistence, Persistence};
