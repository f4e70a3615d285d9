//! # Touchline Sync
//!
//! Cloud mirroring for the data layer.
//!
//! This crate provides:
//! - [`SyncQueue`] and [`SyncTask`], the bounded queue of mutations
//!   awaiting idempotent cloud replay
//! - [`SyncEngine`], the worker that replays tasks with retry and
//!   reports dropped tasks to an error handler
//! - [`SyncedStore`], a `DataStore` writing locally first and mirroring
//!   each mutation into the queue
//! - [`push_all_to_cloud`] / [`pull_all_from_cloud`], whole-store
//!   transfers with per-instance and per-collection failure isolation
//!
//! ## Key invariants
//!
//! - Local writes never wait on the network; mirroring is queued
//! - Replays are idempotent, so a retried task cannot double-apply
//! - A full queue blocks writers instead of growing without bound
//! - One bad task is dropped and reported, never halting the queue

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod pull;
mod push;
mod queue;
mod synced;

pub use config::{RetryConfig, SyncConfig};
pub use engine::{EngineStats, ErrorHandler, SyncEngine};
pub use pull::{pull_all_from_cloud, PullFailure, PullSummary};
pub use push::{push_all_to_cloud, PushFailures, PushSummary};
pub use queue::{SyncQueue, SyncTask};
pub use synced::SyncedStore;
