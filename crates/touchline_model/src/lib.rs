//! # Touchline Model
//!
//! Entity types for the Touchline data layer.
//!
//! This crate provides:
//! - The opaque [`EntityId`] used across every store and migration
//! - The roster, team, game and scheduling entities
//! - Singleton state (settings, warmup plan, timer state)
//! - Validation rules shared by every store implementation
//! - Snapshot and count types used by push/pull and migration
//!
//! Every type serializes with `serde`; the JSON produced here is the
//! at-rest format of the local store and the wire format of the remote
//! store, so field shapes are part of the stability contract.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adjustment;
mod game;
mod grouping;
mod id;
mod kind;
mod personnel;
mod roster;
mod singletons;
mod snapshot;
mod team;
mod validate;

pub use adjustment::PlayerStatAdjustment;
pub use game::{FieldPosition, Game, GameEvent, GameEventKind};
pub use grouping::{Season, Tournament};
pub use id::EntityId;
pub use kind::EntityKind;
pub use personnel::{Personnel, PersonnelRole};
pub use roster::{Player, TeamPlayer};
pub use singletons::{AppSettings, TimerState, WarmupPlan, WarmupStep};
pub use snapshot::{CountMismatch, EntityCounts, StoreSnapshot, SCHEMA_VERSION};
pub use team::Team;
pub use validate::{
    integrity_warnings, validate_all, validate_collection, validate_game, validate_games, Keyed,
    Validate, ValidationError,
};

/// Returns the current time as Unix epoch milliseconds.
///
/// Timestamps in the model (`created_at_ms`, `applied_at_ms`, ...) are
/// plain epoch-millisecond integers so they survive every serialization
/// boundary unchanged.
#[must_use]
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
