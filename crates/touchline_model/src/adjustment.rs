//! Manual stat adjustments.

use crate::id::EntityId;
use crate::now_ms;
use serde::{Deserialize, Serialize};

/// A manual correction to a player's aggregate stats.
///
/// Adjustments let a coach account for games tracked outside the app.
/// They are owned by the player they adjust and are deleted with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatAdjustment {
    /// Stable opaque id.
    pub id: EntityId,
    /// The adjusted player.
    pub player_id: EntityId,
    /// Games played to add (may be negative).
    #[serde(default)]
    pub games_delta: i32,
    /// Goals to add (may be negative).
    #[serde(default)]
    pub goals_delta: i32,
    /// Assists to add (may be negative).
    #[serde(default)]
    pub assists_delta: i32,
    /// Why the adjustment was made.
    #[serde(default)]
    pub note: Option<String>,
    /// When the adjustment was recorded, milliseconds since the Unix epoch.
    #[serde(default)]
    pub applied_at_ms: u64,
}

impl PlayerStatAdjustment {
    /// Creates a zeroed adjustment for `player_id`, stamped now.
    #[must_use]
    pub fn new(player_id: EntityId) -> Self {
        Self {
            id: EntityId::new(),
            player_id,
            games_delta: 0,
            goals_delta: 0,
            assists_delta: 0,
            note: None,
            applied_at_ms: now_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_default_to_zero() {
        let a: PlayerStatAdjustment =
            serde_json::from_str(r#"{"id":"a1","player_id":"p1"}"#).unwrap();
        assert_eq!(a.games_delta, 0);
        assert_eq!(a.goals_delta, 0);
        assert_eq!(a.assists_delta, 0);
    }

    #[test]
    fn negative_deltas_round_trip() {
        let mut a = PlayerStatAdjustment::new(EntityId::from_raw("p1"));
        a.goals_delta = -2;
        let json = serde_json::to_string(&a).unwrap();
        let back: PlayerStatAdjustment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.goals_delta, -2);
    }
}
