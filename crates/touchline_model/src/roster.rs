//! Master roster entities.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};

/// A player in the master roster pool.
///
/// Players exist independently of any team; a [`TeamPlayer`] entry
/// links a player into one team's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Stable opaque id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Jersey number, kept as a string so "00" and "7a" survive.
    #[serde(default)]
    pub jersey_number: Option<String>,
    /// Whether this player is a goalkeeper.
    #[serde(default)]
    pub is_goalie: bool,
    /// Free-form coaching notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl Player {
    /// Creates a new player with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            jersey_number: None,
            is_goalie: false,
            notes: None,
        }
    }
}

/// A player's membership in one team's roster.
///
/// Roster entries carry their own jersey number and goalie flag so a
/// player can wear different numbers on different teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPlayer {
    /// Stable opaque id of the roster entry itself.
    pub id: EntityId,
    /// The team this entry belongs to.
    pub team_id: EntityId,
    /// The master-pool player this entry refers to.
    pub player_id: EntityId,
    /// Jersey number on this team.
    #[serde(default)]
    pub jersey_number: Option<String>,
    /// Whether this player keeps goal on this team.
    #[serde(default)]
    pub is_goalie: bool,
}

impl TeamPlayer {
    /// Creates a new roster entry with a fresh id.
    #[must_use]
    pub fn new(team_id: EntityId, player_id: EntityId) -> Self {
        Self {
            id: EntityId::new(),
            team_id,
            player_id,
            jersey_number: None,
            is_goalie: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_defaults() {
        let p = Player::new("Alice");
        assert_eq!(p.name, "Alice");
        assert!(!p.is_goalie);
        assert!(p.jersey_number.is_none());
    }

    #[test]
    fn player_json_shape() {
        let mut p = Player::new("Bo");
        p.id = EntityId::from_raw("p1");
        p.jersey_number = Some("00".into());

        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["jersey_number"], "00");
        assert_eq!(json["is_goalie"], false);
    }

    #[test]
    fn missing_optional_fields_deserialize() {
        let p: Player = serde_json::from_str(r#"{"id":"p1","name":"Cal"}"#).unwrap();
        assert!(p.jersey_number.is_none());
        assert!(!p.is_goalie);
    }

    #[test]
    fn roster_entry_links_both_sides() {
        let team = EntityId::from_raw("t1");
        let player = EntityId::from_raw("p1");
        let entry = TeamPlayer::new(team.clone(), player.clone());
        assert_eq!(entry.team_id, team);
        assert_eq!(entry.player_id, player);
    }
}
