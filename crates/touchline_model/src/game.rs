//! Games, their event log, and on-field positions.
//!
//! Games carry no id of their own: the games collection is a map, and
//! a game's identity is the key it is stored under.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};

/// What happened at a moment in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEventKind {
    /// Our side scored.
    Goal,
    /// The opponent scored.
    OpponentGoal,
    /// A substitution was made.
    Substitution,
    /// A period ended.
    PeriodEnd,
    /// The game ended.
    GameEnd,
    /// A fair-play card was awarded.
    FairPlayCard,
}

/// One entry in a game's event log.
///
/// Events are addressed by their position in [`Game::events`]; they
/// carry no id of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Kind of event.
    pub kind: GameEventKind,
    /// Clock time of the event, seconds from kickoff.
    pub time_seconds: u64,
    /// Scoring player, for [`GameEventKind::Goal`].
    #[serde(default)]
    pub scorer_id: Option<EntityId>,
    /// Assisting player, for [`GameEventKind::Goal`].
    #[serde(default)]
    pub assister_id: Option<EntityId>,
}

impl GameEvent {
    /// Creates an event with no players attached.
    #[must_use]
    pub fn new(kind: GameEventKind, time_seconds: u64) -> Self {
        Self {
            kind,
            time_seconds,
            scorer_id: None,
            assister_id: None,
        }
    }

    /// Creates a goal event for our side.
    #[must_use]
    pub fn goal(time_seconds: u64, scorer: EntityId, assister: Option<EntityId>) -> Self {
        Self {
            kind: GameEventKind::Goal,
            time_seconds,
            scorer_id: Some(scorer),
            assister_id: assister,
        }
    }
}

/// A player's spot on the tactical board, in relative field coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPosition {
    /// The positioned player.
    pub player_id: EntityId,
    /// Horizontal position, `0.0` (left touchline) to `1.0` (right).
    pub rel_x: f64,
    /// Vertical position, `0.0` (own goal line) to `1.0` (opponent's).
    pub rel_y: f64,
}

/// A single game: metadata, score, event log, and board positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Our side's name as shown on the scoreboard.
    pub team_name: String,
    /// Opponent's name.
    pub opponent_name: String,
    /// Goals for our side.
    #[serde(default)]
    pub home_score: u32,
    /// Goals for the opponent.
    #[serde(default)]
    pub away_score: u32,
    /// Game date, ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub game_date: Option<String>,
    /// Number of periods played.
    #[serde(default = "default_period_count")]
    pub period_count: u8,
    /// Length of one period in minutes.
    #[serde(default = "default_period_duration")]
    pub period_duration_min: u32,
    /// Owning team, if the game is filed under one.
    #[serde(default)]
    pub team_id: Option<EntityId>,
    /// Season the game is filed under, if any.
    #[serde(default)]
    pub season_id: Option<EntityId>,
    /// Tournament the game is filed under, if any.
    #[serde(default)]
    pub tournament_id: Option<EntityId>,
    /// Chronological event log.
    #[serde(default)]
    pub events: Vec<GameEvent>,
    /// Current tactical-board positions.
    #[serde(default)]
    pub positions: Vec<FieldPosition>,
    /// Staff assigned to this game.
    #[serde(default)]
    pub game_personnel: Vec<EntityId>,
    /// Whether the game has been played to completion.
    #[serde(default)]
    pub is_played: bool,
}

fn default_period_count() -> u8 {
    2
}

fn default_period_duration() -> u32 {
    25
}

impl Game {
    /// Creates an unplayed game with the default format.
    #[must_use]
    pub fn new(team_name: impl Into<String>, opponent_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            opponent_name: opponent_name.into(),
            home_score: 0,
            away_score: 0,
            game_date: None,
            period_count: default_period_count(),
            period_duration_min: default_period_duration(),
            team_id: None,
            season_id: None,
            tournament_id: None,
            events: Vec::new(),
            positions: Vec::new(),
            game_personnel: Vec::new(),
            is_played: false,
        }
    }

    /// Recomputes the score from the event log.
    ///
    /// The stored score fields are the source of truth for display, but
    /// after event edits they are brought back in line with the log.
    pub fn recalculate_score(&mut self) {
        self.home_score = self
            .events
            .iter()
            .filter(|e| e.kind == GameEventKind::Goal)
            .count() as u32;
        self.away_score = self
            .events
            .iter()
            .filter(|e| e.kind == GameEventKind::OpponentGoal)
            .count() as u32;
    }

    /// Removes every reference to `personnel_id` from this game.
    ///
    /// Returns `true` if anything changed.
    pub fn remove_personnel(&mut self, personnel_id: &EntityId) -> bool {
        let before = self.game_personnel.len();
        self.game_personnel.retain(|p| p != personnel_id);
        self.game_personnel.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_on_sparse_json() {
        let g: Game =
            serde_json::from_str(r#"{"team_name":"Us","opponent_name":"Them"}"#).unwrap();
        assert_eq!(g.period_count, 2);
        assert_eq!(g.period_duration_min, 25);
        assert!(g.events.is_empty());
        assert!(!g.is_played);
    }

    #[test]
    fn recalculate_counts_both_sides() {
        let mut g = Game::new("Us", "Them");
        g.events.push(GameEvent::goal(60, EntityId::from_raw("p1"), None));
        g.events
            .push(GameEvent::new(GameEventKind::OpponentGoal, 120));
        g.events.push(GameEvent::goal(300, EntityId::from_raw("p2"), None));
        g.recalculate_score();
        assert_eq!(g.home_score, 2);
        assert_eq!(g.away_score, 1);
    }

    #[test]
    fn remove_personnel_reports_change() {
        let mut g = Game::new("Us", "Them");
        let coach = EntityId::from_raw("c1");
        g.game_personnel.push(coach.clone());
        assert!(g.remove_personnel(&coach));
        assert!(!g.remove_personnel(&coach));
        assert!(g.game_personnel.is_empty());
    }

    #[test]
    fn event_kind_serializes_snake_case() {
        let json = serde_json::to_string(&GameEventKind::FairPlayCard).unwrap();
        assert_eq!(json, r#""fair_play_card""#);
    }
}
