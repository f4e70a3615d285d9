//! Field-level validation and referential integrity checks.
//!
//! Field-level checks ([`Validate`], [`validate_all`]) are hard errors:
//! a store refuses to persist an entity that fails them. Cross-entity
//! reference checks ([`integrity_warnings`]) are advisory only, since a
//! game may legitimately mention a player who was deleted later.

use crate::adjustment::PlayerStatAdjustment;
use crate::game::Game;
use crate::grouping::{Season, Tournament};
use crate::id::EntityId;
use crate::kind::EntityKind;
use crate::personnel::Personnel;
use crate::roster::{Player, TeamPlayer};
use crate::snapshot::StoreSnapshot;
use crate::team::Team;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// A validation failure, naming the entity and the problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// What failed, and on which entity.
    pub message: String,
}

impl ValidationError {
    /// Builds an error scoped to one entity.
    #[must_use]
    pub fn entity(kind: EntityKind, id: &EntityId, problem: impl AsRef<str>) -> Self {
        Self {
            message: format!("{kind} {id}: {}", problem.as_ref()),
        }
    }

    /// Builds an error scoped to a whole collection.
    #[must_use]
    pub fn collection(kind: EntityKind, problem: impl AsRef<str>) -> Self {
        Self {
            message: format!("{kind}: {}", problem.as_ref()),
        }
    }
}

/// Access to the id that keys an entity within its collection.
pub trait Keyed {
    /// The collection this entity type belongs to.
    const KIND: EntityKind;

    /// The entity's id.
    fn key(&self) -> &EntityId;
}

macro_rules! impl_keyed {
    ($ty:ty, $kind:expr) => {
        impl Keyed for $ty {
            const KIND: EntityKind = $kind;

            fn key(&self) -> &EntityId {
                &self.id
            }
        }
    };
}

impl_keyed!(Player, EntityKind::Players);
impl_keyed!(Team, EntityKind::Teams);
impl_keyed!(TeamPlayer, EntityKind::Rosters);
impl_keyed!(Season, EntityKind::Seasons);
impl_keyed!(Tournament, EntityKind::Tournaments);
impl_keyed!(Personnel, EntityKind::Personnel);
impl_keyed!(PlayerStatAdjustment, EntityKind::Adjustments);

/// Field-level checks an entity must pass before it is stored.
pub trait Validate {
    /// Checks this entity's own fields; references are not resolved.
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require_id(kind: EntityKind, id: &EntityId) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::collection(kind, "entity has an empty id"));
    }
    Ok(())
}

fn require_name(kind: EntityKind, id: &EntityId, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::entity(kind, id, "name is empty"));
    }
    Ok(())
}

fn require_date_order(
    kind: EntityKind,
    id: &EntityId,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(), ValidationError> {
    // ISO dates order lexicographically.
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(ValidationError::entity(
                kind,
                id,
                format!("start_date {start} is after end_date {end}"),
            ));
        }
    }
    Ok(())
}

impl Validate for Player {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id(Self::KIND, &self.id)?;
        require_name(Self::KIND, &self.id, &self.name)
    }
}

impl Validate for Team {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id(Self::KIND, &self.id)?;
        require_name(Self::KIND, &self.id, &self.name)
    }
}

impl Validate for TeamPlayer {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id(Self::KIND, &self.id)?;
        if self.team_id.is_empty() {
            return Err(ValidationError::entity(Self::KIND, &self.id, "team_id is empty"));
        }
        if self.player_id.is_empty() {
            return Err(ValidationError::entity(
                Self::KIND,
                &self.id,
                "player_id is empty",
            ));
        }
        Ok(())
    }
}

impl Validate for Season {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id(Self::KIND, &self.id)?;
        require_name(Self::KIND, &self.id, &self.name)?;
        require_date_order(
            Self::KIND,
            &self.id,
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )
    }
}

impl Validate for Tournament {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id(Self::KIND, &self.id)?;
        require_name(Self::KIND, &self.id, &self.name)?;
        require_date_order(
            Self::KIND,
            &self.id,
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )
    }
}

impl Validate for Personnel {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id(Self::KIND, &self.id)?;
        require_name(Self::KIND, &self.id, &self.name)
    }
}

impl Validate for PlayerStatAdjustment {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id(Self::KIND, &self.id)?;
        if self.player_id.is_empty() {
            return Err(ValidationError::entity(
                Self::KIND,
                &self.id,
                "player_id is empty",
            ));
        }
        Ok(())
    }
}

/// Validates one game under its collection key.
pub fn validate_game(id: &EntityId, game: &Game) -> Result<(), ValidationError> {
    require_id(EntityKind::Games, id)?;
    if game.team_name.trim().is_empty() {
        return Err(ValidationError::entity(
            EntityKind::Games,
            id,
            "team_name is empty",
        ));
    }
    if game.period_count == 0 {
        return Err(ValidationError::entity(
            EntityKind::Games,
            id,
            "period_count must be at least 1",
        ));
    }
    if game.period_duration_min == 0 {
        return Err(ValidationError::entity(
            EntityKind::Games,
            id,
            "period_duration_min must be at least 1",
        ));
    }
    for pos in &game.positions {
        let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_range(pos.rel_x) || !in_range(pos.rel_y) {
            return Err(ValidationError::entity(
                EntityKind::Games,
                id,
                format!(
                    "position for player {} is outside the field ({}, {})",
                    pos.player_id, pos.rel_x, pos.rel_y
                ),
            ));
        }
    }
    Ok(())
}

/// Validates a whole slice of one keyed collection: every member's
/// fields, plus id uniqueness across the slice. First failure wins.
pub fn validate_collection<T: Keyed + Validate>(items: &[T]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        item.validate()?;
        if !seen.insert(item.key().as_str().to_owned()) {
            return Err(ValidationError::collection(
                T::KIND,
                format!("duplicate id {}", item.key()),
            ));
        }
    }
    Ok(())
}

/// Validates every game in a keyed map.
pub fn validate_games(games: &BTreeMap<EntityId, Game>) -> Result<(), ValidationError> {
    for (id, game) in games {
        validate_game(id, game)?;
    }
    Ok(())
}

/// Validates every collection in a snapshot. First failure wins.
pub fn validate_all(snapshot: &StoreSnapshot) -> Result<(), ValidationError> {
    validate_collection(&snapshot.players)?;
    validate_collection(&snapshot.teams)?;
    validate_collection(&snapshot.rosters)?;
    validate_collection(&snapshot.seasons)?;
    validate_collection(&snapshot.tournaments)?;
    validate_collection(&snapshot.personnel)?;
    validate_collection(&snapshot.adjustments)?;
    validate_games(&snapshot.games)
}

/// Reports cross-entity references that do not resolve.
///
/// Advisory only: a populated return is safe to store and sync, it just
/// means some links point at entities that no longer exist.
#[must_use]
pub fn integrity_warnings(snapshot: &StoreSnapshot) -> Vec<String> {
    let players: HashSet<&str> = snapshot.players.iter().map(|p| p.id.as_str()).collect();
    let teams: HashSet<&str> = snapshot.teams.iter().map(|t| t.id.as_str()).collect();
    let seasons: HashSet<&str> = snapshot.seasons.iter().map(|s| s.id.as_str()).collect();
    let tournaments: HashSet<&str> = snapshot.tournaments.iter().map(|t| t.id.as_str()).collect();
    let personnel: HashSet<&str> = snapshot.personnel.iter().map(|p| p.id.as_str()).collect();

    let mut warnings = Vec::new();
    let mut missing = |from: String, kind: EntityKind, target: &EntityId| {
        warnings.push(format!("{from} references missing {kind} {target}"));
    };

    for entry in &snapshot.rosters {
        if !teams.contains(entry.team_id.as_str()) {
            missing(format!("rosters {}", entry.id), EntityKind::Teams, &entry.team_id);
        }
        if !players.contains(entry.player_id.as_str()) {
            missing(
                format!("rosters {}", entry.id),
                EntityKind::Players,
                &entry.player_id,
            );
        }
    }
    for adj in &snapshot.adjustments {
        if !players.contains(adj.player_id.as_str()) {
            missing(
                format!("adjustments {}", adj.id),
                EntityKind::Players,
                &adj.player_id,
            );
        }
    }
    for (id, game) in &snapshot.games {
        if let Some(team_id) = &game.team_id {
            if !teams.contains(team_id.as_str()) {
                missing(format!("games {id}"), EntityKind::Teams, team_id);
            }
        }
        if let Some(season_id) = &game.season_id {
            if !seasons.contains(season_id.as_str()) {
                missing(format!("games {id}"), EntityKind::Seasons, season_id);
            }
        }
        if let Some(tournament_id) = &game.tournament_id {
            if !tournaments.contains(tournament_id.as_str()) {
                missing(format!("games {id}"), EntityKind::Tournaments, tournament_id);
            }
        }
        for member in &game.game_personnel {
            if !personnel.contains(member.as_str()) {
                missing(format!("games {id}"), EntityKind::Personnel, member);
            }
        }
    }
    if let Some(settings) = &snapshot.settings {
        if let Some(current) = &settings.current_game_id {
            if !snapshot.games.contains_key(current) {
                missing("settings".to_owned(), EntityKind::Games, current);
            }
        }
    }
    if let Some(timer) = &snapshot.timer_state {
        if let Some(game_id) = &timer.game_id {
            if !snapshot.games.contains_key(game_id) {
                missing("timer_state".to_owned(), EntityKind::Games, game_id);
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::singletons::AppSettings;

    #[test]
    fn blank_name_is_rejected() {
        let mut p = Player::new("  ");
        p.id = EntityId::from_raw("p1");
        let err = p.validate().unwrap_err();
        assert!(err.message.contains("name is empty"), "{}", err.message);
    }

    #[test]
    fn empty_id_is_rejected() {
        let mut p = Player::new("Fine Name");
        p.id = EntityId::from_raw("");
        assert!(p.validate().is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut a = Player::new("A");
        a.id = EntityId::from_raw("p1");
        let mut b = Player::new("B");
        b.id = EntityId::from_raw("p1");
        let err = validate_collection(&[a, b]).unwrap_err();
        assert!(err.message.contains("duplicate id p1"), "{}", err.message);
    }

    #[test]
    fn season_dates_must_be_ordered() {
        let mut s = Season::new("Backwards");
        s.start_date = Some("2026-09-01".into());
        s.end_date = Some("2026-05-01".into());
        assert!(s.validate().is_err());

        s.end_date = Some("2026-09-01".into());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn game_format_bounds_are_enforced() {
        let mut games = BTreeMap::new();
        let mut g = Game::new("Us", "Them");
        g.period_count = 0;
        games.insert(EntityId::from_raw("g1"), g);
        assert!(validate_games(&games).is_err());
    }

    #[test]
    fn position_off_the_field_is_rejected() {
        let mut g = Game::new("Us", "Them");
        g.positions.push(crate::game::FieldPosition {
            player_id: EntityId::from_raw("p1"),
            rel_x: 1.5,
            rel_y: 0.5,
        });
        let mut games = BTreeMap::new();
        games.insert(EntityId::from_raw("g1"), g);
        let err = validate_games(&games).unwrap_err();
        assert!(err.message.contains("outside the field"), "{}", err.message);
    }

    #[test]
    fn integrity_warnings_cover_dangling_links() {
        let mut snap = StoreSnapshot::new();
        snap.rosters
            .push(TeamPlayer::new(EntityId::from_raw("t-gone"), EntityId::from_raw("p-gone")));
        snap.settings = Some(AppSettings {
            current_game_id: Some(EntityId::from_raw("g-gone")),
            ..AppSettings::default()
        });

        let warnings = integrity_warnings(&snap);
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("t-gone")));
        assert!(warnings.iter().any(|w| w.contains("p-gone")));
        assert!(warnings.iter().any(|w| w.contains("g-gone")));
    }

    #[test]
    fn clean_snapshot_has_no_warnings() {
        let mut snap = StoreSnapshot::new();
        let mut player = Player::new("A");
        player.id = EntityId::from_raw("p1");
        let mut team = Team::new("T");
        team.id = EntityId::from_raw("t1");
        snap.rosters.push(TeamPlayer::new(
            EntityId::from_raw("t1"),
            EntityId::from_raw("p1"),
        ));
        snap.players.push(player);
        snap.teams.push(team);
        assert!(validate_all(&snap).is_ok());
        assert!(integrity_warnings(&snap).is_empty());
    }
}
