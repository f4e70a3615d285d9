//! The remote transport seam.

use crate::error::RemoteResult;
use serde::{Deserialize, Serialize};
use touchline_model::{
    AppSettings, EntityCounts, EntityId, EntityKind, Game, Personnel, Player,
    PlayerStatAdjustment, Season, StoreSnapshot, Team, TeamPlayer, TimerState, Tournament,
    WarmupPlan,
};

/// One entity on the wire: the typed union of everything the remote
/// can hold. Games carry their external key; singletons carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RemoteRecord {
    /// A master roster player.
    Player(Player),
    /// A team.
    Team(Team),
    /// A roster entry.
    Roster(TeamPlayer),
    /// A season.
    Season(Season),
    /// A tournament.
    Tournament(Tournament),
    /// A staff member.
    Personnel(Personnel),
    /// A game together with its key.
    Game {
        /// The game's external key.
        id: EntityId,
        /// The game itself.
        game: Game,
    },
    /// A stat adjustment.
    Adjustment(PlayerStatAdjustment),
    /// The settings singleton.
    Settings(AppSettings),
    /// The warmup plan singleton.
    WarmupPlan(WarmupPlan),
    /// The timer state singleton.
    TimerState(TimerState),
}

impl RemoteRecord {
    /// The collection this record belongs to.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Player(_) => EntityKind::Players,
            Self::Team(_) => EntityKind::Teams,
            Self::Roster(_) => EntityKind::Rosters,
            Self::Season(_) => EntityKind::Seasons,
            Self::Tournament(_) => EntityKind::Tournaments,
            Self::Personnel(_) => EntityKind::Personnel,
            Self::Game { .. } => EntityKind::Games,
            Self::Adjustment(_) => EntityKind::Adjustments,
            Self::Settings(_) => EntityKind::Settings,
            Self::WarmupPlan(_) => EntityKind::WarmupPlan,
            Self::TimerState(_) => EntityKind::TimerState,
        }
    }

    /// The record's id; `None` for singletons.
    #[must_use]
    pub fn id(&self) -> Option<&EntityId> {
        match self {
            Self::Player(p) => Some(&p.id),
            Self::Team(t) => Some(&t.id),
            Self::Roster(r) => Some(&r.id),
            Self::Season(s) => Some(&s.id),
            Self::Tournament(t) => Some(&t.id),
            Self::Personnel(p) => Some(&p.id),
            Self::Game { id, .. } => Some(id),
            Self::Adjustment(a) => Some(&a.id),
            Self::Settings(_) | Self::WarmupPlan(_) | Self::TimerState(_) => None,
        }
    }
}

/// What a remote backend must provide.
///
/// Upserts are idempotent create-or-replace, which is what makes queued
/// replay safe to repeat. `is_online` must be answerable without
/// touching the network; callers use it as a fast-fail gate.
pub trait RemoteApi: Send + Sync {
    /// Whether the device currently has connectivity.
    fn is_online(&self) -> bool;

    /// Fetches a complete snapshot of the remote's data.
    fn fetch_snapshot(&self) -> RemoteResult<StoreSnapshot>;

    /// Fetches one record; `None` if absent. Singletons are addressed
    /// with an empty id.
    fn get(&self, kind: EntityKind, id: &EntityId) -> RemoteResult<Option<RemoteRecord>>;

    /// Creates or replaces one record.
    fn upsert(&self, record: RemoteRecord) -> RemoteResult<()>;

    /// Deletes one record; `false` if it was not there.
    fn delete(&self, kind: EntityKind, id: &EntityId) -> RemoteResult<bool>;

    /// Empties one collection (or unsets one singleton).
    fn clear(&self, kind: EntityKind) -> RemoteResult<()>;

    /// Counts every collection and singleton.
    fn counts(&self) -> RemoteResult<EntityCounts>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_kind_and_id() {
        let mut player = Player::new("Alice");
        player.id = EntityId::from_raw("p1");
        let record = RemoteRecord::Player(player);
        assert_eq!(record.kind(), EntityKind::Players);
        assert_eq!(record.id(), Some(&EntityId::from_raw("p1")));

        let settings = RemoteRecord::Settings(AppSettings::default());
        assert_eq!(settings.kind(), EntityKind::Settings);
        assert!(settings.id().is_none());
    }

    #[test]
    fn game_record_carries_its_key() {
        let record = RemoteRecord::Game {
            id: EntityId::from_raw("g1"),
            game: Game::new("Us", "Them"),
        };
        assert_eq!(record.id(), Some(&EntityId::from_raw("g1")));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "game");
        assert_eq!(json["data"]["id"], "g1");
    }

    #[test]
    fn wire_shape_is_tagged() {
        let record = RemoteRecord::Player(Player::new("Wire"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "player");
        assert!(json["data"]["name"].is_string());
    }
}
