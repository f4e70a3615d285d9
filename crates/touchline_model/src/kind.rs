//! Entity kinds and the canonical collection names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every kind of entity the store holds.
///
/// The `as_str` names double as collection names on disk and field
/// names in snapshots, so they are part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Master roster players.
    Players,
    /// Teams.
    Teams,
    /// Team roster entries.
    Rosters,
    /// Seasons.
    Seasons,
    /// Tournaments.
    Tournaments,
    /// Club staff.
    Personnel,
    /// Games.
    Games,
    /// Player stat adjustments.
    Adjustments,
    /// The app settings singleton.
    Settings,
    /// The warmup plan singleton.
    WarmupPlan,
    /// The timer state singleton.
    TimerState,
}

impl EntityKind {
    /// Every kind, singletons included.
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Players,
        EntityKind::Teams,
        EntityKind::Rosters,
        EntityKind::Seasons,
        EntityKind::Tournaments,
        EntityKind::Personnel,
        EntityKind::Games,
        EntityKind::Adjustments,
        EntityKind::Settings,
        EntityKind::WarmupPlan,
        EntityKind::TimerState,
    ];

    /// The id-addressed collections, in dependency order.
    pub const COLLECTIONS: [EntityKind; 8] = [
        EntityKind::Players,
        EntityKind::Teams,
        EntityKind::Rosters,
        EntityKind::Seasons,
        EntityKind::Tournaments,
        EntityKind::Personnel,
        EntityKind::Games,
        EntityKind::Adjustments,
    ];

    /// Canonical name, used on disk and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Players => "players",
            EntityKind::Teams => "teams",
            EntityKind::Rosters => "rosters",
            EntityKind::Seasons => "seasons",
            EntityKind::Tournaments => "tournaments",
            EntityKind::Personnel => "personnel",
            EntityKind::Games => "games",
            EntityKind::Adjustments => "adjustments",
            EntityKind::Settings => "settings",
            EntityKind::WarmupPlan => "warmup_plan",
            EntityKind::TimerState => "timer_state",
        }
    }

    /// Whether this kind is a singleton document rather than a collection.
    #[must_use]
    pub const fn is_singleton(self) -> bool {
        matches!(
            self,
            EntityKind::Settings | EntityKind::WarmupPlan | EntityKind::TimerState
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown entity kind: {s}"))
    }
}
