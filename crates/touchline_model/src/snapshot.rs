//! Whole-store snapshots and entity counting.
//!
//! A [`StoreSnapshot`] is the transfer format everywhere a full copy of
//! the data moves at once: the on-disk document, bulk import/export,
//! and both directions of migration.

use crate::adjustment::PlayerStatAdjustment;
use crate::game::Game;
use crate::grouping::{Season, Tournament};
use crate::id::EntityId;
use crate::kind::EntityKind;
use crate::personnel::Personnel;
use crate::roster::{Player, TeamPlayer};
use crate::singletons::{AppSettings, TimerState, WarmupPlan};
use crate::team::Team;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the snapshot document format.
pub const SCHEMA_VERSION: u32 = 2;

fn current_schema() -> u32 {
    SCHEMA_VERSION
}

/// A complete copy of every collection and singleton in a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StoreSnapshot {
    /// Format version of this document.
    #[serde(default = "current_schema")]
    pub schema_version: u32,
    /// Master roster players.
    #[serde(default)]
    pub players: Vec<Player>,
    /// Teams.
    #[serde(default)]
    pub teams: Vec<Team>,
    /// Team roster entries.
    #[serde(default)]
    pub rosters: Vec<TeamPlayer>,
    /// Seasons.
    #[serde(default)]
    pub seasons: Vec<Season>,
    /// Tournaments.
    #[serde(default)]
    pub tournaments: Vec<Tournament>,
    /// Club staff.
    #[serde(default)]
    pub personnel: Vec<Personnel>,
    /// Games, keyed by id.
    #[serde(default)]
    pub games: BTreeMap<EntityId, Game>,
    /// Player stat adjustments.
    #[serde(default)]
    pub adjustments: Vec<PlayerStatAdjustment>,
    /// App settings, if ever written.
    #[serde(default)]
    pub settings: Option<AppSettings>,
    /// Warmup plan, if ever written.
    #[serde(default)]
    pub warmup_plan: Option<WarmupPlan>,
    /// Timer state, if ever written.
    #[serde(default)]
    pub timer_state: Option<TimerState>,
}

impl StoreSnapshot {
    /// An empty snapshot at the current schema version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            ..Self::default()
        }
    }

    /// Whether the snapshot holds no entities at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }

    /// Counts every collection and singleton.
    #[must_use]
    pub fn counts(&self) -> EntityCounts {
        EntityCounts {
            players: self.players.len(),
            teams: self.teams.len(),
            rosters: self.rosters.len(),
            seasons: self.seasons.len(),
            tournaments: self.tournaments.len(),
            personnel: self.personnel.len(),
            games: self.games.len(),
            adjustments: self.adjustments.len(),
            has_settings: self.settings.is_some(),
            has_warmup_plan: self.warmup_plan.is_some(),
            has_timer_state: self.timer_state.is_some(),
        }
    }

    /// Ids present in one collection.
    #[must_use]
    pub fn ids_of(&self, kind: EntityKind) -> Vec<EntityId> {
        fn ids<T>(items: &[T], id: impl Fn(&T) -> &EntityId) -> Vec<EntityId> {
            items.iter().map(|t| id(t).clone()).collect()
        }
        match kind {
            EntityKind::Players => ids(&self.players, |p| &p.id),
            EntityKind::Teams => ids(&self.teams, |t| &t.id),
            EntityKind::Rosters => ids(&self.rosters, |r| &r.id),
            EntityKind::Seasons => ids(&self.seasons, |s| &s.id),
            EntityKind::Tournaments => ids(&self.tournaments, |t| &t.id),
            EntityKind::Personnel => ids(&self.personnel, |p| &p.id),
            EntityKind::Games => self.games.keys().cloned().collect(),
            EntityKind::Adjustments => ids(&self.adjustments, |a| &a.id),
            EntityKind::Settings | EntityKind::WarmupPlan | EntityKind::TimerState => Vec::new(),
        }
    }
}

/// Per-kind entity counts, used in reports and count verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EntityCounts {
    /// Master roster players.
    pub players: usize,
    /// Teams.
    pub teams: usize,
    /// Team roster entries.
    pub rosters: usize,
    /// Seasons.
    pub seasons: usize,
    /// Tournaments.
    pub tournaments: usize,
    /// Club staff.
    pub personnel: usize,
    /// Games.
    pub games: usize,
    /// Player stat adjustments.
    pub adjustments: usize,
    /// Whether the settings singleton is present.
    pub has_settings: bool,
    /// Whether the warmup plan singleton is present.
    pub has_warmup_plan: bool,
    /// Whether the timer state singleton is present.
    pub has_timer_state: bool,
}

impl EntityCounts {
    /// Total entity count, singletons included.
    #[must_use]
    pub fn total(&self) -> usize {
        self.players
            + self.teams
            + self.rosters
            + self.seasons
            + self.tournaments
            + self.personnel
            + self.games
            + self.adjustments
            + usize::from(self.has_settings)
            + usize::from(self.has_warmup_plan)
            + usize::from(self.has_timer_state)
    }

    /// Count for one collection kind; singletons report 0 or 1.
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Players => self.players,
            EntityKind::Teams => self.teams,
            EntityKind::Rosters => self.rosters,
            EntityKind::Seasons => self.seasons,
            EntityKind::Tournaments => self.tournaments,
            EntityKind::Personnel => self.personnel,
            EntityKind::Games => self.games,
            EntityKind::Adjustments => self.adjustments,
            EntityKind::Settings => usize::from(self.has_settings),
            EntityKind::WarmupPlan => usize::from(self.has_warmup_plan),
            EntityKind::TimerState => usize::from(self.has_timer_state),
        }
    }

    /// Compares `self` (expected) against `actual`, one entry per kind
    /// that disagrees.
    #[must_use]
    pub fn mismatches(&self, actual: &EntityCounts) -> Vec<CountMismatch> {
        EntityKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let expected = self.get(kind);
                let got = actual.get(kind);
                (expected != got).then_some(CountMismatch {
                    kind,
                    expected,
                    actual: got,
                })
            })
            .collect()
    }
}

/// One disagreement found when verifying counts after a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountMismatch {
    /// The kind that disagrees.
    pub kind: EntityKind,
    /// How many were expected.
    pub expected: usize,
    /// How many were found.
    pub actual: usize,
}

impl std::fmt::Display for CountMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}",
            self.kind, self.expected, self.actual
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_counts_zero() {
        let snap = StoreSnapshot::new();
        assert!(snap.is_empty());
        assert_eq!(snap.counts().total(), 0);
    }

    #[test]
    fn singletons_count_as_one() {
        let mut snap = StoreSnapshot::new();
        snap.settings = Some(AppSettings::default());
        assert_eq!(snap.counts().total(), 1);
        assert!(!snap.is_empty());
    }

    #[test]
    fn mismatches_name_the_kind() {
        let mut a = StoreSnapshot::new();
        a.players.push(Player::new("A"));
        a.players.push(Player::new("B"));
        let mut b = StoreSnapshot::new();
        b.players.push(Player::new("A"));
        b.timer_state = Some(TimerState::default());

        let diffs = a.counts().mismatches(&b.counts());
        assert_eq!(diffs.len(), 2);
        assert!(diffs
            .iter()
            .any(|d| d.kind == EntityKind::Players && d.expected == 2 && d.actual == 1));
        assert!(diffs.iter().any(|d| d.kind == EntityKind::TimerState));
    }

    #[test]
    fn sparse_document_still_loads() {
        let snap: StoreSnapshot =
            serde_json::from_str(r#"{"players":[{"id":"p1","name":"Solo"}]}"#).unwrap();
        assert_eq!(snap.schema_version, SCHEMA_VERSION);
        assert_eq!(snap.players.len(), 1);
    }

    #[test]
    fn ids_of_reads_the_right_collection() {
        let mut snap = StoreSnapshot::new();
        let mut p = Player::new("A");
        p.id = EntityId::from_raw("p1");
        snap.players.push(p);
        assert_eq!(snap.ids_of(EntityKind::Players), vec![EntityId::from_raw("p1")]);
        assert!(snap.ids_of(EntityKind::Games).is_empty());
        assert!(snap.ids_of(EntityKind::Settings).is_empty());
    }
}
