//! Store fixtures and sample entities.
//!
//! Everything here panics on failure instead of returning errors;
//! fixtures only run inside tests, where a panic is the right way to
//! fail.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use touchline_model::{
    EntityId, Game, GameEvent, GameEventKind, Personnel, PersonnelRole, Player,
    PlayerStatAdjustment, Season, Team, TeamPlayer, Tournament,
};
use touchline_store::{DataStore, LocalStore, StoreConfig};

/// A local store with automatic cleanup.
///
/// Derefs to [`LocalStore`], so tests call contract methods directly on
/// the fixture.
pub struct TestStore {
    /// The store instance.
    pub store: Arc<LocalStore>,
    /// The temporary directory (kept alive so the files survive the test).
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a memory-backed store.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            store: Arc::new(LocalStore::in_memory()),
            _temp_dir: None,
        }
    }

    /// Creates a file-backed store in a fresh temporary directory.
    #[must_use]
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let store = LocalStore::open(temp_dir.path(), &StoreConfig::default())
            .expect("failed to open file-backed store");
        Self {
            store: Arc::new(store),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store directory if file-backed, `None` if in-memory.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().to_path_buf())
    }

    /// A shared handle to the store, for wiring into composites.
    #[must_use]
    pub fn shared(&self) -> Arc<LocalStore> {
        Arc::clone(&self.store)
    }
}

impl std::ops::Deref for TestStore {
    type Target = LocalStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test body against a fresh memory-backed store.
pub fn with_store<F, R>(f: F) -> R
where
    F: FnOnce(&LocalStore) -> R,
{
    let fixture = TestStore::memory();
    f(&fixture.store)
}

/// Runs a test body against a fresh file-backed store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&LocalStore, &Path) -> R,
{
    let fixture = TestStore::file();
    let path = fixture.path().expect("file store has a directory");
    f(&fixture.store, &path)
}

/// A player with the deterministic id `p{n}`.
#[must_use]
pub fn sample_player(n: usize) -> Player {
    let mut player = Player::new(format!("Player {n}"));
    player.id = EntityId::from_raw(format!("p{n}"));
    player.jersey_number = Some(n.to_string());
    player
}

/// A team with the deterministic id `t{n}`.
#[must_use]
pub fn sample_team(n: usize) -> Team {
    let mut team = Team::new(format!("Team {n}"));
    team.id = EntityId::from_raw(format!("t{n}"));
    team
}

/// A roster entry `r{n}` linking `player_id` into `team_id`.
#[must_use]
pub fn sample_roster_entry(n: usize, team_id: &EntityId, player_id: &EntityId) -> TeamPlayer {
    let mut entry = TeamPlayer::new(team_id.clone(), player_id.clone());
    entry.id = EntityId::from_raw(format!("r{n}"));
    entry
}

/// A season with the deterministic id `s{n}`.
#[must_use]
pub fn sample_season(n: usize) -> Season {
    let mut season = Season::new(format!("Season {n}"));
    season.id = EntityId::from_raw(format!("s{n}"));
    season
}

/// A tournament with the deterministic id `tt{n}`.
#[must_use]
pub fn sample_tournament(n: usize) -> Tournament {
    let mut tournament = Tournament::new(format!("Tournament {n}"));
    tournament.id = EntityId::from_raw(format!("tt{n}"));
    tournament
}

/// A staff member with the deterministic id `c{n}`.
#[must_use]
pub fn sample_personnel(n: usize) -> Personnel {
    let mut member = Personnel::new(format!("Coach {n}"), PersonnelRole::HeadCoach);
    member.id = EntityId::from_raw(format!("c{n}"));
    member
}

/// A played game under the deterministic key `g{n}`, one goal each way.
#[must_use]
pub fn sample_game(n: usize) -> (EntityId, Game) {
    let mut game = Game::new(format!("Team {n}"), format!("Opponent {n}"));
    game.events.push(GameEvent::goal(
        60,
        EntityId::from_raw(format!("p{n}")),
        None,
    ));
    game.events.push(GameEvent::new(GameEventKind::OpponentGoal, 120));
    game.recalculate_score();
    game.is_played = true;
    (EntityId::from_raw(format!("g{n}")), game)
}

/// An adjustment `a{n}` crediting `player_id` with one goal.
#[must_use]
pub fn sample_adjustment(n: usize, player_id: &EntityId) -> PlayerStatAdjustment {
    let mut adjustment = PlayerStatAdjustment::new(player_id.clone());
    adjustment.id = EntityId::from_raw(format!("a{n}"));
    adjustment.goals_delta = 1;
    adjustment
}

/// A complete schema-version-1 legacy archive document.
///
/// Version 1 kept jersey numbers as integers, flagged keepers with
/// `isGoalkeeper`, and logged event times in milliseconds. It has no
/// personnel or adjustments.
///
/// Contents: players `p1`/`p2`, team `t1` with both rostered, season
/// `s1`, and game `g1` (one goal at 754s), plus settings.
#[must_use]
pub fn legacy_archive_json() -> String {
    serde_json::json!({
        "schemaVersion": 1,
        "roster": [
            { "id": "p1", "name": "Alice", "jerseyNumber": 7, "isGoalkeeper": false },
            {
                "id": "p2",
                "name": "Bo",
                "jerseyNumber": 1,
                "isGoalkeeper": true,
                "notes": "shot stopper"
            }
        ],
        "teams": [
            { "id": "t1", "name": "U11 Blue", "gameType": "7v7" }
        ],
        "teamRosters": {
            "t1": [
                { "id": "r1", "playerId": "p1", "jerseyNumber": 7, "isGoalkeeper": false },
                { "id": "r2", "playerId": "p2", "jerseyNumber": 1, "isGoalkeeper": true }
            ]
        },
        "seasons": [
            { "id": "s1", "name": "Spring 2019", "startDate": "2019-03-01", "endDate": "2019-06-15" }
        ],
        "tournaments": [],
        "games": {
            "g1": {
                "teamName": "U11 Blue",
                "opponentName": "Rovers",
                "homeScore": 1,
                "awayScore": 0,
                "gameDate": "2019-04-07",
                "periodCount": 2,
                "periodDurationMin": 20,
                "teamId": "t1",
                "seasonId": "s1",
                "isPlayed": true,
                "events": [
                    { "type": "goal", "timeMs": 754000, "scorerId": "p1", "assisterId": "p2" },
                    { "type": "periodEnd", "timeMs": 1200000 },
                    { "type": "gameEnd", "timeMs": 2400000 }
                ]
            }
        },
        "settings": { "language": "en" }
    })
    .to_string()
}

/// Pre-populated stores for cross-crate scenarios.
pub mod scenarios {
    use super::*;
    use touchline_model::{AppSettings, StoreSnapshot};
    use touchline_store::read_snapshot;

    /// Seeds `store` with a small club.
    ///
    /// Three players, one team with two of them rostered, a season, a
    /// tournament, one staff member, one played game filed under all of
    /// them, one stat adjustment, and saved settings. Eleven entities
    /// in total, every collection non-empty except the warmup plan and
    /// timer state.
    pub fn seed_club(store: &dyn DataStore) {
        for n in 1..=3 {
            store.create_player(sample_player(n)).expect("seed player");
        }
        let team = store.create_team(sample_team(1)).expect("seed team");
        store
            .save_team_roster(
                &team.id,
                vec![
                    sample_roster_entry(1, &team.id, &EntityId::from_raw("p1")),
                    sample_roster_entry(2, &team.id, &EntityId::from_raw("p2")),
                ],
            )
            .expect("seed roster");
        let season = store.create_season(sample_season(1)).expect("seed season");
        let tournament = store
            .create_tournament(sample_tournament(1))
            .expect("seed tournament");
        let coach = store
            .create_personnel(sample_personnel(1))
            .expect("seed personnel");

        let (game_id, mut game) = sample_game(1);
        game.team_id = Some(team.id.clone());
        game.season_id = Some(season.id.clone());
        game.tournament_id = Some(tournament.id.clone());
        game.game_personnel.push(coach.id.clone());
        store.save_game(&game_id, game).expect("seed game");

        store
            .add_stat_adjustment(sample_adjustment(1, &EntityId::from_raw("p1")))
            .expect("seed adjustment");
        store
            .save_settings(AppSettings::default())
            .expect("seed settings");
    }

    /// A memory-backed store pre-seeded with [`seed_club`].
    #[must_use]
    pub fn populated_store() -> TestStore {
        let fixture = TestStore::memory();
        seed_club(&*fixture.store);
        fixture
    }

    /// The seeded club as a standalone snapshot.
    #[must_use]
    pub fn populated_snapshot() -> StoreSnapshot {
        let fixture = populated_store();
        read_snapshot(&*fixture.store).expect("snapshot of seeded store")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_starts_empty() {
        let fixture = TestStore::memory();
        assert_eq!(fixture.counts().unwrap().total(), 0);
        assert!(fixture.path().is_none());
    }

    #[test]
    fn file_store_has_a_directory() {
        let fixture = TestStore::file();
        assert!(fixture.path().unwrap().exists());
        fixture.create_player(sample_player(1)).unwrap();
        assert_eq!(fixture.counts().unwrap().players, 1);
    }

    #[test]
    fn seeded_club_counts() {
        let fixture = scenarios::populated_store();
        let counts = fixture.counts().unwrap();
        assert_eq!(counts.players, 3);
        assert_eq!(counts.teams, 1);
        assert_eq!(counts.rosters, 2);
        assert_eq!(counts.seasons, 1);
        assert_eq!(counts.tournaments, 1);
        assert_eq!(counts.personnel, 1);
        assert_eq!(counts.games, 1);
        assert_eq!(counts.adjustments, 1);
        assert!(counts.has_settings);
        assert!(!counts.has_warmup_plan);
        assert_eq!(counts.total(), 11);
    }

    #[test]
    fn seeded_snapshot_matches_store() {
        let snapshot = scenarios::populated_snapshot();
        assert_eq!(snapshot.counts().total(), 11);
        assert!(snapshot.games.contains_key(&EntityId::from_raw("g1")));
    }

    #[test]
    fn legacy_archive_parses_as_json() {
        let value: serde_json::Value =
            serde_json::from_str(&legacy_archive_json()).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["roster"].as_array().unwrap().len(), 2);
        assert_eq!(value["games"]["g1"]["events"][0]["timeMs"], 754000);
    }
}
