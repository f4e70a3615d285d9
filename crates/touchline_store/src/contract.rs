//! The store contract every backend implements.

use crate::error::StoreResult;
use std::collections::BTreeMap;
use touchline_model::{
    AppSettings, EntityCounts, EntityId, Game, GameEvent, Personnel, Player,
    PlayerStatAdjustment, Season, StoreSnapshot, Team, TeamPlayer, TimerState, Tournament,
    WarmupPlan, SCHEMA_VERSION,
};

/// What a personnel delete touched besides the member itself.
///
/// Deleting a staff member also strips them from every game's
/// assignment list; callers that mirror writes elsewhere need to know
/// which games changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonnelRemoval {
    /// Games whose personnel list was edited by the cascade.
    pub games_updated: Vec<EntityId>,
}

/// The backend-agnostic store surface.
///
/// Implemented by the local store, the remote store, and the
/// synchronized composite, so higher layers are written once against
/// this trait. Semantics every implementation honors:
///
/// - Absence is `Ok(None)` / `Ok(false)`, never an error.
/// - `create_*` rejects an already-present id with `AlreadyExists`;
///   an empty id is replaced with a fresh one.
/// - `update_*` of a missing entity is `Ok(None)` and writes nothing.
/// - Bulk `save_*` replaces the whole collection, validating every
///   member before writing any.
/// - Games are addressed by an externally supplied key; `save_game` is
///   an upsert under that key.
/// - Game events are addressed by index; a stale index past the end of
///   the log is a `Validation` error, so callers must re-fetch after
///   structural changes.
///
/// Lifecycle (open/close) is implementation-specific and deliberately
/// not part of the contract.
pub trait DataStore: Send + Sync {
    // Players

    /// Lists all players.
    fn players(&self) -> StoreResult<Vec<Player>>;
    /// Creates a player; fails with `AlreadyExists` on id collision.
    fn create_player(&self, player: Player) -> StoreResult<Player>;
    /// Replaces an existing player; `None` if it does not exist.
    fn update_player(&self, player: Player) -> StoreResult<Option<Player>>;
    /// Deletes a player and that player's stat adjustments.
    /// Returns `false` if the player did not exist.
    fn delete_player(&self, id: &EntityId) -> StoreResult<bool>;
    /// Replaces the whole players collection.
    fn save_players(&self, players: Vec<Player>) -> StoreResult<Vec<Player>>;

    // Teams

    /// Lists all teams.
    fn teams(&self) -> StoreResult<Vec<Team>>;
    /// Fetches one team.
    fn team(&self, id: &EntityId) -> StoreResult<Option<Team>>;
    /// Creates a team; fails with `AlreadyExists` on id collision.
    fn create_team(&self, team: Team) -> StoreResult<Team>;
    /// Replaces an existing team; `None` if it does not exist.
    fn update_team(&self, team: Team) -> StoreResult<Option<Team>>;
    /// Deletes a team and its roster entries.
    /// Returns `false` if the team did not exist.
    fn delete_team(&self, id: &EntityId) -> StoreResult<bool>;
    /// Replaces the whole teams collection.
    fn save_teams(&self, teams: Vec<Team>) -> StoreResult<Vec<Team>>;

    // Rosters

    /// Lists every roster entry across all teams.
    fn rosters(&self) -> StoreResult<Vec<TeamPlayer>>;
    /// Lists one team's roster.
    fn team_roster(&self, team_id: &EntityId) -> StoreResult<Vec<TeamPlayer>>;
    /// Replaces one team's roster, leaving other teams' entries alone.
    /// Every entry must carry the given `team_id`.
    fn save_team_roster(
        &self,
        team_id: &EntityId,
        roster: Vec<TeamPlayer>,
    ) -> StoreResult<Vec<TeamPlayer>>;

    // Seasons

    /// Lists all seasons.
    fn seasons(&self) -> StoreResult<Vec<Season>>;
    /// Creates a season; fails with `AlreadyExists` on id collision.
    fn create_season(&self, season: Season) -> StoreResult<Season>;
    /// Replaces an existing season; `None` if it does not exist.
    fn update_season(&self, season: Season) -> StoreResult<Option<Season>>;
    /// Deletes a season. Games keep their `season_id` link.
    fn delete_season(&self, id: &EntityId) -> StoreResult<bool>;
    /// Replaces the whole seasons collection.
    fn save_seasons(&self, seasons: Vec<Season>) -> StoreResult<Vec<Season>>;

    // Tournaments

    /// Lists all tournaments.
    fn tournaments(&self) -> StoreResult<Vec<Tournament>>;
    /// Creates a tournament; fails with `AlreadyExists` on id collision.
    fn create_tournament(&self, tournament: Tournament) -> StoreResult<Tournament>;
    /// Replaces an existing tournament; `None` if it does not exist.
    fn update_tournament(&self, tournament: Tournament) -> StoreResult<Option<Tournament>>;
    /// Deletes a tournament. Games keep their `tournament_id` link.
    fn delete_tournament(&self, id: &EntityId) -> StoreResult<bool>;
    /// Replaces the whole tournaments collection.
    fn save_tournaments(&self, tournaments: Vec<Tournament>) -> StoreResult<Vec<Tournament>>;

    // Personnel

    /// Lists all staff members.
    fn personnel(&self) -> StoreResult<Vec<Personnel>>;
    /// Fetches one staff member.
    fn personnel_member(&self, id: &EntityId) -> StoreResult<Option<Personnel>>;
    /// Creates a staff member; fails with `AlreadyExists` on id collision.
    fn create_personnel(&self, member: Personnel) -> StoreResult<Personnel>;
    /// Replaces an existing staff member; `None` if it does not exist.
    fn update_personnel(&self, member: Personnel) -> StoreResult<Option<Personnel>>;
    /// Deletes a staff member and strips them from every game's
    /// assignment list. `None` if the member did not exist; otherwise
    /// the removal record names the games that changed.
    fn delete_personnel(&self, id: &EntityId) -> StoreResult<Option<PersonnelRemoval>>;
    /// Replaces the whole personnel collection.
    fn save_personnel(&self, members: Vec<Personnel>) -> StoreResult<Vec<Personnel>>;

    // Games

    /// Returns every game, keyed by id.
    fn games(&self) -> StoreResult<BTreeMap<EntityId, Game>>;
    /// Fetches one game.
    fn game(&self, id: &EntityId) -> StoreResult<Option<Game>>;
    /// Upserts a game under the caller's key.
    fn save_game(&self, id: &EntityId, game: Game) -> StoreResult<Game>;
    /// Deletes a game. Returns `false` if it did not exist.
    fn delete_game(&self, id: &EntityId) -> StoreResult<bool>;
    /// Replaces the whole games collection; returns how many were stored.
    fn save_games(&self, games: BTreeMap<EntityId, Game>) -> StoreResult<usize>;

    // Game events

    /// Appends an event to a game's log and rebalances the score.
    /// `None` if the game does not exist.
    fn add_game_event(&self, game_id: &EntityId, event: GameEvent) -> StoreResult<Option<Game>>;
    /// Replaces the event at `index`. `None` if the game does not
    /// exist; a `Validation` error if `index` is out of range.
    fn update_game_event(
        &self,
        game_id: &EntityId,
        index: usize,
        event: GameEvent,
    ) -> StoreResult<Option<Game>>;
    /// Removes the event at `index`. Same absence/range semantics as
    /// [`DataStore::update_game_event`].
    fn remove_game_event(&self, game_id: &EntityId, index: usize) -> StoreResult<Option<Game>>;

    // Stat adjustments

    /// Lists all stat adjustments.
    fn stat_adjustments(&self) -> StoreResult<Vec<PlayerStatAdjustment>>;
    /// Records a stat adjustment; fails with `AlreadyExists` on id collision.
    fn add_stat_adjustment(
        &self,
        adjustment: PlayerStatAdjustment,
    ) -> StoreResult<PlayerStatAdjustment>;
    /// Deletes a stat adjustment. Returns `false` if it did not exist.
    fn delete_stat_adjustment(&self, id: &EntityId) -> StoreResult<bool>;
    /// Replaces the whole adjustments collection.
    fn save_stat_adjustments(
        &self,
        adjustments: Vec<PlayerStatAdjustment>,
    ) -> StoreResult<Vec<PlayerStatAdjustment>>;

    // Singletons

    /// Reads the settings singleton, if it was ever written.
    fn settings(&self) -> StoreResult<Option<AppSettings>>;
    /// Overwrites the settings singleton.
    fn save_settings(&self, settings: AppSettings) -> StoreResult<AppSettings>;
    /// Reads the warmup plan singleton, if it was ever written.
    fn warmup_plan(&self) -> StoreResult<Option<WarmupPlan>>;
    /// Overwrites the warmup plan singleton.
    fn save_warmup_plan(&self, plan: WarmupPlan) -> StoreResult<WarmupPlan>;
    /// Reads the timer state singleton, if it was ever written.
    fn timer_state(&self) -> StoreResult<Option<TimerState>>;
    /// Overwrites the timer state singleton.
    fn save_timer_state(&self, state: TimerState) -> StoreResult<TimerState>;

    /// Counts every collection and singleton.
    fn counts(&self) -> StoreResult<EntityCounts>;
}

/// Reads a complete snapshot out of any store.
///
/// Collections are read one at a time; against a concurrently written
/// store the snapshot is per-collection consistent, not global.
pub fn read_snapshot(store: &dyn DataStore) -> StoreResult<StoreSnapshot> {
    Ok(StoreSnapshot {
        schema_version: SCHEMA_VERSION,
        players: store.players()?,
        teams: store.teams()?,
        rosters: store.rosters()?,
        seasons: store.seasons()?,
        tournaments: store.tournaments()?,
        personnel: store.personnel()?,
        games: store.games()?,
        adjustments: store.stat_adjustments()?,
        settings: store.settings()?,
        warmup_plan: store.warmup_plan()?,
        timer_state: store.timer_state()?,
    })
}
