//! The cloud store: the same contract, served over a transport.
//!
//! Every call checks connectivity first and fails fast with the
//! designated offline message before touching the transport. List reads
//! go through a full snapshot fetch; cascades are driven from the
//! client so any conforming backend converges to the same state. Unlike
//! the local store there is no rollback across a cascade: child
//! records go first, so a partial failure leaves the parent in place
//! and the whole delete safe to retry.

use crate::api::{RemoteApi, RemoteRecord};
use crate::error::RemoteError;
use std::collections::BTreeMap;
use std::sync::Arc;
use touchline_model::{
    validate_collection, validate_game, validate_games, AppSettings, EntityCounts, EntityId,
    EntityKind, Game, GameEvent, Personnel, Player, PlayerStatAdjustment, Season, StoreSnapshot,
    Team, TeamPlayer, TimerState, Tournament, Validate, WarmupPlan,
};
use touchline_store::{DataStore, PersonnelRemoval, StoreError, StoreResult};

/// Singletons are addressed with an empty id on the wire.
fn singleton_id() -> EntityId {
    EntityId::from_raw("")
}

fn mismatch(kind: EntityKind, got: &RemoteRecord) -> StoreError {
    StoreError::from(RemoteError::Protocol(format!(
        "asked for {kind}, server answered with {}",
        got.kind()
    )))
}

/// A [`DataStore`] over any [`RemoteApi`].
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct RemoteStore {
    api: Arc<dyn RemoteApi>,
}

impl RemoteStore {
    /// Wraps a transport in the store contract.
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self { api }
    }

    /// Whether the device currently has a connection.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.api.is_online()
    }

    /// Fetches the entire cloud state in one call.
    pub fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        self.ensure_online()?;
        Ok(self.api.fetch_snapshot()?)
    }

    /// Empties one collection or singleton on the server.
    pub fn clear_kind(&self, kind: EntityKind) -> StoreResult<()> {
        self.ensure_online()?;
        Ok(self.api.clear(kind)?)
    }

    /// Empties everything on the server, collection by collection.
    pub fn clear_all(&self) -> StoreResult<()> {
        self.ensure_online()?;
        for kind in EntityKind::ALL {
            self.api.clear(kind)?;
        }
        Ok(())
    }

    /// Replays a queued upsert: a raw create-or-replace, no existence
    /// check, safe to repeat.
    pub fn replay_upsert(&self, record: RemoteRecord) -> StoreResult<()> {
        self.ensure_online()?;
        Ok(self.api.upsert(record)?)
    }

    /// Replays a queued delete: removing an already-absent record is
    /// success, so the replay is safe to repeat.
    pub fn replay_delete(&self, kind: EntityKind, id: &EntityId) -> StoreResult<()> {
        self.ensure_online()?;
        self.api.delete(kind, id)?;
        Ok(())
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.api.is_online() {
            Ok(())
        } else {
            Err(StoreError::from(RemoteError::Offline))
        }
    }

    fn exists(&self, kind: EntityKind, id: &EntityId) -> StoreResult<bool> {
        Ok(self.api.get(kind, id)?.is_some())
    }

    fn insert_new(&self, record: RemoteRecord) -> StoreResult<()> {
        let kind = record.kind();
        if let Some(id) = record.id() {
            if self.exists(kind, id)? {
                return Err(StoreError::AlreadyExists {
                    kind,
                    id: id.clone(),
                });
            }
        }
        Ok(self.api.upsert(record)?)
    }

    fn replace_existing(&self, record: RemoteRecord) -> StoreResult<bool> {
        let kind = record.kind();
        if let Some(id) = record.id() {
            if !self.exists(kind, id)? {
                return Ok(false);
            }
        }
        self.api.upsert(record)?;
        Ok(true)
    }
}

impl DataStore for RemoteStore {
    // Players

    fn players(&self) -> StoreResult<Vec<Player>> {
        Ok(self.snapshot()?.players)
    }

    fn create_player(&self, mut player: Player) -> StoreResult<Player> {
        self.ensure_online()?;
        if player.id.is_empty() {
            player.id = EntityId::new();
        }
        player.validate()?;
        self.insert_new(RemoteRecord::Player(player.clone()))?;
        Ok(player)
    }

    fn update_player(&self, player: Player) -> StoreResult<Option<Player>> {
        self.ensure_online()?;
        player.validate()?;
        if self.replace_existing(RemoteRecord::Player(player.clone()))? {
            Ok(Some(player))
        } else {
            Ok(None)
        }
    }

    fn delete_player(&self, id: &EntityId) -> StoreResult<bool> {
        self.ensure_online()?;
        if !self.exists(EntityKind::Players, id)? {
            return Ok(false);
        }
        let snapshot = self.api.fetch_snapshot()?;
        for adjustment in &snapshot.adjustments {
            if &adjustment.player_id == id {
                self.api.delete(EntityKind::Adjustments, &adjustment.id)?;
            }
        }
        self.api.delete(EntityKind::Players, id)?;
        Ok(true)
    }

    fn save_players(&self, players: Vec<Player>) -> StoreResult<Vec<Player>> {
        self.ensure_online()?;
        validate_collection(&players)?;
        self.api.clear(EntityKind::Players)?;
        for player in &players {
            self.api.upsert(RemoteRecord::Player(player.clone()))?;
        }
        Ok(players)
    }

    // Teams

    fn teams(&self) -> StoreResult<Vec<Team>> {
        Ok(self.snapshot()?.teams)
    }

    fn team(&self, id: &EntityId) -> StoreResult<Option<Team>> {
        self.ensure_online()?;
        match self.api.get(EntityKind::Teams, id)? {
            Some(RemoteRecord::Team(team)) => Ok(Some(team)),
            Some(other) => Err(mismatch(EntityKind::Teams, &other)),
            None => Ok(None),
        }
    }

    fn create_team(&self, mut team: Team) -> StoreResult<Team> {
        self.ensure_online()?;
        if team.id.is_empty() {
            team.id = EntityId::new();
        }
        team.validate()?;
        self.insert_new(RemoteRecord::Team(team.clone()))?;
        Ok(team)
    }

    fn update_team(&self, mut team: Team) -> StoreResult<Option<Team>> {
        self.ensure_online()?;
        team.touch();
        team.validate()?;
        if self.replace_existing(RemoteRecord::Team(team.clone()))? {
            Ok(Some(team))
        } else {
            Ok(None)
        }
    }

    fn delete_team(&self, id: &EntityId) -> StoreResult<bool> {
        self.ensure_online()?;
        if !self.exists(EntityKind::Teams, id)? {
            return Ok(false);
        }
        let snapshot = self.api.fetch_snapshot()?;
        for entry in &snapshot.rosters {
            if &entry.team_id == id {
                self.api.delete(EntityKind::Rosters, &entry.id)?;
            }
        }
        self.api.delete(EntityKind::Teams, id)?;
        Ok(true)
    }

    fn save_teams(&self, teams: Vec<Team>) -> StoreResult<Vec<Team>> {
        self.ensure_online()?;
        validate_collection(&teams)?;
        self.api.clear(EntityKind::Teams)?;
        for team in &teams {
            self.api.upsert(RemoteRecord::Team(team.clone()))?;
        }
        Ok(teams)
    }

    // Rosters

    fn rosters(&self) -> StoreResult<Vec<TeamPlayer>> {
        Ok(self.snapshot()?.rosters)
    }

    fn team_roster(&self, team_id: &EntityId) -> StoreResult<Vec<TeamPlayer>> {
        Ok(self
            .snapshot()?
            .rosters
            .into_iter()
            .filter(|entry| &entry.team_id == team_id)
            .collect())
    }

    fn save_team_roster(
        &self,
        team_id: &EntityId,
        roster: Vec<TeamPlayer>,
    ) -> StoreResult<Vec<TeamPlayer>> {
        self.ensure_online()?;
        for entry in &roster {
            if &entry.team_id != team_id {
                return Err(StoreError::validation(format!(
                    "rosters {}: entry belongs to team {}, not {team_id}",
                    entry.id, entry.team_id
                )));
            }
        }
        let snapshot = self.api.fetch_snapshot()?;
        let mut combined: Vec<TeamPlayer> = snapshot
            .rosters
            .iter()
            .filter(|entry| &entry.team_id != team_id)
            .cloned()
            .collect();
        combined.extend(roster.iter().cloned());
        validate_collection(&combined)?;

        for old in snapshot.rosters.iter().filter(|e| &e.team_id == team_id) {
            if !roster.iter().any(|new| new.id == old.id) {
                self.api.delete(EntityKind::Rosters, &old.id)?;
            }
        }
        for entry in &roster {
            self.api.upsert(RemoteRecord::Roster(entry.clone()))?;
        }
        Ok(roster)
    }

    // Seasons

    fn seasons(&self) -> StoreResult<Vec<Season>> {
        Ok(self.snapshot()?.seasons)
    }

    fn create_season(&self, mut season: Season) -> StoreResult<Season> {
        self.ensure_online()?;
        if season.id.is_empty() {
            season.id = EntityId::new();
        }
        season.validate()?;
        self.insert_new(RemoteRecord::Season(season.clone()))?;
        Ok(season)
    }

    fn update_season(&self, season: Season) -> StoreResult<Option<Season>> {
        self.ensure_online()?;
        season.validate()?;
        if self.replace_existing(RemoteRecord::Season(season.clone()))? {
            Ok(Some(season))
        } else {
            Ok(None)
        }
    }

    fn delete_season(&self, id: &EntityId) -> StoreResult<bool> {
        self.ensure_online()?;
        Ok(self.api.delete(EntityKind::Seasons, id)?)
    }

    fn save_seasons(&self, seasons: Vec<Season>) -> StoreResult<Vec<Season>> {
        self.ensure_online()?;
        validate_collection(&seasons)?;
        self.api.clear(EntityKind::Seasons)?;
        for season in &seasons {
            self.api.upsert(RemoteRecord::Season(season.clone()))?;
        }
        Ok(seasons)
    }

    // Tournaments

    fn tournaments(&self) -> StoreResult<Vec<Tournament>> {
        Ok(self.snapshot()?.tournaments)
    }

    fn create_tournament(&self, mut tournament: Tournament) -> StoreResult<Tournament> {
        self.ensure_online()?;
        if tournament.id.is_empty() {
            tournament.id = EntityId::new();
        }
        tournament.validate()?;
        self.insert_new(RemoteRecord::Tournament(tournament.clone()))?;
        Ok(tournament)
    }

    fn update_tournament(&self, tournament: Tournament) -> StoreResult<Option<Tournament>> {
        self.ensure_online()?;
        tournament.validate()?;
        if self.replace_existing(RemoteRecord::Tournament(tournament.clone()))? {
            Ok(Some(tournament))
        } else {
            Ok(None)
        }
    }

    fn delete_tournament(&self, id: &EntityId) -> StoreResult<bool> {
        self.ensure_online()?;
        Ok(self.api.delete(EntityKind::Tournaments, id)?)
    }

    fn save_tournaments(&self, tournaments: Vec<Tournament>) -> StoreResult<Vec<Tournament>> {
        self.ensure_online()?;
        validate_collection(&tournaments)?;
        self.api.clear(EntityKind::Tournaments)?;
        for tournament in &tournaments {
            self.api.upsert(RemoteRecord::Tournament(tournament.clone()))?;
        }
        Ok(tournaments)
    }

    // Personnel

    fn personnel(&self) -> StoreResult<Vec<Personnel>> {
        Ok(self.snapshot()?.personnel)
    }

    fn personnel_member(&self, id: &EntityId) -> StoreResult<Option<Personnel>> {
        self.ensure_online()?;
        match self.api.get(EntityKind::Personnel, id)? {
            Some(RemoteRecord::Personnel(member)) => Ok(Some(member)),
            Some(other) => Err(mismatch(EntityKind::Personnel, &other)),
            None => Ok(None),
        }
    }

    fn create_personnel(&self, mut member: Personnel) -> StoreResult<Personnel> {
        self.ensure_online()?;
        if member.id.is_empty() {
            member.id = EntityId::new();
        }
        member.validate()?;
        self.insert_new(RemoteRecord::Personnel(member.clone()))?;
        Ok(member)
    }

    fn update_personnel(&self, mut member: Personnel) -> StoreResult<Option<Personnel>> {
        self.ensure_online()?;
        member.touch();
        member.validate()?;
        if self.replace_existing(RemoteRecord::Personnel(member.clone()))? {
            Ok(Some(member))
        } else {
            Ok(None)
        }
    }

    fn delete_personnel(&self, id: &EntityId) -> StoreResult<Option<PersonnelRemoval>> {
        self.ensure_online()?;
        if !self.exists(EntityKind::Personnel, id)? {
            return Ok(None);
        }
        // Strip the member from games before deleting the member, so a
        // partial failure can be retried from the top.
        let snapshot = self.api.fetch_snapshot()?;
        let mut games_updated = Vec::new();
        for (game_id, game) in &snapshot.games {
            if game.game_personnel.contains(id) {
                let mut stripped = game.clone();
                stripped.remove_personnel(id);
                self.api.upsert(RemoteRecord::Game {
                    id: game_id.clone(),
                    game: stripped,
                })?;
                games_updated.push(game_id.clone());
            }
        }
        self.api.delete(EntityKind::Personnel, id)?;
        Ok(Some(PersonnelRemoval { games_updated }))
    }

    fn save_personnel(&self, members: Vec<Personnel>) -> StoreResult<Vec<Personnel>> {
        self.ensure_online()?;
        validate_collection(&members)?;
        self.api.clear(EntityKind::Personnel)?;
        for member in &members {
            self.api.upsert(RemoteRecord::Personnel(member.clone()))?;
        }
        Ok(members)
    }

    // Games

    fn games(&self) -> StoreResult<BTreeMap<EntityId, Game>> {
        Ok(self.snapshot()?.games)
    }

    fn game(&self, id: &EntityId) -> StoreResult<Option<Game>> {
        self.ensure_online()?;
        match self.api.get(EntityKind::Games, id)? {
            Some(RemoteRecord::Game { game, .. }) => Ok(Some(game)),
            Some(other) => Err(mismatch(EntityKind::Games, &other)),
            None => Ok(None),
        }
    }

    fn save_game(&self, id: &EntityId, game: Game) -> StoreResult<Game> {
        self.ensure_online()?;
        validate_game(id, &game)?;
        self.api.upsert(RemoteRecord::Game {
            id: id.clone(),
            game: game.clone(),
        })?;
        Ok(game)
    }

    fn delete_game(&self, id: &EntityId) -> StoreResult<bool> {
        self.ensure_online()?;
        Ok(self.api.delete(EntityKind::Games, id)?)
    }

    fn save_games(&self, games: BTreeMap<EntityId, Game>) -> StoreResult<usize> {
        self.ensure_online()?;
        validate_games(&games)?;
        self.api.clear(EntityKind::Games)?;
        let mut stored = 0;
        for (id, game) in &games {
            self.api.upsert(RemoteRecord::Game {
                id: id.clone(),
                game: game.clone(),
            })?;
            stored += 1;
        }
        Ok(stored)
    }

    // Game events

    fn add_game_event(&self, game_id: &EntityId, event: GameEvent) -> StoreResult<Option<Game>> {
        self.ensure_online()?;
        let Some(mut game) = self.game(game_id)? else {
            return Ok(None);
        };
        game.events.push(event);
        game.recalculate_score();
        self.api.upsert(RemoteRecord::Game {
            id: game_id.clone(),
            game: game.clone(),
        })?;
        Ok(Some(game))
    }

    fn update_game_event(
        &self,
        game_id: &EntityId,
        index: usize,
        event: GameEvent,
    ) -> StoreResult<Option<Game>> {
        self.ensure_online()?;
        let Some(mut game) = self.game(game_id)? else {
            return Ok(None);
        };
        if index >= game.events.len() {
            return Err(StoreError::validation(format!(
                "games {game_id}: event index {index} out of range ({} events)",
                game.events.len()
            )));
        }
        game.events[index] = event;
        game.recalculate_score();
        self.api.upsert(RemoteRecord::Game {
            id: game_id.clone(),
            game: game.clone(),
        })?;
        Ok(Some(game))
    }

    fn remove_game_event(&self, game_id: &EntityId, index: usize) -> StoreResult<Option<Game>> {
        self.ensure_online()?;
        let Some(mut game) = self.game(game_id)? else {
            return Ok(None);
        };
        if index >= game.events.len() {
            return Err(StoreError::validation(format!(
                "games {game_id}: event index {index} out of range ({} events)",
                game.events.len()
            )));
        }
        game.events.remove(index);
        game.recalculate_score();
        self.api.upsert(RemoteRecord::Game {
            id: game_id.clone(),
            game: game.clone(),
        })?;
        Ok(Some(game))
    }

    // Stat adjustments

    fn stat_adjustments(&self) -> StoreResult<Vec<PlayerStatAdjustment>> {
        Ok(self.snapshot()?.adjustments)
    }

    fn add_stat_adjustment(
        &self,
        mut adjustment: PlayerStatAdjustment,
    ) -> StoreResult<PlayerStatAdjustment> {
        self.ensure_online()?;
        if adjustment.id.is_empty() {
            adjustment.id = EntityId::new();
        }
        adjustment.validate()?;
        self.insert_new(RemoteRecord::Adjustment(adjustment.clone()))?;
        Ok(adjustment)
    }

    fn delete_stat_adjustment(&self, id: &EntityId) -> StoreResult<bool> {
        self.ensure_online()?;
        Ok(self.api.delete(EntityKind::Adjustments, id)?)
    }

    fn save_stat_adjustments(
        &self,
        adjustments: Vec<PlayerStatAdjustment>,
    ) -> StoreResult<Vec<PlayerStatAdjustment>> {
        self.ensure_online()?;
        validate_collection(&adjustments)?;
        self.api.clear(EntityKind::Adjustments)?;
        for adjustment in &adjustments {
            self.api
                .upsert(RemoteRecord::Adjustment(adjustment.clone()))?;
        }
        Ok(adjustments)
    }

    // Singletons

    fn settings(&self) -> StoreResult<Option<AppSettings>> {
        self.ensure_online()?;
        match self.api.get(EntityKind::Settings, &singleton_id())? {
            Some(RemoteRecord::Settings(settings)) => Ok(Some(settings)),
            Some(other) => Err(mismatch(EntityKind::Settings, &other)),
            None => Ok(None),
        }
    }

    fn save_settings(&self, settings: AppSettings) -> StoreResult<AppSettings> {
        self.ensure_online()?;
        self.api.upsert(RemoteRecord::Settings(settings.clone()))?;
        Ok(settings)
    }

    fn warmup_plan(&self) -> StoreResult<Option<WarmupPlan>> {
        self.ensure_online()?;
        match self.api.get(EntityKind::WarmupPlan, &singleton_id())? {
            Some(RemoteRecord::WarmupPlan(plan)) => Ok(Some(plan)),
            Some(other) => Err(mismatch(EntityKind::WarmupPlan, &other)),
            None => Ok(None),
        }
    }

    fn save_warmup_plan(&self, plan: WarmupPlan) -> StoreResult<WarmupPlan> {
        self.ensure_online()?;
        self.api.upsert(RemoteRecord::WarmupPlan(plan.clone()))?;
        Ok(plan)
    }

    fn timer_state(&self) -> StoreResult<Option<TimerState>> {
        self.ensure_online()?;
        match self.api.get(EntityKind::TimerState, &singleton_id())? {
            Some(RemoteRecord::TimerState(state)) => Ok(Some(state)),
            Some(other) => Err(mismatch(EntityKind::TimerState, &other)),
            None => Ok(None),
        }
    }

    fn save_timer_state(&self, state: TimerState) -> StoreResult<TimerState> {
        self.ensure_online()?;
        self.api.upsert(RemoteRecord::TimerState(state.clone()))?;
        Ok(state)
    }

    fn counts(&self) -> StoreResult<EntityCounts> {
        self.ensure_online()?;
        Ok(self.api.counts()?)
    }
}
