//! The synchronized store: local writes, mirrored to the cloud queue.

use crate::config::SyncConfig;
use crate::pull::PullSummary;
use crate::push::PushSummary;
use crate::queue::{SyncQueue, SyncTask};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use touchline_model::{
    AppSettings, EntityCounts, EntityId, EntityKind, Game, GameEvent, Keyed, Personnel, Player,
    PlayerStatAdjustment, Season, Team, TeamPlayer, TimerState, Tournament, WarmupPlan,
};
use touchline_remote::{RemoteRecord, RemoteStore};
use touchline_store::{DataStore, LocalStore, PersonnelRemoval, StoreResult};

/// A [`DataStore`] that writes locally and mirrors mutations into the
/// sync queue.
///
/// Every mutation goes to the local store synchronously; only after it
/// succeeds, and only while cloud mode is enabled, is the equivalent
/// task queued for replay. Reads never touch the cloud. Queueing blocks
/// when the queue is full, so a write burst backpressures the caller
/// rather than growing the queue without bound.
pub struct SyncedStore {
    local: Arc<LocalStore>,
    queue: Arc<SyncQueue>,
    cloud_enabled: AtomicBool,
}

impl SyncedStore {
    /// Wraps a local store and a queue. Cloud mode starts disabled.
    pub fn new(local: Arc<LocalStore>, queue: Arc<SyncQueue>) -> Self {
        Self {
            local,
            queue,
            cloud_enabled: AtomicBool::new(false),
        }
    }

    /// Turns mirroring on or off. Already-queued tasks stay queued.
    pub fn set_cloud_enabled(&self, enabled: bool) {
        self.cloud_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether mutations are currently mirrored.
    #[must_use]
    pub fn is_cloud_enabled(&self) -> bool {
        self.cloud_enabled.load(Ordering::SeqCst)
    }

    /// The underlying local store.
    #[must_use]
    pub fn local(&self) -> &Arc<LocalStore> {
        &self.local
    }

    /// The queue mutations are mirrored into.
    #[must_use]
    pub fn queue(&self) -> &Arc<SyncQueue> {
        &self.queue
    }

    /// Pushes the entire local store to the cloud.
    /// See [`push_all_to_cloud`](crate::push_all_to_cloud).
    pub fn push_all_to_cloud(
        &self,
        remote: &RemoteStore,
        config: &SyncConfig,
    ) -> StoreResult<PushSummary> {
        crate::push::push_all_to_cloud(self.local.as_ref(), remote, config)
    }

    /// Replaces the local store's contents with the cloud's.
    /// See [`pull_all_from_cloud`](crate::pull_all_from_cloud).
    pub fn pull_all_from_cloud(&self, remote: &RemoteStore) -> StoreResult<PullSummary> {
        crate::pull::pull_all_from_cloud(self.local.as_ref(), remote)
    }

    fn mirror_upsert(&self, record: RemoteRecord) {
        if self.is_cloud_enabled() {
            self.queue.push(SyncTask::Upsert(record));
        }
    }

    fn mirror_delete(&self, kind: EntityKind, id: EntityId) {
        if self.is_cloud_enabled() {
            self.queue.push(SyncTask::Delete { kind, id });
        }
    }

    /// Ids currently in a collection, read only when mirroring is on.
    fn old_ids<T: Keyed>(
        &self,
        fetch: impl FnOnce() -> StoreResult<Vec<T>>,
    ) -> StoreResult<Vec<EntityId>> {
        if !self.is_cloud_enabled() {
            return Ok(Vec::new());
        }
        Ok(fetch()?.iter().map(|item| item.key().clone()).collect())
    }

    /// Mirrors a whole-collection replace: deletes for ids that were
    /// dropped, upserts for every member that remains.
    fn mirror_replace<T: Keyed>(
        &self,
        kind: EntityKind,
        old_ids: Vec<EntityId>,
        stored: &[T],
        wrap: impl Fn(&T) -> RemoteRecord,
    ) {
        if !self.is_cloud_enabled() {
            return;
        }
        for id in old_ids {
            if !stored.iter().any(|item| item.key() == &id) {
                self.queue.push(SyncTask::Delete { kind, id });
            }
        }
        for item in stored {
            self.queue.push(SyncTask::Upsert(wrap(item)));
        }
    }
}

impl DataStore for SyncedStore {
    // Players

    fn players(&self) -> StoreResult<Vec<Player>> {
        self.local.players()
    }

    fn create_player(&self, player: Player) -> StoreResult<Player> {
        let stored = self.local.create_player(player)?;
        self.mirror_upsert(RemoteRecord::Player(stored.clone()));
        Ok(stored)
    }

    fn update_player(&self, player: Player) -> StoreResult<Option<Player>> {
        let stored = self.local.update_player(player)?;
        if let Some(stored) = &stored {
            self.mirror_upsert(RemoteRecord::Player(stored.clone()));
        }
        Ok(stored)
    }

    fn delete_player(&self, id: &EntityId) -> StoreResult<bool> {
        let doomed = if self.is_cloud_enabled() {
            self.local
                .stat_adjustments()?
                .iter()
                .filter(|adj| &adj.player_id == id)
                .map(|adj| adj.id.clone())
                .collect()
        } else {
            Vec::new()
        };
        let deleted = self.local.delete_player(id)?;
        if deleted {
            for adj_id in doomed {
                self.mirror_delete(EntityKind::Adjustments, adj_id);
            }
            self.mirror_delete(EntityKind::Players, id.clone());
        }
        Ok(deleted)
    }

    fn save_players(&self, players: Vec<Player>) -> StoreResult<Vec<Player>> {
        let old_ids = self.old_ids(|| self.local.players())?;
        let stored = self.local.save_players(players)?;
        self.mirror_replace(EntityKind::Players, old_ids, &stored, |p| {
            RemoteRecord::Player(p.clone())
        });
        Ok(stored)
    }

    // Teams

    fn teams(&self) -> StoreResult<Vec<Team>> {
        self.local.teams()
    }

    fn team(&self, id: &EntityId) -> StoreResult<Option<Team>> {
        self.local.team(id)
    }

    fn create_team(&self, team: Team) -> StoreResult<Team> {
        let stored = self.local.create_team(team)?;
        self.mirror_upsert(RemoteRecord::Team(stored.clone()));
        Ok(stored)
    }

    fn update_team(&self, team: Team) -> StoreResult<Option<Team>> {
        let stored = self.local.update_team(team)?;
        if let Some(stored) = &stored {
            self.mirror_upsert(RemoteRecord::Team(stored.clone()));
        }
        Ok(stored)
    }

    fn delete_team(&self, id: &EntityId) -> StoreResult<bool> {
        let doomed = if self.is_cloud_enabled() {
            self.local
                .rosters()?
                .iter()
                .filter(|entry| &entry.team_id == id)
                .map(|entry| entry.id.clone())
                .collect()
        } else {
            Vec::new()
        };
        let deleted = self.local.delete_team(id)?;
        if deleted {
            for entry_id in doomed {
                self.mirror_delete(EntityKind::Rosters, entry_id);
            }
            self.mirror_delete(EntityKind::Teams, id.clone());
        }
        Ok(deleted)
    }

    fn save_teams(&self, teams: Vec<Team>) -> StoreResult<Vec<Team>> {
        let old_ids = self.old_ids(|| self.local.teams())?;
        let stored = self.local.save_teams(teams)?;
        self.mirror_replace(EntityKind::Teams, old_ids, &stored, |t| {
            RemoteRecord::Team(t.clone())
        });
        Ok(stored)
    }

    // Rosters

    fn rosters(&self) -> StoreResult<Vec<TeamPlayer>> {
        self.local.rosters()
    }

    fn team_roster(&self, team_id: &EntityId) -> StoreResult<Vec<TeamPlayer>> {
        self.local.team_roster(team_id)
    }

    fn save_team_roster(
        &self,
        team_id: &EntityId,
        roster: Vec<TeamPlayer>,
    ) -> StoreResult<Vec<TeamPlayer>> {
        let old_ids = self.old_ids(|| self.local.team_roster(team_id))?;
        let stored = self.local.save_team_roster(team_id, roster)?;
        self.mirror_replace(EntityKind::Rosters, old_ids, &stored, |entry| {
            RemoteRecord::Roster(entry.clone())
        });
        Ok(stored)
    }

    // Seasons

    fn seasons(&self) -> StoreResult<Vec<Season>> {
        self.local.seasons()
    }

    fn create_season(&self, season: Season) -> StoreResult<Season> {
        let stored = self.local.create_season(season)?;
        self.mirror_upsert(RemoteRecord::Season(stored.clone()));
        Ok(stored)
    }

    fn update_season(&self, season: Season) -> StoreResult<Option<Season>> {
        let stored = self.local.update_season(season)?;
        if let Some(stored) = &stored {
            self.mirror_upsert(RemoteRecord::Season(stored.clone()));
        }
        Ok(stored)
    }

    fn delete_season(&self, id: &EntityId) -> StoreResult<bool> {
        let deleted = self.local.delete_season(id)?;
        if deleted {
            self.mirror_delete(EntityKind::Seasons, id.clone());
        }
        Ok(deleted)
    }

    fn save_seasons(&self, seasons: Vec<Season>) -> StoreResult<Vec<Season>> {
        let old_ids = self.old_ids(|| self.local.seasons())?;
        let stored = self.local.save_seasons(seasons)?;
        self.mirror_replace(EntityKind::Seasons, old_ids, &stored, |s| {
            RemoteRecord::Season(s.clone())
        });
        Ok(stored)
    }

    // Tournaments

    fn tournaments(&self) -> StoreResult<Vec<Tournament>> {
        self.local.tournaments()
    }

    fn create_tournament(&self, tournament: Tournament) -> StoreResult<Tournament> {
        let stored = self.local.create_tournament(tournament)?;
        self.mirror_upsert(RemoteRecord::Tournament(stored.clone()));
        Ok(stored)
    }

    fn update_tournament(&self, tournament: Tournament) -> StoreResult<Option<Tournament>> {
        let stored = self.local.update_tournament(tournament)?;
        if let Some(stored) = &stored {
            self.mirror_upsert(RemoteRecord::Tournament(stored.clone()));
        }
        Ok(stored)
    }

    fn delete_tournament(&self, id: &EntityId) -> StoreResult<bool> {
        let deleted = self.local.delete_tournament(id)?;
        if deleted {
            self.mirror_delete(EntityKind::Tournaments, id.clone());
        }
        Ok(deleted)
    }

    fn save_tournaments(&self, tournaments: Vec<Tournament>) -> StoreResult<Vec<Tournament>> {
        let old_ids = self.old_ids(|| self.local.tournaments())?;
        let stored = self.local.save_tournaments(tournaments)?;
        self.mirror_replace(EntityKind::Tournaments, old_ids, &stored, |t| {
            RemoteRecord::Tournament(t.clone())
        });
        Ok(stored)
    }

    // Personnel

    fn personnel(&self) -> StoreResult<Vec<Personnel>> {
        self.local.personnel()
    }

    fn personnel_member(&self, id: &EntityId) -> StoreResult<Option<Personnel>> {
        self.local.personnel_member(id)
    }

    fn create_personnel(&self, member: Personnel) -> StoreResult<Personnel> {
        let stored = self.local.create_personnel(member)?;
        self.mirror_upsert(RemoteRecord::Personnel(stored.clone()));
        Ok(stored)
    }

    fn update_personnel(&self, member: Personnel) -> StoreResult<Option<Personnel>> {
        let stored = self.local.update_personnel(member)?;
        if let Some(stored) = &stored {
            self.mirror_upsert(RemoteRecord::Personnel(stored.clone()));
        }
        Ok(stored)
    }

    fn delete_personnel(&self, id: &EntityId) -> StoreResult<Option<PersonnelRemoval>> {
        let removal = self.local.delete_personnel(id)?;
        if let Some(removal) = &removal {
            // Mirror the cascade in the same order the cloud store
            // applies it: stripped games first, then the member.
            for game_id in &removal.games_updated {
                if let Some(game) = self.local.game(game_id)? {
                    self.mirror_upsert(RemoteRecord::Game {
                        id: game_id.clone(),
                        game,
                    });
                }
            }
            self.mirror_delete(EntityKind::Personnel, id.clone());
        }
        Ok(removal)
    }

    fn save_personnel(&self, members: Vec<Personnel>) -> StoreResult<Vec<Personnel>> {
        let old_ids = self.old_ids(|| self.local.personnel())?;
        let stored = self.local.save_personnel(members)?;
        self.mirror_replace(EntityKind::Personnel, old_ids, &stored, |m| {
            RemoteRecord::Personnel(m.clone())
        });
        Ok(stored)
    }

    // Games

    fn games(&self) -> StoreResult<BTreeMap<EntityId, Game>> {
        self.local.games()
    }

    fn game(&self, id: &EntityId) -> StoreResult<Option<Game>> {
        self.local.game(id)
    }

    fn save_game(&self, id: &EntityId, game: Game) -> StoreResult<Game> {
        let stored = self.local.save_game(id, game)?;
        self.mirror_upsert(RemoteRecord::Game {
            id: id.clone(),
            game: stored.clone(),
        });
        Ok(stored)
    }

    fn delete_game(&self, id: &EntityId) -> StoreResult<bool> {
        let deleted = self.local.delete_game(id)?;
        if deleted {
            self.mirror_delete(EntityKind::Games, id.clone());
        }
        Ok(deleted)
    }

    fn save_games(&self, games: BTreeMap<EntityId, Game>) -> StoreResult<usize> {
        let mirror_copy = if self.is_cloud_enabled() {
            Some((
                self.local.games()?.into_keys().collect::<Vec<_>>(),
                games.clone(),
            ))
        } else {
            None
        };
        let stored = self.local.save_games(games)?;
        if let Some((old_keys, new_games)) = mirror_copy {
            for key in old_keys {
                if !new_games.contains_key(&key) {
                    self.mirror_delete(EntityKind::Games, key);
                }
            }
            for (id, game) in new_games {
                self.mirror_upsert(RemoteRecord::Game { id, game });
            }
        }
        Ok(stored)
    }

    // Game events

    fn add_game_event(&self, game_id: &EntityId, event: GameEvent) -> StoreResult<Option<Game>> {
        let updated = self.local.add_game_event(game_id, event)?;
        if let Some(game) = &updated {
            self.mirror_upsert(RemoteRecord::Game {
                id: game_id.clone(),
                game: game.clone(),
            });
        }
        Ok(updated)
    }

    fn update_game_event(
        &self,
        game_id: &EntityId,
        index: usize,
        event: GameEvent,
    ) -> StoreResult<Option<Game>> {
        let updated = self.local.update_game_event(game_id, index, event)?;
        if let Some(game) = &updated {
            self.mirror_upsert(RemoteRecord::Game {
                id: game_id.clone(),
                game: game.clone(),
            });
        }
        Ok(updated)
    }

    fn remove_game_event(&self, game_id: &EntityId, index: usize) -> StoreResult<Option<Game>> {
        let updated = self.local.remove_game_event(game_id, index)?;
        if let Some(game) = &updated {
            self.mirror_upsert(RemoteRecord::Game {
                id: game_id.clone(),
                game: game.clone(),
            });
        }
        Ok(updated)
    }

    // Stat adjustments

    fn stat_adjustments(&self) -> StoreResult<Vec<PlayerStatAdjustment>> {
        self.local.stat_adjustments()
    }

    fn add_stat_adjustment(
        &self,
        adjustment: PlayerStatAdjustment,
    ) -> StoreResult<PlayerStatAdjustment> {
        let stored = self.local.add_stat_adjustment(adjustment)?;
        self.mirror_upsert(RemoteRecord::Adjustment(stored.clone()));
        Ok(stored)
    }

    fn delete_stat_adjustment(&self, id: &EntityId) -> StoreResult<bool> {
        let deleted = self.local.delete_stat_adjustment(id)?;
        if deleted {
            self.mirror_delete(EntityKind::Adjustments, id.clone());
        }
        Ok(deleted)
    }

    fn save_stat_adjustments(
        &self,
        adjustments: Vec<PlayerStatAdjustment>,
    ) -> StoreResult<Vec<PlayerStatAdjustment>> {
        let old_ids = self.old_ids(|| self.local.stat_adjustments())?;
        let stored = self.local.save_stat_adjustments(adjustments)?;
        self.mirror_replace(EntityKind::Adjustments, old_ids, &stored, |adj| {
            RemoteRecord::Adjustment(adj.clone())
        });
        Ok(stored)
    }

    // Singletons

    fn settings(&self) -> StoreResult<Option<AppSettings>> {
        self.local.settings()
    }

    fn save_settings(&self, settings: AppSettings) -> StoreResult<AppSettings> {
        let stored = self.local.save_settings(settings)?;
        self.mirror_upsert(RemoteRecord::Settings(stored.clone()));
        Ok(stored)
    }

    fn warmup_plan(&self) -> StoreResult<Option<WarmupPlan>> {
        self.local.warmup_plan()
    }

    fn save_warmup_plan(&self, plan: WarmupPlan) -> StoreResult<WarmupPlan> {
        let stored = self.local.save_warmup_plan(plan)?;
        self.mirror_upsert(RemoteRecord::WarmupPlan(stored.clone()));
        Ok(stored)
    }

    fn timer_state(&self) -> StoreResult<Option<TimerState>> {
        self.local.timer_state()
    }

    fn save_timer_state(&self, state: TimerState) -> StoreResult<TimerState> {
        let stored = self.local.save_timer_state(state)?;
        self.mirror_upsert(RemoteRecord::TimerState(stored.clone()));
        Ok(stored)
    }

    fn counts(&self) -> StoreResult<EntityCounts> {
        self.local.counts()
    }
}
