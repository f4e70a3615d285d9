//! The local store: an in-memory image, write-through to persistence.
//!
//! All reads are served from memory. Every mutation takes its key
//! lock(s), mutates a copy of the affected collection, persists the
//! copy, and only then commits it to the image, so a failed write
//! leaves both memory and disk as they were. Cascade deletes persist
//! in two phases with a best-effort rollback of phase one if phase two
//! fails.

use crate::config::StoreConfig;
use crate::contract::{DataStore, PersonnelRemoval};
use crate::error::{StoreError, StoreResult};
use crate::locks::{KeyLockManager, StoreKey};
use crate::persistence::{FilePersistence, MemoryPersistence, Persistence};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;
use touchline_model::{
    validate_collection, validate_game, validate_games, AppSettings, EntityCounts, EntityId,
    EntityKind, Game, GameEvent, Keyed, Personnel, Player, PlayerStatAdjustment, Season, Team,
    TeamPlayer, TimerState, Tournament, Validate, WarmupPlan,
};

/// The in-memory working copy of every collection and singleton.
#[derive(Debug, Default)]
struct Image {
    players: Vec<Player>,
    teams: Vec<Team>,
    rosters: Vec<TeamPlayer>,
    seasons: Vec<Season>,
    tournaments: Vec<Tournament>,
    personnel: Vec<Personnel>,
    games: BTreeMap<EntityId, Game>,
    adjustments: Vec<PlayerStatAdjustment>,
    settings: Option<AppSettings>,
    warmup_plan: Option<WarmupPlan>,
    timer_state: Option<TimerState>,
}

/// The on-device store.
///
/// Opening loads every collection from persistence, quarantining any
/// file that doesn't parse (the collection restarts empty; the bad file
/// is kept aside). [`LocalStore::close`] flips the store to
/// `NotInitialized` for all subsequent calls.
pub struct LocalStore {
    persistence: Arc<dyn Persistence>,
    locks: KeyLockManager,
    image: RwLock<Option<Image>>,
}

impl LocalStore {
    /// Opens a file-backed store, acquiring the directory lock.
    pub fn open(path: &Path, config: &StoreConfig) -> StoreResult<Self> {
        Self::with_persistence(Arc::new(FilePersistence::open(path, config)?))
    }

    /// Creates a store backed by memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            persistence: Arc::new(MemoryPersistence::new()),
            locks: KeyLockManager::new(),
            image: RwLock::new(Some(Image::default())),
        }
    }

    /// Creates a store over any persistence backend, loading the image.
    pub fn with_persistence(persistence: Arc<dyn Persistence>) -> StoreResult<Self> {
        let image = Image {
            players: load_collection(persistence.as_ref(), EntityKind::Players)?,
            teams: load_collection(persistence.as_ref(), EntityKind::Teams)?,
            rosters: load_collection(persistence.as_ref(), EntityKind::Rosters)?,
            seasons: load_collection(persistence.as_ref(), EntityKind::Seasons)?,
            tournaments: load_collection(persistence.as_ref(), EntityKind::Tournaments)?,
            personnel: load_collection(persistence.as_ref(), EntityKind::Personnel)?,
            games: load_document(persistence.as_ref(), EntityKind::Games)?.unwrap_or_default(),
            adjustments: load_collection(persistence.as_ref(), EntityKind::Adjustments)?,
            settings: load_document(persistence.as_ref(), EntityKind::Settings)?,
            warmup_plan: load_document(persistence.as_ref(), EntityKind::WarmupPlan)?,
            timer_state: load_document(persistence.as_ref(), EntityKind::TimerState)?,
        };
        Ok(Self {
            persistence,
            locks: KeyLockManager::new(),
            image: RwLock::new(Some(image)),
        })
    }

    /// Closes the store; every later call fails with `NotInitialized`.
    ///
    /// All data is already on disk (writes are write-through), so close
    /// has nothing to flush.
    pub fn close(&self) {
        *self.image.write() = None;
    }

    /// Reads a value out of the image.
    fn view<R>(&self, f: impl FnOnce(&Image) -> R) -> StoreResult<R> {
        let guard = self.image.read();
        let image = guard.as_ref().ok_or(StoreError::NotInitialized)?;
        Ok(f(image))
    }

    /// Serializes and stores one kind's document.
    fn store_document<T: Serialize>(&self, kind: EntityKind, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.persistence.store(kind, &bytes)
    }
}

fn load_collection<T: DeserializeOwned>(
    persistence: &dyn Persistence,
    kind: EntityKind,
) -> StoreResult<Vec<T>> {
    Ok(load_document(persistence, kind)?.unwrap_or_default())
}

fn load_document<T: DeserializeOwned>(
    persistence: &dyn Persistence,
    kind: EntityKind,
) -> StoreResult<Option<T>> {
    let Some(bytes) = persistence.load(kind)? else {
        return Ok(None);
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(kind = %kind, error = %err, "quarantining unreadable store file");
            persistence.quarantine(kind)?;
            Ok(None)
        }
    }
}

fn position_of<T: Keyed>(list: &[T], id: &EntityId) -> Option<usize> {
    list.iter().position(|item| item.key() == id)
}

fn insert_new<T: Keyed + Validate + Clone>(list: &mut Vec<T>, item: T) -> StoreResult<T> {
    item.validate()?;
    if position_of(list, item.key()).is_some() {
        return Err(StoreError::AlreadyExists {
            kind: T::KIND,
            id: item.key().clone(),
        });
    }
    list.push(item.clone());
    Ok(item)
}

fn replace_existing<T: Keyed + Validate + Clone>(
    list: &mut Vec<T>,
    item: T,
) -> StoreResult<Option<T>> {
    item.validate()?;
    match position_of(list, item.key()) {
        Some(pos) => {
            list[pos] = item.clone();
            Ok(Some(item))
        }
        None => Ok(None),
    }
}

impl DataStore for LocalStore {
    // Players

    fn players(&self) -> StoreResult<Vec<Player>> {
        self.view(|image| image.players.clone())
    }

    fn create_player(&self, mut player: Player) -> StoreResult<Player> {
        let _guard = self.locks.lock(&[StoreKey::Players]);
        if player.id.is_empty() {
            player.id = EntityId::new();
        }
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut players = image.players.clone();
        let stored = insert_new(&mut players, player)?;
        self.store_document(EntityKind::Players, &players)?;
        image.players = players;
        Ok(stored)
    }

    fn update_player(&self, player: Player) -> StoreResult<Option<Player>> {
        let _guard = self.locks.lock(&[StoreKey::Players]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut players = image.players.clone();
        let Some(stored) = replace_existing(&mut players, player)? else {
            return Ok(None);
        };
        self.store_document(EntityKind::Players, &players)?;
        image.players = players;
        Ok(Some(stored))
    }

    fn delete_player(&self, id: &EntityId) -> StoreResult<bool> {
        let _guard = self.locks.lock(&[StoreKey::Players, StoreKey::Adjustments]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let Some(pos) = position_of(&image.players, id) else {
            return Ok(false);
        };

        // Phase one: the player itself.
        let mut players = image.players.clone();
        let removed = players.remove(pos);
        self.store_document(EntityKind::Players, &players)?;
        image.players = players;

        // Phase two: that player's stat adjustments.
        let mut adjustments = image.adjustments.clone();
        let before = adjustments.len();
        adjustments.retain(|adj| &adj.player_id != id);
        if adjustments.len() != before {
            if let Err(err) = self.store_document(EntityKind::Adjustments, &adjustments) {
                // Roll phase one back; the write is not re-verified.
                image.players.insert(pos, removed);
                if let Err(rollback) = self.store_document(EntityKind::Players, &image.players) {
                    warn!(player = %id, error = %rollback, "cascade rollback write failed");
                }
                return Err(err);
            }
            image.adjustments = adjustments;
        }
        Ok(true)
    }

    fn save_players(&self, players: Vec<Player>) -> StoreResult<Vec<Player>> {
        let _guard = self.locks.lock(&[StoreKey::Players]);
        validate_collection(&players)?;
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.store_document(EntityKind::Players, &players)?;
        image.players = players.clone();
        Ok(players)
    }

    // Teams

    fn teams(&self) -> StoreResult<Vec<Team>> {
        self.view(|image| image.teams.clone())
    }

    fn team(&self, id: &EntityId) -> StoreResult<Option<Team>> {
        self.view(|image| image.teams.iter().find(|t| &t.id == id).cloned())
    }

    fn create_team(&self, mut team: Team) -> StoreResult<Team> {
        let _guard = self.locks.lock(&[StoreKey::Teams]);
        if team.id.is_empty() {
            team.id = EntityId::new();
        }
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut teams = image.teams.clone();
        let stored = insert_new(&mut teams, team)?;
        self.store_document(EntityKind::Teams, &teams)?;
        image.teams = teams;
        Ok(stored)
    }

    fn update_team(&self, mut team: Team) -> StoreResult<Option<Team>> {
        let _guard = self.locks.lock(&[StoreKey::Teams]);
        team.touch();
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut teams = image.teams.clone();
        let Some(stored) = replace_existing(&mut teams, team)? else {
            return Ok(None);
        };
        self.store_document(EntityKind::Teams, &teams)?;
        image.teams = teams;
        Ok(Some(stored))
    }

    fn delete_team(&self, id: &EntityId) -> StoreResult<bool> {
        let _guard = self.locks.lock(&[StoreKey::Teams, StoreKey::Rosters]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let Some(pos) = position_of(&image.teams, id) else {
            return Ok(false);
        };

        // Phase one: the team itself.
        let mut teams = image.teams.clone();
        let removed = teams.remove(pos);
        self.store_document(EntityKind::Teams, &teams)?;
        image.teams = teams;

        // Phase two: its roster entries.
        let mut rosters = image.rosters.clone();
        let before = rosters.len();
        rosters.retain(|entry| &entry.team_id != id);
        if rosters.len() != before {
            if let Err(err) = self.store_document(EntityKind::Rosters, &rosters) {
                image.teams.insert(pos, removed);
                if let Err(rollback) = self.store_document(EntityKind::Teams, &image.teams) {
                    warn!(team = %id, error = %rollback, "cascade rollback write failed");
                }
                return Err(err);
            }
            image.rosters = rosters;
        }
        Ok(true)
    }

    fn save_teams(&self, teams: Vec<Team>) -> StoreResult<Vec<Team>> {
        let _guard = self.locks.lock(&[StoreKey::Teams]);
        validate_collection(&teams)?;
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.store_document(EntityKind::Teams, &teams)?;
        image.teams = teams.clone();
        Ok(teams)
    }

    // Rosters

    fn rosters(&self) -> StoreResult<Vec<TeamPlayer>> {
        self.view(|image| image.rosters.clone())
    }

    fn team_roster(&self, team_id: &EntityId) -> StoreResult<Vec<TeamPlayer>> {
        self.view(|image| {
            image
                .rosters
                .iter()
                .filter(|entry| &entry.team_id == team_id)
                .cloned()
                .collect()
        })
    }

    fn save_team_roster(
        &self,
        team_id: &EntityId,
        roster: Vec<TeamPlayer>,
    ) -> StoreResult<Vec<TeamPlayer>> {
        let _guard = self.locks.lock(&[StoreKey::Rosters]);
        for entry in &roster {
            if &entry.team_id != team_id {
                return Err(StoreError::validation(format!(
                    "rosters {}: entry belongs to team {}, not {team_id}",
                    entry.id, entry.team_id
                )));
            }
        }
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut rosters: Vec<TeamPlayer> = image
            .rosters
            .iter()
            .filter(|entry| &entry.team_id != team_id)
            .cloned()
            .collect();
        rosters.extend(roster.iter().cloned());
        validate_collection(&rosters)?;

        self.store_document(EntityKind::Rosters, &rosters)?;
        image.rosters = rosters;
        Ok(roster)
    }

    // Seasons

    fn seasons(&self) -> StoreResult<Vec<Season>> {
        self.view(|image| image.seasons.clone())
    }

    fn create_season(&self, mut season: Season) -> StoreResult<Season> {
        let _guard = self.locks.lock(&[StoreKey::Seasons]);
        if season.id.is_empty() {
            season.id = EntityId::new();
        }
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut seasons = image.seasons.clone();
        let stored = insert_new(&mut seasons, season)?;
        self.store_document(EntityKind::Seasons, &seasons)?;
        image.seasons = seasons;
        Ok(stored)
    }

    fn update_season(&self, season: Season) -> StoreResult<Option<Season>> {
        let _guard = self.locks.lock(&[StoreKey::Seasons]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut seasons = image.seasons.clone();
        let Some(stored) = replace_existing(&mut seasons, season)? else {
            return Ok(None);
        };
        self.store_document(EntityKind::Seasons, &seasons)?;
        image.seasons = seasons;
        Ok(Some(stored))
    }

    fn delete_season(&self, id: &EntityId) -> StoreResult<bool> {
        let _guard = self.locks.lock(&[StoreKey::Seasons]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let Some(pos) = position_of(&image.seasons, id) else {
            return Ok(false);
        };
        let mut seasons = image.seasons.clone();
        seasons.remove(pos);
        self.store_document(EntityKind::Seasons, &seasons)?;
        image.seasons = seasons;
        Ok(true)
    }

    fn save_seasons(&self, seasons: Vec<Season>) -> StoreResult<Vec<Season>> {
        let _guard = self.locks.lock(&[StoreKey::Seasons]);
        validate_collection(&seasons)?;
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.store_document(EntityKind::Seasons, &seasons)?;
        image.seasons = seasons.clone();
        Ok(seasons)
    }

    // Tournaments

    fn tournaments(&self) -> StoreResult<Vec<Tournament>> {
        self.view(|image| image.tournaments.clone())
    }

    fn create_tournament(&self, mut tournament: Tournament) -> StoreResult<Tournament> {
        let _guard = self.locks.lock(&[StoreKey::Tournaments]);
        if tournament.id.is_empty() {
            tournament.id = EntityId::new();
        }
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut tournaments = image.tournaments.clone();
        let stored = insert_new(&mut tournaments, tournament)?;
        self.store_document(EntityKind::Tournaments, &tournaments)?;
        image.tournaments = tournaments;
        Ok(stored)
    }

    fn update_tournament(&self, tournament: Tournament) -> StoreResult<Option<Tournament>> {
        let _guard = self.locks.lock(&[StoreKey::Tournaments]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut tournaments = image.tournaments.clone();
        let Some(stored) = replace_existing(&mut tournaments, tournament)? else {
            return Ok(None);
        };
        self.store_document(EntityKind::Tournaments, &tournaments)?;
        image.tournaments = tournaments;
        Ok(Some(stored))
    }

    fn delete_tournament(&self, id: &EntityId) -> StoreResult<bool> {
        let _guard = self.locks.lock(&[StoreKey::Tournaments]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let Some(pos) = position_of(&image.tournaments, id) else {
            return Ok(false);
        };
        let mut tournaments = image.tournaments.clone();
        tournaments.remove(pos);
        self.store_document(EntityKind::Tournaments, &tournaments)?;
        image.tournaments = tournaments;
        Ok(true)
    }

    fn save_tournaments(&self, tournaments: Vec<Tournament>) -> StoreResult<Vec<Tournament>> {
        let _guard = self.locks.lock(&[StoreKey::Tournaments]);
        validate_collection(&tournaments)?;
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.store_document(EntityKind::Tournaments, &tournaments)?;
        image.tournaments = tournaments.clone();
        Ok(tournaments)
    }

    // Personnel

    fn personnel(&self) -> StoreResult<Vec<Personnel>> {
        self.view(|image| image.personnel.clone())
    }

    fn personnel_member(&self, id: &EntityId) -> StoreResult<Option<Personnel>> {
        self.view(|image| image.personnel.iter().find(|m| &m.id == id).cloned())
    }

    fn create_personnel(&self, mut member: Personnel) -> StoreResult<Personnel> {
        let _guard = self.locks.lock(&[StoreKey::Personnel]);
        if member.id.is_empty() {
            member.id = EntityId::new();
        }
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut personnel = image.personnel.clone();
        let stored = insert_new(&mut personnel, member)?;
        self.store_document(EntityKind::Personnel, &personnel)?;
        image.personnel = personnel;
        Ok(stored)
    }

    fn update_personnel(&self, mut member: Personnel) -> StoreResult<Option<Personnel>> {
        let _guard = self.locks.lock(&[StoreKey::Personnel]);
        member.touch();
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut personnel = image.personnel.clone();
        let Some(stored) = replace_existing(&mut personnel, member)? else {
            return Ok(None);
        };
        self.store_document(EntityKind::Personnel, &personnel)?;
        image.personnel = personnel;
        Ok(Some(stored))
    }

    fn delete_personnel(&self, id: &EntityId) -> StoreResult<Option<PersonnelRemoval>> {
        // Fixed order: Personnel before Games.
        let _guard = self.locks.lock(&[StoreKey::Personnel, StoreKey::Games]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let Some(pos) = position_of(&image.personnel, id) else {
            return Ok(None);
        };

        // Phase one: the member itself.
        let mut personnel = image.personnel.clone();
        let removed = personnel.remove(pos);
        self.store_document(EntityKind::Personnel, &personnel)?;
        image.personnel = personnel;

        // Phase two: strip the member from every game's assignments.
        let mut games = image.games.clone();
        let mut games_updated = Vec::new();
        for (game_id, game) in &mut games {
            if game.remove_personnel(id) {
                games_updated.push(game_id.clone());
            }
        }
        if !games_updated.is_empty() {
            if let Err(err) = self.store_document(EntityKind::Games, &games) {
                image.personnel.insert(pos, removed);
                if let Err(rollback) = self.store_document(EntityKind::Personnel, &image.personnel)
                {
                    warn!(member = %id, error = %rollback, "cascade rollback write failed");
                }
                return Err(err);
            }
            image.games = games;
        }
        Ok(Some(PersonnelRemoval { games_updated }))
    }

    fn save_personnel(&self, members: Vec<Personnel>) -> StoreResult<Vec<Personnel>> {
        let _guard = self.locks.lock(&[StoreKey::Personnel]);
        validate_collection(&members)?;
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.store_document(EntityKind::Personnel, &members)?;
        image.personnel = members.clone();
        Ok(members)
    }

    // Games

    fn games(&self) -> StoreResult<BTreeMap<EntityId, Game>> {
        self.view(|image| image.games.clone())
    }

    fn game(&self, id: &EntityId) -> StoreResult<Option<Game>> {
        self.view(|image| image.games.get(id).cloned())
    }

    fn save_game(&self, id: &EntityId, game: Game) -> StoreResult<Game> {
        let _guard = self.locks.lock(&[StoreKey::Games]);
        validate_game(id, &game)?;
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut games = image.games.clone();
        games.insert(id.clone(), game.clone());
        self.store_document(EntityKind::Games, &games)?;
        image.games = games;
        Ok(game)
    }

    fn delete_game(&self, id: &EntityId) -> StoreResult<bool> {
        let _guard = self.locks.lock(&[StoreKey::Games]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        if !image.games.contains_key(id) {
            return Ok(false);
        }
        let mut games = image.games.clone();
        games.remove(id);
        self.store_document(EntityKind::Games, &games)?;
        image.games = games;
        Ok(true)
    }

    fn save_games(&self, games: BTreeMap<EntityId, Game>) -> StoreResult<usize> {
        let _guard = self.locks.lock(&[StoreKey::Games]);
        validate_games(&games)?;
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.store_document(EntityKind::Games, &games)?;
        let stored = games.len();
        image.games = games;
        Ok(stored)
    }

    // Game events

    fn add_game_event(&self, game_id: &EntityId, event: GameEvent) -> StoreResult<Option<Game>> {
        let _guard = self.locks.lock(&[StoreKey::Games]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let Some(game) = image.games.get(game_id) else {
            return Ok(None);
        };
        let mut updated = game.clone();
        updated.events.push(event);
        updated.recalculate_score();

        let mut games = image.games.clone();
        games.insert(game_id.clone(), updated.clone());
        self.store_document(EntityKind::Games, &games)?;
        image.games = games;
        Ok(Some(updated))
    }

    fn update_game_event(
        &self,
        game_id: &EntityId,
        index: usize,
        event: GameEvent,
    ) -> StoreResult<Option<Game>> {
        let _guard = self.locks.lock(&[StoreKey::Games]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let Some(game) = image.games.get(game_id) else {
            return Ok(None);
        };
        if index >= game.events.len() {
            return Err(StoreError::validation(format!(
                "games {game_id}: event index {index} out of range ({} events)",
                game.events.len()
            )));
        }
        let mut updated = game.clone();
        updated.events[index] = event;
        updated.recalculate_score();

        let mut games = image.games.clone();
        games.insert(game_id.clone(), updated.clone());
        self.store_document(EntityKind::Games, &games)?;
        image.games = games;
        Ok(Some(updated))
    }

    fn remove_game_event(&self, game_id: &EntityId, index: usize) -> StoreResult<Option<Game>> {
        let _guard = self.locks.lock(&[StoreKey::Games]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let Some(game) = image.games.get(game_id) else {
            return Ok(None);
        };
        if index >= game.events.len() {
            return Err(StoreError::validation(format!(
                "games {game_id}: event index {index} out of range ({} events)",
                game.events.len()
            )));
        }
        let mut updated = game.clone();
        updated.events.remove(index);
        updated.recalculate_score();

        let mut games = image.games.clone();
        games.insert(game_id.clone(), updated.clone());
        self.store_document(EntityKind::Games, &games)?;
        image.games = games;
        Ok(Some(updated))
    }

    // Stat adjustments

    fn stat_adjustments(&self) -> StoreResult<Vec<PlayerStatAdjustment>> {
        self.view(|image| image.adjustments.clone())
    }

    fn add_stat_adjustment(
        &self,
        mut adjustment: PlayerStatAdjustment,
    ) -> StoreResult<PlayerStatAdjustment> {
        let _guard = self.locks.lock(&[StoreKey::Adjustments]);
        if adjustment.id.is_empty() {
            adjustment.id = EntityId::new();
        }
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let mut adjustments = image.adjustments.clone();
        let stored = insert_new(&mut adjustments, adjustment)?;
        self.store_document(EntityKind::Adjustments, &adjustments)?;
        image.adjustments = adjustments;
        Ok(stored)
    }

    fn delete_stat_adjustment(&self, id: &EntityId) -> StoreResult<bool> {
        let _guard = self.locks.lock(&[StoreKey::Adjustments]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        let Some(pos) = position_of(&image.adjustments, id) else {
            return Ok(false);
        };
        let mut adjustments = image.adjustments.clone();
        adjustments.remove(pos);
        self.store_document(EntityKind::Adjustments, &adjustments)?;
        image.adjustments = adjustments;
        Ok(true)
    }

    fn save_stat_adjustments(
        &self,
        adjustments: Vec<PlayerStatAdjustment>,
    ) -> StoreResult<Vec<PlayerStatAdjustment>> {
        let _guard = self.locks.lock(&[StoreKey::Adjustments]);
        validate_collection(&adjustments)?;
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.store_document(EntityKind::Adjustments, &adjustments)?;
        image.adjustments = adjustments.clone();
        Ok(adjustments)
    }

    // Singletons

    fn settings(&self) -> StoreResult<Option<AppSettings>> {
        self.view(|image| image.settings.clone())
    }

    fn save_settings(&self, settings: AppSettings) -> StoreResult<AppSettings> {
        let _guard = self.locks.lock(&[StoreKey::Settings]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.store_document(EntityKind::Settings, &settings)?;
        image.settings = Some(settings.clone());
        Ok(settings)
    }

    fn warmup_plan(&self) -> StoreResult<Option<WarmupPlan>> {
        self.view(|image| image.warmup_plan.clone())
    }

    fn save_warmup_plan(&self, plan: WarmupPlan) -> StoreResult<WarmupPlan> {
        let _guard = self.locks.lock(&[StoreKey::WarmupPlan]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.store_document(EntityKind::WarmupPlan, &plan)?;
        image.warmup_plan = Some(plan.clone());
        Ok(plan)
    }

    fn timer_state(&self) -> StoreResult<Option<TimerState>> {
        self.view(|image| image.timer_state.clone())
    }

    fn save_timer_state(&self, state: TimerState) -> StoreResult<TimerState> {
        let _guard = self.locks.lock(&[StoreKey::TimerState]);
        let mut guard = self.image.write();
        let image = guard.as_mut().ok_or(StoreError::NotInitialized)?;

        self.store_document(EntityKind::TimerState, &state)?;
        image.timer_state = Some(state.clone());
        Ok(state)
    }

    fn counts(&self) -> StoreResult<EntityCounts> {
        self.view(|image| EntityCounts {
            players: image.players.len(),
            teams: image.teams.len(),
            rosters: image.rosters.len(),
            seasons: image.seasons.len(),
            tournaments: image.tournaments.len(),
            personnel: image.personnel.len(),
            games: image.games.len(),
            adjustments: image.adjustments.len(),
            has_settings: image.settings.is_some(),
            has_warmup_plan: image.warmup_plan.is_some(),
            has_timer_state: image.timer_state.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::read_snapshot;
    use crate::error::ErrorKind;
    use tempfile::tempdir;
    use touchline_model::{GameEventKind, PersonnelRole};

    fn player(id: &str, name: &str) -> Player {
        let mut p = Player::new(name);
        p.id = EntityId::from_raw(id);
        p
    }

    #[test]
    fn create_then_list_players() {
        let store = LocalStore::in_memory();
        store.create_player(player("p1", "Alice")).unwrap();
        store.create_player(player("p2", "Bo")).unwrap();

        let players = store.players().unwrap();
        assert_eq!(players.len(), 2);
    }

    #[test]
    fn create_assigns_id_when_empty() {
        let store = LocalStore::in_memory();
        let stored = store.create_player(Player::new("NoId")).unwrap();
        assert!(!stored.id.is_empty());
    }

    #[test]
    fn create_duplicate_id_fails() {
        let store = LocalStore::in_memory();
        store.create_player(player("p1", "Alice")).unwrap();

        let err = store.create_player(player("p1", "Imposter")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(store.players().unwrap().len(), 1);
    }

    #[test]
    fn update_missing_returns_none() {
        let store = LocalStore::in_memory();
        assert!(store.update_player(player("ghost", "X")).unwrap().is_none());
    }

    #[test]
    fn delete_missing_returns_false() {
        let store = LocalStore::in_memory();
        assert!(!store.delete_player(&EntityId::from_raw("ghost")).unwrap());
    }

    #[test]
    fn delete_player_cascades_adjustments() {
        let store = LocalStore::in_memory();
        store.create_player(player("p1", "Alice")).unwrap();
        store.create_player(player("p2", "Bo")).unwrap();
        store
            .add_stat_adjustment(PlayerStatAdjustment::new(EntityId::from_raw("p1")))
            .unwrap();
        store
            .add_stat_adjustment(PlayerStatAdjustment::new(EntityId::from_raw("p2")))
            .unwrap();

        assert!(store.delete_player(&EntityId::from_raw("p1")).unwrap());

        let remaining = store.stat_adjustments().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].player_id, EntityId::from_raw("p2"));
    }

    #[test]
    fn delete_team_cascades_only_its_roster() {
        let store = LocalStore::in_memory();
        let mut t1 = Team::new("Blue");
        t1.id = EntityId::from_raw("t1");
        let mut t2 = Team::new("Red");
        t2.id = EntityId::from_raw("t2");
        store.create_team(t1).unwrap();
        store.create_team(t2).unwrap();
        store
            .save_team_roster(
                &EntityId::from_raw("t1"),
                vec![TeamPlayer::new(
                    EntityId::from_raw("t1"),
                    EntityId::from_raw("p1"),
                )],
            )
            .unwrap();
        store
            .save_team_roster(
                &EntityId::from_raw("t2"),
                vec![TeamPlayer::new(
                    EntityId::from_raw("t2"),
                    EntityId::from_raw("p1"),
                )],
            )
            .unwrap();

        assert!(store.delete_team(&EntityId::from_raw("t1")).unwrap());

        let rosters = store.rosters().unwrap();
        assert_eq!(rosters.len(), 1);
        assert_eq!(rosters[0].team_id, EntityId::from_raw("t2"));
    }

    #[test]
    fn delete_personnel_strips_games_and_reports_them() {
        let store = LocalStore::in_memory();
        let coach = store
            .create_personnel(Personnel::new("Coach", PersonnelRole::HeadCoach))
            .unwrap();

        let mut with_coach = Game::new("Us", "Them");
        with_coach.game_personnel.push(coach.id.clone());
        store
            .save_game(&EntityId::from_raw("g1"), with_coach)
            .unwrap();
        store
            .save_game(&EntityId::from_raw("g2"), Game::new("Us", "Others"))
            .unwrap();

        let removal = store.delete_personnel(&coach.id).unwrap().unwrap();
        assert_eq!(removal.games_updated, vec![EntityId::from_raw("g1")]);
        assert!(store
            .game(&EntityId::from_raw("g1"))
            .unwrap()
            .unwrap()
            .game_personnel
            .is_empty());
        assert!(store.personnel().unwrap().is_empty());
    }

    #[test]
    fn delete_personnel_missing_is_none() {
        let store = LocalStore::in_memory();
        assert!(store
            .delete_personnel(&EntityId::from_raw("ghost"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn cascade_rollback_restores_phase_one() {
        let backend = Arc::new(MemoryPersistence::new());
        let store = LocalStore::with_persistence(backend.clone()).unwrap();
        let coach = store
            .create_personnel(Personnel::new("Coach", PersonnelRole::HeadCoach))
            .unwrap();
        let mut game = Game::new("Us", "Them");
        game.game_personnel.push(coach.id.clone());
        store.save_game(&EntityId::from_raw("g1"), game).unwrap();

        backend.fail_stores_for(EntityKind::Games);
        let err = store.delete_personnel(&coach.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        // Phase one was rolled back: the member is still there, and the
        // game still lists them.
        assert_eq!(store.personnel().unwrap().len(), 1);
        let game = store.game(&EntityId::from_raw("g1")).unwrap().unwrap();
        assert_eq!(game.game_personnel, vec![coach.id]);
    }

    #[test]
    fn event_ops_keep_score_in_line() {
        let store = LocalStore::in_memory();
        let id = EntityId::from_raw("g1");
        store.save_game(&id, Game::new("Us", "Them")).unwrap();

        let game = store
            .add_game_event(&id, GameEvent::goal(60, EntityId::from_raw("p1"), None))
            .unwrap()
            .unwrap();
        assert_eq!(game.home_score, 1);

        let game = store
            .add_game_event(&id, GameEvent::new(GameEventKind::OpponentGoal, 120))
            .unwrap()
            .unwrap();
        assert_eq!(game.away_score, 1);

        let game = store.remove_game_event(&id, 0).unwrap().unwrap();
        assert_eq!(game.home_score, 0);
        assert_eq!(game.away_score, 1);
    }

    #[test]
    fn stale_event_index_is_validation_error() {
        let store = LocalStore::in_memory();
        let id = EntityId::from_raw("g1");
        store.save_game(&id, Game::new("Us", "Them")).unwrap();

        let err = store
            .update_game_event(&id, 3, GameEvent::new(GameEventKind::PeriodEnd, 1500))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        // Missing game is absence, not an error.
        assert!(store
            .remove_game_event(&EntityId::from_raw("ghost"), 0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn bulk_save_is_all_or_nothing() {
        let store = LocalStore::in_memory();
        store.create_player(player("p1", "Alice")).unwrap();

        let err = store
            .save_players(vec![player("p2", "Bo"), player("p3", "  ")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        // Nothing was replaced.
        let players = store.players().unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id, EntityId::from_raw("p1"));
    }

    #[test]
    fn save_team_roster_rejects_foreign_entries() {
        let store = LocalStore::in_memory();
        let entry = TeamPlayer::new(EntityId::from_raw("t2"), EntityId::from_raw("p1"));
        let err = store
            .save_team_roster(&EntityId::from_raw("t1"), vec![entry])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn close_makes_every_call_fail() {
        let store = LocalStore::in_memory();
        store.create_player(player("p1", "Alice")).unwrap();
        store.close();

        assert!(matches!(
            store.players(),
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(
            store.create_player(player("p2", "Bo")),
            Err(StoreError::NotInitialized)
        ));
    }

    #[test]
    fn file_store_survives_reopen() {
        let temp = tempdir().unwrap();
        {
            let store = LocalStore::open(temp.path(), &StoreConfig::default()).unwrap();
            store.create_player(player("p1", "Alice")).unwrap();
            store.save_settings(AppSettings::default()).unwrap();
            store
                .save_game(&EntityId::from_raw("g1"), Game::new("Us", "Them"))
                .unwrap();
        }

        let store = LocalStore::open(temp.path(), &StoreConfig::default()).unwrap();
        assert_eq!(store.players().unwrap().len(), 1);
        assert!(store.settings().unwrap().is_some());
        assert!(store.game(&EntityId::from_raw("g1")).unwrap().is_some());
    }

    #[test]
    fn corrupt_file_is_quarantined_on_open() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("players.json"), b"{definitely not json").unwrap();

        let store = LocalStore::open(temp.path(), &StoreConfig::default()).unwrap();
        assert!(store.players().unwrap().is_empty());

        let quarantined = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .any(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("players.json.corrupt-")
            });
        assert!(quarantined);

        // The store stays usable after quarantine.
        store.create_player(player("p1", "Fresh")).unwrap();
        assert_eq!(store.players().unwrap().len(), 1);
    }

    #[test]
    fn second_open_is_locked() {
        let temp = tempdir().unwrap();
        let _store = LocalStore::open(temp.path(), &StoreConfig::default()).unwrap();

        let result = LocalStore::open(temp.path(), &StoreConfig::default());
        assert!(matches!(result, Err(StoreError::Locked)));
    }

    #[test]
    fn snapshot_reads_the_whole_store() {
        let store = LocalStore::in_memory();
        store.create_player(player("p1", "Alice")).unwrap();
        store
            .save_game(&EntityId::from_raw("g1"), Game::new("Us", "Them"))
            .unwrap();
        store.save_timer_state(TimerState::default()).unwrap();

        let snapshot = read_snapshot(&store).unwrap();
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.games.len(), 1);
        assert!(snapshot.timer_state.is_some());
        assert_eq!(snapshot.counts(), store.counts().unwrap());
    }
}
