//! Whole-store pull from the cloud.

use std::collections::BTreeSet;
use touchline_model::{EntityId, EntityKind, TeamPlayer};
use touchline_remote::{RemoteError, RemoteStore};
use touchline_store::{DataStore, StoreError, StoreResult};
use tracing::{info, warn};

/// One collection that could not be written locally.
#[derive(Debug, Clone)]
pub struct PullFailure {
    /// The collection or singleton that failed.
    pub kind: EntityKind,
    /// Why it failed.
    pub message: String,
}

/// What a whole-store pull accomplished.
#[derive(Debug, Clone, Default)]
pub struct PullSummary {
    /// Players stored.
    pub players: usize,
    /// Teams stored.
    pub teams: usize,
    /// Roster entries stored.
    pub rosters: usize,
    /// Seasons stored.
    pub seasons: usize,
    /// Tournaments stored.
    pub tournaments: usize,
    /// Staff members stored.
    pub personnel: usize,
    /// Games stored.
    pub games: usize,
    /// Stat adjustments stored.
    pub adjustments: usize,
    /// Whether the settings singleton was present and stored.
    pub settings: bool,
    /// Whether the warmup plan singleton was present and stored.
    pub warmup_plan: bool,
    /// Whether the timer state singleton was present and stored.
    pub timer_state: bool,
    /// Collections that failed to land.
    pub failures: Vec<PullFailure>,
}

impl PullSummary {
    /// Whether every collection landed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Replaces the local store's contents with the cloud's.
///
/// Fails fast when offline. Otherwise fetches one remote snapshot and
/// bulk-saves collection by collection; a collection that fails to
/// write is recorded and skipped, never aborting the rest. Rosters are
/// replaced team by team, emptying teams that have no cloud entries. A
/// singleton absent in the cloud is left as it is locally.
pub fn pull_all_from_cloud(local: &dyn DataStore, remote: &RemoteStore) -> StoreResult<PullSummary> {
    if !remote.is_online() {
        return Err(RemoteError::Offline.into());
    }
    let snapshot = remote.snapshot()?;
    let mut summary = PullSummary::default();

    match local.save_players(snapshot.players) {
        Ok(stored) => summary.players = stored.len(),
        Err(err) => record_failure(&mut summary, EntityKind::Players, err),
    }
    match local.save_teams(snapshot.teams) {
        Ok(stored) => summary.teams = stored.len(),
        Err(err) => record_failure(&mut summary, EntityKind::Teams, err),
    }

    // Every team that has entries on either side gets its slice
    // replaced; teams with no cloud entries end up empty.
    let mut roster_teams: BTreeSet<EntityId> = BTreeSet::new();
    match local.rosters() {
        Ok(existing) => roster_teams.extend(existing.into_iter().map(|entry| entry.team_id)),
        Err(err) => record_failure(&mut summary, EntityKind::Rosters, err),
    }
    roster_teams.extend(snapshot.rosters.iter().map(|entry| entry.team_id.clone()));
    for team_id in roster_teams {
        let entries: Vec<TeamPlayer> = snapshot
            .rosters
            .iter()
            .filter(|entry| entry.team_id == team_id)
            .cloned()
            .collect();
        match local.save_team_roster(&team_id, entries) {
            Ok(stored) => summary.rosters += stored.len(),
            Err(err) => record_failure(&mut summary, EntityKind::Rosters, err),
        }
    }

    match local.save_seasons(snapshot.seasons) {
        Ok(stored) => summary.seasons = stored.len(),
        Err(err) => record_failure(&mut summary, EntityKind::Seasons, err),
    }
    match local.save_tournaments(snapshot.tournaments) {
        Ok(stored) => summary.tournaments = stored.len(),
        Err(err) => record_failure(&mut summary, EntityKind::Tournaments, err),
    }
    match local.save_personnel(snapshot.personnel) {
        Ok(stored) => summary.personnel = stored.len(),
        Err(err) => record_failure(&mut summary, EntityKind::Personnel, err),
    }
    match local.save_games(snapshot.games) {
        Ok(stored) => summary.games = stored,
        Err(err) => record_failure(&mut summary, EntityKind::Games, err),
    }
    match local.save_stat_adjustments(snapshot.adjustments) {
        Ok(stored) => summary.adjustments = stored.len(),
        Err(err) => record_failure(&mut summary, EntityKind::Adjustments, err),
    }

    if let Some(settings) = snapshot.settings {
        match local.save_settings(settings) {
            Ok(_) => summary.settings = true,
            Err(err) => record_failure(&mut summary, EntityKind::Settings, err),
        }
    }
    if let Some(plan) = snapshot.warmup_plan {
        match local.save_warmup_plan(plan) {
            Ok(_) => summary.warmup_plan = true,
            Err(err) => record_failure(&mut summary, EntityKind::WarmupPlan, err),
        }
    }
    if let Some(state) = snapshot.timer_state {
        match local.save_timer_state(state) {
            Ok(_) => summary.timer_state = true,
            Err(err) => record_failure(&mut summary, EntityKind::TimerState, err),
        }
    }

    info!(failed = summary.failures.len(), "pull from cloud finished");
    Ok(summary)
}

fn record_failure(summary: &mut PullSummary, kind: EntityKind, err: StoreError) {
    warn!(kind = %kind, error = %err, "pull failed for collection");
    summary.failures.push(PullFailure {
        kind,
        message: err.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use touchline_model::{Game, Player, Team};
    use touchline_remote::{MemoryRemote, RemoteApi, RemoteRecord};
    use touchline_store::{LocalStore, MemoryPersistence};

    fn seeded_remote() -> Arc<MemoryRemote> {
        let api = Arc::new(MemoryRemote::new());
        for n in 1..=3 {
            let mut p = Player::new(format!("Player {n}"));
            p.id = EntityId::from_raw(format!("p{n}"));
            api.upsert(RemoteRecord::Player(p)).unwrap();
        }
        let mut team = Team::new("Cloud FC");
        team.id = EntityId::from_raw("t1");
        api.upsert(RemoteRecord::Team(team)).unwrap();
        api.upsert(RemoteRecord::Game {
            id: EntityId::from_raw("g1"),
            game: Game::new("Cloud FC", "Rivals"),
        })
        .unwrap();
        api
    }

    #[test]
    fn pull_replaces_local_contents() {
        let api = seeded_remote();
        let remote = RemoteStore::new(api);
        let local = LocalStore::in_memory();
        let mut stale = Player::new("Stale");
        stale.id = EntityId::from_raw("old");
        local.create_player(stale).unwrap();

        let summary = pull_all_from_cloud(&local, &remote).unwrap();

        assert!(summary.is_complete());
        assert_eq!(summary.players, 3);
        assert_eq!(summary.teams, 1);
        assert_eq!(summary.games, 1);
        assert!(!summary.settings);
        assert!(local
            .players()
            .unwrap()
            .iter()
            .all(|p| p.id != EntityId::from_raw("old")));
    }

    #[test]
    fn collection_failures_are_isolated() {
        let api = seeded_remote();
        let remote = RemoteStore::new(api);
        let backend = Arc::new(MemoryPersistence::new());
        let local = LocalStore::with_persistence(backend.clone()).unwrap();
        backend.fail_stores_for(EntityKind::Teams);

        let summary = pull_all_from_cloud(&local, &remote).unwrap();

        assert!(!summary.is_complete());
        assert_eq!(summary.players, 3);
        assert_eq!(summary.teams, 0);
        assert!(summary
            .failures
            .iter()
            .any(|f| f.kind == EntityKind::Teams));
        assert!(local.teams().unwrap().is_empty());
        assert_eq!(local.players().unwrap().len(), 3);
    }

    #[test]
    fn offline_fails_fast_without_writing() {
        let api = seeded_remote();
        api.set_online(false);
        let remote = RemoteStore::new(api);
        let local = LocalStore::in_memory();

        let err = pull_all_from_cloud(&local, &remote).unwrap_err();
        assert!(err.is_retryable());
        assert!(local.players().unwrap().is_empty());
    }

    #[test]
    fn roster_slices_of_vanished_teams_are_emptied() {
        let api = Arc::new(MemoryRemote::new());
        api.upsert(RemoteRecord::Roster(TeamPlayer::new(
            EntityId::from_raw("t2"),
            EntityId::from_raw("p9"),
        )))
        .unwrap();
        let remote = RemoteStore::new(api);

        let local = LocalStore::in_memory();
        local
            .save_team_roster(
                &EntityId::from_raw("t1"),
                vec![TeamPlayer::new(
                    EntityId::from_raw("t1"),
                    EntityId::from_raw("p1"),
                )],
            )
            .unwrap();

        let summary = pull_all_from_cloud(&local, &remote).unwrap();

        assert!(summary.is_complete());
        assert_eq!(summary.rosters, 1);
        let rosters = local.rosters().unwrap();
        assert_eq!(rosters.len(), 1);
        assert_eq!(rosters[0].team_id, EntityId::from_raw("t2"));
    }
}
