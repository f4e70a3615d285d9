//! Whole-store push to the cloud.

use crate::config::{RetryConfig, SyncConfig};
use std::collections::BTreeMap;
use touchline_model::{EntityId, EntityKind, Game, Keyed};
use touchline_remote::{RemoteError, RemoteRecord, RemoteStore};
use touchline_store::{read_snapshot, DataStore, StoreError, StoreResult};
use tracing::{info, warn};

/// Ids (and singletons) that could not be pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushFailures {
    /// Players that failed.
    pub players: Vec<EntityId>,
    /// Teams that failed.
    pub teams: Vec<EntityId>,
    /// Roster entries that failed.
    pub rosters: Vec<EntityId>,
    /// Seasons that failed.
    pub seasons: Vec<EntityId>,
    /// Tournaments that failed.
    pub tournaments: Vec<EntityId>,
    /// Staff members that failed.
    pub personnel: Vec<EntityId>,
    /// Games that failed.
    pub games: Vec<EntityId>,
    /// Stat adjustments that failed.
    pub adjustments: Vec<EntityId>,
    /// Singletons that failed.
    pub singletons: Vec<EntityKind>,
}

impl PushFailures {
    /// Whether anything failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// How many instances failed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.players.len()
            + self.teams.len()
            + self.rosters.len()
            + self.seasons.len()
            + self.tournaments.len()
            + self.personnel.len()
            + self.games.len()
            + self.adjustments.len()
            + self.singletons.len()
    }
}

/// What a whole-store push accomplished.
///
/// Counts are instances that landed; failed instances are listed by id
/// in [`PushSummary::failures`] so the caller can retry just those.
#[derive(Debug, Clone, Default)]
pub struct PushSummary {
    /// Players pushed.
    pub players: usize,
    /// Teams pushed.
    pub teams: usize,
    /// Roster entries pushed.
    pub rosters: usize,
    /// Seasons pushed.
    pub seasons: usize,
    /// Tournaments pushed.
    pub tournaments: usize,
    /// Staff members pushed.
    pub personnel: usize,
    /// Games pushed.
    pub games: usize,
    /// Stat adjustments pushed.
    pub adjustments: usize,
    /// Whether the settings singleton was present and pushed.
    pub settings: bool,
    /// Whether the warmup plan singleton was present and pushed.
    pub warmup_plan: bool,
    /// Whether the timer state singleton was present and pushed.
    pub timer_state: bool,
    /// Everything that failed.
    pub failures: PushFailures,
}

impl PushSummary {
    /// Whether every instance landed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// How many instances landed.
    #[must_use]
    pub fn pushed_total(&self) -> usize {
        self.players
            + self.teams
            + self.rosters
            + self.seasons
            + self.tournaments
            + self.personnel
            + self.games
            + self.adjustments
            + usize::from(self.settings)
            + usize::from(self.warmup_plan)
            + usize::from(self.timer_state)
    }
}

/// Pushes the entire local store to the cloud.
///
/// Fails fast when offline. Otherwise reads one local snapshot and
/// pushes collection by collection: instances go out in chunks, each
/// chunk's instances in parallel on scoped threads, each instance
/// wrapped in retry-with-backoff for transient errors. A failed
/// instance is recorded and skipped; it never aborts the push.
pub fn push_all_to_cloud(
    local: &dyn DataStore,
    remote: &RemoteStore,
    config: &SyncConfig,
) -> StoreResult<PushSummary> {
    if !remote.is_online() {
        return Err(RemoteError::Offline.into());
    }
    let snapshot = read_snapshot(local)?;
    let mut summary = PushSummary::default();

    let (pushed, failed) = push_chunked(remote, config, &snapshot.players, |p| {
        RemoteRecord::Player(p.clone())
    });
    summary.players = pushed;
    summary.failures.players = failed;

    let (pushed, failed) = push_chunked(remote, config, &snapshot.teams, |t| {
        RemoteRecord::Team(t.clone())
    });
    summary.teams = pushed;
    summary.failures.teams = failed;

    let (pushed, failed) = push_chunked(remote, config, &snapshot.rosters, |r| {
        RemoteRecord::Roster(r.clone())
    });
    summary.rosters = pushed;
    summary.failures.rosters = failed;

    let (pushed, failed) = push_chunked(remote, config, &snapshot.seasons, |s| {
        RemoteRecord::Season(s.clone())
    });
    summary.seasons = pushed;
    summary.failures.seasons = failed;

    let (pushed, failed) = push_chunked(remote, config, &snapshot.tournaments, |t| {
        RemoteRecord::Tournament(t.clone())
    });
    summary.tournaments = pushed;
    summary.failures.tournaments = failed;

    let (pushed, failed) = push_chunked(remote, config, &snapshot.personnel, |m| {
        RemoteRecord::Personnel(m.clone())
    });
    summary.personnel = pushed;
    summary.failures.personnel = failed;

    let (pushed, failed) = push_games(remote, config, &snapshot.games);
    summary.games = pushed;
    summary.failures.games = failed;

    let (pushed, failed) = push_chunked(remote, config, &snapshot.adjustments, |a| {
        RemoteRecord::Adjustment(a.clone())
    });
    summary.adjustments = pushed;
    summary.failures.adjustments = failed;

    if let Some(settings) = snapshot.settings {
        summary.settings = push_singleton(
            remote,
            config,
            EntityKind::Settings,
            RemoteRecord::Settings(settings),
            &mut summary.failures.singletons,
        );
    }
    if let Some(plan) = snapshot.warmup_plan {
        summary.warmup_plan = push_singleton(
            remote,
            config,
            EntityKind::WarmupPlan,
            RemoteRecord::WarmupPlan(plan),
            &mut summary.failures.singletons,
        );
    }
    if let Some(state) = snapshot.timer_state {
        summary.timer_state = push_singleton(
            remote,
            config,
            EntityKind::TimerState,
            RemoteRecord::TimerState(state),
            &mut summary.failures.singletons,
        );
    }

    info!(
        pushed = summary.pushed_total(),
        failed = summary.failures.total(),
        "push to cloud finished"
    );
    Ok(summary)
}

fn push_chunked<T, F>(
    remote: &RemoteStore,
    config: &SyncConfig,
    items: &[T],
    wrap: F,
) -> (usize, Vec<EntityId>)
where
    T: Keyed,
    F: Fn(&T) -> RemoteRecord,
{
    push_records(
        remote,
        config,
        items.iter().map(|item| (item.key().clone(), wrap(item))),
    )
}

fn push_games(
    remote: &RemoteStore,
    config: &SyncConfig,
    games: &BTreeMap<EntityId, Game>,
) -> (usize, Vec<EntityId>) {
    push_records(
        remote,
        config,
        games.iter().map(|(id, game)| {
            (
                id.clone(),
                RemoteRecord::Game {
                    id: id.clone(),
                    game: game.clone(),
                },
            )
        }),
    )
}

fn push_records(
    remote: &RemoteStore,
    config: &SyncConfig,
    records: impl Iterator<Item = (EntityId, RemoteRecord)>,
) -> (usize, Vec<EntityId>) {
    let all: Vec<(EntityId, RemoteRecord)> = records.collect();
    let retry = &config.retry;
    let mut pushed = 0;
    let mut failed = Vec::new();

    for chunk in all.chunks(config.push_chunk_size.max(1)) {
        let mut outcomes: Vec<(&EntityId, StoreResult<()>)> = Vec::with_capacity(chunk.len());
        std::thread::scope(|scope| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|(id, record)| {
                    let record = record.clone();
                    (id, scope.spawn(move || push_with_retry(remote, retry, record)))
                })
                .collect();
            for (id, handle) in handles {
                let outcome = handle
                    .join()
                    .unwrap_or_else(|_| Err(StoreError::storage("push worker panicked")));
                outcomes.push((id, outcome));
            }
        });
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => pushed += 1,
                Err(err) => {
                    warn!(id = %id, error = %err, "push failed");
                    failed.push(id.clone());
                }
            }
        }
    }
    (pushed, failed)
}

fn push_singleton(
    remote: &RemoteStore,
    config: &SyncConfig,
    kind: EntityKind,
    record: RemoteRecord,
    failed: &mut Vec<EntityKind>,
) -> bool {
    match push_with_retry(remote, &config.retry, record) {
        Ok(()) => true,
        Err(err) => {
            warn!(kind = %kind, error = %err, "push failed");
            failed.push(kind);
            false
        }
    }
}

fn push_with_retry(
    remote: &RemoteStore,
    retry: &RetryConfig,
    record: RemoteRecord,
) -> StoreResult<()> {
    let mut attempt = 0u32;
    loop {
        match remote.replay_upsert(record.clone()) {
            Ok(()) => return Ok(()),
            Err(err) => {
                attempt += 1;
                if err.is_retryable() && attempt < retry.max_attempts {
                    std::thread::sleep(retry.delay_for_attempt(attempt));
                    continue;
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use touchline_model::{AppSettings, Personnel, PersonnelRole, Player, Team};
    use touchline_remote::{MemoryRemote, RemoteApi};
    use touchline_store::LocalStore;

    fn populated_local() -> LocalStore {
        let local = LocalStore::in_memory();
        for n in 1..=5 {
            let mut p = Player::new(format!("Player {n}"));
            p.id = EntityId::from_raw(format!("p{n}"));
            local.create_player(p).unwrap();
        }
        let mut team = Team::new("Blue");
        team.id = EntityId::from_raw("t1");
        local.create_team(team).unwrap();
        local
            .create_personnel(Personnel::new("Coach", PersonnelRole::HeadCoach))
            .unwrap();
        local
            .save_game(&EntityId::from_raw("g1"), Game::new("Blue", "Red"))
            .unwrap();
        local.save_settings(AppSettings::default()).unwrap();
        local
    }

    fn small_chunks() -> SyncConfig {
        SyncConfig::new()
            .with_push_chunk_size(2)
            .with_retry(RetryConfig::no_retry())
    }

    #[test]
    fn pushes_a_populated_store_completely() {
        let local = populated_local();
        let api = Arc::new(MemoryRemote::new());
        let remote = RemoteStore::new(api.clone());

        let summary = push_all_to_cloud(&local, &remote, &small_chunks()).unwrap();

        assert!(summary.is_complete());
        assert_eq!(summary.players, 5);
        assert_eq!(summary.teams, 1);
        assert_eq!(summary.games, 1);
        assert!(summary.settings);
        assert!(!summary.timer_state);
        assert_eq!(api.counts().unwrap(), local.counts().unwrap());
    }

    #[test]
    fn failed_instances_are_isolated_and_listed() {
        let local = populated_local();
        let api = Arc::new(MemoryRemote::new());
        api.fail_upserts_for(EntityId::from_raw("p3"));
        let remote = RemoteStore::new(api.clone());

        let summary = push_all_to_cloud(&local, &remote, &small_chunks()).unwrap();

        assert!(!summary.is_complete());
        assert_eq!(summary.players, 4);
        assert_eq!(summary.failures.players, vec![EntityId::from_raw("p3")]);
        // Everything else still went through.
        assert_eq!(summary.teams, 1);
        assert_eq!(api.counts().unwrap().players, 4);
    }

    #[test]
    fn offline_fails_fast_without_pushing() {
        let local = populated_local();
        let api = Arc::new(MemoryRemote::new());
        api.set_online(false);
        let remote = RemoteStore::new(api.clone());

        let err = push_all_to_cloud(&local, &remote, &small_chunks()).unwrap_err();
        assert!(err.is_retryable());

        api.set_online(true);
        assert_eq!(api.counts().unwrap().total(), 0);
    }
}
