//! An in-memory reference remote with failure injection.

use crate::api::{RemoteApi, RemoteRecord};
use crate::error::{RemoteError, RemoteResult};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use touchline_model::{EntityCounts, EntityId, EntityKind, Keyed, StoreSnapshot};

/// A complete [`RemoteApi`] backed by memory.
///
/// Serves as the reference backend in tests and the CLI demo. The
/// injection knobs simulate the cloud failure modes the rest of the
/// layer has to survive: going offline, per-record server errors,
/// failing clears, and writes the server accepts but loses.
#[derive(Debug)]
pub struct MemoryRemote {
    online: AtomicBool,
    data: Mutex<StoreSnapshot>,
    fail_upserts: Mutex<HashSet<EntityId>>,
    fail_next_clears: AtomicUsize,
    dropped: Mutex<HashSet<(EntityKind, EntityId)>>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self {
            online: AtomicBool::new(true),
            data: Mutex::new(StoreSnapshot::new()),
            fail_upserts: Mutex::new(HashSet::new()),
            fail_next_clears: AtomicUsize::new(0),
            dropped: Mutex::new(HashSet::new()),
        }
    }
}

impl MemoryRemote {
    /// Creates an online, empty remote.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the held data wholesale, e.g. to stage a demo cloud.
    pub fn seed(&self, snapshot: StoreSnapshot) {
        *self.data.lock() = snapshot;
    }

    /// Flips connectivity; offline calls fail without touching data.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Makes every upsert of the record with this id fail with a 500.
    pub fn fail_upserts_for(&self, id: EntityId) {
        self.fail_upserts.lock().insert(id);
    }

    /// Makes the next `n` clears fail with a 500.
    pub fn fail_next_clears(&self, n: usize) {
        self.fail_next_clears.store(n, Ordering::SeqCst);
    }

    /// Accepts upserts of this record but stores nothing, the failure
    /// mode a count verification exists to catch.
    pub fn drop_silently(&self, kind: EntityKind, id: EntityId) {
        self.dropped.lock().insert((kind, id));
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        self.fail_upserts.lock().clear();
        self.fail_next_clears.store(0, Ordering::SeqCst);
        self.dropped.lock().clear();
    }

    fn ensure_online(&self) -> RemoteResult<()> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(RemoteError::Offline);
        }
        Ok(())
    }
}

fn upsert_by_id<T: Keyed>(list: &mut Vec<T>, item: T) {
    match list.iter_mut().find(|existing| existing.key() == item.key()) {
        Some(slot) => *slot = item,
        None => list.push(item),
    }
}

fn remove_by_id<T: Keyed>(list: &mut Vec<T>, id: &EntityId) -> bool {
    let before = list.len();
    list.retain(|item| item.key() != id);
    list.len() != before
}

impl RemoteApi for MemoryRemote {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn fetch_snapshot(&self) -> RemoteResult<StoreSnapshot> {
        self.ensure_online()?;
        Ok(self.data.lock().clone())
    }

    fn get(&self, kind: EntityKind, id: &EntityId) -> RemoteResult<Option<RemoteRecord>> {
        self.ensure_online()?;
        let data = self.data.lock();
        let found = match kind {
            EntityKind::Players => data
                .players
                .iter()
                .find(|p| &p.id == id)
                .cloned()
                .map(RemoteRecord::Player),
            EntityKind::Teams => data
                .teams
                .iter()
                .find(|t| &t.id == id)
                .cloned()
                .map(RemoteRecord::Team),
            EntityKind::Rosters => data
                .rosters
                .iter()
                .find(|r| &r.id == id)
                .cloned()
                .map(RemoteRecord::Roster),
            EntityKind::Seasons => data
                .seasons
                .iter()
                .find(|s| &s.id == id)
                .cloned()
                .map(RemoteRecord::Season),
            EntityKind::Tournaments => data
                .tournaments
                .iter()
                .find(|t| &t.id == id)
                .cloned()
                .map(RemoteRecord::Tournament),
            EntityKind::Personnel => data
                .personnel
                .iter()
                .find(|p| &p.id == id)
                .cloned()
                .map(RemoteRecord::Personnel),
            EntityKind::Games => data.games.get(id).cloned().map(|game| RemoteRecord::Game {
                id: id.clone(),
                game,
            }),
            EntityKind::Adjustments => data
                .adjustments
                .iter()
                .find(|a| &a.id == id)
                .cloned()
                .map(RemoteRecord::Adjustment),
            EntityKind::Settings => data.settings.clone().map(RemoteRecord::Settings),
            EntityKind::WarmupPlan => data.warmup_plan.clone().map(RemoteRecord::WarmupPlan),
            EntityKind::TimerState => data.timer_state.clone().map(RemoteRecord::TimerState),
        };
        Ok(found)
    }

    fn upsert(&self, record: RemoteRecord) -> RemoteResult<()> {
        self.ensure_online()?;

        if let Some(id) = record.id() {
            if self.fail_upserts.lock().contains(id) {
                return Err(RemoteError::http(
                    500,
                    format!("injected upsert failure for {id}"),
                ));
            }
            if self.dropped.lock().contains(&(record.kind(), id.clone())) {
                // Accepted and lost on purpose.
                return Ok(());
            }
        }

        let mut data = self.data.lock();
        match record {
            RemoteRecord::Player(p) => upsert_by_id(&mut data.players, p),
            RemoteRecord::Team(t) => upsert_by_id(&mut data.teams, t),
            RemoteRecord::Roster(r) => upsert_by_id(&mut data.rosters, r),
            RemoteRecord::Season(s) => upsert_by_id(&mut data.seasons, s),
            RemoteRecord::Tournament(t) => upsert_by_id(&mut data.tournaments, t),
            RemoteRecord::Personnel(p) => upsert_by_id(&mut data.personnel, p),
            RemoteRecord::Game { id, game } => {
                data.games.insert(id, game);
            }
            RemoteRecord::Adjustment(a) => upsert_by_id(&mut data.adjustments, a),
            RemoteRecord::Settings(s) => data.settings = Some(s),
            RemoteRecord::WarmupPlan(p) => data.warmup_plan = Some(p),
            RemoteRecord::TimerState(t) => data.timer_state = Some(t),
        }
        Ok(())
    }

    fn delete(&self, kind: EntityKind, id: &EntityId) -> RemoteResult<bool> {
        self.ensure_online()?;
        let mut data = self.data.lock();
        let existed = match kind {
            EntityKind::Players => remove_by_id(&mut data.players, id),
            EntityKind::Teams => remove_by_id(&mut data.teams, id),
            EntityKind::Rosters => remove_by_id(&mut data.rosters, id),
            EntityKind::Seasons => remove_by_id(&mut data.seasons, id),
            EntityKind::Tournaments => remove_by_id(&mut data.tournaments, id),
            EntityKind::Personnel => {
                let existed = remove_by_id(&mut data.personnel, id);
                if existed {
                    // Server-side cascade, mirroring the local store.
                    for game in data.games.values_mut() {
                        game.remove_personnel(id);
                    }
                }
                existed
            }
            EntityKind::Games => data.games.remove(id).is_some(),
            EntityKind::Adjustments => remove_by_id(&mut data.adjustments, id),
            EntityKind::Settings => data.settings.take().is_some(),
            EntityKind::WarmupPlan => data.warmup_plan.take().is_some(),
            EntityKind::TimerState => data.timer_state.take().is_some(),
        };
        Ok(existed)
    }

    fn clear(&self, kind: EntityKind) -> RemoteResult<()> {
        self.ensure_online()?;

        let pending = self.fail_next_clears.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_next_clears.store(pending - 1, Ordering::SeqCst);
            return Err(RemoteError::http(
                500,
                format!("injected clear failure for {kind}"),
            ));
        }

        let mut data = self.data.lock();
        match kind {
            EntityKind::Players => data.players.clear(),
            EntityKind::Teams => data.teams.clear(),
            EntityKind::Rosters => data.rosters.clear(),
            EntityKind::Seasons => data.seasons.clear(),
            EntityKind::Tournaments => data.tournaments.clear(),
            EntityKind::Personnel => data.personnel.clear(),
            EntityKind::Games => data.games.clear(),
            EntityKind::Adjustments => data.adjustments.clear(),
            EntityKind::Settings => data.settings = None,
            EntityKind::WarmupPlan => data.warmup_plan = None,
            EntityKind::TimerState => data.timer_state = None,
        }
        Ok(())
    }

    fn counts(&self) -> RemoteResult<EntityCounts> {
        self.ensure_online()?;
        Ok(self.data.lock().counts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchline_model::{Game, Personnel, PersonnelRole, Player};

    fn player(id: &str) -> Player {
        let mut p = Player::new(format!("Player {id}"));
        p.id = EntityId::from_raw(id);
        p
    }

    #[test]
    fn upsert_get_delete_round_trip() {
        let remote = MemoryRemote::new();
        remote.upsert(RemoteRecord::Player(player("p1"))).unwrap();

        let got = remote
            .get(EntityKind::Players, &EntityId::from_raw("p1"))
            .unwrap();
        assert!(matches!(got, Some(RemoteRecord::Player(_))));

        assert!(remote
            .delete(EntityKind::Players, &EntityId::from_raw("p1"))
            .unwrap());
        assert!(!remote
            .delete(EntityKind::Players, &EntityId::from_raw("p1"))
            .unwrap());
    }

    #[test]
    fn upsert_is_replace_not_append() {
        let remote = MemoryRemote::new();
        remote.upsert(RemoteRecord::Player(player("p1"))).unwrap();

        let mut renamed = player("p1");
        renamed.name = "Renamed".into();
        remote.upsert(RemoteRecord::Player(renamed)).unwrap();

        let snapshot = remote.fetch_snapshot().unwrap();
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].name, "Renamed");
    }

    #[test]
    fn offline_fails_every_call() {
        let remote = MemoryRemote::new();
        remote.set_online(false);

        assert!(matches!(
            remote.fetch_snapshot(),
            Err(RemoteError::Offline)
        ));
        assert!(matches!(
            remote.upsert(RemoteRecord::Player(player("p1"))),
            Err(RemoteError::Offline)
        ));
        assert!(matches!(remote.counts(), Err(RemoteError::Offline)));
    }

    #[test]
    fn personnel_delete_cascades_into_games() {
        let remote = MemoryRemote::new();
        let mut coach = Personnel::new("Coach", PersonnelRole::HeadCoach);
        coach.id = EntityId::from_raw("c1");
        remote.upsert(RemoteRecord::Personnel(coach)).unwrap();

        let mut game = Game::new("Us", "Them");
        game.game_personnel.push(EntityId::from_raw("c1"));
        remote
            .upsert(RemoteRecord::Game {
                id: EntityId::from_raw("g1"),
                game,
            })
            .unwrap();

        assert!(remote
            .delete(EntityKind::Personnel, &EntityId::from_raw("c1"))
            .unwrap());
        let snapshot = remote.fetch_snapshot().unwrap();
        assert!(snapshot.games[&EntityId::from_raw("g1")]
            .game_personnel
            .is_empty());
    }

    #[test]
    fn dropped_write_is_accepted_but_absent() {
        let remote = MemoryRemote::new();
        remote.drop_silently(EntityKind::Players, EntityId::from_raw("p1"));

        remote.upsert(RemoteRecord::Player(player("p1"))).unwrap();
        assert_eq!(remote.counts().unwrap().players, 0);
    }

    #[test]
    fn clear_failures_count_down() {
        let remote = MemoryRemote::new();
        remote.upsert(RemoteRecord::Player(player("p1"))).unwrap();
        remote.fail_next_clears(1);

        assert!(remote.clear(EntityKind::Players).is_err());
        remote.clear(EntityKind::Players).unwrap();
        assert_eq!(remote.counts().unwrap().players, 0);
    }

    #[test]
    fn injected_upsert_failure_targets_one_id() {
        let remote = MemoryRemote::new();
        remote.fail_upserts_for(EntityId::from_raw("p1"));

        assert!(remote.upsert(RemoteRecord::Player(player("p1"))).is_err());
        remote.upsert(RemoteRecord::Player(player("p2"))).unwrap();
        assert_eq!(remote.counts().unwrap().players, 1);
    }
}
