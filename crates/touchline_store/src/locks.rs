//! Key-scoped locking with one global acquisition order.

use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use touchline_model::EntityKind;

/// A lockable region of the store, one per collection or singleton.
///
/// The declaration order is the single global acquisition order: every
/// multi-key operation sorts its keys and acquires them ascending, which
/// rules out lock cycles. A staff delete, for example, takes
/// `Personnel` then `Games`, never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    /// The players collection.
    Players,
    /// The teams collection.
    Teams,
    /// The roster entries collection.
    Rosters,
    /// The seasons collection.
    Seasons,
    /// The tournaments collection.
    Tournaments,
    /// The personnel collection.
    Personnel,
    /// The games collection.
    Games,
    /// The stat adjustments collection.
    Adjustments,
    /// The settings singleton.
    Settings,
    /// The warmup plan singleton.
    WarmupPlan,
    /// The timer state singleton.
    TimerState,
}

impl StoreKey {
    /// The key guarding one entity kind.
    #[must_use]
    pub const fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Players => Self::Players,
            EntityKind::Teams => Self::Teams,
            EntityKind::Rosters => Self::Rosters,
            EntityKind::Seasons => Self::Seasons,
            EntityKind::Tournaments => Self::Tournaments,
            EntityKind::Personnel => Self::Personnel,
            EntityKind::Games => Self::Games,
            EntityKind::Adjustments => Self::Adjustments,
            EntityKind::Settings => Self::Settings,
            EntityKind::WarmupPlan => Self::WarmupPlan,
            EntityKind::TimerState => Self::TimerState,
        }
    }
}

/// Grants exclusive access to sets of [`StoreKey`]s.
///
/// Waiting is unbounded and in-process only; coordination across
/// processes is the store directory lock's job, not this one's.
#[derive(Debug, Default)]
pub struct KeyLockManager {
    held: Mutex<HashSet<StoreKey>>,
    released: Condvar,
}

impl KeyLockManager {
    /// Creates a manager with no keys held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires every key in `keys`, blocking until all are free.
    ///
    /// Keys are deduplicated and acquired in the global order
    /// regardless of the order the caller lists them in.
    pub fn lock(&self, keys: &[StoreKey]) -> KeyLockGuard<'_> {
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut held = self.held.lock();
        for key in &sorted {
            while held.contains(key) {
                self.released.wait(&mut held);
            }
            held.insert(*key);
        }
        drop(held);

        KeyLockGuard {
            manager: self,
            keys: sorted,
        }
    }

    /// Acquires the single key guarding one entity kind.
    pub fn lock_kind(&self, kind: EntityKind) -> KeyLockGuard<'_> {
        self.lock(&[StoreKey::for_kind(kind)])
    }
}

/// Holds a set of keys; releases them all on drop.
#[derive(Debug)]
pub struct KeyLockGuard<'a> {
    manager: &'a KeyLockManager,
    keys: Vec<StoreKey>,
}

impl KeyLockGuard<'_> {
    /// The keys this guard holds, in the global order.
    #[must_use]
    pub fn keys(&self) -> &[StoreKey] {
        &self.keys
    }
}

impl Drop for KeyLockGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.manager.held.lock();
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);
        self.manager.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn declaration_order_is_the_global_order() {
        assert!(StoreKey::Personnel < StoreKey::Games);
        assert!(StoreKey::Players < StoreKey::Adjustments);
        assert!(StoreKey::Teams < StoreKey::Rosters);
    }

    #[test]
    fn for_kind_maps_every_kind() {
        for kind in EntityKind::ALL {
            let key = StoreKey::for_kind(kind);
            assert_eq!(format!("{key:?}"), format!("{kind:?}"));
        }
    }

    #[test]
    fn duplicate_keys_collapse() {
        let manager = KeyLockManager::new();
        let guard = manager.lock(&[StoreKey::Players, StoreKey::Players]);
        assert_eq!(guard.keys(), &[StoreKey::Players]);
    }

    #[test]
    fn disjoint_keys_do_not_block_each_other() {
        let manager = KeyLockManager::new();
        let _players = manager.lock(&[StoreKey::Players]);
        // Completes immediately; a block here would hang the test.
        let _teams = manager.lock(&[StoreKey::Teams]);
    }

    #[test]
    fn contended_key_serializes_writers() {
        let manager = Arc::new(KeyLockManager::new());
        let value = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let value = Arc::clone(&value);
                thread::spawn(move || {
                    let _guard = manager.lock(&[StoreKey::Games]);
                    // Racy read-modify-write; the key lock makes it safe.
                    let seen = value.load(Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    value.store(seen + 1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(value.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn overlapping_multi_key_locks_make_progress() {
        let manager = Arc::new(KeyLockManager::new());
        let sets: [Vec<StoreKey>; 3] = [
            vec![StoreKey::Games, StoreKey::Personnel],
            vec![StoreKey::Adjustments, StoreKey::Games],
            vec![StoreKey::Personnel, StoreKey::Adjustments],
        ];

        let handles: Vec<_> = sets
            .into_iter()
            .map(|keys| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let _guard = manager.lock(&keys);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
