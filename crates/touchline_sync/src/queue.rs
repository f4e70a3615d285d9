//! The bounded queue of mutations awaiting cloud replay.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use touchline_model::{EntityId, EntityKind};
use touchline_remote::RemoteRecord;

/// One queued mutation to replay against the cloud.
///
/// Replays are idempotent: an upsert is create-or-replace, and deleting
/// an already-absent record is success. A task that runs twice leaves
/// the cloud in the same state as a task that runs once.
#[derive(Debug, Clone)]
pub enum SyncTask {
    /// Create-or-replace one record.
    Upsert(RemoteRecord),
    /// Delete one record.
    Delete {
        /// Collection or singleton to delete from.
        kind: EntityKind,
        /// The record's id.
        id: EntityId,
    },
}

impl SyncTask {
    /// The entity kind this task touches.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Upsert(record) => record.kind(),
            Self::Delete { kind, .. } => *kind,
        }
    }

    /// A short description for logs and error reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Upsert(record) => match record.id() {
                Some(id) => format!("upsert {} {id}", record.kind()),
                None => format!("upsert {}", record.kind()),
            },
            Self::Delete { kind, id } => format!("delete {kind} {id}"),
        }
    }
}

/// A bounded FIFO queue of [`SyncTask`]s.
///
/// [`SyncQueue::push`] blocks while the queue is full, so a burst of
/// writes backpressures the writer instead of growing without bound.
#[derive(Debug)]
pub struct SyncQueue {
    inner: Mutex<VecDeque<SyncTask>>,
    capacity: usize,
    task_available: Condvar,
    space_available: Condvar,
}

impl SyncQueue {
    /// Creates a queue holding at most `capacity` tasks (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            task_available: Condvar::new(),
            space_available: Condvar::new(),
        }
    }

    /// The queue's capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a task, blocking while the queue is full.
    pub fn push(&self, task: SyncTask) {
        let mut inner = self.inner.lock();
        while inner.len() >= self.capacity {
            self.space_available.wait(&mut inner);
        }
        inner.push_back(task);
        drop(inner);
        self.task_available.notify_one();
    }

    /// Pops the oldest task, waiting up to `timeout` for one to arrive.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<SyncTask> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        loop {
            if let Some(task) = inner.pop_front() {
                drop(inner);
                self.space_available.notify_one();
                return Some(task);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let timed_out = self
                .task_available
                .wait_for(&mut inner, deadline - now)
                .timed_out();
            if timed_out && inner.is_empty() {
                return None;
            }
        }
    }

    /// How many tasks are waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Removes and returns every waiting task, unblocking pushers.
    pub fn drain(&self) -> Vec<SyncTask> {
        let mut inner = self.inner.lock();
        let tasks: Vec<SyncTask> = inner.drain(..).collect();
        drop(inner);
        self.space_available.notify_all();
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use touchline_model::Player;

    fn upsert(id: &str) -> SyncTask {
        let mut p = Player::new("Queued");
        p.id = EntityId::from_raw(id);
        SyncTask::Upsert(RemoteRecord::Player(p))
    }

    #[test]
    fn tasks_come_out_in_push_order() {
        let queue = SyncQueue::new(8);
        queue.push(upsert("p1"));
        queue.push(SyncTask::Delete {
            kind: EntityKind::Teams,
            id: EntityId::from_raw("t1"),
        });

        let first = queue.pop_timeout(Duration::ZERO).unwrap();
        assert_eq!(first.describe(), "upsert players p1");
        let second = queue.pop_timeout(Duration::ZERO).unwrap();
        assert_eq!(second.describe(), "delete teams t1");
        assert!(queue.pop_timeout(Duration::ZERO).is_none());
    }

    #[test]
    fn pop_times_out_on_an_empty_queue() {
        let queue = SyncQueue::new(8);
        let start = Instant::now();
        assert!(queue.pop_timeout(Duration::from_millis(30)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn push_blocks_when_full_and_resumes_after_pop() {
        let queue = Arc::new(SyncQueue::new(1));
        queue.push(upsert("p1"));

        let (sent, landed) = mpsc::channel();
        let pusher = {
            let queue = queue.clone();
            std::thread::spawn(move || {
                queue.push(upsert("p2"));
                sent.send(()).ok();
            })
        };

        // The second push is stuck behind the full queue.
        assert!(landed
            .recv_timeout(Duration::from_millis(50))
            .is_err());

        queue.pop_timeout(Duration::ZERO).unwrap();
        landed
            .recv_timeout(Duration::from_secs(2))
            .expect("push resumed after space opened");
        pusher.join().unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn drain_empties_and_unblocks() {
        let queue = Arc::new(SyncQueue::new(2));
        queue.push(upsert("p1"));
        queue.push(upsert("p2"));

        let pusher = {
            let queue = queue.clone();
            std::thread::spawn(move || queue.push(upsert("p3")))
        };

        std::thread::sleep(Duration::from_millis(20));
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);

        pusher.join().unwrap();
        assert_eq!(queue.len(), 1);
    }
}
