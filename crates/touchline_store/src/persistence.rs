//! Persistence backends for the local store.
//!
//! The local store keeps its working image in memory and writes every
//! collection through to a [`Persistence`] backend as one document per
//! kind. The file backend is the real one; the memory backend backs
//! tests and throwaway stores.

use crate::config::StoreConfig;
use crate::dir::StoreDir;
use crate::error::StoreResult;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use touchline_model::EntityKind;

/// Whole-document storage, one document per entity kind.
pub trait Persistence: Send + Sync {
    /// Loads the stored document for one kind; `None` if never written.
    fn load(&self, kind: EntityKind) -> StoreResult<Option<Vec<u8>>>;

    /// Stores the full document for one kind, replacing what was there.
    fn store(&self, kind: EntityKind, bytes: &[u8]) -> StoreResult<()>;

    /// Puts an unreadable document aside so the kind loads as absent.
    /// The document is preserved, not destroyed.
    fn quarantine(&self, kind: EntityKind) -> StoreResult<()>;
}

/// In-memory persistence for tests and throwaway stores.
///
/// Supports failure injection: stores for chosen kinds can be made to
/// fail, which is how rollback paths get exercised.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    files: Mutex<HashMap<EntityKind, Vec<u8>>>,
    quarantined: Mutex<Vec<EntityKind>>,
    failing: Mutex<HashSet<EntityKind>>,
}

impl MemoryPersistence {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent store for `kind` fail.
    pub fn fail_stores_for(&self, kind: EntityKind) {
        self.failing.lock().insert(kind);
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    /// Kinds that have been quarantined, in order.
    #[must_use]
    pub fn quarantined(&self) -> Vec<EntityKind> {
        self.quarantined.lock().clone()
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, kind: EntityKind) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.files.lock().get(&kind).cloned())
    }

    fn store(&self, kind: EntityKind, bytes: &[u8]) -> StoreResult<()> {
        if self.failing.lock().contains(&kind) {
            return Err(crate::error::StoreError::storage(format!(
                "injected store failure for {kind}"
            )));
        }
        self.files.lock().insert(kind, bytes.to_vec());
        Ok(())
    }

    fn quarantine(&self, kind: EntityKind) -> StoreResult<()> {
        self.files.lock().remove(&kind);
        self.quarantined.lock().push(kind);
        Ok(())
    }
}

/// File-backed persistence over a locked [`StoreDir`].
#[derive(Debug)]
pub struct FilePersistence {
    dir: StoreDir,
}

impl FilePersistence {
    /// Opens the store directory, acquiring its exclusive lock.
    pub fn open(path: &Path, config: &StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            dir: StoreDir::open(path, config)?,
        })
    }

    /// The underlying directory.
    #[must_use]
    pub fn dir(&self) -> &StoreDir {
        &self.dir
    }
}

impl Persistence for FilePersistence {
    fn load(&self, kind: EntityKind) -> StoreResult<Option<Vec<u8>>> {
        self.dir.read(kind)
    }

    fn store(&self, kind: EntityKind, bytes: &[u8]) -> StoreResult<()> {
        self.dir.write_atomic(kind, bytes)
    }

    fn quarantine(&self, kind: EntityKind) -> StoreResult<()> {
        self.dir.quarantine(kind)?;
        Ok(())
    }
}
