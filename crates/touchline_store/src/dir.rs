//! Store directory management.
//!
//! File system layout of a local store:
//!
//! ```text
//! <store_path>/
//! ├─ LOCK                          # Advisory lock for single-writer
//! ├─ players.json                  # One JSON document per collection
//! ├─ teams.json
//! ├─ ...
//! ├─ settings.json                 # One document per singleton
//! └─ games.json.corrupt-<millis>   # Quarantined unreadable file
//! ```
//!
//! The LOCK file ensures only one process writes the store at a time.
//! Data files are written with write-then-rename plus a directory fsync
//! so a crash never leaves a half-written collection behind.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use touchline_model::{now_ms, EntityKind};

const LOCK_FILE: &str = "LOCK";

/// Manages the store directory: locking, atomic writes, quarantine.
///
/// Holds an exclusive advisory lock on the directory for its whole
/// lifetime; only one `StoreDir` can exist per directory at a time.
#[derive(Debug)]
pub struct StoreDir {
    path: PathBuf,
    sync_on_write: bool,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl StoreDir {
    /// Opens or creates a store directory.
    ///
    /// # Errors
    ///
    /// - `Storage` if the directory doesn't exist and
    ///   `config.create_if_missing` is false, or if it already holds
    ///   store files and `config.error_if_exists` is true.
    /// - `Locked` if another process holds the lock.
    pub fn open(path: &Path, config: &StoreConfig) -> StoreResult<Self> {
        if !path.exists() {
            if config.create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(StoreError::storage(format!(
                    "store directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(StoreError::storage(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        if config.error_if_exists && Self::holds_store_files(path) {
            return Err(StoreError::storage(format!(
                "store already exists: {}",
                path.display()
            )));
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        // Non-blocking: a held lock means another writer, not a queue.
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            sync_on_write: config.sync_on_write,
            _lock_file: lock_file,
        })
    }

    /// Whether `path` already contains any collection file.
    #[must_use]
    pub fn holds_store_files(path: &Path) -> bool {
        EntityKind::ALL
            .into_iter()
            .any(|kind| path.join(format!("{kind}.json")).exists())
    }

    /// Returns the store directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the data file path for one kind.
    #[must_use]
    pub fn file_path(&self, kind: EntityKind) -> PathBuf {
        self.path.join(format!("{kind}.json"))
    }

    /// Reads one kind's file; `None` if it doesn't exist or is empty.
    pub fn read(&self, kind: EntityKind) -> StoreResult<Option<Vec<u8>>> {
        let path = self.file_path(kind);
        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        if data.is_empty() {
            return Ok(None);
        }
        Ok(Some(data))
    }

    /// Writes one kind's file atomically.
    ///
    /// Write-then-rename for crash safety:
    /// 1. Write to a temporary file next to the target
    /// 2. Sync the temporary file to disk
    /// 3. Rename it over the target
    /// 4. Fsync the directory so the rename is durable
    pub fn write_atomic(&self, kind: EntityKind, bytes: &[u8]) -> StoreResult<()> {
        let target = self.file_path(kind);
        let temp = self.path.join(format!("{kind}.json.tmp"));

        let mut file = File::create(&temp)?;
        file.write_all(bytes)?;
        if self.sync_on_write {
            file.sync_all()?;
        }
        drop(file);

        fs::rename(&temp, &target)?;

        if self.sync_on_write {
            self.sync_directory()?;
        }
        Ok(())
    }

    /// Moves one kind's unreadable file aside and leaves no data file.
    ///
    /// The file is renamed to `<kind>.json.corrupt-<millis>` so nothing
    /// is destroyed; a subsequent [`StoreDir::read`] returns `None` and
    /// the collection restarts empty. Returns the quarantine path, or
    /// `None` if there was no file to move.
    pub fn quarantine(&self, kind: EntityKind) -> StoreResult<Option<PathBuf>> {
        let source = self.file_path(kind);
        if !source.exists() {
            return Ok(None);
        }

        let target = self.path.join(format!("{kind}.json.corrupt-{}", now_ms()));
        fs::rename(&source, &target)?;
        self.sync_directory()?;
        Ok(Some(target))
    }

    /// Syncs the store directory so renames and deletes are durable.
    #[cfg(unix)]
    fn sync_directory(&self) -> StoreResult<()> {
        // On Unix, fsync on a directory syncs the directory entries.
        let dir = File::open(&self.path)?;
        dir.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StoreResult<()> {
        // Windows NTFS journaling covers metadata durability; directory
        // fsync is not directly supported there.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("new_store");
        assert!(!path.exists());

        let dir = StoreDir::open(&path, &StoreConfig::default()).unwrap();
        assert!(path.is_dir());
        drop(dir);
    }

    #[test]
    fn open_fails_if_not_exists_and_no_create() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nonexistent");

        let config = StoreConfig::new().create_if_missing(false);
        assert!(StoreDir::open(&path, &config).is_err());
    }

    #[test]
    fn lock_prevents_second_open() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("locked");

        let _dir1 = StoreDir::open(&path, &StoreConfig::default()).unwrap();
        let result = StoreDir::open(&path, &StoreConfig::default());
        assert!(matches!(result, Err(StoreError::Locked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("reopen");

        {
            let _dir = StoreDir::open(&path, &StoreConfig::default()).unwrap();
        }
        let _dir2 = StoreDir::open(&path, &StoreConfig::default()).unwrap();
    }

    #[test]
    fn write_then_read_round_trip() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), &StoreConfig::default()).unwrap();

        assert!(dir.read(EntityKind::Players).unwrap().is_none());
        dir.write_atomic(EntityKind::Players, b"[]").unwrap();
        assert_eq!(dir.read(EntityKind::Players).unwrap().unwrap(), b"[]");

        // No leftover temp file.
        assert!(!temp.path().join("players.json.tmp").exists());
    }

    #[test]
    fn quarantine_moves_file_aside() {
        let temp = tempdir().unwrap();
        let dir = StoreDir::open(temp.path(), &StoreConfig::default()).unwrap();

        dir.write_atomic(EntityKind::Games, b"{not json").unwrap();
        let moved = dir.quarantine(EntityKind::Games).unwrap().unwrap();

        assert!(moved.exists());
        assert!(moved
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("games.json.corrupt-"));
        assert!(dir.read(EntityKind::Games).unwrap().is_none());

        // Nothing to quarantine the second time.
        assert!(dir.quarantine(EntityKind::Games).unwrap().is_none());
    }

    #[test]
    fn error_if_exists_rejects_populated_directory() {
        let temp = tempdir().unwrap();
        {
            let dir = StoreDir::open(temp.path(), &StoreConfig::default()).unwrap();
            dir.write_atomic(EntityKind::Teams, b"[]").unwrap();
        }

        let config = StoreConfig::new().error_if_exists(true);
        assert!(StoreDir::open(temp.path(), &config).is_err());
    }
}
