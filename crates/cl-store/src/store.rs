//! The JSON document stores.
//!
//! [`JsonStore`] is the generic load/save/lock mechanism; [`ActiveStore`]
//! and [`ShelfStore`] bind it to the two documents git-cl persists and
//! add the document-specific rules (the active store prunes empty
//! changelists on every save).

use camino::{Utf8Path, Utf8PathBuf};
use cl_core::record::ShelvedRecords;
use cl_core::Changelists;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

use crate::error::StoreError;
use crate::lock::StoreLock;

/// File name of the active-changelist document, under `.git/`.
pub const ACTIVE_FILE: &str = "cl.json";

/// File name of the shelved-record document, under `.git/`.
pub const SHELF_FILE: &str = "cl-stashes.json";

/// How many times a lock acquisition is retried before giving up.
const LOCK_RETRIES: u32 = 3;

/// Pause between lock retries.
const LOCK_RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(50);

/// A single JSON document with advisory locking and atomic saves.
///
/// Every operation re-reads from disk; no state is cached between
/// operations because other invocations may run in between.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: Utf8PathBuf,
    _doc: std::marker::PhantomData<T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Creates a store for the document at `path`.
    #[must_use]
    pub fn new(path: Utf8PathBuf) -> Self {
        Self {
            path,
            _doc: std::marker::PhantomData,
        }
    }

    /// The document path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Loads the document, or its `Default` if the file does not exist.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] for unreadable files, [`StoreError::Parse`] for
    /// corrupt documents.
    pub fn load(&self) -> Result<T, StoreError> {
        let contents = match std::fs::read_to_string(self.path.as_std_path()) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(StoreError::io(self.path.clone(), e)),
        };
        serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Saves the document atomically: write to a temp file in the same
    /// directory, then rename over the real path. A crash mid-write
    /// leaves the previous document intact.
    pub fn save(&self, doc: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc).map_err(StoreError::Serialize)?;

        let dir = self.path.parent().unwrap_or(Utf8Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir.as_std_path())
            .map_err(|e| StoreError::io(self.path.clone(), e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.write_all(b"\n"))
            .map_err(|e| StoreError::io(self.path.clone(), e))?;
        tmp.persist(self.path.as_std_path())
            .map_err(|e| StoreError::io(self.path.clone(), e.error))?;

        debug!(path = %self.path, "saved metadata document");
        Ok(())
    }

    /// Runs `f` under the document's exclusive advisory lock.
    ///
    /// The lock covers the whole read-modify-write cycle and is released
    /// on every exit path. Acquisition is retried briefly; persistent
    /// contention surfaces as [`StoreError::LockContention`].
    pub fn with_lock<R, E, F>(&self, f: F) -> Result<R, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Self) -> Result<R, E>,
    {
        let _guard = self.acquire_lock()?;
        f(self)
    }

    fn acquire_lock(&self) -> Result<StoreLock, StoreError> {
        let mut attempt = 0;
        loop {
            match StoreLock::acquire(&self.path) {
                Ok(guard) => return Ok(guard),
                Err(e) if e.is_contention() && attempt < LOCK_RETRIES => {
                    attempt += 1;
                    std::thread::sleep(LOCK_RETRY_DELAY);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// The active-changelist store (`.git/cl.json`).
#[derive(Debug, Clone)]
pub struct ActiveStore {
    inner: JsonStore<Changelists>,
}

impl ActiveStore {
    /// Creates the store rooted at `git_dir` (the repository's `.git`).
    #[must_use]
    pub fn new(git_dir: &Utf8Path) -> Self {
        Self {
            inner: JsonStore::new(git_dir.join(ACTIVE_FILE)),
        }
    }

    /// The document path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.inner.path()
    }

    /// Loads all active changelists.
    pub fn load(&self) -> Result<Changelists, StoreError> {
        self.inner.load()
    }

    /// Saves the changelists, pruning empty ones first.
    ///
    /// Empty lists are never persisted; a changelist emptied by a normal
    /// mutation simply disappears from the document.
    pub fn save(&self, lists: &Changelists) -> Result<(), StoreError> {
        let pruned: Changelists = lists
            .iter()
            .filter(|(_, files)| !files.is_empty())
            .map(|(name, files)| (name.clone(), files.clone()))
            .collect();
        self.inner.save(&pruned)
    }

    /// Runs `f` under this document's lock.
    pub fn with_lock<R, E, F>(&self, f: F) -> Result<R, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Self) -> Result<R, E>,
    {
        let _guard = self.inner.acquire_lock().map_err(E::from)?;
        f(self)
    }
}

/// The shelved-record store (`.git/cl-stashes.json`).
///
/// Independent lock scope from [`ActiveStore`]: shelving mutates both
/// stores, but a plain status read of one never waits on the other.
#[derive(Debug, Clone)]
pub struct ShelfStore {
    inner: JsonStore<ShelvedRecords>,
}

impl ShelfStore {
    /// Creates the store rooted at `git_dir`.
    #[must_use]
    pub fn new(git_dir: &Utf8Path) -> Self {
        Self {
            inner: JsonStore::new(git_dir.join(SHELF_FILE)),
        }
    }

    /// The document path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.inner.path()
    }

    /// Loads all shelved records.
    pub fn load(&self) -> Result<ShelvedRecords, StoreError> {
        self.inner.load()
    }

    /// Saves the records.
    pub fn save(&self, records: &ShelvedRecords) -> Result<(), StoreError> {
        self.inner.save(records)
    }

    /// Runs `f` under this document's lock.
    pub fn with_lock<R, E, F>(&self, f: F) -> Result<R, E>
    where
        E: From<StoreError>,
        F: FnOnce(&Self) -> Result<R, E>,
    {
        let _guard = self.inner.acquire_lock().map_err(E::from)?;
        f(self)
    }
}
