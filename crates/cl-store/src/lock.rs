//! Advisory file locking for metadata documents.
//!
//! Each document gets a companion lock file (`cl.json` → `cl.json.lock`)
//! holding a small JSON payload identifying the current holder. The lock
//! is an OS advisory lock via [`fs2`], so it evaporates if the holding
//! process dies, and the payload is only ever diagnostic.
//!
//! The lock is held for the full read-modify-write cycle and released on
//! [`Drop`], which covers every exit path including errors.

use std::fs::{File, OpenOptions};
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;

/// Diagnostic payload written into the lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockHolder {
    /// Process id of the holder.
    pid: u32,
    /// Acquisition time, seconds since the Unix epoch.
    acquired_at: u64,
}

impl LockHolder {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        }
    }
}

/// An exclusive advisory lock scoped to one metadata document.
///
/// Acquired before the document is read, released (and the lock file
/// removed) when the guard is dropped after the write completes or the
/// operation bails out.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use cl_store::StoreLock;
///
/// let lock = StoreLock::acquire(Utf8Path::new("/repo/.git/cl.json"))?;
/// // read, modify, write ...
/// drop(lock);
/// # Ok::<(), cl_store::StoreError>(())
/// ```
#[derive(Debug)]
pub struct StoreLock {
    /// Kept open for the lifetime of the guard; holds the OS lock.
    file: File,
    /// The lock file path, removed on release.
    lock_path: Utf8PathBuf,
}

impl StoreLock {
    /// Attempts to acquire the lock for `doc_path` without blocking.
    ///
    /// # Errors
    ///
    /// [`StoreError::LockContention`] if another process holds the lock
    /// (with the holder's pid when the payload is readable), or
    /// [`StoreError::Io`] for anything else.
    pub fn acquire(doc_path: &Utf8Path) -> Result<Self, StoreError> {
        let lock_path = lock_path_for(doc_path);

        // Opening with create(true) rather than create_new: a leftover
        // lock file from a crashed process carries no OS lock, so the
        // try_lock below succeeds and we take over cleanly.
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path.as_std_path())
            .map_err(|e| StoreError::io(lock_path.clone(), e))?;

        if file.try_lock_exclusive().is_err() {
            let pid = read_holder(&lock_path).map(|h| h.pid);
            return Err(StoreError::LockContention {
                path: doc_path.to_path_buf(),
                pid,
            });
        }

        let holder = LockHolder::current();
        debug!(pid = holder.pid, lock = %lock_path, "acquired store lock");

        // Best effort: the payload is diagnostic only.
        if let Ok(json) = serde_json::to_string(&holder) {
            let _ = file.set_len(0);
            let _ = file.write_all(json.as_bytes());
            let _ = file.flush();
        }

        Ok(Self { file, lock_path })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(self.lock_path.as_std_path());
        debug!(lock = %self.lock_path, "released store lock");
    }
}

/// The lock file companion for a document.
#[must_use]
pub(crate) fn lock_path_for(doc_path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{doc_path}.lock"))
}

fn read_holder(lock_path: &Utf8Path) -> Option<LockHolder> {
    let contents = std::fs::read_to_string(lock_path.as_std_path()).ok()?;
    serde_json::from_str(&contents).ok()
}
