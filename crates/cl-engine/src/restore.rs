//! Restoring shelved changelists, with conflict prediction.
//!
//! A restore replays a stash pop, so before touching git we classify
//! every shelved file against the current working tree and refuse the
//! whole restore when a pop would collide. The prediction is
//! deliberately conservative: a blocked restore changes nothing.

use std::fmt;

use cl_core::{ShelvedRecord, StatusCode};
use cl_git::{find_stash_by_message, Vcs};
use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::EngineError;

/// Why a shelved file would collide on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// An untracked file now occupies the path the pop would recreate.
    UntrackedPresent,
    /// The path has unstaged modifications the pop would overwrite.
    UnstagedModification,
}

impl ConflictKind {
    /// A short suggestion for clearing the conflict.
    #[must_use]
    pub fn suggestion(self) -> &'static str {
        match self {
            Self::UntrackedPresent => "move the file aside, or commit it first",
            Self::UnstagedModification => "commit or stash your local changes first",
        }
    }
}

/// One predicted collision between a shelved file and the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Storage-relative path.
    pub path: String,
    /// Why the pop would collide here.
    pub kind: ConflictKind,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.kind.suggestion())
    }
}

/// The pre-restore verdict for one changelist.
#[derive(Debug, Clone, Default)]
pub struct RestoreCheck {
    /// Files absent from the working tree (the ideal case).
    pub absent: Vec<String>,
    /// Files present but clean or staged-only (git merges cleanly).
    pub safe: Vec<String>,
    /// Files that would collide; any entry blocks the restore.
    pub conflicts: Vec<Conflict>,
}

impl RestoreCheck {
    /// Whether the restore may proceed.
    #[inline]
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// What a completed restore did.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    /// The changelist name.
    pub name: String,
    /// Files returned to the working tree.
    pub files: Vec<String>,
}

/// Classifies `record`'s files against the current working tree.
///
/// Absent is ideal, clean or staged-only is safe, anything else blocks.
/// Untracked files that were never part of the stash (the categories
/// said they were tracked) still block: the pop would refuse to
/// overwrite them.
pub(crate) fn classify<V: Vcs>(
    engine: &Engine<V>,
    record: &ShelvedRecord,
) -> Result<RestoreCheck, EngineError> {
    let snapshot = engine.vcs().status_snapshot(true)?;
    let mut check = RestoreCheck::default();

    for path in &record.files {
        let on_disk = engine
            .vcs()
            .repo_root()
            .join(path.as_str())
            .as_std_path()
            .exists();
        if !on_disk {
            check.absent.push(path.clone());
            continue;
        }

        let code = snapshot.code_for(path);
        if code.index == '?' {
            check.conflicts.push(Conflict {
                path: path.clone(),
                kind: ConflictKind::UntrackedPresent,
            });
        } else if code == StatusCode::clean() || !code.has_unstaged() {
            check.safe.push(path.clone());
        } else {
            check.conflicts.push(Conflict {
                path: path.clone(),
                kind: ConflictKind::UnstagedModification,
            });
        }
    }

    Ok(check)
}

impl<V: Vcs> Engine<V> {
    /// Predicts whether restoring `name` would collide, without
    /// touching anything.
    pub fn restore_check(&self, name: &str) -> Result<RestoreCheck, EngineError> {
        let records = self.shelf_store().load()?;
        let record = records
            .get(name)
            .ok_or_else(|| EngineError::NotShelved(name.to_owned()))?;
        classify(self, record)
    }

    /// Restores one shelved changelist.
    ///
    /// Pops the stash first, then moves the membership back to the
    /// active store; a failed pop leaves the shelf record in place so
    /// the restore can be retried. A record whose stash entry has
    /// vanished (dropped by hand) is never silently discarded; it
    /// surfaces as a consistency error with recovery guidance.
    pub fn restore(&self, name: &str) -> Result<RestoreOutcome, EngineError> {
        let records = self.shelf_store().load()?;
        let record = records
            .get(name)
            .ok_or_else(|| EngineError::NotShelved(name.to_owned()))?
            .clone();

        let check = classify(self, &record)?;
        if !check.is_clear() {
            return Err(EngineError::RestoreBlocked {
                name: name.to_owned(),
                conflicts: check.conflicts,
            });
        }

        // Resolve the stash by message: indices shift as other stashes
        // come and go, so the recorded reference is only a hint.
        let reference = find_stash_by_message(&self.vcs().stash_list()?, &record.shelf_message)
            .ok_or_else(|| {
                EngineError::Consistency(format!(
                    "no stash entry matches '{}' for changelist '{name}'; \
                     inspect 'git stash list' and, if the work is gone, \
                     remove the record with 'git-cl delete {name}' after \
                     unstashing manually",
                    record.shelf_message
                ))
            })?;
        debug!(changelist = name, %reference, "popping shelf stash");
        self.vcs().stash_pop(&reference)?;

        // Lock ordering: active before shelf.
        self.active_store().with_lock(|active| {
            self.shelf_store().with_lock(|shelf| {
                let mut records = shelf.load()?;
                records.remove(name);
                shelf.save(&records)?;

                let mut lists = active.load()?;
                lists.insert(name.to_owned(), record.files.clone());
                active.save(&lists)?;
                Ok::<(), EngineError>(())
            })
        })?;

        info!(changelist = name, files = record.files.len(), "restored changelist");
        Ok(RestoreOutcome {
            name: name.to_owned(),
            files: record.files,
        })
    }

    /// Restores every shelved changelist, newest shelf first.
    ///
    /// Stops at the first failure and reports what was restored before
    /// it; earlier restores are not undone.
    pub fn restore_all(&self) -> Result<Vec<RestoreOutcome>, EngineError> {
        let mut names: Vec<(String, u64)> = self
            .shelf_store()
            .load()?
            .iter()
            .map(|(name, record)| (name.clone(), record.timestamp))
            .collect();
        names.sort_by(|a, b| b.1.cmp(&a.1));

        let mut outcomes = Vec::new();
        for (name, _) in names {
            outcomes.push(self.restore(&name)?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{engine_with, shelved_record, FakeVcs};

    #[test]
    fn test_restore_check_absent_is_clear() {
        let Some((_dir, engine)) = engine_with(FakeVcs::default()) else {
            return;
        };
        let record = shelved_record(&["gone.txt"]);
        let check = classify(&engine, &record).ok();
        assert!(check.as_ref().is_some_and(RestoreCheck::is_clear));
        assert_eq!(check.map(|c| c.absent), Some(vec!["gone.txt".to_owned()]));
    }

    #[test]
    fn test_restore_check_untracked_blocks() {
        let vcs = FakeVcs::default().with_status("taken.txt", '?', '?');
        let Some((dir, engine)) = engine_with(vcs) else {
            return;
        };
        let _ = std::fs::write(dir.path().join("taken.txt"), "squatter");

        let record = shelved_record(&["taken.txt"]);
        let check = classify(&engine, &record).ok();
        assert_eq!(
            check.and_then(|c| c.conflicts.first().map(|x| x.kind)),
            Some(ConflictKind::UntrackedPresent)
        );
    }

    #[test]
    fn test_restore_check_unstaged_modification_blocks() {
        let vcs = FakeVcs::default().with_status("dirty.txt", ' ', 'M');
        let Some((dir, engine)) = engine_with(vcs) else {
            return;
        };
        let _ = std::fs::write(dir.path().join("dirty.txt"), "local edits");

        let record = shelved_record(&["dirty.txt"]);
        let check = classify(&engine, &record).ok();
        assert_eq!(
            check.and_then(|c| c.conflicts.first().map(|x| x.kind)),
            Some(ConflictKind::UnstagedModification)
        );
    }

    #[test]
    fn test_restore_check_staged_only_is_safe() {
        let vcs = FakeVcs::default().with_status("staged.txt", 'M', ' ');
        let Some((dir, engine)) = engine_with(vcs) else {
            return;
        };
        let _ = std::fs::write(dir.path().join("staged.txt"), "staged");

        let record = shelved_record(&["staged.txt"]);
        let check = classify(&engine, &record).ok();
        assert!(check.as_ref().is_some_and(RestoreCheck::is_clear));
        assert_eq!(check.map(|c| c.safe), Some(vec!["staged.txt".to_owned()]));
    }

    #[test]
    fn test_restore_unknown_name() {
        let Some((_dir, engine)) = engine_with(FakeVcs::default()) else {
            return;
        };
        assert!(matches!(
            engine.restore("never-shelved"),
            Err(EngineError::NotShelved(_))
        ));
    }
}
