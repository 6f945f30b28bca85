//! The changelist engine: CRUD plus grouped status.
//!
//! [`Engine`] owns the two stores and the VCS gateway. Every mutating
//! call runs one read-modify-write cycle under the relevant advisory
//! lock and persists atomically; there is no partial persistence on
//! error.

use camino::{Utf8Path, Utf8PathBuf};
use cl_core::{sanitize, validate_name, Changelists, PathError, StatusCode};
use cl_git::status::StatusLine;
use cl_git::Vcs;
use cl_store::{ActiveStore, ShelfStore};
use tracing::debug;

use crate::error::EngineError;

/// One file within a status group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    /// Storage-relative path.
    pub path: String,
    /// The raw porcelain code (clean when git reported nothing).
    pub code: StatusCode,
}

/// One changelist's slice of the status view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// The changelist name.
    pub name: String,
    /// Member files with their current codes, sorted by path.
    pub entries: Vec<GroupEntry>,
}

/// The full grouped status view.
///
/// Produced from exactly one status query so the view is internally
/// consistent; querying twice with no intervening mutation yields
/// identical results.
#[derive(Debug, Clone, Default)]
pub struct GroupedStatus {
    /// Active changelists in name order.
    pub groups: Vec<Group>,
    /// Changed files that belong to no changelist.
    pub unassigned: Vec<GroupEntry>,
    /// Names currently shelved (so an interrupted workflow is visible
    /// on the very next status call).
    pub shelved: Vec<String>,
    /// Entries with unrecognized codes, suppressed from the groups.
    pub suppressed: Vec<StatusLine>,
}

/// What an [`Engine::assign`] call did.
#[derive(Debug, Clone, Default)]
pub struct AssignOutcome {
    /// Paths now in the target changelist (storage-relative).
    pub added: Vec<String>,
    /// Paths rejected by the resolver, with reasons.
    pub rejected: Vec<(String, PathError)>,
    /// Accepted paths that do not currently exist on disk (a warning;
    /// deleted files are legitimately assignable).
    pub missing: Vec<String>,
}

/// The engine: stores + VCS gateway + the caller's working directory.
#[derive(Debug)]
pub struct Engine<V: Vcs> {
    vcs: V,
    cwd: Utf8PathBuf,
    active: ActiveStore,
    shelf: ShelfStore,
}

impl<V: Vcs> Engine<V> {
    /// Creates an engine for the repository `vcs` is bound to, with
    /// paths resolved relative to `cwd`.
    #[must_use]
    pub fn new(vcs: V, cwd: Utf8PathBuf) -> Self {
        let active = ActiveStore::new(vcs.git_dir());
        let shelf = ShelfStore::new(vcs.git_dir());
        Self {
            vcs,
            cwd,
            active,
            shelf,
        }
    }

    /// The VCS gateway.
    #[inline]
    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// The caller's working directory.
    #[inline]
    #[must_use]
    pub fn cwd(&self) -> &Utf8Path {
        &self.cwd
    }

    /// The active-changelist store.
    #[inline]
    #[must_use]
    pub fn active_store(&self) -> &ActiveStore {
        &self.active
    }

    /// The shelved-record store.
    #[inline]
    #[must_use]
    pub fn shelf_store(&self) -> &ShelfStore {
        &self.shelf
    }

    /// Converts a storage-relative path to caller-relative form for
    /// display.
    #[must_use]
    pub fn display_path(&self, storage: &str) -> String {
        cl_core::to_caller_relative(Utf8Path::new(storage), &self.cwd, self.vcs.repo_root())
            .into_string()
    }

    /// Validates `name`, mapping failures into [`EngineError`].
    pub(crate) fn check_name(&self, name: &str) -> Result<(), EngineError> {
        validate_name(name).map_err(|source| EngineError::InvalidName {
            name: name.to_owned(),
            source,
        })
    }

    /// Resolves user paths, splitting them into accepted storage paths
    /// and rejections.
    pub(crate) fn resolve_paths(&self, paths: &[String]) -> (Vec<String>, Vec<(String, PathError)>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for given in paths {
            match sanitize(given, &self.cwd, self.vcs.repo_root()) {
                Ok(storage) => {
                    let storage = storage.into_string();
                    if !accepted.contains(&storage) {
                        accepted.push(storage);
                    }
                }
                Err(reason) => rejected.push((given.clone(), reason)),
            }
        }
        (accepted, rejected)
    }

    /// Assigns files to a changelist, creating it on first use.
    ///
    /// A path already held by another changelist migrates silently: a
    /// path belongs to at most one changelist at any time. Paths are
    /// deduplicated within the call.
    pub fn assign(&self, name: &str, paths: &[String]) -> Result<AssignOutcome, EngineError> {
        self.check_name(name)?;

        // A shelved name must be restored before it can grow again.
        if self.shelf.load()?.contains_key(name) {
            return Err(EngineError::Shelved(name.to_owned()));
        }

        let (accepted, rejected) = self.resolve_paths(paths);
        if accepted.is_empty() {
            if rejected.is_empty() {
                return Err(EngineError::NoValidPaths);
            }
            return Ok(AssignOutcome {
                rejected,
                ..AssignOutcome::default()
            });
        }

        let missing: Vec<String> = accepted
            .iter()
            .filter(|p| !self.vcs.repo_root().join(p.as_str()).as_std_path().exists())
            .cloned()
            .collect();

        self.active.with_lock(|store| {
            let mut lists = store.load()?;

            // Enforce the at-most-one-changelist invariant up front.
            for files in lists.values_mut() {
                files.retain(|f| !accepted.contains(f));
            }

            let target = lists.entry(name.to_owned()).or_default();
            for path in &accepted {
                if !target.contains(path) {
                    target.push(path.clone());
                }
            }

            store.save(&lists)?;
            debug!(changelist = name, count = accepted.len(), "assigned files");
            Ok(AssignOutcome {
                added: accepted,
                rejected,
                missing,
            })
        })
    }

    /// Removes files from a changelist.
    ///
    /// The files themselves are untouched; they simply become
    /// unassigned. Emptying the changelist deletes it (empty lists are
    /// pruned on save).
    pub fn unassign(&self, name: &str, paths: &[String]) -> Result<Vec<String>, EngineError> {
        let (accepted, _rejected) = self.resolve_paths(paths);

        self.active.with_lock(|store| {
            let mut lists = store.load()?;
            let files = lists
                .get_mut(name)
                .ok_or_else(|| EngineError::NotFound(name.to_owned()))?;

            let mut removed = Vec::new();
            files.retain(|f| {
                if accepted.contains(f) {
                    removed.push(f.clone());
                    false
                } else {
                    true
                }
            });

            store.save(&lists)?;
            Ok(removed)
        })
    }

    /// Deletes the named changelists (metadata only, files untouched).
    ///
    /// Shelved names are deleted from the shelf document; the stash
    /// entry itself is left alone, this is the manual-recovery path for
    /// records whose stash has diverged. Validates every name first so
    /// the whole call is atomic: either all named changelists are
    /// deleted, or none.
    pub fn delete(&self, names: &[String]) -> Result<Vec<String>, EngineError> {
        // Lock ordering: active before shelf.
        self.active.with_lock(|active| {
            self.shelf.with_lock(|shelf| {
                let mut lists = active.load()?;
                let mut records = shelf.load()?;

                for name in names {
                    if !lists.contains_key(name) && !records.contains_key(name) {
                        return Err(EngineError::NotFound(name.clone()));
                    }
                }

                let mut shelf_touched = false;
                for name in names {
                    if lists.remove(name).is_none() {
                        records.remove(name);
                        shelf_touched = true;
                    }
                }
                active.save(&lists)?;
                if shelf_touched {
                    shelf.save(&records)?;
                }
                Ok(names.to_vec())
            })
        })
    }

    /// Deletes every active changelist.
    pub fn delete_all(&self) -> Result<Vec<String>, EngineError> {
        self.active.with_lock(|store| {
            let lists = store.load()?;
            let names: Vec<String> = lists.keys().cloned().collect();
            store.save(&Changelists::new())?;
            Ok(names)
        })
    }

    /// Produces the grouped status view.
    ///
    /// One status query is taken and partitioned by declared membership;
    /// member files git reported nothing about appear with the clean
    /// code. `filter` restricts the view to a single changelist (the
    /// unassigned section is then omitted unless `include_unassigned`).
    pub fn grouped_status(
        &self,
        filter: Option<&str>,
        include_unassigned: bool,
    ) -> Result<GroupedStatus, EngineError> {
        let lists = self.active.load()?;
        if let Some(name) = filter {
            if !lists.contains_key(name) {
                return Err(EngineError::NotFound(name.to_owned()));
            }
        }

        let snapshot = self.vcs.status_snapshot(true)?;
        let mut view = GroupedStatus::default();

        let mut claimed = cl_core::FxHashSet::default();
        for (name, files) in &lists {
            claimed.extend(files.iter().cloned());
            if filter.is_some_and(|f| f != name) {
                continue;
            }
            let mut entries: Vec<GroupEntry> = files
                .iter()
                .map(|path| GroupEntry {
                    path: path.clone(),
                    code: snapshot.code_for(path),
                })
                .collect();
            entries.sort_by(|a, b| a.path.cmp(&b.path));
            view.groups.push(Group {
                name: name.clone(),
                entries,
            });
        }

        if filter.is_none() || include_unassigned {
            let mut unassigned: Vec<GroupEntry> = snapshot
                .entries
                .iter()
                .filter(|(path, _)| !claimed.contains(*path))
                .map(|(path, code)| GroupEntry {
                    path: path.clone(),
                    code: *code,
                })
                .collect();
            unassigned.sort_by(|a, b| a.path.cmp(&b.path));
            view.unassigned = unassigned;
        }

        view.shelved = self.shelf.load()?.keys().cloned().collect();
        view.suppressed = snapshot.suppressed;
        Ok(view)
    }
}
