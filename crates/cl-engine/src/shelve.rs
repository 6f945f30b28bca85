//! Shelving changelists onto the git stash.
//!
//! A shelve categorizes each member file, unstages any staged
//! additions so the stash can carry them, pushes one stash holding
//! every shelvable file, then moves the membership from the active
//! store to the shelf store. The stash is pushed before the metadata
//! moves: a failed push leaves the changelist fully active.

use std::time::{SystemTime, UNIX_EPOCH};

use cl_core::{FileCategories, ShelvedRecord};
use cl_git::Vcs;
use tracing::info;

use crate::engine::Engine;
use crate::error::EngineError;

/// What a shelve would (or did) take, per category.
#[derive(Debug, Clone, Default)]
pub struct ShelvePlan {
    /// The changelist name.
    pub name: String,
    /// The categorized member files.
    pub categories: FileCategories,
    /// Members left behind because nothing about them is shelvable
    /// (clean, or modified in the index only).
    pub skipped: Vec<String>,
}

impl ShelvePlan {
    /// Whether anything would actually go onto the stash.
    #[inline]
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.categories.is_empty()
    }
}

/// The stash subject for a shelved changelist.
///
/// The epoch suffix keeps the subject unique across repeated shelve
/// and restore cycles of the same name, so lookup by message is
/// unambiguous.
fn shelf_message(name: &str, timestamp: u64) -> String {
    format!("git-cl: {name} [{timestamp}]")
}

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Splits `files` into shelvable categories against `snapshot`.
pub(crate) fn categorize<V: Vcs>(
    engine: &Engine<V>,
    files: &[String],
) -> Result<(FileCategories, Vec<String>), EngineError> {
    let snapshot = engine.vcs().status_snapshot(true)?;
    let mut categories = FileCategories::default();
    let mut skipped = Vec::new();

    for path in files {
        let code = snapshot.code_for(path);
        match (code.index, code.worktree) {
            ('?', '?') => categories.untracked.push(path.clone()),
            ('A', _) => categories.staged_additions.push(path.clone()),
            (_, 'D') | ('D', ' ') => categories.deleted_files.push(path.clone()),
            (_, ' ' | '?') => skipped.push(path.clone()),
            _ => categories.unstaged_changes.push(path.clone()),
        }
    }

    Ok((categories, skipped))
}

impl<V: Vcs> Engine<V> {
    /// Previews what shelving `name` would take, without touching
    /// anything.
    pub fn shelve_plan(&self, name: &str) -> Result<ShelvePlan, EngineError> {
        let lists = self.active_store().load()?;
        let files = lists
            .get(name)
            .ok_or_else(|| EngineError::NotFound(name.to_owned()))?;
        let (categories, skipped) = categorize(self, files)?;
        Ok(ShelvePlan {
            name: name.to_owned(),
            categories,
            skipped,
        })
    }

    /// Shelves one changelist onto the stash.
    ///
    /// A changelist with nothing shelvable is refused rather than
    /// shelved empty. Staged additions are unstaged first so the stash
    /// carries them as untracked content.
    pub fn shelve(&self, name: &str) -> Result<ShelvedRecord, EngineError> {
        let plan = self.shelve_plan(name)?;
        if !plan.has_work() {
            return Err(EngineError::NothingShelvable(name.to_owned()));
        }

        if !plan.categories.staged_additions.is_empty() {
            self.vcs().unstage(&plan.categories.staged_additions)?;
        }

        let timestamp = now_epoch();
        let message = shelf_message(name, timestamp);
        let shelvable = plan.categories.shelvable();
        let include_untracked = !plan.categories.untracked.is_empty()
            || !plan.categories.staged_additions.is_empty();

        // Push before any metadata moves.
        self.vcs()
            .stash_push(&message, &shelvable, include_untracked)?;

        let reference = cl_git::find_stash_by_message(&self.vcs().stash_list()?, &message)
            .unwrap_or_else(|| "stash@{0}".to_owned());
        let source_branch = self.vcs().current_branch()?;

        let record = ShelvedRecord {
            shelf_ref: reference,
            shelf_message: message,
            files: plan.categories.shelvable(),
            timestamp,
            source_branch,
            file_categories: plan.categories,
        };

        // Lock ordering: active before shelf.
        self.active_store().with_lock(|active| {
            self.shelf_store().with_lock(|shelf| {
                let mut lists = active.load()?;
                lists.remove(name);
                active.save(&lists)?;

                let mut records = shelf.load()?;
                records.insert(name.to_owned(), record.clone());
                shelf.save(&records)?;
                Ok::<(), EngineError>(())
            })
        })?;

        info!(
            changelist = name,
            files = record.files.len(),
            "shelved changelist"
        );
        Ok(record)
    }

    /// Shelves every active changelist that has shelvable content.
    ///
    /// Changelists with nothing shelvable are skipped, not treated as
    /// failures. Returns the shelved records in shelve order together
    /// with the skipped names.
    pub fn shelve_all(&self) -> Result<(Vec<(String, ShelvedRecord)>, Vec<String>), EngineError> {
        let names: Vec<String> = self.active_store().load()?.keys().cloned().collect();

        let mut shelved = Vec::new();
        let mut skipped = Vec::new();
        for name in names {
            match self.shelve(&name) {
                Ok(record) => shelved.push((name, record)),
                Err(EngineError::NothingShelvable(name)) => skipped.push(name),
                Err(other) => return Err(other),
            }
        }
        Ok((shelved, skipped))
    }
}
