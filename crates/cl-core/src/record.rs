//! Persistent document types.
//!
//! Two JSON documents live under `.git/`: the active changelists
//! (`cl.json`, a plain name → paths map) and the shelved-changelist
//! records (`cl-stashes.json`). Both use storage-relative forward-slash
//! paths exclusively.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The active-changelist document: name → member paths.
///
/// `BTreeMap` keeps the persisted JSON in a stable order so repeated
/// saves of the same state are byte-identical.
pub type Changelists = BTreeMap<String, Vec<String>>;

/// The categorization snapshot captured when a changelist is shelved.
///
/// Partitions the shelved files by what made them shelvable; the restore
/// conflict detector uses this to know what the shelf entry will try to
/// recreate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCategories {
    /// Files with working-tree modifications at shelve time.
    #[serde(default)]
    pub unstaged_changes: Vec<String>,

    /// Files newly added to the index at shelve time.
    #[serde(default)]
    pub staged_additions: Vec<String>,

    /// Untracked files explicitly listed in the changelist.
    #[serde(default)]
    pub untracked: Vec<String>,

    /// Files deleted in the working tree at shelve time.
    #[serde(default)]
    pub deleted_files: Vec<String>,
}

impl FileCategories {
    /// All shelvable paths across the four categories, in category order.
    #[must_use]
    pub fn shelvable(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(
            self.unstaged_changes.len()
                + self.staged_additions.len()
                + self.untracked.len()
                + self.deleted_files.len(),
        );
        out.extend(self.unstaged_changes.iter().cloned());
        out.extend(self.staged_additions.iter().cloned());
        out.extend(self.untracked.iter().cloned());
        out.extend(self.deleted_files.iter().cloned());
        out.sort();
        out.dedup();
        out
    }

    /// Returns `true` if no category holds any file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unstaged_changes.is_empty()
            && self.staged_additions.is_empty()
            && self.untracked.is_empty()
            && self.deleted_files.is_empty()
    }
}

/// One shelved changelist.
///
/// Exists only for names that are NOT in the active document; a name is
/// either active or shelved, never both. Created when a changelist is
/// shelved, destroyed when it is successfully restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelvedRecord {
    /// The stash reference at creation time (`stash@{0}`).
    ///
    /// Indices shift as other stashes come and go, so restore re-resolves
    /// the entry by [`shelf_message`](Self::shelf_message) instead of
    /// trusting this field.
    pub shelf_ref: String,

    /// The unique message the stash entry was pushed with.
    pub shelf_message: String,

    /// Every path that was a member of the changelist, shelvable or not.
    pub files: Vec<String>,

    /// Capture time, seconds since the Unix epoch.
    pub timestamp: u64,

    /// The branch that was checked out when the shelf was taken.
    pub source_branch: String,

    /// Which files actually went into the shelf, by category.
    pub file_categories: FileCategories,
}

/// The shelved-record document: name → record.
pub type ShelvedRecords = BTreeMap<String, ShelvedRecord>;
