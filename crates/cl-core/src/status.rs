//! Porcelain status-code classification.
//!
//! git's machine-readable status reports a fixed two-character code per
//! path: the first character describes the index (staging area), the
//! second the working tree. [`StatusCode`] keeps the raw pair for display
//! (`[ M] file.txt`) and [`FileClass`] collapses it into the handful of
//! classes the rest of the tool reasons about.

use serde::{Deserialize, Serialize};

/// The collapsed class of a working-tree entry.
///
/// # Examples
///
/// ```
/// use cl_core::{FileClass, StatusCode};
///
/// assert_eq!(StatusCode::new('?', '?').class(), FileClass::Untracked);
/// assert_eq!(StatusCode::new(' ', 'M').class(), FileClass::Modified);
/// assert_eq!(StatusCode::new(' ', 'D').class(), FileClass::Deleted);
/// assert_eq!(StatusCode::new('A', ' ').class(), FileClass::Added);
/// assert_eq!(StatusCode::clean().class(), FileClass::Clean);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileClass {
    /// `??` — not known to git.
    Untracked,

    /// Newly added to the index (code starts with `A`).
    Added,

    /// Modified, renamed, copied, or type-changed in either column.
    Modified,

    /// Deleted in exactly one column (`D ` or ` D`).
    Deleted,

    /// No reported change, or a code this tool does not classify.
    #[default]
    Clean,
}

impl FileClass {
    /// Returns a human-readable label for this class.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Untracked => "untracked",
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Clean => "clean",
        }
    }
}

/// A raw two-character porcelain status code.
///
/// The pair is kept verbatim so status output can show the same codes
/// `git status --short` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusCode {
    /// Index (staging area) column.
    pub index: char,
    /// Working-tree column.
    pub worktree: char,
}

impl StatusCode {
    /// Creates a status code from its two columns.
    #[inline]
    #[must_use]
    pub const fn new(index: char, worktree: char) -> Self {
        Self { index, worktree }
    }

    /// The code of an unchanged file (`"  "`).
    #[inline]
    #[must_use]
    pub const fn clean() -> Self {
        Self::new(' ', ' ')
    }

    /// Collapses this code into a [`FileClass`].
    ///
    /// The mapping mirrors what the shelf primitives can operate on:
    ///
    /// - `??` → [`FileClass::Untracked`]
    /// - ` D` / `D ` → [`FileClass::Deleted`]
    /// - first column `A` → [`FileClass::Added`]
    /// - any of `M`, `T`, `R`, `C` in either column → [`FileClass::Modified`]
    /// - anything else (including `  `, `!!`, unmerged codes) → [`FileClass::Clean`]
    #[must_use]
    pub fn class(self) -> FileClass {
        let Self { index, worktree } = self;
        if index == '?' && worktree == '?' {
            return FileClass::Untracked;
        }
        if matches!((index, worktree), ('D', ' ') | (' ', 'D')) {
            return FileClass::Deleted;
        }
        if index == 'A' {
            return FileClass::Added;
        }
        if [index, worktree]
            .iter()
            .any(|c| matches!(c, 'M' | 'T' | 'R' | 'C'))
        {
            return FileClass::Modified;
        }
        FileClass::Clean
    }

    /// Returns `true` if this code belongs to the recognized set.
    ///
    /// Unrecognized codes (ignored entries, unmerged conflicts, …) are
    /// suppressed from default status output; the caller reports how many
    /// were suppressed so the information is never silently lost.
    #[must_use]
    pub fn is_recognized(self) -> bool {
        self == Self::clean() || self.class() != FileClass::Clean
    }

    /// Returns `true` if the working-tree column reports a change.
    #[inline]
    #[must_use]
    pub const fn has_unstaged(self) -> bool {
        !matches!(self.worktree, ' ' | '?')
    }

    /// Returns `true` if the index column reports a staged change.
    #[inline]
    #[must_use]
    pub const fn has_staged(self) -> bool {
        !matches!(self.index, ' ' | '?')
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.index, self.worktree)
    }
}
