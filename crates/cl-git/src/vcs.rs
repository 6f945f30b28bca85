//! The narrow VCS interface.
//!
//! The orchestration layer (shelving, restoring, branch promotion) only
//! ever talks to this trait, so its state machines can be tested against
//! an in-memory fake without spawning a single process.

use camino::Utf8Path;

use crate::error::GitError;
use crate::status::{StatusLine, StatusSnapshot};

/// Where a commit message comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMessage<'a> {
    /// An inline `-m` message.
    Inline(&'a str),
    /// Read from a file (`-F`).
    FromFile(&'a Utf8Path),
}

/// One entry of the stash stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    /// The positional reference, e.g. `stash@{0}`.
    pub reference: String,
    /// The reflog subject, which embeds the message the entry was pushed
    /// with (`On main: git-cl: feature [...]`).
    pub subject: String,
}

/// The subprocess-as-oracle seam.
///
/// Every method maps to one external git invocation with an explicit
/// argument list; non-zero exit is failure and nothing is retried. Paths
/// are storage-relative (implementations run git from the repository
/// root, where storage-relative paths are directly valid).
pub trait Vcs {
    /// Absolute repository root.
    fn repo_root(&self) -> &Utf8Path;

    /// Absolute path of the repository's git directory (`.git`).
    fn git_dir(&self) -> &Utf8Path;

    /// Raw porcelain status lines, optionally including all untracked
    /// files.
    fn status_lines(&self, include_untracked: bool) -> Result<Vec<StatusLine>, GitError>;

    /// Stages the given paths (`git add --`).
    fn stage(&self, paths: &[String]) -> Result<(), GitError>;

    /// Unstages the given paths (`git reset HEAD --`).
    fn unstage(&self, paths: &[String]) -> Result<(), GitError>;

    /// Commits exactly `paths` (`git commit --`), leaving any other
    /// staged content staged.
    fn commit(&self, message: CommitMessage<'_>, paths: &[String]) -> Result<(), GitError>;

    /// Reverts the given paths to their HEAD state (`git checkout --`).
    fn checkout_paths(&self, paths: &[String]) -> Result<(), GitError>;

    /// Diff of the given paths, optionally index-only (`--cached`).
    fn diff(&self, paths: &[String], staged: bool) -> Result<String, GitError>;

    /// Pushes a stash entry scoped to exactly `paths`.
    fn stash_push(
        &self,
        message: &str,
        paths: &[String],
        include_untracked: bool,
    ) -> Result<(), GitError>;

    /// Pops the stash entry at `reference`.
    fn stash_pop(&self, reference: &str) -> Result<(), GitError>;

    /// The current stash stack, newest first.
    fn stash_list(&self) -> Result<Vec<StashEntry>, GitError>;

    /// Name of the currently checked-out branch.
    fn current_branch(&self) -> Result<String, GitError>;

    /// Whether a local branch of this name exists.
    fn branch_exists(&self, name: &str) -> Result<bool, GitError>;

    /// Creates `name` from `base` (or the current HEAD) and switches to
    /// it.
    fn create_branch(&self, name: &str, base: Option<&str>) -> Result<(), GitError>;

    /// Checks out an existing branch.
    fn checkout_branch(&self, name: &str) -> Result<(), GitError>;

    /// A classified status snapshot; never cached.
    fn status_snapshot(&self, include_untracked: bool) -> Result<StatusSnapshot, GitError> {
        Ok(StatusSnapshot::from_lines(
            self.status_lines(include_untracked)?,
        ))
    }
}

/// Finds the stash entry whose subject contains `message`.
///
/// Stash indices shift whenever entries are pushed or popped, so shelved
/// records are re-resolved by their unique message at restore time.
#[must_use]
pub fn find_stash_by_message(entries: &[StashEntry], message: &str) -> Option<String> {
    entries
        .iter()
        .find(|e| e.subject.contains(message))
        .map(|e| e.reference.clone())
}
