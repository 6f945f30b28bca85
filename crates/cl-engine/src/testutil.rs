//! In-memory [`Vcs`] fake for engine tests.
//!
//! The fake models just enough git to exercise the engine's state
//! machines: a status table, a branch set, and a stash stack whose
//! entries disappear from the status table when pushed and reappear
//! when popped.

use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use cl_core::StatusCode;
use cl_git::status::{StatusLine, StatusSnapshot};
use cl_git::{CommitMessage, GitError, StashEntry, Vcs};

use crate::engine::Engine;

#[derive(Debug, Default)]
struct FakeState {
    /// path -> code, the simulated working tree.
    status: Vec<(String, StatusCode)>,
    /// Simulated stash stack, newest last.
    stashes: Vec<(String, Vec<(String, StatusCode)>)>,
    branches: Vec<String>,
    current_branch: String,
    fail_create_branch: bool,
    fail_stash_pop: bool,
    /// When set, a stash push whose message contains this substring
    /// fails.
    fail_stash_push_for: Option<String>,
}

/// A scriptable in-memory git.
#[derive(Debug)]
pub struct FakeVcs {
    repo_root: Utf8PathBuf,
    git_dir: Utf8PathBuf,
    state: Mutex<FakeState>,
}

impl Default for FakeVcs {
    fn default() -> Self {
        Self {
            repo_root: Utf8PathBuf::new(),
            git_dir: Utf8PathBuf::new(),
            state: Mutex::new(FakeState {
                branches: vec!["main".to_owned()],
                current_branch: "main".to_owned(),
                ..FakeState::default()
            }),
        }
    }
}

impl FakeVcs {
    /// Seeds one status entry.
    #[must_use]
    pub fn with_status(self, path: &str, index: char, worktree: char) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state
                .status
                .push((path.to_owned(), StatusCode::new(index, worktree)));
        }
        self
    }

    /// Seeds an extra local branch.
    #[must_use]
    pub fn with_branch(self, name: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.branches.push(name.to_owned());
        }
        self
    }

    /// Makes branch creation fail.
    #[must_use]
    pub fn fail_create_branch(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.fail_create_branch = true;
        }
        self
    }

    /// Makes every stash pop fail.
    #[must_use]
    pub fn fail_stash_pop(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.fail_stash_pop = true;
        }
        self
    }

    /// Makes a stash push fail when its message contains `needle`.
    #[must_use]
    pub fn fail_stash_push_for(self, needle: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.fail_stash_push_for = Some(needle.to_owned());
        }
        self
    }

    fn bind(&mut self, repo_root: Utf8PathBuf, git_dir: Utf8PathBuf) {
        self.repo_root = repo_root;
        self.git_dir = git_dir;
    }

    fn scripted_failure(what: &str) -> GitError {
        GitError::CommandFailed {
            command: format!("git {what}"),
            code: Some(1),
            stderr: format!("fake: {what} rejected"),
        }
    }
}

impl Vcs for FakeVcs {
    fn repo_root(&self) -> &Utf8Path {
        &self.repo_root
    }

    fn git_dir(&self) -> &Utf8Path {
        &self.git_dir
    }

    fn status_lines(&self, include_untracked: bool) -> Result<Vec<StatusLine>, GitError> {
        let state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("status"))?;
        Ok(state
            .status
            .iter()
            .filter(|(_, code)| include_untracked || code.index != '?')
            .map(|(path, code)| StatusLine {
                code: *code,
                path: path.clone(),
            })
            .collect())
    }

    fn stage(&self, paths: &[String]) -> Result<(), GitError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("add"))?;
        for (path, code) in &mut state.status {
            if paths.contains(path) {
                *code = StatusCode::new(if code.index == '?' { 'A' } else { 'M' }, ' ');
            }
        }
        Ok(())
    }

    fn unstage(&self, paths: &[String]) -> Result<(), GitError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("reset"))?;
        for (path, code) in &mut state.status {
            if paths.contains(path) {
                *code = if code.index == 'A' {
                    StatusCode::new('?', '?')
                } else {
                    StatusCode::new(' ', 'M')
                };
            }
        }
        Ok(())
    }

    fn commit(&self, _message: CommitMessage<'_>, paths: &[String]) -> Result<(), GitError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("commit"))?;
        state.status.retain(|(path, _)| !paths.contains(path));
        Ok(())
    }

    fn checkout_paths(&self, paths: &[String]) -> Result<(), GitError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("checkout"))?;
        state.status.retain(|(path, _)| !paths.contains(path));
        Ok(())
    }

    fn diff(&self, paths: &[String], _staged: bool) -> Result<String, GitError> {
        Ok(paths
            .iter()
            .map(|p| format!("diff --fake a/{p} b/{p}\n"))
            .collect())
    }

    fn stash_push(
        &self,
        message: &str,
        paths: &[String],
        _include_untracked: bool,
    ) -> Result<(), GitError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("stash push"))?;
        if state
            .fail_stash_push_for
            .as_deref()
            .is_some_and(|needle| message.contains(needle))
        {
            return Err(Self::scripted_failure("stash push"));
        }
        let mut taken = Vec::new();
        state.status.retain(|(path, code)| {
            if paths.contains(path) {
                taken.push((path.clone(), *code));
                false
            } else {
                true
            }
        });
        state.stashes.push((message.to_owned(), taken));
        Ok(())
    }

    fn stash_pop(&self, reference: &str) -> Result<(), GitError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("stash pop"))?;
        if state.fail_stash_pop {
            return Err(Self::scripted_failure("stash pop"));
        }
        // reference is "stash@{N}" with 0 = newest.
        let index = reference
            .strip_prefix("stash@{")
            .and_then(|s| s.strip_suffix('}'))
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| Self::scripted_failure("stash pop"))?;
        let depth = state.stashes.len();
        if index >= depth {
            return Err(Self::scripted_failure("stash pop"));
        }
        let (_, entries) = state.stashes.remove(depth - 1 - index);
        state.status.extend(entries);
        Ok(())
    }

    fn stash_list(&self) -> Result<Vec<StashEntry>, GitError> {
        let state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("stash list"))?;
        Ok(state
            .stashes
            .iter()
            .rev()
            .enumerate()
            .map(|(i, (message, _))| StashEntry {
                reference: format!("stash@{{{i}}}"),
                subject: format!("On {}: {message}", state.current_branch),
            })
            .collect())
    }

    fn current_branch(&self) -> Result<String, GitError> {
        let state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("rev-parse"))?;
        Ok(state.current_branch.clone())
    }

    fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        let state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("show-ref"))?;
        Ok(state.branches.iter().any(|b| b == name))
    }

    fn create_branch(&self, name: &str, _base: Option<&str>) -> Result<(), GitError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("checkout -b"))?;
        if state.fail_create_branch || state.branches.iter().any(|b| b == name) {
            return Err(Self::scripted_failure("checkout -b"));
        }
        state.branches.push(name.to_owned());
        state.current_branch = name.to_owned();
        Ok(())
    }

    fn checkout_branch(&self, name: &str) -> Result<(), GitError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Self::scripted_failure("checkout"))?;
        if !state.branches.iter().any(|b| b == name) {
            return Err(Self::scripted_failure("checkout"));
        }
        state.current_branch = name.to_owned();
        Ok(())
    }
}

/// Builds an engine over `vcs` rooted in a fresh temp directory.
///
/// Returns `None` when the temp directory lands on a non-UTF-8 path,
/// which the stores cannot represent; the test then degrades to a
/// no-op.
pub fn engine_with(mut vcs: FakeVcs) -> Option<(tempfile::TempDir, Engine<FakeVcs>)> {
    let dir = tempfile::tempdir().ok()?;
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).ok()?;
    let git_dir = root.join(".git");
    std::fs::create_dir_all(git_dir.as_std_path()).ok()?;
    vcs.bind(root.clone(), git_dir);
    let engine = Engine::new(vcs, root);
    Some((dir, engine))
}

/// A minimal shelved record for conflict-classification tests.
pub fn shelved_record(files: &[&str]) -> cl_core::ShelvedRecord {
    let files: Vec<String> = files.iter().map(|s| (*s).to_owned()).collect();
    cl_core::ShelvedRecord {
        shelf_ref: "stash@{0}".to_owned(),
        shelf_message: "git-cl: fixture [1700000000]".to_owned(),
        files: files.clone(),
        timestamp: 1_700_000_000,
        source_branch: "main".to_owned(),
        file_categories: cl_core::FileCategories {
            unstaged_changes: files,
            ..cl_core::FileCategories::default()
        },
    }
}
