//! Per-changelist wrappers over everyday git verbs.
//!
//! These operations scope `git add`, `reset`, `commit`, `diff`, and
//! `checkout` to a changelist's members. They consult one fresh status
//! snapshot to decide which members the verb can act on, so a member
//! with nothing relevant going on is skipped rather than handed to git
//! to choke on.

use cl_core::StatusCode;
use cl_git::{CommitMessage, Vcs};
use tracing::info;

use crate::engine::Engine;
use crate::error::EngineError;

/// What a stage or unstage did.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// Paths the index operation touched.
    pub files: Vec<String>,
    /// Whether the changelist was deleted afterwards.
    pub deleted: bool,
}

/// What a commit did.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// Files included in the commit. Empty means nothing was tracked
    /// and changed, and no commit was made.
    pub files: Vec<String>,
    /// Untracked members left out of the commit; they stay in the
    /// changelist for a later `stage` + `commit`.
    pub skipped_untracked: Vec<String>,
    /// Whether the changelist was deleted afterwards.
    pub deleted: bool,
}

/// What a checkout (revert) did.
#[derive(Debug, Clone, Default)]
pub struct CheckoutOutcome {
    /// Files reverted to their HEAD content.
    pub reverted: Vec<String>,
    /// Untracked members skipped: they have no HEAD content to revert
    /// to, and handing them to `git checkout --` would fail the whole
    /// command.
    pub skipped_untracked: Vec<String>,
    /// Changelists deleted afterwards.
    pub deleted: Vec<String>,
}

impl<V: Vcs> Engine<V> {
    fn members(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let lists = self.active_store().load()?;
        lists
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(name.to_owned()))
    }

    /// Gathers the members of several changelists, in the order given.
    ///
    /// Every name is validated before any member is returned, so a
    /// typo in the last name fails the whole call instead of acting on
    /// the first few.
    fn members_of_all(&self, names: &[String]) -> Result<Vec<String>, EngineError> {
        let lists = self.active_store().load()?;
        let mut members = Vec::new();
        for name in names {
            let files = lists
                .get(name)
                .ok_or_else(|| EngineError::NotFound(name.clone()))?;
            for file in files {
                if !members.contains(file) {
                    members.push(file.clone());
                }
            }
        }
        Ok(members)
    }

    /// Stages every member with pending changes.
    ///
    /// An empty `files` vector means no member had anything to stage.
    /// With `delete_after` the changelist is deleted once staging
    /// succeeds.
    pub fn stage(&self, name: &str, delete_after: bool) -> Result<StageOutcome, EngineError> {
        let members = self.members(name)?;
        let snapshot = self.vcs().status_snapshot(true)?;

        let pending: Vec<String> = members
            .into_iter()
            .filter(|path| {
                let code = snapshot.code_for(path);
                // Untracked counts: `git add` is exactly how it starts
                // being tracked.
                code.has_unstaged() || code.index == '?'
            })
            .collect();

        if !pending.is_empty() {
            self.vcs().stage(&pending)?;
            info!(changelist = name, count = pending.len(), "staged changelist");
        }

        let deleted = if delete_after {
            self.delete(&[name.to_owned()])?;
            true
        } else {
            false
        };
        Ok(StageOutcome {
            files: pending,
            deleted,
        })
    }

    /// Unstages every member with staged content.
    pub fn unstage(&self, name: &str, delete_after: bool) -> Result<StageOutcome, EngineError> {
        let members = self.members(name)?;
        let snapshot = self.vcs().status_snapshot(true)?;

        let staged: Vec<String> = members
            .into_iter()
            .filter(|path| snapshot.code_for(path).has_staged())
            .collect();

        if !staged.is_empty() {
            self.vcs().unstage(&staged)?;
        }

        let deleted = if delete_after {
            self.delete(&[name.to_owned()])?;
            true
        } else {
            false
        };
        Ok(StageOutcome {
            files: staged,
            deleted,
        })
    }

    /// Commits a changelist's tracked members as one commit.
    ///
    /// Stages the members first, then commits exactly those paths so
    /// unrelated staged content stays staged. Untracked members are
    /// skipped, never silently committed; if nothing tracked changed,
    /// no commit is made and the changelist stays put. On success the
    /// changelist is deleted unless `keep` is set; the commit is never
    /// undone if the metadata delete fails afterwards.
    pub fn commit(
        &self,
        name: &str,
        message: CommitMessage<'_>,
        keep: bool,
    ) -> Result<CommitOutcome, EngineError> {
        let members = self.members(name)?;
        let snapshot = self.vcs().status_snapshot(true)?;

        let mut changed = Vec::new();
        let mut skipped_untracked = Vec::new();
        for path in members {
            let code = snapshot.code_for(&path);
            if code.index == '?' {
                skipped_untracked.push(path);
            } else if code != StatusCode::clean() {
                changed.push(path);
            }
        }
        if changed.is_empty() {
            return Ok(CommitOutcome {
                files: changed,
                skipped_untracked,
                deleted: false,
            });
        }

        // A relative -F path means the caller's file, not a path under
        // the repo root git is spawned in.
        let resolved;
        let message = if let CommitMessage::FromFile(path) = message {
            resolved = if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.cwd().join(path)
            };
            CommitMessage::FromFile(resolved.as_path())
        } else {
            message
        };

        self.vcs().stage(&changed)?;
        self.vcs().commit(message, &changed)?;
        info!(changelist = name, count = changed.len(), "committed changelist");

        let deleted = if keep {
            false
        } else {
            self.delete(&[name.to_owned()])?;
            true
        };

        Ok(CommitOutcome {
            files: changed,
            skipped_untracked,
            deleted,
        })
    }

    /// Shows the combined diff of the named changelists' members.
    ///
    /// `staged` switches to the index-vs-HEAD diff. Untracked members
    /// are excluded: git diff has nothing to compare them against.
    pub fn diff(&self, names: &[String], staged: bool) -> Result<String, EngineError> {
        let members = self.members_of_all(names)?;
        let snapshot = self.vcs().status_snapshot(true)?;

        let tracked: Vec<String> = members
            .into_iter()
            .filter(|path| snapshot.code_for(path).index != '?')
            .collect();
        if tracked.is_empty() {
            return Ok(String::new());
        }

        Ok(self.vcs().diff(&tracked, staged)?)
    }

    /// Reverts the named changelists' members to their HEAD content.
    ///
    /// Destructive by nature; callers are expected to confirm first.
    /// Untracked members are skipped and reported, never deleted. With
    /// `delete_after` the changelists are deleted once the revert
    /// succeeds.
    pub fn checkout(
        &self,
        names: &[String],
        delete_after: bool,
    ) -> Result<CheckoutOutcome, EngineError> {
        let members = self.members_of_all(names)?;
        let snapshot = self.vcs().status_snapshot(true)?;

        let mut outcome = CheckoutOutcome::default();
        for path in members {
            let code = snapshot.code_for(&path);
            if code.index == '?' {
                outcome.skipped_untracked.push(path);
            } else if code != StatusCode::clean() {
                outcome.reverted.push(path);
            }
        }

        if !outcome.reverted.is_empty() {
            self.vcs().checkout_paths(&outcome.reverted)?;
            info!(count = outcome.reverted.len(), "reverted changelists");
        }
        if delete_after {
            self.delete(names)?;
            outcome.deleted = names.to_vec();
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{engine_with, FakeVcs};

    #[test]
    fn test_stage_only_touches_pending_members() {
        let vcs = FakeVcs::default()
            .with_status("dirty.txt", ' ', 'M')
            .with_status("already.txt", 'M', ' ');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine
            .assign(
                "mixed",
                &["dirty.txt".to_owned(), "already.txt".to_owned(), "clean.txt".to_owned()]
            )
            .is_ok());

        let staged = engine.stage("mixed", false).ok();
        assert_eq!(staged.map(|o| o.files), Some(vec!["dirty.txt".to_owned()]));
    }

    #[test]
    fn test_stage_can_delete_the_changelist() {
        let vcs = FakeVcs::default().with_status("dirty.txt", ' ', 'M');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine.assign("done", &["dirty.txt".to_owned()]).is_ok());

        let outcome = engine.stage("done", true).ok();
        assert_eq!(outcome.map(|o| o.deleted), Some(true));
        assert_eq!(engine.active_store().load().ok().map(|l| l.len()), Some(0));
    }

    #[test]
    fn test_unstage_only_touches_staged_members() {
        let vcs = FakeVcs::default()
            .with_status("staged.txt", 'M', ' ')
            .with_status("unstaged.txt", ' ', 'M');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine
            .assign("mixed", &["staged.txt".to_owned(), "unstaged.txt".to_owned()])
            .is_ok());

        let unstaged = engine.unstage("mixed", false).ok();
        assert_eq!(unstaged.map(|o| o.files), Some(vec!["staged.txt".to_owned()]));
        assert_eq!(engine.active_store().load().ok().map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_commit_deletes_by_default() {
        let vcs = FakeVcs::default().with_status("work.txt", ' ', 'M');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine.assign("feature", &["work.txt".to_owned()]).is_ok());

        let outcome = engine.commit("feature", CommitMessage::Inline("done"), false).ok();
        assert_eq!(outcome.as_ref().map(|o| o.deleted), Some(true));
        assert_eq!(engine.active_store().load().ok().map(|l| l.len()), Some(0));
    }

    #[test]
    fn test_commit_keep_retains_changelist() {
        let vcs = FakeVcs::default().with_status("work.txt", ' ', 'M');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine.assign("feature", &["work.txt".to_owned()]).is_ok());

        let outcome = engine.commit("feature", CommitMessage::Inline("wip"), true).ok();
        assert_eq!(outcome.as_ref().map(|o| o.deleted), Some(false));
        assert_eq!(engine.active_store().load().ok().map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_commit_skips_untracked_members() {
        let vcs = FakeVcs::default()
            .with_status("tracked.txt", ' ', 'M')
            .with_status("brand-new.txt", '?', '?');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine
            .assign("mixed", &["tracked.txt".to_owned(), "brand-new.txt".to_owned()])
            .is_ok());

        let outcome = engine.commit("mixed", CommitMessage::Inline("partial"), false).ok();
        assert!(outcome.is_some());
        if let Some(outcome) = outcome {
            assert_eq!(outcome.files, vec!["tracked.txt".to_owned()]);
            assert_eq!(outcome.skipped_untracked, vec!["brand-new.txt".to_owned()]);
        }
    }

    #[test]
    fn test_commit_of_untracked_only_changelist_is_a_noop() {
        let vcs = FakeVcs::default().with_status("brand-new.txt", '?', '?');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine.assign("fresh", &["brand-new.txt".to_owned()]).is_ok());

        let outcome = engine.commit("fresh", CommitMessage::Inline("nope"), false).ok();
        assert!(outcome.is_some());
        if let Some(outcome) = outcome {
            assert!(outcome.files.is_empty());
            assert!(!outcome.deleted);
            assert_eq!(outcome.skipped_untracked, vec!["brand-new.txt".to_owned()]);
        }
        // Still untracked in the working tree, and the changelist survives.
        let snapshot = engine.vcs().status_snapshot(true).ok();
        assert_eq!(
            snapshot.map(|s| s.code_for("brand-new.txt").index),
            Some('?')
        );
        assert_eq!(engine.active_store().load().ok().map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_commit_of_clean_changelist_is_a_noop() {
        let Some((_dir, engine)) = engine_with(FakeVcs::default()) else {
            return;
        };
        assert!(engine.assign("quiet", &["clean.txt".to_owned()]).is_ok());

        let outcome = engine.commit("quiet", CommitMessage::Inline("nope"), false).ok();
        assert!(outcome.is_some());
        if let Some(outcome) = outcome {
            assert!(outcome.files.is_empty());
            assert!(!outcome.deleted);
        }
    }

    #[test]
    fn test_checkout_skips_untracked_members() {
        let vcs = FakeVcs::default()
            .with_status("dirty.txt", ' ', 'M')
            .with_status("new.txt", '?', '?');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine
            .assign("mixed", &["dirty.txt".to_owned(), "new.txt".to_owned()])
            .is_ok());

        let outcome = engine.checkout(&["mixed".to_owned()], false).ok();
        assert!(outcome.is_some());
        if let Some(outcome) = outcome {
            assert_eq!(outcome.reverted, vec!["dirty.txt".to_owned()]);
            assert_eq!(outcome.skipped_untracked, vec!["new.txt".to_owned()]);
            assert!(outcome.deleted.is_empty());
        }
    }

    #[test]
    fn test_checkout_spans_several_changelists_and_deletes() {
        let vcs = FakeVcs::default()
            .with_status("a.txt", ' ', 'M')
            .with_status("b.txt", ' ', 'M');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine.assign("one", &["a.txt".to_owned()]).is_ok());
        assert!(engine.assign("two", &["b.txt".to_owned()]).is_ok());

        let names = vec!["one".to_owned(), "two".to_owned()];
        let outcome = engine.checkout(&names, true).ok();
        assert!(outcome.is_some());
        if let Some(outcome) = outcome {
            assert_eq!(outcome.reverted, vec!["a.txt".to_owned(), "b.txt".to_owned()]);
            assert_eq!(outcome.deleted, names);
        }
        assert_eq!(engine.active_store().load().ok().map(|l| l.len()), Some(0));
    }

    #[test]
    fn test_checkout_rejects_unknown_name_before_acting() {
        let vcs = FakeVcs::default().with_status("a.txt", ' ', 'M');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine.assign("one", &["a.txt".to_owned()]).is_ok());

        assert!(matches!(
            engine.checkout(&["one".to_owned(), "ghost".to_owned()], false),
            Err(EngineError::NotFound(name)) if name == "ghost"
        ));
        // Nothing reverted, nothing deleted.
        assert_eq!(engine.active_store().load().ok().map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_diff_excludes_untracked() {
        let vcs = FakeVcs::default().with_status("new.txt", '?', '?');
        let Some((_dir, engine)) = engine_with(vcs) else {
            return;
        };
        assert!(engine.assign("fresh", &["new.txt".to_owned()]).is_ok());

        assert_eq!(
            engine.diff(&["fresh".to_owned()], false).ok(),
            Some(String::new())
        );
    }

    #[test]
    fn test_diff_validates_every_name() {
        let Some((_dir, engine)) = engine_with(FakeVcs::default()) else {
            return;
        };
        assert!(engine.assign("real", &["a.txt".to_owned()]).is_ok());

        assert!(matches!(
            engine.diff(&["real".to_owned(), "ghost".to_owned()], false),
            Err(EngineError::NotFound(name)) if name == "ghost"
        ));
    }
}
