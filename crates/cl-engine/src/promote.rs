//! Branch promotion: lift one changelist onto a fresh branch.
//!
//! Promotion shelves everything, creates the branch, and restores only
//! the target changelist onto it. Any failure after the shelve phase
//! triggers a rollback that restores every shelved changelist in
//! reverse order; rollback failures are enumerated, never silently
//! swallowed, so the operator knows exactly which names are still on
//! the shelf.

use cl_git::Vcs;
use tracing::{info, warn};

use crate::engine::Engine;
use crate::error::EngineError;

/// Where a promotion failed, for the error report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoteState {
    /// Checking preconditions; nothing has been touched yet.
    Validating,
    /// Shelving every active changelist.
    ShelvingAll,
    /// Creating and switching to the new branch.
    CreatingBranch,
    /// Restoring the target changelist onto the new branch.
    RestoringTarget,
}

impl PromoteState {
    #[must_use]
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::ShelvingAll => "shelving",
            Self::CreatingBranch => "creating branch",
            Self::RestoringTarget => "restoring target",
        }
    }
}

/// What a rollback managed to undo.
#[derive(Debug, Clone, Default)]
pub struct RollbackReport {
    /// Changelists successfully restored during rollback.
    pub restored: Vec<String>,
    /// Changelists still shelved, with the reason each restore failed.
    pub failed: Vec<(String, String)>,
    /// Set when the half-created branch was left in place (git has no
    /// safe automatic branch deletion here; the operator decides).
    pub branch_left_behind: Option<String>,
    /// Set when switching back to the source branch itself failed, e.g.
    /// because it moved while the promotion ran. The rollback still
    /// restores what it can where HEAD currently is.
    pub source_checkout_failed: Option<String>,
}

impl RollbackReport {
    /// Whether the rollback returned the repository to its pre-call
    /// state, give or take a leftover branch.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.source_checkout_failed.is_none()
    }
}

/// A successful promotion.
#[derive(Debug, Clone)]
pub struct PromotionOutcome {
    /// The promoted changelist.
    pub name: String,
    /// The branch now checked out.
    pub branch: String,
    /// The branch promotion started from.
    pub source_branch: String,
    /// Files restored onto the new branch.
    pub files: Vec<String>,
    /// Other changelists left shelved on the source branch.
    pub left_shelved: Vec<String>,
}

impl<V: Vcs> Engine<V> {
    /// Promotes `name` onto a new branch called `branch`.
    ///
    /// Preconditions: the changelist exists and is not already
    /// shelved, the branch does not exist (and `base`, when given,
    /// does), and every changed file in the repository belongs to some
    /// changelist (unassigned changes would be dragged along by the
    /// shelve-all and silently land on no branch).
    pub fn promote(
        &self,
        name: &str,
        branch: &str,
        base: Option<&str>,
    ) -> Result<PromotionOutcome, EngineError> {
        let mut state = PromoteState::Validating;
        self.validate_promotion(name, branch, base)?;

        let source_branch = self.vcs().current_branch()?;
        // Shelf records that predate this promotion are not ours to
        // roll back.
        let pre_shelved: cl_core::FxHashSet<String> =
            self.shelf_store().load()?.keys().cloned().collect();

        let result = (|| -> Result<PromotionOutcome, EngineError> {
            state = PromoteState::ShelvingAll;
            self.shelve_all()?;

            if !self.shelf_store().load()?.contains_key(name) {
                // The target had nothing shelvable, so there is nothing
                // to carry onto the branch.
                return Err(EngineError::NothingShelvable(name.to_owned()));
            }

            state = PromoteState::CreatingBranch;
            self.vcs().create_branch(branch, base)?;

            state = PromoteState::RestoringTarget;
            let restored = self.restore(name)?;

            let left_shelved: Vec<String> = self.shelf_store().load()?.keys().cloned().collect();
            info!(changelist = name, branch, "promoted changelist");
            Ok(PromotionOutcome {
                name: name.to_owned(),
                branch: branch.to_owned(),
                source_branch: source_branch.clone(),
                files: restored.files,
                left_shelved,
            })
        })();

        match result {
            Ok(outcome) => Ok(outcome),
            Err(source) => {
                warn!(changelist = name, state = state.as_str(), "promotion failed, rolling back");
                // Read the shelf store rather than trusting in-memory
                // bookkeeping: a shelve-all that failed partway still
                // left records behind, and every one of them must be
                // rolled back or reported.
                let shelved_names: Vec<String> = self
                    .shelf_store()
                    .load()
                    .map(|records| {
                        records
                            .keys()
                            .filter(|k| !pre_shelved.contains(k.as_str()))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                let rollback = self.roll_back(&shelved_names, &source_branch, branch, state);
                Err(EngineError::PromotionFailed {
                    state: state.as_str(),
                    source: Box::new(source),
                    rollback,
                })
            }
        }
    }

    fn validate_promotion(
        &self,
        name: &str,
        branch: &str,
        base: Option<&str>,
    ) -> Result<(), EngineError> {
        self.check_name(name)?;

        let lists = self.active_store().load()?;
        if !lists.contains_key(name) {
            if self.shelf_store().load()?.contains_key(name) {
                return Err(EngineError::Shelved(name.to_owned()));
            }
            return Err(EngineError::NotFound(name.to_owned()));
        }

        if self.vcs().branch_exists(branch)? {
            return Err(EngineError::BranchExists(branch.to_owned()));
        }
        if let Some(base) = base {
            if !self.vcs().branch_exists(base)? {
                return Err(EngineError::NoSuchBranch(base.to_owned()));
            }
        }

        // Untracked files included: they would ride along on the
        // shelve-all just like tracked changes.
        let snapshot = self.vcs().status_snapshot(true)?;
        let mut claimed = cl_core::FxHashSet::default();
        for files in lists.values() {
            claimed.extend(files.iter().cloned());
        }
        let mut unassigned: Vec<String> = snapshot
            .entries
            .keys()
            .filter(|path| !claimed.contains(*path))
            .cloned()
            .collect();
        if !unassigned.is_empty() {
            unassigned.sort();
            return Err(EngineError::UnassignedChanges(unassigned));
        }

        Ok(())
    }

    /// Undoes a failed promotion as far as possible.
    ///
    /// Switches back to the source branch when the failure happened
    /// after the branch switch, then restores shelved changelists in
    /// reverse shelve order. Each restore failure is recorded and the
    /// rollback continues with the next name.
    fn roll_back(
        &self,
        shelved_names: &[String],
        source_branch: &str,
        branch: &str,
        state: PromoteState,
    ) -> RollbackReport {
        let mut report = RollbackReport::default();

        if matches!(state, PromoteState::RestoringTarget) {
            if let Err(err) = self.vcs().checkout_branch(source_branch) {
                warn!(branch = source_branch, %err, "rollback could not return to source branch");
                report.source_checkout_failed = Some(err.to_string());
            }
            report.branch_left_behind = Some(branch.to_owned());
        }

        for name in shelved_names.iter().rev() {
            // Already restored before the failure, nothing to undo.
            if !self
                .shelf_store()
                .load()
                .map(|r| r.contains_key(name))
                .unwrap_or(true)
            {
                continue;
            }
            match self.restore(name) {
                Ok(_) => report.restored.push(name.clone()),
                Err(err) => report.failed.push((name.clone(), err.to_string())),
            }
        }

        report
    }
}
