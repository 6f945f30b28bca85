//! Error types for the cl-engine crate.
//!
//! The taxonomy follows the tool's propagation policy: single-step
//! commands fail atomically with no partial persistence; the multi-step
//! workflows attach a rollback report enumerating exactly what still
//! needs manual attention.

use cl_core::NameError;
use cl_git::GitError;
use cl_store::StoreError;

use crate::promote::RollbackReport;
use crate::restore::Conflict;

/// Errors from changelist operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The changelist name failed validation. No state was touched.
    #[error("Invalid changelist name '{name}': {source}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Which rule it broke.
        #[source]
        source: NameError,
    },

    /// Every path given to the operation was rejected.
    #[error("no valid paths given")]
    NoValidPaths,

    /// The named changelist is not in the active store.
    #[error("changelist '{0}' does not exist")]
    NotFound(String),

    /// The named changelist is not in the shelved store.
    #[error("changelist '{0}' is not stashed")]
    NotShelved(String),

    /// The name is currently shelved; it cannot be mutated while it is.
    #[error("changelist '{0}' is stashed; unstash it first")]
    Shelved(String),

    /// The changelist has no file the shelf primitive could take.
    #[error("changelist '{0}' has no shelvable changes")]
    NothingShelvable(String),

    /// The desired branch already exists.
    #[error("branch '{0}' already exists")]
    BranchExists(String),

    /// The branch a promotion was asked to base itself on is missing.
    #[error("base branch '{0}' does not exist")]
    NoSuchBranch(String),

    /// Changed files that belong to no changelist block branch
    /// promotion; they must never be silently carried across a branch
    /// switch.
    #[error("{} changed file(s) belong to no changelist: {}", .0.len(), .0.join(", "))]
    UnassignedChanges(Vec<String>),

    /// Restoring would collide with the current working tree.
    #[error("cannot restore '{name}': {} blocking conflict(s)", conflicts.len())]
    RestoreBlocked {
        /// The changelist that could not be restored.
        name: String,
        /// The blocking paths with suggestions.
        conflicts: Vec<Conflict>,
    },

    /// Stored metadata disagrees with live git state.
    ///
    /// Never auto-discarded; the message carries manual-recovery
    /// guidance.
    #[error("{0}")]
    Consistency(String),

    /// A multi-step workflow failed and was rolled back.
    #[error("branch promotion failed during {state}: {source}")]
    PromotionFailed {
        /// The state-machine step that failed.
        state: &'static str,
        /// What went wrong.
        #[source]
        source: Box<EngineError>,
        /// What the rollback managed, and what it did not.
        rollback: RollbackReport,
    },

    /// An external git invocation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A metadata store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Returns `true` when the error left no state changed.
    ///
    /// Validation failures fail fast by construction; lock contention
    /// happens before anything is read.
    #[must_use]
    pub const fn is_clean_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. }
                | Self::NoValidPaths
                | Self::NotFound(_)
                | Self::NotShelved(_)
                | Self::Shelved(_)
                | Self::NothingShelvable(_)
                | Self::BranchExists(_)
                | Self::NoSuchBranch(_)
                | Self::UnassignedChanges(_)
                | Self::Store(StoreError::LockContention { .. })
        )
    }
}
