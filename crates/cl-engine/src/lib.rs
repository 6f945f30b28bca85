//! Changelist orchestration for git-cl.
//!
//! This crate is the stateful layer between the metadata stores and the
//! external git tool:
//!
//! - [`Engine`] — CRUD over changelists plus grouped status
//! - [`shelve`] — categorization and the shelve (stash) coordinator
//! - [`restore`] — the pre-flight conflict detector and restore ops
//! - [`promote`] — the branch-promotion state machine with rollback
//! - [`ops`] — stage/unstage/commit/diff/checkout over changelists
//!
//! Every operation re-reads the stores under their advisory locks and
//! queries git fresh; nothing is cached between invocations.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod ops;
pub mod promote;
pub mod restore;
pub mod shelve;

#[cfg(test)]
mod testutil;

pub use engine::{AssignOutcome, Engine, Group, GroupEntry, GroupedStatus};
pub use error::EngineError;
pub use ops::{CheckoutOutcome, CommitOutcome, StageOutcome};
pub use promote::{PromotionOutcome, RollbackReport};
pub use restore::{Conflict, ConflictKind, RestoreCheck, RestoreOutcome};
pub use shelve::ShelvePlan;
