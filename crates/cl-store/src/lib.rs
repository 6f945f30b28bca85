//! Locked, atomically-persisted JSON metadata stores for git-cl.
//!
//! Two documents live under `.git/`: the active changelists (`cl.json`)
//! and the shelved-changelist records (`cl-stashes.json`). Each is owned
//! by a [`JsonStore`] that guarantees:
//!
//! - the document on disk is always the previous or the new valid state,
//!   never a partial write (temp file + rename)
//! - at most one read-modify-write cycle runs at a time across processes
//!   on the same machine (advisory exclusive lock, [`StoreLock`])
//!
//! The two stores have independent lock scopes so a mutation of one does
//! not block reads of the other. Locking is cooperative only; it is not
//! safe across networked filesystems, a documented limitation.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod lock;
pub mod store;

pub use error::StoreError;
pub use lock::StoreLock;
pub use store::{ActiveStore, JsonStore, ShelfStore, ACTIVE_FILE, SHELF_FILE};
