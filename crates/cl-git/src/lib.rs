//! git subprocess gateway for git-cl.
//!
//! The external `git` binary is the only source of truth about the
//! working tree. This crate wraps it behind the narrow [`Vcs`] trait so
//! the orchestration layer can be exercised against a fake, and provides
//! [`GitCli`], the real implementation that spawns `git` with explicit
//! argument lists (never a shell) and treats any non-zero exit as
//! failure.
//!
//! The gateway is a read-only oracle for status: every query re-invokes
//! `git status`, because the repository can change between any two
//! operations issued by this tool.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod cli;
pub mod error;
pub mod status;
pub mod vcs;

pub use cli::GitCli;
pub use error::GitError;
pub use status::{parse_porcelain, StatusLine, StatusSnapshot};
pub use vcs::{find_stash_by_message, CommitMessage, StashEntry, Vcs};
