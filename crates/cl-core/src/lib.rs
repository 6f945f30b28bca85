//! Core types, path resolution, and validation for the git-cl tool.
//!
//! This crate provides the foundational pieces used across the workspace:
//!
//! - The path resolver ([`sanitize`], [`to_caller_relative`]) converting
//!   between caller-relative, storage-relative, and absolute paths
//! - Changelist name validation ([`validate_name`])
//! - Porcelain status-code classification ([`StatusCode`], [`FileClass`])
//! - Persistent document types ([`Changelists`], [`ShelvedRecord`])
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod name;
pub mod paths;
pub mod record;
pub mod status;

pub use error::{NameError, PathError};
pub use name::{validate_name, MAX_NAME_LEN};
pub use paths::{sanitize, to_caller_relative};
pub use record::{Changelists, FileCategories, ShelvedRecord, ShelvedRecords};
pub use status::{FileClass, StatusCode};

/// A `HashMap` keyed with `FxHash`, faster than the std default for the
/// short string keys this tool works with.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A `HashSet` hashed with `FxHash`.
pub type FxHashSet<T> = rustc_hash::FxHashSet<T>;
