//! Error types for the cl-core crate.
//!
//! This module provides [`NameError`] for changelist-name validation
//! failures and [`PathError`] for path-resolution rejections.

use camino::Utf8PathBuf;

/// Reasons a changelist name is rejected.
///
/// Validation is deterministic string inspection; none of these variants
/// represent I/O failures.
///
/// # Examples
///
/// ```
/// use cl_core::{validate_name, NameError};
///
/// let err = validate_name("HEAD");
/// assert!(matches!(err, Err(NameError::Reserved(_))));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// The name is empty.
    #[error("name is empty")]
    Empty,

    /// The name exceeds the maximum length.
    #[error("name is {len} characters, maximum is {max}")]
    TooLong {
        /// Length of the rejected name.
        len: usize,
        /// The enforced maximum.
        max: usize,
    },

    /// The name contains a character outside the allowed set.
    ///
    /// Allowed: ASCII alphanumerics, `-`, `_`, and `.`.
    #[error("character '{0}' is not allowed")]
    InvalidChar(char),

    /// The name consists only of dots (`.`, `..`, `...`).
    #[error("name consists only of dots")]
    DotsOnly,

    /// The name collides with a reserved git token.
    #[error("'{0}' is a reserved word")]
    Reserved(String),
}

/// Reasons a user-supplied path is rejected by the resolver.
///
/// Rejection is the expected outcome for bad input; callers report the
/// reason and skip the path rather than aborting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path resolves to a location outside the repository root.
    #[error("path '{0}' is outside the repository")]
    OutsideRepo(Utf8PathBuf),

    /// The path contains a control character or shell metacharacter.
    ///
    /// No shell is ever invoked by this tool, but stored metadata may be
    /// consumed by external integrations, so these bytes are refused at
    /// the door.
    #[error("path '{path}' contains forbidden character '{found}'")]
    DangerousChar {
        /// The offending path as given.
        path: String,
        /// The character that triggered the rejection (escaped).
        found: String,
    },

    /// The path is empty after normalization.
    #[error("path is empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_error_display() {
        let err = NameError::TooLong { len: 200, max: 100 };
        let msg = err.to_string();
        assert!(msg.contains("200"));
        assert!(msg.contains("100"));

        assert!(NameError::Reserved("HEAD".to_owned())
            .to_string()
            .contains("HEAD"));
    }

    #[test]
    fn test_path_error_display() {
        let err = PathError::OutsideRepo(Utf8PathBuf::from("../etc/passwd"));
        assert!(err.to_string().contains("../etc/passwd"));

        let err = PathError::DangerousChar {
            path: "a;b".to_owned(),
            found: "';'".to_owned(),
        };
        assert!(err.to_string().contains("a;b"));
    }
}
