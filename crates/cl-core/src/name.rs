//! Changelist name validation.
//!
//! Names become git stash messages and branch names, so the allowed
//! charset is the conservative intersection of what git accepts and what
//! reads well in status output: ASCII alphanumerics plus `-`, `_`, `.`.

use crate::error::NameError;

/// Maximum accepted changelist-name length, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Git tokens that may never be used as changelist names.
///
/// Only `HEAD` is reserved; ordinary branch names (`main`, `master`) and
/// git-cl command words are deliberately allowed.
const RESERVED: &[&str] = &["HEAD"];

/// Validates a changelist name.
///
/// # Errors
///
/// Returns a [`NameError`] describing the first rule the name violates:
/// empty, too long, a forbidden character, dots-only, or a reserved git
/// token.
///
/// # Examples
///
/// ```
/// use cl_core::validate_name;
///
/// assert!(validate_name("feature-auth").is_ok());
/// assert!(validate_name("fix_2.1").is_ok());
/// assert!(validate_name(".hidden").is_ok());
///
/// assert!(validate_name("my list").is_err());
/// assert!(validate_name("..").is_err());
/// assert!(validate_name("HEAD").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }

    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(NameError::TooLong {
            len,
            max: MAX_NAME_LEN,
        });
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(NameError::InvalidChar(bad));
    }

    // "." and ".." are path components to git; longer runs are rejected
    // for the same reason.
    if name.chars().all(|c| c == '.') {
        return Err(NameError::DotsOnly);
    }

    if RESERVED.contains(&name) {
        return Err(NameError::Reserved(name.to_owned()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_names() {
        for name in ["my-list", "my_list", "my.list", "feature1", ".hidden"] {
            assert!(validate_name(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn test_accepts_branch_and_command_words() {
        // Branch names and git-cl command words are not reserved.
        for name in ["main", "master", "status", "add"] {
            assert!(validate_name(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn test_rejects_special_characters() {
        for name in [
            "my list", "my/list", "my@list", "my:list", "my~list", "my^list", "my*list",
        ] {
            assert!(
                matches!(validate_name(name), Err(NameError::InvalidChar(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_dots_only() {
        for name in [".", "..", "..."] {
            assert_eq!(validate_name(name), Err(NameError::DotsOnly));
        }
    }

    #[test]
    fn test_rejects_reserved_head() {
        assert_eq!(
            validate_name("HEAD"),
            Err(NameError::Reserved("HEAD".to_owned()))
        );
    }

    #[test]
    fn test_rejects_empty_and_long() {
        assert_eq!(validate_name(""), Err(NameError::Empty));

        let long = "a".repeat(200);
        assert_eq!(
            validate_name(&long),
            Err(NameError::TooLong { len: 200, max: 100 })
        );

        let ok = "a".repeat(50);
        assert!(validate_name(&ok).is_ok());
    }
}
