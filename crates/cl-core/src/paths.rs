//! The path resolver.
//!
//! git-cl works with three path representations:
//!
//! - **caller-relative** — what the user typed, relative to wherever in
//!   the tree the command was invoked
//! - **storage-relative** — relative to the repository root, forward
//!   slashes; the only form ever persisted
//! - **absolute** — used internally while converting between the two
//!
//! [`sanitize`] goes caller → storage and enforces the safety rules;
//! [`to_caller_relative`] goes storage → caller for display and for
//! invoking git from a subdirectory.
//!
//! Resolution is purely lexical (`.` and `..` are folded without touching
//! the filesystem) so that deleted and not-yet-created files can still be
//! named.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use crate::error::PathError;

/// Bytes refused in any user-supplied path.
///
/// Control characters plus the shell metacharacters `; | & ` $`. No shell
/// is ever spawned, but persisted metadata must stay inert if an external
/// integration interpolates it somewhere less careful.
fn forbidden_char(c: char) -> bool {
    c.is_control() || matches!(c, ';' | '|' | '&' | '`' | '$')
}

/// Folds `.` and `..` components without consulting the filesystem.
///
/// A `..` that climbs past the first component is preserved, which makes
/// the later repo-root prefix check fail exactly as it should.
fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for comp in path.components() {
        match comp {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

/// Converts a user-supplied path into storage-relative form.
///
/// The path is resolved against `cwd` (unless already absolute), lexically
/// normalized, and stripped of the `repo_root` prefix. Both `cwd` and
/// `repo_root` must be absolute.
///
/// # Errors
///
/// - [`PathError::DangerousChar`] if the path contains a control character
///   or shell metacharacter
/// - [`PathError::OutsideRepo`] if the path escapes the repository
///   (absolute path elsewhere, or `..` traversal)
/// - [`PathError::Empty`] if the input is empty or resolves to the
///   repository root itself
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use cl_core::sanitize;
///
/// let root = Utf8Path::new("/repo");
/// let src = Utf8Path::new("/repo/src");
///
/// let p = sanitize("app.py", src, root);
/// assert_eq!(p.as_deref(), Ok(Utf8Path::new("src/app.py")));
///
/// assert!(sanitize("../../etc/passwd", src, root).is_err());
/// assert!(sanitize("/etc/passwd", src, root).is_err());
/// ```
pub fn sanitize(
    user_path: &str,
    cwd: &Utf8Path,
    repo_root: &Utf8Path,
) -> Result<Utf8PathBuf, PathError> {
    if user_path.is_empty() {
        return Err(PathError::Empty);
    }

    if let Some(bad) = user_path.chars().find(|&c| forbidden_char(c)) {
        return Err(PathError::DangerousChar {
            path: user_path.to_owned(),
            found: format!("{bad:?}"),
        });
    }

    let given = Utf8Path::new(user_path);
    let absolute = if given.is_absolute() {
        normalize(given)
    } else {
        normalize(&cwd.join(given))
    };

    let storage = absolute
        .strip_prefix(repo_root)
        .map_err(|_| PathError::OutsideRepo(Utf8PathBuf::from(user_path)))?;

    if storage.as_str().is_empty() {
        return Err(PathError::Empty);
    }

    Ok(storage.to_path_buf())
}

/// Converts a storage-relative path back to caller-relative form.
///
/// The result refers to the same file as `repo_root.join(storage)` but is
/// expressed relative to `cwd`, which keeps status output and git
/// invocations correct from any subdirectory. Both `cwd` and `repo_root`
/// must be absolute, with `cwd` inside the repository.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use cl_core::to_caller_relative;
///
/// let root = Utf8Path::new("/repo");
///
/// let p = to_caller_relative(Utf8Path::new("src/app.py"), Utf8Path::new("/repo/src"), root);
/// assert_eq!(p, Utf8Path::new("app.py"));
///
/// let p = to_caller_relative(Utf8Path::new("README.md"), Utf8Path::new("/repo/src"), root);
/// assert_eq!(p, Utf8Path::new("../README.md"));
/// ```
#[must_use]
pub fn to_caller_relative(
    storage: &Utf8Path,
    cwd: &Utf8Path,
    repo_root: &Utf8Path,
) -> Utf8PathBuf {
    let absolute = repo_root.join(storage);

    let mut abs_parts = absolute.components().peekable();
    let mut cwd_parts = cwd.components().peekable();

    // Drop the shared prefix.
    while let (Some(a), Some(c)) = (abs_parts.peek(), cwd_parts.peek()) {
        if a == c {
            abs_parts.next();
            cwd_parts.next();
        } else {
            break;
        }
    }

    let mut out = Utf8PathBuf::new();
    for _ in cwd_parts {
        out.push("..");
    }
    for part in abs_parts {
        out.push(part.as_str());
    }

    if out.as_str().is_empty() {
        out.push(".");
    }
    out
}
