//! Error types for the cl-git crate.

use camino::Utf8PathBuf;

/// Errors from invoking the external `git` binary.
///
/// The subprocess's exit status is authoritative: a non-zero exit aborts
/// the operation at that step with git's own stderr attached, and nothing
/// is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// The `git` binary could not be spawned at all.
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    /// git exited non-zero.
    #[error("git {command} failed{code}: {stderr}", code = match .code { Some(c) => format!(" (exit {c})"), None => String::new() })]
    CommandFailed {
        /// The subcommand and arguments that were run.
        command: String,
        /// Exit code, when the process was not killed by a signal.
        code: Option<i32>,
        /// git's stderr, trimmed.
        stderr: String,
    },

    /// git produced output that is not valid UTF-8.
    #[error("git {command} produced non-UTF-8 output")]
    NonUtf8Output {
        /// The subcommand that was run.
        command: String,
    },

    /// The working directory is not inside a git repository.
    #[error("not a git repository: {0}")]
    NotARepository(Utf8PathBuf),
}

impl GitError {
    /// Returns the exit code git reported, if any.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = GitError::CommandFailed {
            command: "stash pop stash@{0}".to_owned(),
            code: Some(1),
            stderr: "could not restore untracked files".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("stash pop"));
        assert!(msg.contains("exit 1"));
        assert!(msg.contains("untracked"));
        assert_eq!(err.exit_code(), Some(1));
    }

    #[test]
    fn test_not_a_repository_display() {
        let err = GitError::NotARepository(Utf8PathBuf::from("/tmp/elsewhere"));
        assert!(err.to_string().contains("/tmp/elsewhere"));
        assert_eq!(err.exit_code(), None);
    }
}
