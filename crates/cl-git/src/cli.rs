//! The real `git` implementation of [`Vcs`].

use std::process::{Command, Output};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::error::GitError;
use crate::status::{parse_porcelain, StatusLine};
use crate::vcs::{CommitMessage, StashEntry, Vcs};

/// Separator used with `git stash list --format` to split the reference
/// from the subject without guessing at colons in messages.
const STASH_FORMAT: &str = "%gd\t%gs";

/// Invokes the system `git` binary, pinned to one repository.
///
/// Every call builds an explicit argument vector, runs synchronously from
/// the repository root, and treats a non-zero exit status as failure with
/// git's stderr attached. No command is ever retried.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: Utf8PathBuf,
    git_dir: Utf8PathBuf,
}

impl GitCli {
    /// Discovers the repository containing `cwd`.
    ///
    /// # Errors
    ///
    /// [`GitError::NotARepository`] if `cwd` is not inside a git work
    /// tree, or the usual spawn/UTF-8 errors.
    pub fn discover(cwd: &Utf8Path) -> Result<Self, GitError> {
        let root = run_in(cwd, &["rev-parse", "--show-toplevel"])
            .map_err(|e| match e {
                GitError::CommandFailed { .. } => GitError::NotARepository(cwd.to_path_buf()),
                other => other,
            })?
            .trim()
            .to_owned();
        let git_dir = run_in(cwd, &["rev-parse", "--absolute-git-dir"])?
            .trim()
            .to_owned();

        Ok(Self {
            repo_root: Utf8PathBuf::from(root),
            git_dir: Utf8PathBuf::from(git_dir),
        })
    }

    /// Runs a git subcommand from the repository root and returns stdout.
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        run_in(&self.repo_root, args)
    }

    /// Like [`run`](Self::run) but hands back the raw output so callers
    /// can distinguish exit codes.
    fn run_raw(&self, args: &[&str]) -> Result<Output, GitError> {
        debug!(?args, "invoking git");
        Command::new("git")
            .args(args)
            .current_dir(self.repo_root.as_std_path())
            .output()
            .map_err(GitError::Spawn)
    }
}

fn run_in(cwd: &Utf8Path, args: &[&str]) -> Result<String, GitError> {
    debug!(?args, %cwd, "invoking git");
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd.as_std_path())
        .output()
        .map_err(GitError::Spawn)?;
    check_output(args, output)
}

fn check_output(args: &[&str], output: Output) -> Result<String, GitError> {
    let command = args.join(" ");
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        return Err(GitError::CommandFailed {
            command,
            code: output.status.code(),
            stderr,
        });
    }
    String::from_utf8(output.stdout).map_err(|_| GitError::NonUtf8Output { command })
}

impl Vcs for GitCli {
    fn repo_root(&self) -> &Utf8Path {
        &self.repo_root
    }

    fn git_dir(&self) -> &Utf8Path {
        &self.git_dir
    }

    fn status_lines(&self, include_untracked: bool) -> Result<Vec<StatusLine>, GitError> {
        let untracked = if include_untracked {
            "--untracked-files=all"
        } else {
            "--untracked-files=no"
        };
        let out = self.run(&["status", "--porcelain", untracked])?;
        Ok(parse_porcelain(&out))
    }

    fn stage(&self, paths: &[String]) -> Result<(), GitError> {
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args).map(drop)
    }

    fn unstage(&self, paths: &[String]) -> Result<(), GitError> {
        let mut args = vec!["reset", "-q", "HEAD", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args).map(drop)
    }

    fn commit(&self, message: CommitMessage<'_>, paths: &[String]) -> Result<(), GitError> {
        let mut args = match message {
            CommitMessage::Inline(msg) => vec!["commit", "-m", msg],
            CommitMessage::FromFile(path) => vec!["commit", "-F", path.as_str()],
        };
        args.push("--");
        args.extend(paths.iter().map(String::as_str));
        self.run(&args).map(drop)
    }

    fn checkout_paths(&self, paths: &[String]) -> Result<(), GitError> {
        let mut args = vec!["checkout", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args).map(drop)
    }

    fn diff(&self, paths: &[String], staged: bool) -> Result<String, GitError> {
        let mut args = vec!["diff"];
        if staged {
            args.push("--cached");
        }
        args.push("--");
        args.extend(paths.iter().map(String::as_str));
        self.run(&args)
    }

    fn stash_push(
        &self,
        message: &str,
        paths: &[String],
        include_untracked: bool,
    ) -> Result<(), GitError> {
        let mut args = vec!["stash", "push", "-m", message];
        if include_untracked {
            args.push("--include-untracked");
        }
        args.push("--");
        args.extend(paths.iter().map(String::as_str));
        self.run(&args).map(drop)
    }

    fn stash_pop(&self, reference: &str) -> Result<(), GitError> {
        self.run(&["stash", "pop", "-q", reference]).map(drop)
    }

    fn stash_list(&self) -> Result<Vec<StashEntry>, GitError> {
        let format = format!("--format={STASH_FORMAT}");
        let out = self.run(&["stash", "list", &format])?;
        Ok(out
            .lines()
            .filter_map(|line| {
                let (reference, subject) = line.split_once('\t')?;
                Some(StashEntry {
                    reference: reference.to_owned(),
                    subject: subject.to_owned(),
                })
            })
            .collect())
    }

    fn current_branch(&self) -> Result<String, GitError> {
        Ok(self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?.trim().to_owned())
    }

    fn branch_exists(&self, name: &str) -> Result<bool, GitError> {
        let reference = format!("refs/heads/{name}");
        let output = self.run_raw(&["show-ref", "--verify", "--quiet", &reference])?;
        // Exit 1 is the documented "no such ref"; anything else is a real
        // failure.
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            code => Err(GitError::CommandFailed {
                command: format!("show-ref --verify --quiet {reference}"),
                code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            }),
        }
    }

    fn create_branch(&self, name: &str, base: Option<&str>) -> Result<(), GitError> {
        let mut args = vec!["checkout", "-q", "-b", name];
        if let Some(base) = base {
            args.push(base);
        }
        self.run(&args).map(drop)
    }

    fn checkout_branch(&self, name: &str) -> Result<(), GitError> {
        self.run(&["checkout", "-q", name]).map(drop)
    }
}
