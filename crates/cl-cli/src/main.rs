//! CLI entry point for git-cl.
//!
//! This binary provides the command-line interface for grouping working
//! tree files into named changelists, shelving them onto the git stash,
//! and promoting a changelist onto its own branch.
//!
//! # Usage
//!
//! ```bash
//! git-cl <COMMAND>
//!
//! # Group files and review them
//! git-cl add my-feature src/parser.rs src/lexer.rs
//! git-cl status
//!
//! # Park the work and get it back later
//! git-cl stash my-feature
//! git-cl unstash my-feature
//!
//! # Lift a changelist onto its own branch
//! git-cl branch my-feature feature/parser-rework
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::{BufRead, Write};

use camino::Utf8PathBuf;
use cl_engine::{Engine, EngineError, GroupedStatus};
use cl_git::{CommitMessage, GitCli};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Group working-tree files into named changelists.
///
/// Changelists are persistent named groups of files layered over a git
/// working tree. They can be reviewed as a unit, shelved onto the git
/// stash, restored, and promoted onto their own branch.
#[derive(Parser)]
#[command(name = "git-cl", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show working-tree status grouped by changelist.
    #[command(visible_alias = "st")]
    Status {
        /// Restrict the view to one changelist.
        name: Option<String>,

        /// Also list entries with unrecognized status codes.
        #[arg(long)]
        all: bool,

        /// Show the "No Changelist" section even when a name is given.
        #[arg(long = "include-no-cl")]
        include_no_cl: bool,
    },

    /// Add files to a changelist, creating it on first use.
    Add {
        /// The changelist name.
        name: String,

        /// Files to add.
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Remove files from a changelist (the files are untouched).
    #[command(visible_alias = "rm", alias = "r")]
    Remove {
        /// The changelist name.
        name: String,

        /// Files to remove.
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Delete changelists (metadata only; files are untouched).
    #[command(visible_alias = "del")]
    Delete {
        /// Names to delete.
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        names: Vec<String>,

        /// Delete every changelist.
        #[arg(long)]
        all: bool,
    },

    /// Stage a changelist's pending changes (git add).
    Stage {
        /// The changelist name.
        name: String,

        /// Delete the changelist after staging.
        #[arg(long)]
        delete: bool,
    },

    /// Unstage a changelist's staged changes (git reset).
    Unstage {
        /// The changelist name.
        name: String,

        /// Delete the changelist after unstaging.
        #[arg(long)]
        delete: bool,
    },

    /// Commit a changelist's files as one commit.
    #[command(visible_alias = "ci")]
    #[command(group(ArgGroup::new("msg").required(true).args(["message", "file"])))]
    Commit {
        /// The changelist name.
        name: String,

        /// Commit message.
        #[arg(short, long)]
        message: Option<String>,

        /// Read the commit message from a file.
        #[arg(short = 'F', long)]
        file: Option<Utf8PathBuf>,

        /// Keep the changelist after committing.
        #[arg(long)]
        keep: bool,
    },

    /// Show the combined diff of one or more changelists.
    Diff {
        /// Changelist names.
        #[arg(required = true)]
        names: Vec<String>,

        /// Show the staged (index vs HEAD) diff instead.
        #[arg(long)]
        staged: bool,
    },

    /// Revert changelists' files to their HEAD content.
    #[command(visible_alias = "co")]
    Checkout {
        /// Changelist names.
        #[arg(required = true)]
        names: Vec<String>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,

        /// Delete the changelists after reverting.
        #[arg(long)]
        delete: bool,
    },

    /// Stash a changelist's changes onto the git stash.
    #[command(visible_alias = "sh")]
    Stash {
        /// The changelist to stash; omit to stash every changelist.
        name: Option<String>,
    },

    /// Restore a stashed changelist to the working tree.
    #[command(visible_alias = "us")]
    Unstash {
        /// The changelist to restore; omit to restore every stashed
        /// changelist.
        name: Option<String>,
    },

    /// Move a changelist onto a new branch.
    #[command(visible_alias = "br")]
    Branch {
        /// The changelist to promote.
        name: String,

        /// The branch to create.
        branch: String,

        /// Base the new branch on this branch instead of HEAD.
        #[arg(long)]
        from: Option<String>,
    },
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `warn` level by default so
/// normal command output stays clean.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "warn" };
        EnvFilter::new(level)
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds the engine for the repository containing the current
/// directory.
///
/// # Errors
///
/// Returns an error outside a git work tree or on a non-UTF-8 working
/// directory.
fn build_engine() -> color_eyre::Result<Engine<GitCli>> {
    let cwd = std::env::current_dir()?;
    let cwd = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|p| color_eyre::eyre::eyre!("current directory is not valid UTF-8: {}", p.display()))?;
    let vcs = GitCli::discover(&cwd)?;
    Ok(Engine::new(vcs, cwd))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn run_status(
    engine: &Engine<GitCli>,
    name: Option<&str>,
    show_all: bool,
    include_no_cl: bool,
) -> color_eyre::Result<()> {
    let view = engine.grouped_status(name, include_no_cl)?;
    print_grouped_status(engine, &view, show_all);
    Ok(())
}

fn run_add(engine: &Engine<GitCli>, name: &str, paths: &[String]) -> color_eyre::Result<()> {
    let outcome = engine.assign(name, paths)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for (path, reason) in &outcome.rejected {
        let _ = writeln!(handle, "Warning: skipping '{path}': {reason}");
    }
    for path in &outcome.missing {
        let _ = writeln!(
            handle,
            "Warning: '{}' does not exist",
            engine.display_path(path)
        );
    }
    if !outcome.added.is_empty() {
        let _ = writeln!(
            handle,
            "Added to changelist '{name}': {} file(s)",
            outcome.added.len()
        );
    }
    Ok(())
}

fn run_remove(engine: &Engine<GitCli>, name: &str, paths: &[String]) -> color_eyre::Result<()> {
    let removed = engine.unassign(name, paths)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(
        handle,
        "Removed from changelist '{name}': {} file(s)",
        removed.len()
    );
    Ok(())
}

fn run_delete(engine: &Engine<GitCli>, names: &[String], all: bool) -> color_eyre::Result<()> {
    let deleted = if all {
        engine.delete_all()?
    } else {
        engine.delete(names)?
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for name in &deleted {
        let _ = writeln!(handle, "Deleted changelist '{name}'");
    }
    Ok(())
}

fn run_stage(engine: &Engine<GitCli>, name: &str, delete: bool) -> color_eyre::Result<()> {
    let outcome = engine.stage(name, delete)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if outcome.files.is_empty() {
        let _ = writeln!(handle, "Nothing to stage in changelist '{name}'");
    } else {
        let _ = writeln!(handle, "Staged {} file(s) from '{name}'", outcome.files.len());
    }
    if outcome.deleted {
        let _ = writeln!(handle, "Deleted changelist '{name}'");
    }
    Ok(())
}

fn run_unstage(engine: &Engine<GitCli>, name: &str, delete: bool) -> color_eyre::Result<()> {
    let outcome = engine.unstage(name, delete)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if outcome.files.is_empty() {
        let _ = writeln!(handle, "Nothing to unstage in changelist '{name}'");
    } else {
        let _ = writeln!(handle, "Unstaged {} file(s) from '{name}'", outcome.files.len());
    }
    if outcome.deleted {
        let _ = writeln!(handle, "Deleted changelist '{name}'");
    }
    Ok(())
}

fn run_commit(
    engine: &Engine<GitCli>,
    name: &str,
    message: Option<&str>,
    file: Option<&Utf8PathBuf>,
    keep: bool,
) -> color_eyre::Result<()> {
    let message = match (message, file) {
        (Some(msg), _) => CommitMessage::Inline(msg),
        (None, Some(path)) => CommitMessage::FromFile(path.as_path()),
        // clap's ArgGroup guarantees one of the two is present.
        (None, None) => return Err(color_eyre::eyre::eyre!("a commit message is required")),
    };

    let outcome = engine.commit(name, message, keep)?;
    info!(changelist = name, files = outcome.files.len(), "committed");

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for path in &outcome.skipped_untracked {
        let _ = writeln!(
            handle,
            "Skipping untracked file '{}' (stage it first to commit it)",
            engine.display_path(path)
        );
    }
    if outcome.files.is_empty() {
        let _ = writeln!(handle, "No tracked files with changes in changelist '{name}'");
        return Ok(());
    }
    let _ = writeln!(
        handle,
        "Committed {} file(s) from '{name}'",
        outcome.files.len()
    );
    if outcome.deleted {
        let _ = writeln!(handle, "Deleted changelist '{name}'");
    }
    Ok(())
}

fn run_diff(engine: &Engine<GitCli>, names: &[String], staged: bool) -> color_eyre::Result<()> {
    let diff = engine.diff(names, staged)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if diff.is_empty() {
        let _ = writeln!(
            handle,
            "No tracked files with changes in: {}",
            names.join(", ")
        );
    } else {
        let _ = write!(handle, "{diff}");
    }
    Ok(())
}

fn run_checkout(
    engine: &Engine<GitCli>,
    names: &[String],
    force: bool,
    delete: bool,
) -> color_eyre::Result<()> {
    if !force && !confirm_checkout(names)? {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "Aborted");
        return Ok(());
    }

    let outcome = engine.checkout(names, delete)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    for path in &outcome.skipped_untracked {
        let _ = writeln!(
            handle,
            "Skipping untracked file '{}'",
            engine.display_path(path)
        );
    }
    if outcome.reverted.is_empty() {
        let _ = writeln!(
            handle,
            "No tracked files with changes in: {}",
            names.join(", ")
        );
    } else {
        let _ = writeln!(handle, "Reverted {} file(s)", outcome.reverted.len());
    }
    for name in &outcome.deleted {
        let _ = writeln!(handle, "Deleted changelist '{name}'");
    }
    Ok(())
}

fn run_stash(engine: &Engine<GitCli>, name: Option<&str>) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    match name {
        Some(name) => {
            let record = engine.shelve(name)?;
            let _ = writeln!(
                handle,
                "Stashed changelist '{name}' ({} file(s))",
                record.files.len()
            );
        }
        None => {
            let (shelved, skipped) = engine.shelve_all()?;
            for (name, record) in &shelved {
                let _ = writeln!(
                    handle,
                    "Stashed changelist '{name}' ({} file(s))",
                    record.files.len()
                );
            }
            for name in &skipped {
                let _ = writeln!(handle, "Skipped '{name}': no stashable changes");
            }
            if shelved.is_empty() && skipped.is_empty() {
                let _ = writeln!(handle, "No changelists to stash");
            }
        }
    }
    Ok(())
}

fn run_unstash(engine: &Engine<GitCli>, name: Option<&str>) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let outcomes = match name {
        Some(name) => vec![engine.restore(name)?],
        None => {
            let outcomes = engine.restore_all()?;
            if outcomes.is_empty() {
                let _ = writeln!(handle, "No stashed changelists");
            }
            outcomes
        }
    };

    for outcome in &outcomes {
        let _ = writeln!(
            handle,
            "Restored changelist '{}' ({} file(s))",
            outcome.name,
            outcome.files.len()
        );
    }
    Ok(())
}

fn run_branch(
    engine: &Engine<GitCli>,
    name: &str,
    branch: &str,
    from: Option<&str>,
) -> color_eyre::Result<()> {
    let outcome = engine.promote(name, branch, from)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(
        handle,
        "Moved changelist '{}' onto branch '{}' ({} file(s))",
        outcome.name,
        outcome.branch,
        outcome.files.len()
    );
    if !outcome.left_shelved.is_empty() {
        let _ = writeln!(
            handle,
            "Left stashed on '{}': {}",
            outcome.source_branch,
            outcome.left_shelved.join(", ")
        );
        let _ = writeln!(
            handle,
            "Run 'git-cl unstash' after switching back to retrieve them"
        );
    }
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Renders the grouped status view.
///
/// Each changelist becomes a `<name>:` header with `[XY] path` lines;
/// changed files outside every changelist go under `No Changelist:`.
fn print_grouped_status(engine: &Engine<GitCli>, view: &GroupedStatus, show_all: bool) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    for group in &view.groups {
        let _ = writeln!(handle, "{}:", group.name);
        for entry in &group.entries {
            let _ = writeln!(
                handle,
                "  [{}] {}",
                entry.code,
                engine.display_path(&entry.path)
            );
        }
        let _ = writeln!(handle);
    }

    if !view.unassigned.is_empty() {
        let _ = writeln!(handle, "No Changelist:");
        for entry in &view.unassigned {
            let _ = writeln!(
                handle,
                "  [{}] {}",
                entry.code,
                engine.display_path(&entry.path)
            );
        }
        let _ = writeln!(handle);
    }

    if !view.shelved.is_empty() {
        let _ = writeln!(handle, "Stashed changelists: {}", view.shelved.join(", "));
        let _ = writeln!(handle);
    }

    if !view.suppressed.is_empty() {
        if show_all {
            let _ = writeln!(handle, "Unrecognized status entries:");
            for line in &view.suppressed {
                let _ = writeln!(
                    handle,
                    "  [{}] {}",
                    line.code,
                    engine.display_path(&line.path)
                );
            }
        } else {
            let _ = writeln!(
                handle,
                "({} entries with unrecognized status suppressed; use --all to list them)",
                view.suppressed.len()
            );
        }
    }

    if view.groups.is_empty() && view.unassigned.is_empty() && view.shelved.is_empty() {
        let _ = writeln!(handle, "No changelists and no changes");
    }
}

/// Asks the user to confirm a destructive checkout.
fn confirm_checkout(names: &[String]) -> color_eyre::Result<bool> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = write!(
        handle,
        "This will discard local changes to the files in '{}'. Proceed? [y/N] ",
        names.join("', '")
    );
    let _ = handle.flush();
    drop(handle);

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Renders restore conflicts with their suggestions before the error
/// propagates.
fn report_conflicts(err: &EngineError) {
    if let EngineError::RestoreBlocked { conflicts, .. } = err {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        for conflict in conflicts {
            let _ = writeln!(handle, "  conflict: {conflict}");
        }
    }
    if let EngineError::PromotionFailed { rollback, .. } = err {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        for name in &rollback.restored {
            let _ = writeln!(handle, "  rolled back: '{name}' restored");
        }
        for (name, reason) in &rollback.failed {
            let _ = writeln!(handle, "  still stashed: '{name}' ({reason})");
        }
        if let Some(branch) = &rollback.branch_left_behind {
            let _ = writeln!(handle, "  branch '{branch}' was left behind");
        }
        if let Some(reason) = &rollback.source_checkout_failed {
            let _ = writeln!(
                handle,
                "  could not return to the original branch: {reason}"
            );
        }
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
fn main() -> color_eyre::Result<()> {
    // Install color-eyre first, before any potential failure.
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    let engine = build_engine()?;

    let result = match &cli.command {
        Commands::Status {
            name,
            all,
            include_no_cl,
        } => run_status(&engine, name.as_deref(), *all, *include_no_cl),
        Commands::Add { name, paths } => run_add(&engine, name, paths),
        Commands::Remove { name, paths } => run_remove(&engine, name, paths),
        Commands::Delete { names, all } => run_delete(&engine, names, *all),
        Commands::Stage { name, delete } => run_stage(&engine, name, *delete),
        Commands::Unstage { name, delete } => run_unstage(&engine, name, *delete),
        Commands::Commit {
            name,
            message,
            file,
            keep,
        } => run_commit(&engine, name, message.as_deref(), file.as_ref(), *keep),
        Commands::Diff { names, staged } => run_diff(&engine, names, *staged),
        Commands::Checkout {
            names,
            force,
            delete,
        } => run_checkout(&engine, names, *force, *delete),
        Commands::Stash { name } => run_stash(&engine, name.as_deref()),
        Commands::Unstash { name } => run_unstash(&engine, name.as_deref()),
        Commands::Branch { name, branch, from } => {
            run_branch(&engine, name, branch, from.as_deref())
        }
    };

    if let Err(report) = &result {
        if let Some(engine_err) = report.downcast_ref::<EngineError>() {
            report_conflicts(engine_err);
        }
    }
    result
}
