//! Porcelain v1 status parsing.
//!
//! Each line of `git status --porcelain` is a fixed two-character code,
//! one space, then the path; renames and copies use `old -> new` and the
//! new name is the one that matters. Lines whose code falls outside the
//! recognized set are kept separately so callers can report how many were
//! suppressed instead of losing them.

use cl_core::{FxHashMap, StatusCode};

/// One parsed status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// The raw two-character code.
    pub code: StatusCode,
    /// Storage-relative path (the new name for renames).
    pub path: String,
}

/// A full status query result.
///
/// `entries` holds the recognized codes keyed by path; `suppressed` holds
/// everything else (ignored entries, unmerged conflicts, exotic codes) so
/// the caller can surface at least a count.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    /// path → code for recognized entries.
    pub entries: FxHashMap<String, StatusCode>,
    /// Lines whose code is not in the recognized set.
    pub suppressed: Vec<StatusLine>,
}

impl StatusSnapshot {
    /// Builds a snapshot from parsed lines, splitting recognized from
    /// suppressed.
    #[must_use]
    pub fn from_lines(lines: Vec<StatusLine>) -> Self {
        let mut snapshot = Self::default();
        for line in lines {
            if line.code.is_recognized() {
                snapshot.entries.insert(line.path, line.code);
            } else {
                snapshot.suppressed.push(line);
            }
        }
        snapshot
    }

    /// The code for `path`, or clean if git reported nothing.
    #[must_use]
    pub fn code_for(&self, path: &str) -> StatusCode {
        self.entries.get(path).copied().unwrap_or(StatusCode::clean())
    }
}

/// Parses `git status --porcelain` output.
///
/// Malformed lines (shorter than the fixed-width prefix) are skipped.
///
/// # Examples
///
/// ```
/// use cl_git::parse_porcelain;
///
/// let lines = parse_porcelain(" M src/app.py\n?? notes.txt\n");
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines[0].path, "src/app.py");
/// assert_eq!(lines[0].code.to_string(), " M");
/// ```
#[must_use]
pub fn parse_porcelain(output: &str) -> Vec<StatusLine> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<StatusLine> {
    // Fixed width: XY, space, path. Not trimmed first, the code's first
    // column is often a space.
    let mut chars = line.chars();
    let index = chars.next()?;
    let worktree = chars.next()?;
    if chars.next()? != ' ' {
        return None;
    }
    let rest = line.get(3..)?;
    if rest.is_empty() {
        return None;
    }

    // Rename/copy syntax: "R  old -> new" - the new name is current.
    let path = match rest.split_once(" -> ") {
        Some((_, new)) => new,
        None => rest,
    };

    // git quotes paths containing unusual bytes; those can never appear
    // in a changelist (the resolver refuses them) so the outer quotes
    // are stripped without unescaping.
    let path = path
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path);

    Some(StatusLine {
        code: StatusCode::new(index, worktree),
        path: path.to_owned(),
    })
}
