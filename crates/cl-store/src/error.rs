//! Error types for the cl-store crate.

use camino::Utf8PathBuf;

/// Errors that can occur while loading, saving, or locking a metadata
/// document.
///
/// # Error Recovery Strategy
///
/// - [`StoreError::LockContention`]: another invocation holds the lock;
///   the caller may simply retry later. No state was touched.
/// - [`StoreError::Parse`]: the document is corrupt; nothing is
///   overwritten automatically, manual inspection is required.
/// - I/O errors propagate as-is.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to read or write a document or lock file.
    #[error("failed to access {path}: {source}")]
    Io {
        /// The file involved.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document exists but is not valid JSON for its schema.
    #[error("metadata file {path} is corrupt: {source}")]
    Parse {
        /// The document that failed to parse.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to serialize a document for writing.
    #[error("failed to serialize metadata: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Another process holds the advisory lock.
    #[error("metadata file {path} is locked by another git-cl invocation{holder}", holder = match .pid { Some(p) => format!(" (pid {p})"), None => String::new() })]
    LockContention {
        /// The locked document.
        path: Utf8PathBuf,
        /// Pid recorded in the lock file, when readable.
        pid: Option<u32>,
    },
}

impl StoreError {
    /// Creates an [`StoreError::Io`] for `path`.
    #[inline]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if this error means "try again later".
    #[inline]
    #[must_use]
    pub const fn is_contention(&self) -> bool {
        matches!(self, Self::LockContention { .. })
    }
}
