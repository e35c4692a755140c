/// Error types for scanning and tree mutation.
use crate::model::NodeIndex;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the caller of a scan.
///
/// Per-directory listing failures are *not* reported this way; the scanner
/// recovers from them locally and only emits a progress notice.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The requested root does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// The requested root exists but is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Permission denied while inspecting the root.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic I/O error while inspecting the root.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A scan is already running on this controller.
    #[error("A scan is already running")]
    AlreadyRunning,

    /// The background scanner thread could not be spawned.
    #[error("Failed to spawn scanner thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Misuse of the entry tree's mutation API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    /// `set_children` was called a second time on the same directory.
    #[error("children of {path} are already loaded")]
    ChildrenAlreadyLoaded { path: PathBuf },

    /// An entry handed to `set_children` names a different parent.
    #[error("entry {name:?} does not belong to {path}")]
    ParentMismatch { path: PathBuf, name: String },

    /// A directory's size disagrees with the files below it.
    #[error("size of {path} is {recorded} but its loaded files total {expected}")]
    SizeMismatch {
        node: NodeIndex,
        path: PathBuf,
        recorded: u64,
        expected: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_is_classified_by_kind() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));

        let err = ScanError::io("/test/path", std::io::Error::other("boom"));
        assert!(matches!(err, ScanError::Io { .. }));
    }
}
