use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Fatal failures of a pipeline stage.
///
/// Every stage returns `anyhow::Error`; when a stage aborts because of one of these conditions the
/// root of the error chain is a [SortError] and can be recovered with
/// `error.downcast_ref::<SortError>()`.
///
/// Content anomalies are never reported through this type: malformed records are passed through
/// and a corrupt tie-breaker is treated as absent.
#[derive(Debug, Error)]
pub enum SortError {
    /// An input could not be opened for reading
    #[error("failed to open {} for reading", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A temporary, diagnostics or output file could not be created
    #[error("failed to create {}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The finished temporary file could not be moved to the output path
    #[error("failed to rename {} to {}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SortError {
    pub(crate) fn open(path: &Path, source: io::Error) -> SortError {
        SortError::Open {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn create(path: &Path, source: io::Error) -> SortError {
        SortError::Create {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn rename(from: &Path, to: &Path, source: io::Error) -> SortError {
        SortError::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    }
}
