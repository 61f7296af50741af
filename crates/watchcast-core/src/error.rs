use std::path::PathBuf;
use thiserror::Error;
use watchcast_sources::SourceError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on history store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History store {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("History store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures that end a cycle before any delivery is attempted
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Fetching watch history failed: {0}")]
    Fetch(#[from] SourceError),

    #[error("Opening history store failed: {0}")]
    Store(#[from] StoreError),

    #[error("Lookback of {hours} hours reaches past the earliest representable time")]
    LookbackOutOfRange { hours: i64 },
}
