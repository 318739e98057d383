//! Error types for wikisync-sync.
//!
//! Every variant here aborts the run. Per-file problems that the run
//! survives are reported as [`crate::report::SkipReason`] instead.

use std::path::PathBuf;

use thiserror::Error;

use wikisync_core::{ConfigError, ManifestError, RemoteError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("failed to log in: {0}")]
    Auth(#[source] RemoteError),

    /// Asset uploads are fatal because later pages link to the assigned
    /// URL. The manifest has been checkpointed before this is returned.
    #[error(
        "failed to upload {path}: {source}. The current upload map has been saved \
         so you won't have to upload everything again"
    )]
    AssetUpload {
        path: String,
        #[source]
        source: RemoteError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
