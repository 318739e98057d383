//! Error types for wikisync-remote.

use std::path::PathBuf;

use thiserror::Error;
use wikisync_core::RemoteError;

/// Cookie jar persistence failures. Never fatal to a run.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize cookie jar for {path}: {message}")]
    Format { path: PathBuf, message: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SessionError {
    SessionError::Io {
        path: path.into(),
        source,
    }
}

/// Translate a ureq failure into the engine's error vocabulary.
pub(crate) fn from_ureq(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, response) => RemoteError::Status {
            status,
            url: response.get_url().to_owned(),
        },
        ureq::Error::Transport(transport) => RemoteError::Transport(transport.to_string()),
    }
}
