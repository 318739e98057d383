//! Error types for wikisync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from manifest persistence.
///
/// A missing or unparsable manifest is *not* an error, see
/// [`crate::manifest::ManifestLoad`]. Only structural damage to a required
/// section aborts a run.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// I/O failure while writing the manifest, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A required top-level key exists but does not hold a mapping.
    #[error("manifest at {path} has an invalid format: `{key}` must be a mapping")]
    InvalidSection { path: PathBuf, key: String },
}

/// Configuration problems. All of these are fatal before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("please specify your team name (--team or `team:` in the config file)")]
    MissingTeam,

    #[error("please specify where to look for your code (--src or `src_dir:` in the config file)")]
    MissingSourceDir,

    #[error("please specify where to build your code (--build or `build_dir:` in the config file)")]
    MissingBuildDir,

    /// An environment variable required for a live run is unset or empty.
    #[error("environment variable {0} is not set")]
    MissingCredential(&'static str),

    #[error("source directory {path} does not exist or is not a directory")]
    SourceNotFound { path: PathBuf },

    /// The build directory is wiped on every run, so it must never contain
    /// the sources.
    #[error("build directory {build} would contain the source directory {src}")]
    BuildContainsSource { build: PathBuf, src: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Failure signalled by a remote site adapter.
///
/// Every variant means the same thing to the sync engine: the call failed.
/// The split exists for log messages.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network-level failure: DNS, connect, TLS, timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The server answered 2xx but reported a failure in the body.
    #[error("rejected by remote: {0}")]
    Rejected(String),

    /// The response could not be decoded.
    #[error("unexpected response from {url}: {message}")]
    Protocol { url: String, message: String },
}

/// Convenience constructor for [`ManifestError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
