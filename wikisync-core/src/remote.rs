//! Contract between the sync engine and a remote wiki.
//!
//! The engine only ever talks to [`RemoteSite`]; the HTTP implementation
//! lives in `wikisync-remote`, tests use an in-memory fake.

use std::fmt;

use crate::error::{ConfigError, RemoteError};

pub const USERNAME_ENV: &str = "IGEM_USERNAME";
pub const PASSWORD_ENV: &str = "IGEM_PASSWORD";

/// Login credentials. Never printed: `Debug` redacts the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `IGEM_USERNAME` / `IGEM_PASSWORD`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Credentials::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingCredential(key))
        };
        Ok(Self {
            username: get(USERNAME_ENV)?,
            password: get(PASSWORD_ENV)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An asset ready to be uploaded.
#[derive(Debug, Clone, Copy)]
pub struct AssetUpload<'a> {
    /// Manifest key of the local file.
    pub rel_path: &'a str,
    /// Filename to request on the remote side.
    pub filename: &'a str,
    pub content_hash: &'a str,
    pub bytes: &'a [u8],
}

/// What the platform reports after a successful file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub url: String,
    /// Authoritative filename; may differ from [`AssetUpload::filename`].
    pub filename: String,
}

/// Authentication and upload endpoints of a wiki.
///
/// Calls are blocking. A single `Err` is terminal for that operation; the
/// engine does not retry.
pub trait RemoteSite {
    fn login(&mut self, credentials: &Credentials) -> Result<(), RemoteError>;

    fn upload_file(&mut self, file: &AssetUpload<'_>) -> Result<UploadedFile, RemoteError>;

    /// Replace the page reachable at `target_url` with `content`.
    fn upload_page(&mut self, content: &str, target_url: &str) -> Result<(), RemoteError>;
}
