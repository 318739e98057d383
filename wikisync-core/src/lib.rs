//! wikisync core library — domain types, manifest persistence, configuration
//! and the remote-site contract.
//!
//! - [`types`] — file categories, manifest entries, source file records
//! - [`manifest`] — load / save of `upload_map.yml`
//! - [`config`] — layered run configuration
//! - [`site`] — deterministic wiki URL layout
//! - [`remote`] — [`RemoteSite`] trait and credentials
//! - [`error`] — [`ManifestError`], [`ConfigError`], [`RemoteError`]

pub mod config;
pub mod error;
pub mod manifest;
pub mod remote;
pub mod site;
pub mod types;

pub use config::{ConfigFile, SyncConfig};
pub use error::{ConfigError, ManifestError, RemoteError};
pub use manifest::{Manifest, ManifestLoad};
pub use remote::{AssetUpload, Credentials, RemoteSite, UploadedFile};
pub use site::SiteLayout;
pub use types::{AssetEntry, FileCategory, PageEntry, SourceFile};
