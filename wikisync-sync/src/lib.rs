//! # wikisync-sync
//!
//! Incremental sync engine: classify the source tree, upload changed
//! assets, rewrite and upload changed pages, and keep the upload manifest
//! current.
//!
//! Call [`run`] with a resolved [`wikisync_core::SyncConfig`] and a
//! [`Session`]. The returned [`SyncReport`] lists the outcome of every file.
//! [`inspect`] compares the source tree with the manifest without syncing.

pub mod assets;
pub mod classifier;
pub mod error;
pub mod hash;
pub mod pages;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod status;

pub use classifier::{classify, Classified};
pub use error::SyncError;
pub use pipeline::{checkpoint, run, Session};
pub use report::{FileOutcome, SkipReason, SyncReport};
pub use resolver::ManifestResolver;
pub use status::{inspect, FileState, FileStatus};
