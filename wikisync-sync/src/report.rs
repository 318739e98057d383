//! Per-file outcomes of a sync run.

use std::fmt;
use std::path::PathBuf;

use wikisync_core::FileCategory;

/// Why a file was left out of this run. None of these abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The source file could not be read.
    Read(String),
    /// The rewritten output could not be written to the build directory.
    Write(String),
    /// The page upload failed; the stored hash was left alone so the next
    /// run retries it.
    Upload(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Read(e) => write!(f, "could not read source: {e}"),
            SkipReason::Write(e) => write!(f, "could not write build output: {e}"),
            SkipReason::Upload(e) => write!(f, "upload failed: {e}"),
        }
    }
}

/// Outcome of processing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Content changed (or was new) and is now on the remote.
    Uploaded {
        path: String,
        category: FileCategory,
        url: String,
    },
    /// Content hash matches the manifest; nothing sent.
    Unchanged { path: String, category: FileCategory },
    /// Dry run: the file *would* have been uploaded.
    WouldUpload { path: String, category: FileCategory },
    Skipped {
        path: String,
        category: FileCategory,
        reason: SkipReason,
    },
}

impl FileOutcome {
    pub fn path(&self) -> &str {
        match self {
            FileOutcome::Uploaded { path, .. }
            | FileOutcome::Unchanged { path, .. }
            | FileOutcome::WouldUpload { path, .. }
            | FileOutcome::Skipped { path, .. } => path,
        }
    }

    pub fn category(&self) -> FileCategory {
        match self {
            FileOutcome::Uploaded { category, .. }
            | FileOutcome::Unchanged { category, .. }
            | FileOutcome::WouldUpload { category, .. }
            | FileOutcome::Skipped { category, .. } => *category,
        }
    }
}

/// Summary of a complete run, in processing order (assets first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<FileOutcome>,
    /// Files skipped for having an unsupported extension.
    pub unsupported: Vec<PathBuf>,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn uploaded(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Uploaded { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Unchanged { .. }))
    }

    pub fn would_upload(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::WouldUpload { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    /// Outcome recorded for `path`, if it was processed.
    pub fn outcome(&self, path: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.path() == path)
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}
