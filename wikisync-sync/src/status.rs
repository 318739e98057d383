//! Offline comparison of the source tree with the manifest.
//!
//! Nothing is uploaded or written. Assets are compared by source hash. Code
//! files are rewritten in memory against the stored asset URLs and compared
//! by output hash and target URL, the same check a sync makes.

use std::collections::BTreeSet;

use wikisync_core::{manifest, FileCategory, Manifest, SiteLayout, SourceFile, SyncConfig};

use crate::classifier::classify;
use crate::error::SyncError;
use crate::hash::hash_bytes;
use crate::pages::{is_current, render, target_url};
use crate::pipeline::retarget;

/// Sync state of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileState {
    /// Not in the manifest yet (or never successfully uploaded).
    New,
    /// Differs from the last upload.
    Changed,
    /// Identical to the last upload.
    Unchanged,
    /// Manifest entry without a source file.
    Orphan,
}

impl FileState {
    pub fn key(self) -> &'static str {
        match self {
            FileState::New => "new",
            FileState::Changed => "changed",
            FileState::Unchanged => "unchanged",
            FileState::Orphan => "orphan",
        }
    }

    /// Whether the next sync will upload this path.
    pub fn needs_sync(self) -> bool {
        matches!(self, FileState::New | FileState::Changed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub path: String,
    pub category: FileCategory,
    pub state: FileState,
}

/// Compare `config.src_dir` with the manifest at `config.manifest_path`.
///
/// Entries come back assets first, then markup, stylesheets and scripts,
/// each sorted by path; orphans follow the live files of their section.
pub fn inspect(config: &SyncConfig) -> Result<Vec<FileStatus>, SyncError> {
    config.validate()?;
    let mut stored = manifest::load_or_default(&config.manifest_path)?;
    retarget(&mut stored, config);
    let layout = config.layout();
    // classify() adds placeholders; keep the stored copy for comparison.
    let mut scratch = stored.clone();
    let classified = classify(&config.src_dir, &config.build_dir, &layout, &mut scratch)?;

    let mut statuses = Vec::new();

    for file in &classified.assets {
        let state = match std::fs::read(&file.src_path) {
            Ok(bytes) => match stored.assets.get(&file.rel_path) {
                Some(entry) if entry.remote_url.is_empty() => FileState::New,
                Some(entry) if entry.content_hash == hash_bytes(&bytes) => FileState::Unchanged,
                Some(_) => FileState::Changed,
                None => FileState::New,
            },
            Err(e) => {
                tracing::warn!("couldn't read {}: {e}", file.src_path.display());
                FileState::Changed
            }
        };
        statuses.push(FileStatus {
            path: file.rel_path.clone(),
            category: FileCategory::Asset,
            state,
        });
    }
    let live: BTreeSet<&str> = classified.assets.iter().map(|f| f.rel_path.as_str()).collect();
    push_orphans(&mut statuses, stored.assets.keys(), &live, FileCategory::Asset);

    for (files, category) in [
        (&classified.pages, FileCategory::Markup),
        (&classified.stylesheets, FileCategory::Stylesheet),
        (&classified.scripts, FileCategory::Script),
    ] {
        for file in files {
            statuses.push(FileStatus {
                path: file.rel_path.clone(),
                category,
                state: code_state(&stored, &layout, file),
            });
        }
        let live: BTreeSet<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        if let Some(section) = stored.pages(category) {
            push_orphans(&mut statuses, section.keys(), &live, category);
        }
    }

    Ok(statuses)
}

fn code_state(stored: &Manifest, layout: &SiteLayout, file: &SourceFile) -> FileState {
    let committed = stored
        .pages(file.category)
        .and_then(|section| section.get(&file.rel_path))
        .is_some_and(|entry| !entry.content_hash.is_empty());
    if !committed {
        return FileState::New;
    }
    let source = match std::fs::read_to_string(&file.src_path) {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!("couldn't read {}: {e}", file.src_path.display());
            return FileState::Changed;
        }
    };
    let output = render(file, source, stored, layout);
    let hash = hash_bytes(output.as_bytes());
    if is_current(stored, file, &hash, &target_url(file, layout)) {
        FileState::Unchanged
    } else {
        FileState::Changed
    }
}

fn push_orphans<'a>(
    out: &mut Vec<FileStatus>,
    keys: impl Iterator<Item = &'a String>,
    live: &BTreeSet<&str>,
    category: FileCategory,
) {
    out.extend(
        keys.filter(|key| !live.contains(key.as_str()))
            .map(|key| FileStatus {
                path: key.clone(),
                category,
                state: FileState::Orphan,
            }),
    );
}
