//! Source tree walk and classification.
//!
//! Every file under the source directory becomes a [`SourceFile`] in the
//! bucket matching its extension. Code files also get a placeholder
//! manifest entry on first sight, so a brand-new page always compares as
//! changed.

use std::collections::hash_map::{Entry, HashMap};
use std::path::{Path, PathBuf};

use wikisync_core::{
    types::manifest_key, FileCategory, Manifest, PageEntry, SiteLayout, SourceFile,
};

use crate::error::{io_err, SyncError};

/// Source files grouped by category, each group sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub pages: Vec<SourceFile>,
    pub stylesheets: Vec<SourceFile>,
    pub scripts: Vec<SourceFile>,
    pub assets: Vec<SourceFile>,
    pub unsupported: Vec<PathBuf>,
}

impl Classified {
    /// Markup, then stylesheets, then scripts.
    pub fn code_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.pages
            .iter()
            .chain(&self.stylesheets)
            .chain(&self.scripts)
    }

    /// Code files sharing a remote URL with an earlier file, as
    /// `(earlier, later)` in walk order. Both upload to the same page and
    /// the later one wins.
    pub fn url_collisions(&self) -> Vec<(&SourceFile, &SourceFile)> {
        let mut seen: HashMap<&str, &SourceFile> = HashMap::new();
        let mut collisions = Vec::new();
        for file in self.code_files() {
            let Some(url) = file.remote_url.as_deref() else {
                continue;
            };
            match seen.entry(url) {
                Entry::Occupied(earlier) => collisions.push((*earlier.get(), file)),
                Entry::Vacant(slot) => {
                    slot.insert(file);
                }
            }
        }
        collisions
    }

    fn push(&mut self, file: SourceFile) {
        match file.category {
            FileCategory::Markup => self.pages.push(file),
            FileCategory::Stylesheet => self.stylesheets.push(file),
            FileCategory::Script => self.scripts.push(file),
            FileCategory::Asset => self.assets.push(file),
            FileCategory::Unsupported => self.unsupported.push(file.src_path),
        }
    }
}

/// Walk `src_dir` and classify every file.
///
/// Existing manifest entries are never modified here; unseen code files get
/// a [`PageEntry::placeholder`].
pub fn classify(
    src_dir: &Path,
    build_dir: &Path,
    layout: &SiteLayout,
    manifest: &mut Manifest,
) -> Result<Classified, SyncError> {
    let mut paths = Vec::new();
    collect_files(src_dir, &mut paths)?;
    paths.sort();

    let mut classified = Classified::default();
    for path in paths {
        let rel = path.strip_prefix(src_dir).unwrap_or(path.as_path());
        let key = manifest_key(rel);
        let category = FileCategory::from_path(&path);
        if category == FileCategory::Unsupported {
            tracing::info!("{} has an unsupported file extension; skipping", path.display());
        }

        let mut file = SourceFile::new(key, path.clone(), build_dir.join(rel), category);
        if let Some(url) = layout.link_url(&file.rel_path, category) {
            if let Some(section) = manifest.pages_mut(category) {
                section
                    .entry(file.rel_path.clone())
                    .or_insert_with(|| PageEntry::placeholder(url.clone()));
            }
            file.remote_url = Some(url);
        }
        classified.push(file);
    }

    for (earlier, later) in classified.url_collisions() {
        tracing::warn!(
            "{} and {} both upload to {}; the page will show {}",
            earlier.rel_path,
            later.rel_path,
            later.remote_url.as_deref().unwrap_or_default(),
            later.rel_path
        );
    }

    tracing::debug!(
        "classified {} pages, {} stylesheets, {} scripts, {} assets, {} unsupported",
        classified.pages.len(),
        classified.stylesheets.len(),
        classified.scripts.len(),
        classified.assets.len(),
        classified.unsupported.len()
    );
    Ok(classified)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = std::fs::metadata(&path).map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}
