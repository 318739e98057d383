//! Page phase: rewrite → hash → write build output → upload.
//!
//! ## Per-file protocol
//!
//! 1. Read the source text (failure: skip this file).
//! 2. Rewrite relative references with the category's rewriter.
//! 3. Normalise line endings and hash the rewritten output.
//! 4. Compare hash and target URL with the manifest → skip if both match.
//! 5. Write the output under the build directory (failure: skip).
//! 6. Upload to the file's link URL (failure: skip, hash untouched).
//! 7. Commit the new hash to the manifest.
//!
//! The hash is committed only after a confirmed upload, so a failed upload
//! is retried on the next run instead of being mistaken for up to date.

use std::borrow::Cow;
use std::path::Path;

use wikisync_core::{Manifest, PageEntry, RemoteSite, SiteLayout, SourceFile};
use wikisync_rewriter::{rewriter_for, LinkContext};

use crate::hash::{hash_bytes, normalize_newlines};
use crate::report::{FileOutcome, SkipReason};
use crate::resolver::ManifestResolver;

/// Process every code file. Never fails as a whole; per-file problems come
/// back as [`FileOutcome::Skipped`].
pub fn sync_pages<'f>(
    files: impl IntoIterator<Item = &'f SourceFile>,
    manifest: &mut Manifest,
    layout: &SiteLayout,
    mut remote: Option<&mut (dyn RemoteSite + '_)>,
) -> Vec<FileOutcome> {
    files
        .into_iter()
        .map(|file| sync_page(file, manifest, layout, remote.as_deref_mut()))
        .collect()
}

fn sync_page(
    file: &SourceFile,
    manifest: &mut Manifest,
    layout: &SiteLayout,
    remote: Option<&mut (dyn RemoteSite + '_)>,
) -> FileOutcome {
    let skipped = |reason: SkipReason| FileOutcome::Skipped {
        path: file.rel_path.clone(),
        category: file.category,
        reason,
    };

    // Step 1: read.
    let source = match std::fs::read_to_string(&file.src_path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("couldn't open/read {}; skipping: {e}", file.rel_path);
            return skipped(SkipReason::Read(e.to_string()));
        }
    };

    // Steps 2-4: rewrite, hash, compare.
    let output = render(file, source, manifest, layout);
    let hash = hash_bytes(output.as_bytes());
    let url = target_url(file, layout);
    if is_current(manifest, file, &hash, &url) {
        tracing::info!("{} is already up to date", file.rel_path);
        return FileOutcome::Unchanged {
            path: file.rel_path.clone(),
            category: file.category,
        };
    }

    // Step 5: build output.
    if let Err(e) = write_build(&file.build_path, &output) {
        tracing::error!("couldn't write {}; skipping: {e}", file.build_path.display());
        return skipped(SkipReason::Write(e.to_string()));
    }

    // Step 6: upload.
    let Some(remote) = remote else {
        tracing::info!("[dry-run] would upload {} to {url}", file.rel_path);
        return FileOutcome::WouldUpload {
            path: file.rel_path.clone(),
            category: file.category,
        };
    };
    if let Err(e) = remote.upload_page(&output, &url) {
        tracing::error!("couldn't upload {}; it will be retried next run: {e}", file.rel_path);
        return skipped(SkipReason::Upload(e.to_string()));
    }
    tracing::info!("uploaded {} to {url}", file.rel_path);

    // Step 7: commit.
    if let Some(section) = manifest.pages_mut(file.category) {
        let entry = section
            .entry(file.rel_path.clone())
            .or_insert_with(|| PageEntry::placeholder(url.clone()));
        entry.content_hash = hash;
        entry.remote_url = url.clone();
    }
    FileOutcome::Uploaded {
        path: file.rel_path.clone(),
        category: file.category,
        url,
    }
}

/// Rewritten output of a code file with LF line endings. Asset URLs come
/// from `manifest`, so call this after the asset phase.
pub(crate) fn render(
    file: &SourceFile,
    source: String,
    manifest: &Manifest,
    layout: &SiteLayout,
) -> String {
    let rewritten = match rewriter_for(file.category) {
        Some(rewriter) => {
            let resolver = ManifestResolver::new(manifest, layout);
            rewriter.rewrite(&source, &LinkContext::new(&file.rel_path, &resolver))
        }
        None => source,
    };
    if let Cow::Owned(normalized) = normalize_newlines(&rewritten) {
        return normalized;
    }
    rewritten
}

/// Page URL the file uploads to.
pub(crate) fn target_url(file: &SourceFile, layout: &SiteLayout) -> String {
    match &file.remote_url {
        Some(url) => url.clone(),
        None => layout
            .link_url(&file.rel_path, file.category)
            .unwrap_or_default(),
    }
}

/// `true` when the manifest records an upload of exactly this output to
/// exactly this URL.
pub(crate) fn is_current(manifest: &Manifest, file: &SourceFile, hash: &str, url: &str) -> bool {
    manifest
        .pages(file.category)
        .and_then(|section| section.get(&file.rel_path))
        .is_some_and(|entry| entry.content_hash == hash && entry.remote_url == url)
}

fn write_build(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use wikisync_core::FileCategory;

    fn page(dir: &TempDir, rel: &str, build: PathBuf) -> SourceFile {
        let layout = SiteLayout::new("Example", 2020);
        let mut file = SourceFile::new(rel, dir.path().join(rel), build, FileCategory::Markup);
        file.remote_url = layout.link_url(rel, FileCategory::Markup);
        file
    }

    #[test]
    fn unreadable_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let file = page(&dir, "gone.html", dir.path().join("build/gone.html"));
        let mut manifest = Manifest::default();

        let outcomes = sync_pages([&file], &mut manifest, &SiteLayout::new("Example", 2020), None);

        assert!(matches!(
            outcomes[0],
            FileOutcome::Skipped {
                reason: SkipReason::Read(_),
                ..
            }
        ));
    }

    #[test]
    fn unwritable_build_path_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<p/>").unwrap();
        // A file where the build directory should be.
        fs::write(dir.path().join("blocked"), "").unwrap();
        let file = page(&dir, "index.html", dir.path().join("blocked/index.html"));
        let mut manifest = Manifest::default();

        let outcomes = sync_pages([&file], &mut manifest, &SiteLayout::new("Example", 2020), None);

        assert!(matches!(
            outcomes[0],
            FileOutcome::Skipped {
                reason: SkipReason::Write(_),
                ..
            }
        ));
    }

    #[test]
    fn same_output_at_a_new_url_is_not_current() {
        let dir = TempDir::new().unwrap();
        let file = page(&dir, "index.html", dir.path().join("build/index.html"));
        let mut manifest = Manifest::default();
        manifest.html.insert(
            "index.html".into(),
            PageEntry {
                content_hash: "h".into(),
                remote_url: "https://2019.igem.org/Team:Example".into(),
            },
        );

        assert!(is_current(&manifest, &file, "h", "https://2019.igem.org/Team:Example"));
        assert!(!is_current(&manifest, &file, "h", "https://2020.igem.org/Team:Example"));
        assert!(!is_current(&manifest, &file, "other", "https://2019.igem.org/Team:Example"));
    }

    #[test]
    fn dry_run_writes_output_but_commits_no_hash() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "a\r\nb\r\n").unwrap();
        let build = dir.path().join("build/index.html");
        let file = page(&dir, "index.html", build.clone());
        let mut manifest = Manifest::default();

        let outcomes = sync_pages([&file], &mut manifest, &SiteLayout::new("Example", 2020), None);

        assert!(matches!(outcomes[0], FileOutcome::WouldUpload { .. }));
        assert_eq!(fs::read_to_string(build).unwrap(), "a\nb\n");
        assert!(manifest.html.is_empty());
    }
}
