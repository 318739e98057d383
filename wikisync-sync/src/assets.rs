//! Asset phase: hash-gated upload of binary files.
//!
//! Runs before any page is rewritten, because pages link to the URLs the
//! platform assigns here. The manifest entry for an asset is touched only
//! after its upload succeeded, so an abort leaves the failing asset's prior
//! entry (if any) exactly as it was.

use wikisync_core::{AssetUpload, FileCategory, Manifest, RemoteSite, SiteLayout, SourceFile};

use crate::error::SyncError;
use crate::hash::hash_bytes;
use crate::report::{FileOutcome, SkipReason};

/// Upload every asset whose content hash differs from the manifest.
///
/// `remote` is `None` for a dry run. Fills in `content_hash` and
/// `remote_url` on each record it resolves. The first failed upload returns
/// [`SyncError::AssetUpload`]; the caller checkpoints and aborts.
pub fn upload_assets(
    assets: &mut [SourceFile],
    manifest: &mut Manifest,
    layout: &SiteLayout,
    mut remote: Option<&mut (dyn RemoteSite + '_)>,
) -> Result<Vec<FileOutcome>, SyncError> {
    let mut outcomes = Vec::with_capacity(assets.len());

    for file in assets.iter_mut() {
        let bytes = match std::fs::read(&file.src_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("couldn't read {}; skipping: {e}", file.src_path.display());
                outcomes.push(skipped(file, SkipReason::Read(e.to_string())));
                continue;
            }
        };
        let hash = hash_bytes(&bytes);
        file.content_hash = Some(hash.clone());

        if let Some(entry) = manifest.assets.get(&file.rel_path) {
            if entry.content_hash == hash && !entry.remote_url.is_empty() {
                tracing::info!("{} is already up to date", file.rel_path);
                file.remote_url = Some(entry.remote_url.clone());
                outcomes.push(FileOutcome::Unchanged {
                    path: file.rel_path.clone(),
                    category: FileCategory::Asset,
                });
                continue;
            }
        }

        let Some(remote) = remote.as_deref_mut() else {
            tracing::info!("[dry-run] would upload {}", file.rel_path);
            outcomes.push(FileOutcome::WouldUpload {
                path: file.rel_path.clone(),
                category: FileCategory::Asset,
            });
            continue;
        };

        let filename = layout.asset_filename(&file.rel_path);
        let upload = AssetUpload {
            rel_path: &file.rel_path,
            filename: &filename,
            content_hash: &hash,
            bytes: &bytes,
        };
        let uploaded = remote
            .upload_file(&upload)
            .map_err(|source| SyncError::AssetUpload {
                path: file.rel_path.clone(),
                source,
            })?;
        tracing::info!("uploaded {} as {}", file.rel_path, uploaded.filename);

        let entry = manifest.assets.entry(file.rel_path.clone()).or_default();
        entry.content_hash = hash;
        entry.remote_url = uploaded.url.clone();
        entry.remote_filename = uploaded.filename;

        file.remote_url = Some(uploaded.url.clone());
        outcomes.push(FileOutcome::Uploaded {
            path: file.rel_path.clone(),
            category: FileCategory::Asset,
            url: uploaded.url,
        });
    }

    Ok(outcomes)
}

fn skipped(file: &SourceFile, reason: SkipReason) -> FileOutcome {
    FileOutcome::Skipped {
        path: file.rel_path.clone(),
        category: file.category,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use wikisync_core::{AssetEntry, Credentials, RemoteError, UploadedFile};

    #[derive(Default)]
    struct CountingRemote {
        uploads: usize,
    }

    impl RemoteSite for CountingRemote {
        fn login(&mut self, _: &Credentials) -> Result<(), RemoteError> {
            Ok(())
        }

        fn upload_file(&mut self, file: &AssetUpload<'_>) -> Result<UploadedFile, RemoteError> {
            self.uploads += 1;
            Ok(UploadedFile {
                url: format!("https://remote/{}", file.filename),
                filename: format!("Renamed-{}", file.filename),
            })
        }

        fn upload_page(&mut self, _: &str, _: &str) -> Result<(), RemoteError> {
            Ok(())
        }
    }

    fn asset(dir: &TempDir, rel: &str, bytes: Option<&[u8]>) -> SourceFile {
        let src = dir.path().join(rel);
        if let Some(bytes) = bytes {
            std::fs::write(&src, bytes).unwrap();
        }
        SourceFile::new(rel, src, PathBuf::from("build").join(rel), FileCategory::Asset)
    }

    #[test]
    fn platform_filename_and_url_are_recorded() {
        let dir = TempDir::new().unwrap();
        let mut files = vec![asset(&dir, "logo.png", Some(b"png"))];
        let mut manifest = Manifest::default();
        let mut remote = CountingRemote::default();

        upload_assets(
            &mut files,
            &mut manifest,
            &SiteLayout::new("Example", 2020),
            Some(&mut remote),
        )
        .unwrap();

        let entry = &manifest.assets["logo.png"];
        assert_eq!(entry.remote_filename, "Renamed-T--Example--logo.png");
        assert_eq!(entry.remote_url, "https://remote/T--Example--logo.png");
        assert_eq!(entry.content_hash, hash_bytes(b"png"));
        assert_eq!(files[0].remote_url.as_deref(), Some(entry.remote_url.as_str()));
    }

    #[test]
    fn same_hash_with_empty_url_is_uploaded_again() {
        let dir = TempDir::new().unwrap();
        let mut files = vec![asset(&dir, "logo.png", Some(b"png"))];
        let mut manifest = Manifest::default();
        manifest.assets.insert(
            "logo.png".into(),
            AssetEntry {
                content_hash: hash_bytes(b"png"),
                ..AssetEntry::default()
            },
        );
        let mut remote = CountingRemote::default();

        let outcomes = upload_assets(
            &mut files,
            &mut manifest,
            &SiteLayout::new("Example", 2020),
            Some(&mut remote),
        )
        .unwrap();

        assert_eq!(remote.uploads, 1);
        assert!(matches!(outcomes[0], FileOutcome::Uploaded { .. }));
    }

    #[test]
    fn unreadable_asset_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut files = vec![
            asset(&dir, "missing.png", None),
            asset(&dir, "ok.png", Some(b"ok")),
        ];
        let mut manifest = Manifest::default();
        let mut remote = CountingRemote::default();

        let outcomes = upload_assets(
            &mut files,
            &mut manifest,
            &SiteLayout::new("Example", 2020),
            Some(&mut remote),
        )
        .unwrap();

        assert!(matches!(
            outcomes[0],
            FileOutcome::Skipped {
                reason: SkipReason::Read(_),
                ..
            }
        ));
        assert_eq!(remote.uploads, 1);
        assert!(!manifest.assets.contains_key("missing.png"));
    }
}
