//! Sync orchestration: the only entry point the CLI calls.
//!
//! 1. Validate configuration.
//! 2. Load the manifest (fails soft, except for a malformed section) and
//!    drop its entries if they were recorded for another team or year.
//! 3. Recreate the build directory.
//! 4. Log in (live runs only).
//! 5. Classify the source tree.
//! 6. Upload assets.
//! 7. Checkpoint the manifest.
//! 8. Rewrite and upload html, css, js.
//! 9. Save the manifest.
//!
//! Any fatal error after step 2 checkpoints the manifest before it is
//! returned, so work already done is never lost.

use std::path::Path;

use wikisync_core::{manifest, Credentials, Manifest, RemoteSite, SyncConfig};

use crate::assets::upload_assets;
use crate::classifier::classify;
use crate::error::{io_err, SyncError};
use crate::pages::sync_pages;
use crate::report::SyncReport;

/// How a run talks to the remote site.
pub enum Session<'a> {
    /// Log in and upload for real; the manifest is persisted.
    Live {
        remote: &'a mut dyn RemoteSite,
        credentials: &'a Credentials,
    },
    /// Rewrite into the build directory only. No network access and no
    /// manifest writes.
    DryRun,
}

impl Session<'_> {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Session::DryRun)
    }
}

/// Run a full sync.
pub fn run(config: &SyncConfig, session: Session<'_>) -> Result<SyncReport, SyncError> {
    config.validate()?;
    let mut manifest = manifest::load_or_default(&config.manifest_path)?;
    retarget(&mut manifest, config);
    let persist = !session.is_dry_run();

    match sync(config, &mut manifest, session) {
        Ok(report) => {
            if persist {
                checkpoint(&config.manifest_path, &manifest);
            }
            tracing::info!(
                "sync finished: {} uploaded, {} unchanged, {} would upload, {} skipped",
                report.uploaded(),
                report.unchanged(),
                report.would_upload(),
                report.skipped()
            );
            Ok(report)
        }
        Err(e) => {
            if persist {
                checkpoint(&config.manifest_path, &manifest);
            }
            Err(e)
        }
    }
}

fn sync(
    config: &SyncConfig,
    manifest: &mut Manifest,
    session: Session<'_>,
) -> Result<SyncReport, SyncError> {
    let layout = config.layout();
    let dry_run = session.is_dry_run();

    recreate_dir(&config.build_dir)?;

    let mut remote = match session {
        Session::Live {
            remote,
            credentials,
        } => {
            remote.login(credentials).map_err(SyncError::Auth)?;
            tracing::info!("logged in as {}", credentials.username);
            Some(remote)
        }
        Session::DryRun => None,
    };

    let mut classified = classify(&config.src_dir, &config.build_dir, &layout, manifest)?;

    let mut outcomes = upload_assets(
        &mut classified.assets,
        manifest,
        &layout,
        remote.as_deref_mut(),
    )?;

    // Pages reference asset URLs; keep them even if a page phase crash
    // follows.
    if !dry_run {
        checkpoint(&config.manifest_path, manifest);
    }

    outcomes.extend(sync_pages(
        classified.code_files(),
        manifest,
        &layout,
        remote.as_deref_mut(),
    ));

    Ok(SyncReport {
        outcomes,
        unsupported: classified.unsupported,
        dry_run,
    })
}

/// Point `manifest` at the configured wiki, logging when that discards
/// entries recorded for another one.
pub(crate) fn retarget(manifest: &mut Manifest, config: &SyncConfig) {
    let site = config.layout().home_url();
    if manifest.retarget(&site) {
        tracing::warn!(
            "{} was recorded for another wiki; everything will be uploaded to {site} again",
            config.manifest_path.display()
        );
    }
}

/// Best-effort manifest write. Failures are logged; the in-memory manifest
/// stays authoritative and the next checkpoint tries again.
pub fn checkpoint(path: &Path, manifest: &Manifest) -> bool {
    match manifest::save_at(path, manifest) {
        Ok(()) => {
            tracing::debug!("saved manifest to {}", path.display());
            true
        }
        Err(e) => {
            tracing::error!("tried to write {} but couldn't: {e}", path.display());
            false
        }
    }
}

fn recreate_dir(dir: &Path) -> Result<(), SyncError> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))
}
