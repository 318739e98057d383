//! Manifest-backed [`LinkResolver`].
//!
//! Assets resolve to the URL the platform assigned on upload, so this
//! resolver must only be used once the asset phase is finished. Pages,
//! stylesheets and scripts resolve to their deterministic layout URL.

use std::path::Path;

use wikisync_core::{FileCategory, Manifest, SiteLayout};
use wikisync_rewriter::LinkResolver;

pub struct ManifestResolver<'a> {
    manifest: &'a Manifest,
    layout: &'a SiteLayout,
}

impl<'a> ManifestResolver<'a> {
    pub fn new(manifest: &'a Manifest, layout: &'a SiteLayout) -> Self {
        Self { manifest, layout }
    }
}

impl LinkResolver for ManifestResolver<'_> {
    fn resolve(&self, local_path: &str) -> Option<String> {
        match FileCategory::from_path(Path::new(local_path)) {
            FileCategory::Asset => self.manifest.asset_url(local_path).map(str::to_owned),
            category @ (FileCategory::Markup | FileCategory::Stylesheet | FileCategory::Script) => {
                self.layout.link_url(local_path, category)
            }
            FileCategory::Unsupported => None,
        }
    }
}
