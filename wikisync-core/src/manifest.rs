//! Upload manifest: the durable map of local path → content hash + remote URL.
//!
//! # Storage layout
//!
//! ```text
//! upload_map.yml
//!   assets: { <path>: { content_hash, remote_filename, remote_url } }
//!   css:    { <path>: { content_hash, remote_url } }
//!   html:   { <path>: { content_hash, remote_url } }
//!   js:     { <path>: { content_hash, remote_url } }
//!   site:   <team home URL the entries were uploaded for>
//!   <any other key is carried through untouched>
//! ```
//!
//! Loading fails soft: a missing or unparsable file yields
//! [`ManifestLoad::Absent`] / [`ManifestLoad::Corrupt`], which
//! [`load_or_default`] collapses to an empty manifest. The one hard failure
//! is a required section that is present but not a mapping.
//!
//! Writes serialize with sorted keys into `<path>.tmp` and rename over the
//! target, so a crash never leaves a half-written manifest behind.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_yaml::Value;

use crate::error::{io_err, ManifestError};
use crate::types::{AssetEntry, FileCategory, PageEntry};

/// Default manifest location, relative to the working directory.
pub const DEFAULT_MANIFEST_FILE: &str = "upload_map.yml";

/// Top-level keys every manifest carries after load.
pub const REQUIRED_SECTIONS: [&str; 4] = ["assets", "html", "css", "js"];

/// Top-level key naming the wiki the entries belong to. Kept in
/// [`Manifest::extra`].
pub const SITE_KEY: &str = "site";

pub type AssetMap = BTreeMap<String, AssetEntry>;
pub type PageMap = BTreeMap<String, PageEntry>;

/// In-memory manifest. Mutated in place during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub assets: AssetMap,
    pub html: PageMap,
    pub css: PageMap,
    pub js: PageMap,
    /// Unknown top-level keys, preserved verbatim across load/save.
    pub extra: BTreeMap<String, Value>,
}

impl Manifest {
    /// Page section for a code category; `None` for assets and unsupported
    /// files.
    pub fn pages(&self, category: FileCategory) -> Option<&PageMap> {
        match category {
            FileCategory::Markup => Some(&self.html),
            FileCategory::Stylesheet => Some(&self.css),
            FileCategory::Script => Some(&self.js),
            FileCategory::Asset | FileCategory::Unsupported => None,
        }
    }

    pub fn pages_mut(&mut self, category: FileCategory) -> Option<&mut PageMap> {
        match category {
            FileCategory::Markup => Some(&mut self.html),
            FileCategory::Stylesheet => Some(&mut self.css),
            FileCategory::Script => Some(&mut self.js),
            FileCategory::Asset | FileCategory::Unsupported => None,
        }
    }

    /// Remote URL recorded for an asset, if it has been uploaded.
    pub fn asset_url(&self, rel_path: &str) -> Option<&str> {
        self.assets
            .get(rel_path)
            .map(|entry| entry.remote_url.as_str())
            .filter(|url| !url.is_empty())
    }

    /// Total number of tracked entries across all four sections.
    pub fn len(&self) -> usize {
        self.assets.len() + self.html.len() + self.css.len() + self.js.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record `site` as the wiki this manifest describes.
    ///
    /// When the manifest was recorded for a different site every entry is
    /// dropped, since none of its hashes or URLs apply there. A manifest
    /// without a site key keeps its entries. Returns whether entries were
    /// dropped.
    pub fn retarget(&mut self, site: &str) -> bool {
        let previous = self
            .extra
            .insert(SITE_KEY.to_string(), Value::String(site.to_string()));
        match previous {
            None => false,
            Some(Value::String(previous)) if previous == site => false,
            Some(_) => {
                let dropped = !self.is_empty();
                self.assets.clear();
                self.html.clear();
                self.css.clear();
                self.js.clear();
                dropped
            }
        }
    }

    fn to_document(&self) -> Result<BTreeMap<String, Value>, serde_yaml::Error> {
        let mut doc = self.extra.clone();
        doc.insert("assets".to_string(), serde_yaml::to_value(&self.assets)?);
        doc.insert("css".to_string(), serde_yaml::to_value(&self.css)?);
        doc.insert("html".to_string(), serde_yaml::to_value(&self.html)?);
        doc.insert("js".to_string(), serde_yaml::to_value(&self.js)?);
        Ok(doc)
    }
}

/// Outcome of reading a manifest file.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestLoad {
    Loaded(Manifest),
    /// No file at the path.
    Absent,
    /// The file exists but could not be read or understood.
    Corrupt(String),
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read the manifest at `path`.
///
/// Returns `Err` only for [`ManifestError::InvalidSection`]; every other
/// problem is reported through [`ManifestLoad`].
pub fn load_at(path: &Path) -> Result<ManifestLoad, ManifestError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ManifestLoad::Absent),
        Err(e) => return Ok(ManifestLoad::Corrupt(e.to_string())),
    };
    let root = match serde_yaml::from_str::<Value>(&contents) {
        Ok(Value::Mapping(root)) => root,
        Ok(_) => return Ok(ManifestLoad::Corrupt("top level is not a mapping".into())),
        Err(e) => return Ok(ManifestLoad::Corrupt(e.to_string())),
    };

    let mut manifest = Manifest::default();
    for (key, value) in root {
        let Some(key) = key.as_str().map(str::to_owned) else {
            return Ok(ManifestLoad::Corrupt("top-level key is not a string".into()));
        };
        let parsed = match key.as_str() {
            "assets" => section(path, &key, value)?.map(|m| manifest.assets = m),
            "html" => section(path, &key, value)?.map(|m| manifest.html = m),
            "css" => section(path, &key, value)?.map(|m| manifest.css = m),
            "js" => section(path, &key, value)?.map(|m| manifest.js = m),
            _ => {
                manifest.extra.insert(key, value);
                Ok(())
            }
        };
        if let Err(reason) = parsed {
            return Ok(ManifestLoad::Corrupt(reason));
        }
    }
    Ok(ManifestLoad::Loaded(manifest))
}

/// Decode one required section. The outer `Result` is the fatal structural
/// check; the inner one is a soft entry-level parse failure.
fn section<T: DeserializeOwned>(
    path: &Path,
    key: &str,
    value: Value,
) -> Result<Result<BTreeMap<String, T>, String>, ManifestError> {
    if !value.is_mapping() {
        return Err(ManifestError::InvalidSection {
            path: path.to_path_buf(),
            key: key.to_string(),
        });
    }
    Ok(serde_yaml::from_value(value).map_err(|e| format!("malformed entry under `{key}`: {e}")))
}

/// Load the manifest, falling back to an empty one when the file is absent
/// or unreadable.
pub fn load_or_default(path: &Path) -> Result<Manifest, ManifestError> {
    match load_at(path)? {
        ManifestLoad::Loaded(manifest) => {
            tracing::debug!("loaded {} manifest entries from {}", manifest.len(), path.display());
            Ok(manifest)
        }
        ManifestLoad::Absent => {
            tracing::info!("no manifest at {}; starting fresh", path.display());
            Ok(Manifest::default())
        }
        ManifestLoad::Corrupt(reason) => {
            tracing::warn!(
                "ignoring unreadable manifest at {} ({reason}); starting fresh",
                path.display()
            );
            Ok(Manifest::default())
        }
    }
}

// ---------------------------------------------------------------------------
// Save (atomic)
// ---------------------------------------------------------------------------

/// Write the whole manifest to `path`.
///
/// Write flow: serialize (sorted keys) → `<path>.tmp` → `rename`.
pub fn save_at(path: &Path, manifest: &Manifest) -> Result<(), ManifestError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let yaml = serde_yaml::to_string(&manifest.to_document()?)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
