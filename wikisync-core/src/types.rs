//! Domain types shared by every wikisync crate.
//!
//! All path fields use `PathBuf`. Manifest keys are normalized relative path
//! strings with `/` separators, regardless of platform.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// File categories
// ---------------------------------------------------------------------------

/// Extensions uploaded verbatim as wiki files.
pub const ASSET_EXTENSIONS: &[&str] = &[
    "png", "gif", "jpg", "jpeg", "pdf", "ppt", "txt", "zip", "mp3", "mp4", "webm", "mov", "swf",
    "xls", "xlsx", "docx", "pptx", "csv", "m", "ogg", "gb", "tif", "tiff", "fcs", "otf", "eot",
    "ttf", "woff", "svg",
];

/// Role of a source file, decided solely by its lowercased extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Markup,
    Stylesheet,
    Script,
    Asset,
    Unsupported,
}

impl FileCategory {
    /// Classify by extension (without the dot). Case-insensitive.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "html" => FileCategory::Markup,
            "css" => FileCategory::Stylesheet,
            "js" => FileCategory::Script,
            other if ASSET_EXTENSIONS.contains(&other) => FileCategory::Asset,
            _ => FileCategory::Unsupported,
        }
    }

    /// Classify a path. Files without an extension are unsupported.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileCategory::Unsupported)
    }

    /// Markup, stylesheet and script files are rewritten and saved as wiki
    /// pages; assets are uploaded as files.
    pub fn is_code(self) -> bool {
        matches!(
            self,
            FileCategory::Markup | FileCategory::Stylesheet | FileCategory::Script
        )
    }

    /// The manifest section this category is tracked under, if any.
    pub fn section(self) -> Option<&'static str> {
        match self {
            FileCategory::Markup => Some("html"),
            FileCategory::Stylesheet => Some("css"),
            FileCategory::Script => Some("js"),
            FileCategory::Asset => Some("assets"),
            FileCategory::Unsupported => None,
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileCategory::Markup => write!(f, "html"),
            FileCategory::Stylesheet => write!(f, "css"),
            FileCategory::Script => write!(f, "js"),
            FileCategory::Asset => write!(f, "asset"),
            FileCategory::Unsupported => write!(f, "unsupported"),
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest entries
// ---------------------------------------------------------------------------

/// Manifest record for an uploaded asset.
///
/// Fields are declared in alphabetical order so the serialized YAML is
/// sorted without a post-processing step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Hash of the raw file bytes at last successful upload.
    #[serde(default)]
    pub content_hash: String,
    /// Filename the platform assigned, which may differ from the requested one.
    #[serde(default)]
    pub remote_filename: String,
    #[serde(default)]
    pub remote_url: String,
}

/// Manifest record for an html, css or js page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Hash of the *rewritten* output at last successful upload. Empty for a
    /// page that has never been uploaded.
    #[serde(default)]
    pub content_hash: String,
    #[serde(default)]
    pub remote_url: String,
}

impl PageEntry {
    /// Placeholder for a newly discovered page: guaranteed to compare as
    /// changed on first encounter.
    pub fn placeholder(remote_url: impl Into<String>) -> Self {
        Self {
            content_hash: String::new(),
            remote_url: remote_url.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Source file record
// ---------------------------------------------------------------------------

/// One discovered source file. Created by the classifier, discarded at the
/// end of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Normalized relative path (`/`-separated), the manifest key.
    pub rel_path: String,
    /// Absolute (or cwd-relative) path of the source file.
    pub src_path: PathBuf,
    /// Where the rewritten output is written before upload.
    pub build_path: PathBuf,
    pub category: FileCategory,
    /// Link target on the remote site. Known up front for code files; set
    /// by the asset uploader for assets.
    pub remote_url: Option<String>,
    /// Hash of the raw bytes. Assets only, filled in by the uploader.
    pub content_hash: Option<String>,
}

impl SourceFile {
    pub fn new(
        rel_path: impl Into<String>,
        src_path: PathBuf,
        build_path: PathBuf,
        category: FileCategory,
    ) -> Self {
        Self {
            rel_path: rel_path.into(),
            src_path,
            build_path,
            category,
            remote_url: None,
            content_hash: None,
        }
    }
}

/// Normalize a relative path into a manifest key: `/` separators, no
/// leading `./`.
pub fn manifest_key(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
