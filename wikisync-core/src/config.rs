//! Run configuration.
//!
//! Values are layered: command-line overrides win over the optional YAML
//! config file, which wins over built-in defaults. Team, source directory
//! and build directory have no default; leaving any of them out is a
//! [`ConfigError`].

use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::manifest::DEFAULT_MANIFEST_FILE;
use crate::site::SiteLayout;

/// Config file picked up from the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "wikisync.yml";

/// Cookie jar location, relative to the working directory.
pub const DEFAULT_COOKIE_FILE: &str = "igemwiki-upload.cookies";

/// Optional settings, as read from `wikisync.yml` or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub team: Option<String>,
    pub year: Option<u16>,
    pub src_dir: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub cookies: Option<PathBuf>,
}

impl ConfigFile {
    /// Parse a config file. A missing file is an error here; callers decide
    /// whether the file was optional.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fields set in `overrides` replace the ones in `self`.
    pub fn merge(self, overrides: ConfigFile) -> ConfigFile {
        ConfigFile {
            team: overrides.team.or(self.team),
            year: overrides.year.or(self.year),
            src_dir: overrides.src_dir.or(self.src_dir),
            build_dir: overrides.build_dir.or(self.build_dir),
            manifest: overrides.manifest.or(self.manifest),
            cookies: overrides.cookies.or(self.cookies),
        }
    }

    /// Fill in defaults and check that the required values are present.
    ///
    /// Only presence is checked here; [`SyncConfig::validate`] looks at the
    /// filesystem.
    pub fn resolve(self) -> Result<SyncConfig, ConfigError> {
        let team = self
            .team
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingTeam)?;
        let src_dir = self.src_dir.ok_or(ConfigError::MissingSourceDir)?;
        let build_dir = self.build_dir.ok_or(ConfigError::MissingBuildDir)?;
        Ok(SyncConfig {
            team,
            year: self.year.unwrap_or_else(current_year),
            src_dir,
            build_dir,
            manifest_path: self
                .manifest
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_FILE)),
            cookie_path: self
                .cookies
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIE_FILE)),
        })
    }
}

/// Fully resolved configuration for one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub team: String,
    pub year: u16,
    pub src_dir: PathBuf,
    pub build_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub cookie_path: PathBuf,
}

impl SyncConfig {
    pub fn layout(&self) -> SiteLayout {
        SiteLayout::new(&self.team, self.year)
    }

    /// Check the directories before anything touches the disk.
    ///
    /// The build directory is deleted at the start of every run, so it must
    /// not be the source directory or one of its ancestors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.src_dir.is_dir() {
            return Err(ConfigError::SourceNotFound {
                path: self.src_dir.clone(),
            });
        }
        let src = absolute(&self.src_dir);
        let build = absolute(&self.build_dir);
        if src.starts_with(&build) {
            return Err(ConfigError::BuildContainsSource { build, src });
        }
        Ok(())
    }
}

fn current_year() -> u16 {
    u16::try_from(chrono::Utc::now().year()).unwrap_or(u16::MAX)
}

/// Best-effort absolute path: canonical when the path exists, otherwise
/// joined onto the current directory.
fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    })
}
