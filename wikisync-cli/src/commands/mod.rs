pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use wikisync_core::{config::DEFAULT_CONFIG_FILE, ConfigFile, SyncConfig};

/// Options shared by every command. Each one overrides the config file.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Team name as registered with iGEM.
    #[arg(long)]
    pub team: Option<String>,

    /// Competition year (defaults to the current year).
    #[arg(long)]
    pub year: Option<u16>,

    /// Directory holding the wiki sources.
    #[arg(long = "src", value_name = "DIR")]
    pub src_dir: Option<PathBuf>,

    /// Directory for rewritten output. Wiped at the start of every sync.
    #[arg(long = "build", value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Upload map location.
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Cookie jar location.
    #[arg(long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,

    /// YAML config file [default: wikisync.yml, if present].
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    /// Layer command-line values over the config file and resolve defaults.
    pub fn resolve(self) -> Result<SyncConfig> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    ConfigFile::load(&default)
                        .with_context(|| format!("failed to load config {DEFAULT_CONFIG_FILE}"))?
                } else {
                    ConfigFile::default()
                }
            }
        };
        let overrides = ConfigFile {
            team: self.team,
            year: self.year,
            src_dir: self.src_dir,
            build_dir: self.build_dir,
            manifest: self.manifest,
            cookies: self.cookies,
        };
        let config = file.merge(overrides).resolve()?;
        tracing::debug!("resolved configuration: {config:?}");
        Ok(config)
    }
}
