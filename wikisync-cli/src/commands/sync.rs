//! `wikisync sync` — rewrite, then upload what changed.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use wikisync_core::Credentials;
use wikisync_remote::WikiClient;
use wikisync_sync::{run, FileOutcome, Session, SyncReport};

use super::ConfigArgs;

/// Arguments for `wikisync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Rewrite into the build directory only: no login, no uploads, no
    /// upload map changes.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.resolve()?;

        let report = if self.dry_run {
            run(&config, Session::DryRun)
        } else {
            let credentials = Credentials::from_env()?;
            let mut client = WikiClient::new(&config.layout(), &config.cookie_path);
            run(
                &config,
                Session::Live {
                    remote: &mut client,
                    credentials: &credentials,
                },
            )
        }
        .with_context(|| format!("sync failed for team '{}'", config.team))?;

        print_results(&config.team, &report);
        Ok(())
    }
}

fn print_results(team: &str, report: &SyncReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };

    if report.outcomes.is_empty() {
        println!("{prefix}✓ '{team}' — nothing to do");
        return;
    }

    let sent = report.uploaded() + report.would_upload();
    let verb = if report.dry_run { "to upload" } else { "uploaded" };
    println!(
        "{prefix}✓ '{team}' synced ({sent} {verb}, {} unchanged, {} skipped)",
        report.unchanged(),
        report.skipped()
    );

    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Uploaded { path, url, .. } => {
                println!("  {}  {path} → {url}", "↑".green())
            }
            FileOutcome::WouldUpload { path, .. } => println!("  {}  {path}", "~".yellow()),
            FileOutcome::Unchanged { path, .. } => println!("  {}  {path}", "·".bright_black()),
            FileOutcome::Skipped { path, reason, .. } => {
                println!("  {}  {path}: {reason}", "✗".red())
            }
        }
    }

    if !report.unsupported.is_empty() {
        println!(
            "{} {} file(s) with unsupported extensions were left out",
            "note:".bold(),
            report.unsupported.len()
        );
    }
}
