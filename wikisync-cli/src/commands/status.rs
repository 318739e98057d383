//! `wikisync status` — what the next sync would touch.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use wikisync_core::FileCategory;
use wikisync_sync::{inspect, FileState, FileStatus};

use super::ConfigArgs;

/// Arguments for `wikisync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.resolve()?;
        let statuses = inspect(&config)
            .with_context(|| format!("status check failed for team '{}'", config.team))?;

        if self.json {
            return print_json(&config.team, &statuses);
        }
        print_table(&config.team, &statuses);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusReportJson<'a> {
    team: &'a str,
    summary: StatusSummaryJson,
    files: Vec<FileStatusJson<'a>>,
}

#[derive(Serialize)]
struct StatusSummaryJson {
    files: usize,
    pending: usize,
    orphans: usize,
}

#[derive(Serialize)]
struct FileStatusJson<'a> {
    path: &'a str,
    category: FileCategory,
    status: &'static str,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "file")]
    path: String,
    #[tabled(rename = "type")]
    category: String,
    #[tabled(rename = "status")]
    status: String,
}

fn print_json(team: &str, statuses: &[FileStatus]) -> Result<()> {
    let payload = StatusReportJson {
        team,
        summary: summary(statuses),
        files: statuses
            .iter()
            .map(|s| FileStatusJson {
                path: &s.path,
                category: s.category,
                status: s.state.key(),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn summary(statuses: &[FileStatus]) -> StatusSummaryJson {
    StatusSummaryJson {
        files: statuses
            .iter()
            .filter(|s| s.state != FileState::Orphan)
            .count(),
        pending: statuses.iter().filter(|s| s.state.needs_sync()).count(),
        orphans: statuses
            .iter()
            .filter(|s| s.state == FileState::Orphan)
            .count(),
    }
}

fn print_table(team: &str, statuses: &[FileStatus]) {
    let counts = summary(statuses);
    println!(
        "wikisync v{} | {team} | {} files | {} pending | {} orphaned",
        env!("CARGO_PKG_VERSION"),
        counts.files,
        counts.pending,
        counts.orphans,
    );

    if statuses.is_empty() {
        println!("No source files found.");
        return;
    }

    let rows: Vec<StatusTableRow> = statuses
        .iter()
        .map(|s| StatusTableRow {
            path: s.path.clone(),
            category: s.category.to_string(),
            status: state_label(s.state),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if counts.orphans > 0 {
        println!("Orphaned entries have no source file; remove them from the upload map if they are gone for good.");
    }
    if counts.pending > 0 {
        println!("Run 'wikisync sync' to upload pending files.");
    }
}

fn state_label(state: FileState) -> String {
    let label = state.key().to_uppercase();
    match state {
        FileState::New => label.green().bold().to_string(),
        FileState::Changed => label.yellow().bold().to_string(),
        FileState::Unchanged => label.bright_black().to_string(),
        FileState::Orphan => label.magenta().bold().to_string(),
    }
}
