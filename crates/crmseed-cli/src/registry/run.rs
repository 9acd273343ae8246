use std::fs::create_dir_all;
use std::path::PathBuf;
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crmseed_core::ColumnConventions;
use crmseed_generate::{GenerationReport, PopulateOutcome};

use super::RegistryResult;
use crate::workspace::write_json_atomic;

/// Metadata captured when a `generate` run starts.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub runs_dir: PathBuf,
    pub db_path: PathBuf,
    pub tables: Vec<String>,
    pub rows: usize,
    pub seed: Option<u64>,
    pub dry_run: bool,
    pub out_dir: Option<PathBuf>,
    pub conventions: ColumnConventions,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig<'a> {
    pub run_id: &'a str,
    pub started_at: String,
    pub cli_version: &'static str,
    pub db_path: String,
    pub tables: &'a [String],
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
    pub conventions: &'a ColumnConventions,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub report_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Inserted,
    AllSkipped,
    NothingGenerated,
    Previewed,
    Failed,
}

/// Per-table entry of `generation_report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct TableRun {
    pub table: String,
    pub status: TableStatus,
    pub generated: u64,
    pub inserted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<GenerationReport>,
}

impl TableRun {
    fn empty(table: &str, status: TableStatus) -> Self {
        Self {
            table: table.to_string(),
            status,
            generated: 0,
            inserted: 0,
            diagnostic: None,
            csv_path: None,
            error: None,
            report: None,
        }
    }

    pub fn from_outcome(table: &str, outcome: PopulateOutcome) -> Self {
        match outcome {
            PopulateOutcome::NothingGenerated => Self::empty(table, TableStatus::NothingGenerated),
            PopulateOutcome::Inserted {
                generated,
                inserted,
                report,
            } => Self {
                generated,
                inserted,
                report: Some(report),
                ..Self::empty(table, TableStatus::Inserted)
            },
            PopulateOutcome::AllSkipped {
                generated,
                diagnostic,
                report,
            } => Self {
                generated,
                diagnostic,
                report: Some(report),
                ..Self::empty(table, TableStatus::AllSkipped)
            },
        }
    }

    pub fn previewed(table: &str, csv_path: PathBuf, report: GenerationReport) -> Self {
        Self {
            generated: report.rows_generated,
            csv_path: Some(csv_path.display().to_string()),
            report: Some(report),
            ..Self::empty(table, TableStatus::Previewed)
        }
    }

    pub fn nothing_generated(table: &str) -> Self {
        Self::empty(table, TableStatus::NothingGenerated)
    }

    pub fn failed(table: &str, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::empty(table, TableStatus::Failed)
        }
    }
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    run_id: &'a str,
    started_at: String,
    finished_at: String,
    duration_ms: u64,
    rows_inserted: u64,
    tables: &'a [TableRun],
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.runs_dir.join(format!("{timestamp}__run_{}", ctx.run_id));
    create_dir_all(&root)?;

    let paths = RunPaths {
        config_path: root.join("config.json"),
        report_path: root.join("generation_report.json"),
        root,
    };

    let config = RunConfig {
        run_id: &ctx.run_id,
        started_at: ctx.started_at.to_rfc3339(),
        cli_version: env!("CARGO_PKG_VERSION"),
        db_path: ctx.db_path.display().to_string(),
        tables: &ctx.tables,
        rows: ctx.rows,
        seed: ctx.seed,
        dry_run: ctx.dry_run,
        out_dir: ctx.out_dir.as_ref().map(|dir| dir.display().to_string()),
        conventions: &ctx.conventions,
        git: collect_git_info(),
    };
    write_json_atomic(&paths.config_path, &config)?;

    Ok(paths)
}

pub fn write_report(
    paths: &RunPaths,
    ctx: &RunContext,
    tables: &[TableRun],
    duration_ms: u64,
) -> RegistryResult<()> {
    let report = RunReport {
        run_id: &ctx.run_id,
        started_at: ctx.started_at.to_rfc3339(),
        finished_at: Utc::now().to_rfc3339(),
        duration_ms,
        rows_inserted: tables.iter().map(|table| table.inserted).sum(),
        tables,
    };
    write_json_atomic(&paths.report_path, &report)?;
    Ok(())
}

fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}
