use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crmseed_generate::{GenerateOptions, GenerationEngine, GenerationError, write_generated_csv};
use crmseed_store::{
    SampleStore, SqliteStore, build_create_table_sql, read_bounds_csv, read_rows_csv,
    read_schema_csv, sanitize_column_name, sanitize_table_name,
};

use crate::registry::{RunContext, TableRun, TableStatus, start_run, write_report};
use crate::workspace::{CliSettings, WorkspacePaths};
use crate::{BoundsArgs, CliError, DefineArgs, GenerateArgs, LoadArgs};

/// Resolved workspace state shared by every subcommand.
#[derive(Debug)]
pub(crate) struct AppContext {
    pub paths: WorkspacePaths,
    pub settings: CliSettings,
    pub db_path: PathBuf,
}

impl AppContext {
    async fn open_store(&self) -> Result<SqliteStore, CliError> {
        Ok(SqliteStore::connect(&self.db_path).await?)
    }
}

pub(crate) async fn run_define(ctx: &AppContext, args: DefineArgs) -> Result<(), CliError> {
    let definitions = read_schema_csv(&args.file)?;
    if definitions.is_empty() {
        return Err(CliError::InvalidConfig(format!(
            "no table definitions found in {}",
            args.file.display()
        )));
    }

    if args.print_sql {
        for definition in &definitions {
            println!("{};\n", build_create_table_sql(definition)?);
        }
        return Ok(());
    }

    let store = ctx.open_store().await?;
    for definition in &definitions {
        let table = definition.table_name();
        if args.replace && store.table_exists(&table).await? {
            store.drop_table(&table).await?;
            info!(event = "table_replaced", table = %table);
        }
        store.create_table(definition).await?;
        println!("created {table} ({} columns)", definition.columns.len());
    }
    Ok(())
}

pub(crate) async fn run_bounds(ctx: &AppContext, args: BoundsArgs) -> Result<(), CliError> {
    let records = read_bounds_csv(&args.file)?;
    let store = ctx.open_store().await?;
    let saved = store.save_bounds(&records).await?;
    let skipped = records.len() as u64 - saved;
    println!("saved {saved} bounds ({skipped} skipped)");
    Ok(())
}

pub(crate) async fn run_load(ctx: &AppContext, args: LoadArgs) -> Result<(), CliError> {
    let table = match args.table {
        Some(table) => table,
        None => args
            .file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CliError::InvalidConfig(format!("no table name in {}", args.file.display()))
            })?,
    };
    let mut batch = read_rows_csv(&args.file, &table)?;

    let store = ctx.open_store().await?;
    let Some(schema) = store.get_schema(&table).await? else {
        return Err(CliError::InvalidConfig(format!("table '{table}' does not exist")));
    };

    let mut matched = 0;
    for name in &mut batch.columns {
        let column = if name.is_empty() {
            None
        } else {
            schema
                .column(name)
                .or_else(|| schema.column(&sanitize_column_name(name)))
        };
        match column {
            Some(column) => {
                *name = column.name.clone();
                matched += 1;
            }
            None => warn!(event = "column_ignored", table = %schema.name, column = %name),
        }
    }
    if matched == 0 {
        return Err(CliError::InvalidConfig(format!(
            "{} shares no columns with '{}' ({})",
            args.file.display(),
            schema.name,
            schema.column_names().join(", ")
        )));
    }

    if args.clear {
        let removed = store.clear_table(&schema.name).await?;
        println!("{}: cleared {removed} rows", schema.name);
    }
    if batch.rows.is_empty() {
        println!("{}: no data rows in {}", schema.name, args.file.display());
        return Ok(());
    }

    let total = batch.row_count() as u64;
    let inserted = store.insert_rows(&schema.name, &batch).await?;
    info!(event = "rows_loaded", table = %schema.name, inserted, total);
    if inserted == 0 {
        let reason = store
            .insert_one_row_diagnostic(&schema.name, &batch)
            .await?
            .unwrap_or_else(|| "duplicate keys ignored".to_string());
        println!("{}: all {total} rows were skipped ({reason})", schema.name);
    } else {
        println!(
            "{}: inserted {inserted} of {total} rows ({} skipped)",
            schema.name,
            total - inserted
        );
    }
    Ok(())
}

pub(crate) async fn run_tables(ctx: &AppContext) -> Result<(), CliError> {
    let store = ctx.open_store().await?;
    let with_bounds: BTreeSet<String> = store.tables_with_bounds().await?.into_iter().collect();
    let tables = store.list_tables().await?;
    if tables.is_empty() {
        println!("no tables defined");
        return Ok(());
    }
    for table in tables {
        let rows = store.row_count(&table).await?;
        let bounds = if with_bounds.contains(&table) {
            "bounds"
        } else {
            "no bounds"
        };
        println!("{table}\t{rows} rows\t{bounds}");
    }
    Ok(())
}

pub(crate) async fn run_generate(ctx: &AppContext, args: GenerateArgs) -> Result<(), CliError> {
    let rows = args.rows.unwrap_or(ctx.settings.default_rows);
    if rows == 0 || rows > ctx.settings.max_rows {
        return Err(CliError::InvalidConfig(format!(
            "rows must be between 1 and {}",
            ctx.settings.max_rows
        )));
    }

    let out_dir = args.dry_run.then(|| {
        args.out
            .as_deref()
            .map(|dir| ctx.paths.resolve(dir))
            .unwrap_or_else(|| ctx.paths.out_dir.clone())
    });

    let run_ctx = RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: chrono::Utc::now(),
        runs_dir: ctx.paths.runs_dir.clone(),
        db_path: ctx.db_path.clone(),
        tables: args.tables.clone(),
        rows,
        seed: args.seed,
        dry_run: args.dry_run,
        out_dir: out_dir.clone(),
        conventions: ctx.settings.conventions.clone(),
    };
    let run_paths = start_run(&run_ctx)?;
    info!(
        event = "run_started",
        run_id = %run_ctx.run_id,
        tables = ?run_ctx.tables,
        rows,
        dry_run = args.dry_run
    );

    let engine = GenerationEngine::new(GenerateOptions {
        seed: args.seed,
        conventions: ctx.settings.conventions.clone(),
    });
    let store = ctx.open_store().await?;
    let timer = Instant::now();

    let mut results = Vec::with_capacity(args.tables.len());
    for table in &args.tables {
        let result = match &out_dir {
            Some(dir) => preview_table(&engine, &store, table, rows, dir).await,
            None => engine
                .populate_table(&store, table, rows)
                .await
                .map(|outcome| TableRun::from_outcome(table, outcome)),
        };
        let entry = result.unwrap_or_else(|err| {
            warn!(event = "table_failed", table = %table, error = %err);
            TableRun::failed(table, err.to_string())
        });
        print_table_run(&entry);
        results.push(entry);
    }

    let duration_ms = timer.elapsed().as_millis() as u64;
    write_report(&run_paths, &run_ctx, &results, duration_ms)?;
    info!(
        event = "run_finished",
        run_id = %run_ctx.run_id,
        duration_ms,
        report = %run_paths.report_path.display()
    );
    println!("run {} -> {}", run_ctx.run_id, run_paths.root.display());

    let failed = results
        .iter()
        .filter(|entry| entry.status == TableStatus::Failed)
        .count();
    if failed > 0 {
        return Err(CliError::TablesFailed(failed));
    }
    Ok(())
}

async fn preview_table(
    engine: &GenerationEngine,
    store: &SqliteStore,
    table: &str,
    rows: usize,
    out_dir: &Path,
) -> Result<TableRun, GenerationError> {
    let Some((batch, report)) = engine
        .generate_for_table_with_report(store, table, rows)
        .await?
    else {
        return Ok(TableRun::nothing_generated(table));
    };
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!("{}.csv", sanitize_table_name(table)));
    let written = write_generated_csv(&path, &batch)?;
    info!(event = "preview_written", table = %table, path = %path.display(), bytes = written);
    Ok(TableRun::previewed(table, path, report))
}

fn print_table_run(entry: &TableRun) {
    match entry.status {
        TableStatus::Inserted => println!(
            "{}: inserted {} of {} generated rows",
            entry.table, entry.inserted, entry.generated
        ),
        TableStatus::AllSkipped => println!(
            "{}: all {} generated rows were skipped ({})",
            entry.table,
            entry.generated,
            entry
                .diagnostic
                .as_deref()
                .unwrap_or("duplicate keys ignored")
        ),
        TableStatus::NothingGenerated => {
            println!("{}: nothing generated (missing table or columns)", entry.table)
        }
        TableStatus::Previewed => println!(
            "{}: {} rows written to {}",
            entry.table,
            entry.generated,
            entry.csv_path.as_deref().unwrap_or("-")
        ),
        TableStatus::Failed => println!(
            "{}: failed: {}",
            entry.table,
            entry.error.as_deref().unwrap_or("unknown error")
        ),
    }
}
