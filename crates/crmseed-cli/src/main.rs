mod commands;
mod registry;
mod workspace;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use crmseed_core::Error as CoreError;
use crmseed_generate::GenerationError;
use thiserror::Error;

use commands::AppContext;
use registry::init_cli_logging;
use workspace::{WorkspacePaths, load_or_create_settings};

#[derive(Debug, Error)]
enum CliError {
    #[error("workspace error: {0}")]
    Workspace(#[from] workspace::WorkspaceError),
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("store error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{0} table(s) failed, see the run report")]
    TablesFailed(usize),
}

#[derive(Parser, Debug)]
#[command(name = "crmseed", version, about = "Constrained sample data for CRM SQLite stores")]
struct Cli {
    /// Workspace directory holding config/, data/, runs/, out/ and logs/.
    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,
    /// SQLite database file (overrides `db_path` in settings.toml).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create tables from a schema definition CSV.
    Define(DefineArgs),
    /// Load per-column (min, max) bounds from a CSV.
    Bounds(BoundsArgs),
    /// Insert rows from a data CSV into an existing table.
    Load(LoadArgs),
    /// Generate sample rows and insert them (or preview as CSV).
    Generate(GenerateArgs),
    /// List defined tables with row counts.
    Tables,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Define(_) => "define",
            Command::Bounds(_) => "bounds",
            Command::Load(_) => "load",
            Command::Generate(_) => "generate",
            Command::Tables => "tables",
        }
    }
}

#[derive(Args, Debug)]
struct DefineArgs {
    /// Schema definition CSV (table, column, type, length, scale, pk, null, default).
    #[arg(long)]
    file: PathBuf,
    /// Drop existing tables before creating them.
    #[arg(long, default_value_t = false)]
    replace: bool,
    /// Print the CREATE TABLE statements without touching the database.
    #[arg(long, default_value_t = false)]
    print_sql: bool,
}

#[derive(Args, Debug)]
struct BoundsArgs {
    /// Bounds CSV (table, column, min, max).
    #[arg(long)]
    file: PathBuf,
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Data CSV with a header row naming the target columns.
    #[arg(long)]
    file: PathBuf,
    /// Target table (defaults to the file name without extension).
    #[arg(long)]
    table: Option<String>,
    /// Delete existing rows before loading.
    #[arg(long, default_value_t = false)]
    clear: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Target table(s).
    #[arg(long = "table", value_name = "TABLE", required = true)]
    tables: Vec<String>,
    /// Rows per table (defaults to `default_rows` from settings.toml).
    #[arg(long)]
    rows: Option<usize>,
    /// Fixed seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
    /// Write CSV previews instead of inserting.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Preview directory (defaults to `out/` in the workspace).
    #[arg(long, requires = "dry_run")]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let paths = WorkspacePaths::new(cli.workspace);
    paths.ensure_dirs()?;
    init_cli_logging(&paths.cli_log_path())?;
    let settings = load_or_create_settings(&paths)?;
    let db_path = paths.resolve(cli.db.as_deref().unwrap_or(settings.db_path.as_path()));

    tracing::info!(
        event = "command_started",
        command = cli.command.name(),
        db = %db_path.display()
    );

    let ctx = AppContext {
        paths,
        settings,
        db_path,
    };
    match cli.command {
        Command::Define(args) => commands::run_define(&ctx, args).await,
        Command::Bounds(args) => commands::run_bounds(&ctx, args).await,
        Command::Load(args) => commands::run_load(&ctx, args).await,
        Command::Generate(args) => commands::run_generate(&ctx, args).await,
        Command::Tables => commands::run_tables(&ctx).await,
    }
}
