use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use crmseed_core::{ColumnBound, TableSchema};
use crmseed_generate::{GenerateOptions, GenerationEngine, write_generated_csv};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut schema_path: Option<PathBuf> = None;
    let mut bounds_path: Option<PathBuf> = None;
    let mut out_path: Option<PathBuf> = None;
    let mut rows = 10_usize;
    let mut seed: Option<u64> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--schema" => schema_path = args.next().map(PathBuf::from),
            "--bounds" => bounds_path = args.next().map(PathBuf::from),
            "--out" => out_path = args.next().map(PathBuf::from),
            "--rows" => rows = args.next().ok_or("missing --rows value")?.parse()?,
            "--seed" => seed = Some(args.next().ok_or("missing --seed value")?.parse()?),
            _ => return Err(format!("unexpected argument: {arg}").into()),
        }
    }

    let schema_path = schema_path.ok_or("missing --schema path")?;
    let schema: TableSchema = serde_json::from_str(&std::fs::read_to_string(&schema_path)?)?;
    let bounds: BTreeMap<String, ColumnBound> = match bounds_path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(&path)?)?,
        None => BTreeMap::new(),
    };

    let engine = GenerationEngine::new(GenerateOptions {
        seed,
        ..GenerateOptions::default()
    });
    let Some(table) = engine.generate(&schema, &bounds, &BTreeMap::new(), rows) else {
        println!("nothing to generate");
        return Ok(());
    };

    let out_path = out_path.unwrap_or_else(|| PathBuf::from(format!("{}.csv", schema.name)));
    let bytes = write_generated_csv(&out_path, &table)?;
    println!("wrote {} rows ({bytes} bytes) to {}", table.row_count(), out_path.display());
    Ok(())
}
