use std::collections::BTreeMap;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crmseed_core::{ColumnBound, GeneratedTable, SampleStore, SampleValue, TableSchema};

use crate::bounds::NormalizedBound;
use crate::errors::GenerationError;
use crate::keys::{ColumnPlan, plan_column};
use crate::model::{GenerateOptions, GenerationReport, PopulateOutcome};
use crate::postprocess::truncate_column;
use crate::strategies::{ColumnDomain, StrategyTable};

/// Entry point for generating sample rows from a table snapshot and bounds.
#[derive(Debug)]
pub struct GenerationEngine {
    options: GenerateOptions,
    strategies: StrategyTable,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self::with_strategies(options, StrategyTable::standard())
    }

    pub fn with_strategies(options: GenerateOptions, strategies: StrategyTable) -> Self {
        Self {
            options,
            strategies,
        }
    }

    /// Generate `rows` rows for `schema`. `None` when there is nothing to generate.
    pub fn generate(
        &self,
        schema: &TableSchema,
        bounds: &BTreeMap<String, ColumnBound>,
        max_lengths: &BTreeMap<String, u32>,
        rows: usize,
    ) -> Option<GeneratedTable> {
        self.generate_with_report(schema, bounds, max_lengths, rows)
            .map(|(table, _)| table)
    }

    /// Same as [`GenerationEngine::generate`], plus a per-column report.
    pub fn generate_with_report(
        &self,
        schema: &TableSchema,
        bounds: &BTreeMap<String, ColumnBound>,
        max_lengths: &BTreeMap<String, u32>,
        rows: usize,
    ) -> Option<(GeneratedTable, GenerationReport)> {
        if schema.columns.is_empty() || rows == 0 {
            return None;
        }

        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut report = GenerationReport::new(run_id.clone(), &schema.name, rows as u64);
        let mut rng = self.rng();
        let conventions = &self.options.conventions;
        let primary_key_count = schema.primary_key_count();

        let mut columns = Vec::with_capacity(schema.columns.len());
        for column in &schema.columns {
            let bound = NormalizedBound::from_bound(lookup(bounds, &column.name));
            let plan = plan_column(column, &bound, conventions, primary_key_count);

            let (strategy_id, mut values) = match plan.materialize(&bound, rows, &mut rng) {
                Some(values) => (plan.id(), values),
                None => {
                    let domain = ColumnDomain {
                        column,
                        bound: &bound,
                        is_boolean: conventions.is_boolean_column(&column.name),
                    };
                    match self.strategies.select(&domain) {
                        Some(strategy) => {
                            (strategy.id(), strategy.sample(&domain, rows, &mut rng))
                        }
                        None => ("null.unmatched", vec![SampleValue::Null; rows]),
                    }
                }
            };

            let null_only = values.iter().all(SampleValue::is_null);
            report.record_column(&column.name, strategy_id, null_only);
            debug!(
                table = %schema.name,
                column = %column.name,
                strategy = strategy_id,
                null_only,
                "column planned"
            );

            let cap = lookup(max_lengths, &column.name)
                .copied()
                .filter(|limit| *limit > 0)
                .or(column.max_length.filter(|limit| *limit > 0));
            if let Some(cap) = cap {
                let cut = truncate_column(&mut values, cap as usize);
                report.record_truncation(&column.name, cut);
            }

            columns.push((column.name.clone(), values));
        }

        let table = GeneratedTable::from_columns(schema.name.clone(), columns);
        report.rows_generated = table.row_count() as u64;

        let null_only = report.null_only_columns();
        if !null_only.is_empty() {
            warn!(
                run_id = %run_id,
                table = %schema.name,
                columns = ?null_only,
                "columns generated as NULL only"
            );
        }
        info!(
            run_id = %run_id,
            table = %schema.name,
            rows = report.rows_generated,
            truncated = report.truncated_total,
            duration_ms = start.elapsed().as_millis() as u64,
            "sample rows generated"
        );

        Some((table, report))
    }

    /// Fetch schema, bounds and max lengths once, then generate.
    pub async fn generate_for_table<S>(
        &self,
        store: &S,
        table: &str,
        rows: usize,
    ) -> Result<Option<GeneratedTable>, GenerationError>
    where
        S: SampleStore + ?Sized,
    {
        Ok(self
            .generate_for_table_with_report(store, table, rows)
            .await?
            .map(|(table, _)| table))
    }

    pub async fn generate_for_table_with_report<S>(
        &self,
        store: &S,
        table: &str,
        rows: usize,
    ) -> Result<Option<(GeneratedTable, GenerationReport)>, GenerationError>
    where
        S: SampleStore + ?Sized,
    {
        let Some(schema) = store.get_schema(table).await? else {
            warn!(table = %table, engine = store.engine(), "table schema not found");
            return Ok(None);
        };
        let bounds = store.get_bounds(table).await?;
        let max_lengths = store.get_max_lengths(table).await?;
        Ok(self.generate_with_report(&schema, &bounds, &max_lengths, rows))
    }

    /// Generate a batch and hand it to the store.
    ///
    /// When the store skips every row, a single-row plain insert is attempted
    /// (and rolled back) to surface the rejection reason.
    pub async fn populate_table<S>(
        &self,
        store: &S,
        table: &str,
        rows: usize,
    ) -> Result<PopulateOutcome, GenerationError>
    where
        S: SampleStore + ?Sized,
    {
        let Some((batch, report)) = self
            .generate_for_table_with_report(store, table, rows)
            .await?
        else {
            return Ok(PopulateOutcome::NothingGenerated);
        };

        let generated = batch.row_count() as u64;
        let inserted = store.insert_rows(table, &batch).await?;
        if inserted > 0 {
            return Ok(PopulateOutcome::Inserted {
                generated,
                inserted,
                report,
            });
        }

        let diagnostic = store.insert_one_row_diagnostic(table, &batch).await?;
        warn!(
            table = %table,
            generated,
            diagnostic = diagnostic.as_deref().unwrap_or("ignored by constraint"),
            "no generated row was inserted"
        );
        Ok(PopulateOutcome::AllSkipped {
            generated,
            diagnostic,
            report,
        })
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.options.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }
}

/// Exact key first, then a case-insensitive match.
fn lookup<'a, V>(map: &'a BTreeMap<String, V>, column: &str) -> Option<&'a V> {
    map.get(column).or_else(|| {
        map.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    })
}

#[cfg(test)]
mod tests {
    use crmseed_core::{ColumnSpec, DeclaredType};

    use super::*;

    fn seeded() -> GenerationEngine {
        GenerationEngine::new(GenerateOptions {
            seed: Some(11),
            ..GenerateOptions::default()
        })
    }

    #[test]
    fn empty_schema_or_zero_rows_generate_nothing() {
        let engine = seeded();
        let empty = TableSchema::new("t", Vec::new());
        assert!(engine
            .generate(&empty, &BTreeMap::new(), &BTreeMap::new(), 5)
            .is_none());

        let schema = TableSchema::new("t", vec![ColumnSpec::new("A", DeclaredType::Integer)]);
        assert!(engine
            .generate(&schema, &BTreeMap::new(), &BTreeMap::new(), 0)
            .is_none());
    }

    #[test]
    fn bounds_are_matched_case_insensitively() {
        let engine = seeded();
        let schema = TableSchema::new("t", vec![ColumnSpec::new("AGE", DeclaredType::Integer)]);
        let bounds = BTreeMap::from([("age".to_string(), ColumnBound::range("20", "60"))]);
        let table = engine
            .generate(&schema, &bounds, &BTreeMap::new(), 10)
            .expect("rows");
        let values = table.column_values("AGE").expect("AGE column");
        assert!(values
            .iter()
            .all(|value| value.as_i64().is_some_and(|age| (20..=60).contains(&age))));
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let schema = TableSchema::new(
            "t",
            vec![
                ColumnSpec::new("SCORE", DeclaredType::Real),
                ColumnSpec::new("GRADE_CD", DeclaredType::Text),
            ],
        );
        let bounds = BTreeMap::from([
            ("SCORE".to_string(), ColumnBound::range("0", "100")),
            ("GRADE_CD".to_string(), ColumnBound::range("A", "E")),
        ]);
        let first = seeded().generate(&schema, &bounds, &BTreeMap::new(), 20);
        let second = seeded().generate(&schema, &bounds, &BTreeMap::new(), 20);
        assert_eq!(first, second);
    }

    #[test]
    fn report_tracks_strategies_and_truncation() {
        let engine = seeded();
        let schema = TableSchema::new(
            "t",
            vec![
                ColumnSpec::new("SCORE", DeclaredType::Real),
                ColumnSpec::new("MEMO", DeclaredType::Text),
            ],
        );
        let bounds = BTreeMap::from([("SCORE".to_string(), ColumnBound::range("10", "99"))]);
        let max_lengths = BTreeMap::from([("SCORE".to_string(), 3_u32)]);
        let (_, report) = engine
            .generate_with_report(&schema, &bounds, &max_lengths, 8)
            .expect("rows");

        assert_eq!(report.rows_requested, 8);
        assert_eq!(report.rows_generated, 8);
        assert_eq!(report.columns[0].strategy, "float.declared");
        assert_eq!(report.columns[1].strategy, "null.unknown_bound");
        assert_eq!(report.null_only_columns(), vec!["MEMO"]);
        assert_eq!(report.strategy_usage.get("float.declared"), Some(&1));
        assert!(report.truncated_total > 0);
    }

    #[test]
    fn unseeded_engines_draw_fresh_entropy() {
        let unseeded = || GenerationEngine::new(GenerateOptions::default());
        let schema = TableSchema::new("t", vec![ColumnSpec::new("AMT", DeclaredType::Integer)]);
        let bounds = BTreeMap::from([("AMT".to_string(), ColumnBound::range("0", "1000000"))]);
        let first = unseeded().generate(&schema, &bounds, &BTreeMap::new(), 50);
        let second = unseeded().generate(&schema, &bounds, &BTreeMap::new(), 50);
        assert!(first.is_some());
        assert_ne!(first, second);
    }

    #[test]
    fn float_bound_too_wide_for_f64_yields_nulls() {
        let engine = seeded();
        let schema = TableSchema::new("t", vec![ColumnSpec::new("SCORE", DeclaredType::Real)]);
        let bounds = BTreeMap::from([("SCORE".to_string(), ColumnBound::range("-1e308", "1e308"))]);
        let (table, report) = engine
            .generate_with_report(&schema, &bounds, &BTreeMap::new(), 5)
            .expect("rows");
        assert_eq!(report.columns[0].strategy, "null.ambiguous");
        let values = table.column_values("SCORE").expect("SCORE column");
        assert!(values.iter().all(|value| value.is_null()));
    }
}
