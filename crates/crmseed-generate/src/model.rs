use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crmseed_core::ColumnConventions;

/// Options for the generation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Fixed seed for reproducible batches; a fresh seed per call otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub conventions: ColumnConventions,
}

/// How one column was populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnReport {
    pub column: String,
    pub strategy: String,
    pub null_only: bool,
    pub truncated: u64,
}

/// Report for a single generation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationReport {
    pub run_id: String,
    pub table: String,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub columns: Vec<ColumnReport>,
    pub strategy_usage: BTreeMap<String, u64>,
    pub truncated_total: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, table: impl Into<String>, rows_requested: u64) -> Self {
        Self {
            run_id,
            table: table.into(),
            rows_requested,
            rows_generated: 0,
            columns: Vec::new(),
            strategy_usage: BTreeMap::new(),
            truncated_total: 0,
        }
    }

    pub fn record_column(&mut self, column: &str, strategy: &str, null_only: bool) {
        *self.strategy_usage.entry(strategy.to_string()).or_insert(0) += 1;
        self.columns.push(ColumnReport {
            column: column.to_string(),
            strategy: strategy.to_string(),
            null_only,
            truncated: 0,
        });
    }

    pub fn record_truncation(&mut self, column: &str, count: u64) {
        if count == 0 {
            return;
        }
        if let Some(entry) = self
            .columns
            .iter_mut()
            .find(|entry| entry.column == column)
        {
            entry.truncated += count;
        }
        self.truncated_total += count;
    }

    /// Columns that came out entirely NULL.
    pub fn null_only_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|entry| entry.null_only)
            .map(|entry| entry.column.as_str())
            .collect()
    }
}

/// Result of generating and inserting one table.
#[derive(Debug, Clone, PartialEq)]
pub enum PopulateOutcome {
    /// No usable schema, no columns or zero rows requested.
    NothingGenerated,
    Inserted {
        generated: u64,
        inserted: u64,
        report: GenerationReport,
    },
    /// Every generated row was skipped by the store; `diagnostic` carries the
    /// rejection reason of a plain single-row insert, if it failed.
    AllSkipped {
        generated: u64,
        diagnostic: Option<String>,
        report: GenerationReport,
    },
}

impl PopulateOutcome {
    pub fn inserted(&self) -> u64 {
        match self {
            PopulateOutcome::Inserted { inserted, .. } => *inserted,
            _ => 0,
        }
    }

    pub fn report(&self) -> Option<&GenerationReport> {
        match self {
            PopulateOutcome::NothingGenerated => None,
            PopulateOutcome::Inserted { report, .. } | PopulateOutcome::AllSkipped { report, .. } => {
                Some(report)
            }
        }
    }
}
