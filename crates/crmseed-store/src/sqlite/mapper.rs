use std::collections::BTreeMap;

use regex::Regex;

use crmseed_core::{ColumnBound, ColumnSpec, DeclaredType, GeneratedTable, SampleValue};

use crate::ddl::parse_positive_int;

use super::queries::{RawBound, RawColumn, RawDataLength};

/// Extract `CHECK(length("col") <= N)` limits from a table's DDL.
pub fn parse_check_lengths(ddl: &str) -> BTreeMap<String, u32> {
    let mut out = BTreeMap::new();
    let Some(re) = Regex::new(
        r#"(?i)check\s*\(\s*length\s*\(\s*["`\[]?([^"`\]\)]+?)["`\]]?\s*\)\s*<=\s*(\d+)\s*\)"#,
    )
    .ok() else {
        return out;
    };
    for caps in re.captures_iter(ddl) {
        if let Some(limit) = parse_positive_int(&caps[2]) {
            out.insert(caps[1].trim().to_string(), limit);
        }
    }
    out
}

pub fn map_columns(raw: Vec<RawColumn>, check_lengths: &BTreeMap<String, u32>) -> Vec<ColumnSpec> {
    raw.into_iter()
        .map(|col| {
            let max_length = check_lengths
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&col.name))
                .map(|(_, limit)| *limit);
            ColumnSpec {
                declared_type: DeclaredType::from_declared(&col.declared_type),
                is_primary_key: col.pk_position > 0,
                not_null: col.not_null,
                default_value: col.default_value,
                max_length,
                name: col.name,
            }
        })
        .collect()
}

pub fn map_bounds(raw: Vec<RawBound>) -> BTreeMap<String, ColumnBound> {
    raw.into_iter()
        .map(|row| {
            let bound = ColumnBound {
                min_value: non_blank(row.min_value),
                max_value: non_blank(row.max_value),
            };
            (row.column_name, bound)
        })
        .collect()
}

pub fn map_data_lengths(raw: Vec<RawDataLength>) -> BTreeMap<String, u32> {
    raw.into_iter()
        .filter_map(|row| parse_positive_int(&row.data_length).map(|limit| (row.column_name, limit)))
        .collect()
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Batch reshaped to the target table's column order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SampleValue>>,
}

impl AlignedBatch {
    pub fn insert_sql(&self, table: &str, or_ignore: bool) -> String {
        let verb = if or_ignore { "INSERT OR IGNORE" } else { "INSERT" };
        if self.columns.is_empty() {
            return format!("{verb} INTO {} DEFAULT VALUES", crate::naming::quote_ident(table));
        }
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|name| crate::naming::quote_ident(name))
            .collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "{verb} INTO {} ({}) VALUES ({})",
            crate::naming::quote_ident(table),
            columns.join(", "),
            placeholders
        )
    }
}

/// Reshape a generated batch for insertion into `target`.
///
/// Keeps target columns that were generated, plus NOT NULL columns without a
/// default that the batch left out. NULLs in NOT NULL columns become `0` for
/// numeric columns and `""` otherwise; integer key columns stay NULL so the
/// store assigns them.
pub fn align_batch(target: &[ColumnSpec], batch: &GeneratedTable) -> AlignedBatch {
    let mut columns = Vec::new();
    let mut sources = Vec::new();
    for column in target {
        let source = batch.column_index(&column.name);
        let store_assigned = column.is_primary_key && column.declared_type.is_integer();
        let needs_fill = column.not_null && column.default_value.is_none() && !store_assigned;
        if source.is_some() || needs_fill {
            columns.push(column);
            sources.push(source);
        }
    }

    let rows = batch
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .zip(&sources)
                .map(|(column, source)| {
                    let value = source
                        .and_then(|index| row.get(index))
                        .cloned()
                        .unwrap_or(SampleValue::Null);
                    fill_not_null(column, value)
                })
                .collect()
        })
        .collect();

    AlignedBatch {
        columns: columns.iter().map(|column| column.name.clone()).collect(),
        rows,
    }
}

fn fill_not_null(column: &ColumnSpec, value: SampleValue) -> SampleValue {
    if !value.is_null() || !column.not_null {
        return value;
    }
    if column.is_primary_key && column.declared_type.is_integer() {
        return value;
    }
    match column.declared_type {
        DeclaredType::Integer | DeclaredType::Real => SampleValue::Integer(0),
        DeclaredType::Text | DeclaredType::Blob => SampleValue::Text(String::new()),
    }
}
