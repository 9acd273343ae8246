//! CSV import of schema sheets, bound sheets and data rows.
//!
//! Both sheet kinds may carry title rows above the header; the header is
//! searched for within the first [`HEADER_SCAN_ROWS`] records and matched by
//! normalized aliases in English and Korean. Data files always carry their
//! header on the first line.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crmseed_core::{BoundRecord, Error, GeneratedTable, Result, SampleValue};

use crate::ddl::{ColumnDefinition, TableDefinition, is_not_null_flag, is_truthy};

pub const HEADER_SCAN_ROWS: usize = 10;

/// Cell contents read as NULL in data files.
pub const NA_TOKENS: &[&str] = &["", "#N/A", "null", "None", "nan", ".", "#NULL!"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Table,
    TableKo,
    Column,
    ColumnKo,
    DataType,
    DataLength,
    Scale,
    PrimaryKey,
    NullFlag,
    Default,
    Min,
    Max,
}

const BOUND_ALIASES: &[(Field, &[&str])] = &[
    (Field::Table, &["테이블명", "table_name", "table name", "테이블"]),
    (Field::Column, &["컬럼명", "column_name", "column name", "컬럼", "column"]),
    (Field::Min, &["min", "min_val", "min val", "최소", "min value"]),
    (Field::Max, &["max", "max_val", "max val", "최대", "max value"]),
];

const SCHEMA_ALIASES: &[(Field, &[&str])] = &[
    (Field::Table, &["테이블명", "table_name", "table name"]),
    (Field::TableKo, &["테이블 한글명", "엔티티명", "table_name_ko"]),
    (Field::Column, &["컬럼명", "column_name", "column name"]),
    (Field::ColumnKo, &["컬럼 한글명", "속성명", "column_name_ko"]),
    (Field::DataType, &["데이터타입", "data_type", "data type", "type"]),
    (Field::DataLength, &["데이터길이", "data_length", "data length", "length"]),
    (Field::Scale, &["소수점", "scale"]),
    (Field::PrimaryKey, &["pk", "primary_key"]),
    (Field::NullFlag, &["null여부", "null_yn", "nullable", "null"]),
    (Field::Default, &["default", "default_value"]),
];

/// Read `(table, column, min, max)` rows from a bound sheet.
pub fn read_bounds_csv(path: impl AsRef<Path>) -> Result<Vec<BoundRecord>> {
    parse_bounds_csv(open(path.as_ref())?)
}

/// Read table definitions from a schema sheet, one per distinct table name.
pub fn read_schema_csv(path: impl AsRef<Path>) -> Result<Vec<TableDefinition>> {
    parse_schema_csv(open(path.as_ref())?)
}

/// Read a data file into a batch for `table`.
pub fn read_rows_csv(path: impl AsRef<Path>, table: &str) -> Result<GeneratedTable> {
    parse_rows_csv(open(path.as_ref())?, table)
}

pub fn parse_rows_csv<R: Read>(reader: R, table: &str) -> Result<GeneratedTable> {
    let mut records = load_records(reader)?.into_iter();
    let Some(header) = records.next() else {
        return Err(Error::InvalidInput("data file is empty".to_string()));
    };
    let columns: Vec<String> = header
        .iter()
        .map(|name| name.trim().trim_start_matches('\u{feff}').to_string())
        .collect();
    if columns.iter().all(String::is_empty) {
        return Err(Error::InvalidInput("data file has no header".to_string()));
    }

    let rows = records
        .filter(|record| record.iter().any(|value| !value.trim().is_empty()))
        .map(|record| {
            (0..columns.len())
                .map(|index| match record.get(index) {
                    Some(value) if !NA_TOKENS.contains(&value) => {
                        SampleValue::Text(value.to_string())
                    }
                    _ => SampleValue::Null,
                })
                .collect()
        })
        .collect();

    Ok(GeneratedTable {
        table: table.to_string(),
        columns,
        rows,
    })
}

pub fn parse_bounds_csv<R: Read>(reader: R) -> Result<Vec<BoundRecord>> {
    let records = load_records(reader)?;
    let Some((header_idx, fields)) =
        locate_header(&records, BOUND_ALIASES, &[Field::Table, Field::Column])
    else {
        return Err(Error::InvalidInput(
            "bound sheet needs table and column headers".to_string(),
        ));
    };

    let mut out = Vec::new();
    for record in &records[header_idx + 1..] {
        let (Some(table), Some(column)) = (
            cell(record, &fields, Field::Table),
            cell(record, &fields, Field::Column),
        ) else {
            continue;
        };
        out.push(BoundRecord {
            table_name: table,
            column_name: column,
            min_value: cell(record, &fields, Field::Min),
            max_value: cell(record, &fields, Field::Max),
        });
    }
    Ok(out)
}

pub fn parse_schema_csv<R: Read>(reader: R) -> Result<Vec<TableDefinition>> {
    let records = load_records(reader)?;
    let Some((header_idx, fields)) = locate_header(
        &records,
        SCHEMA_ALIASES,
        &[Field::Table, Field::Column, Field::DataType],
    ) else {
        return Err(Error::InvalidInput(
            "schema sheet needs table, column and data type headers".to_string(),
        ));
    };

    let mut tables: Vec<TableDefinition> = Vec::new();
    for record in &records[header_idx + 1..] {
        let (Some(table), Some(column)) = (
            cell(record, &fields, Field::Table),
            cell(record, &fields, Field::Column),
        ) else {
            continue;
        };

        let definition = match tables.iter_mut().position(|def| def.name == table) {
            Some(index) => &mut tables[index],
            None => {
                tables.push(TableDefinition {
                    name: table,
                    name_ko: cell(record, &fields, Field::TableKo),
                    columns: Vec::new(),
                });
                let last = tables.len() - 1;
                &mut tables[last]
            }
        };

        definition.columns.push(ColumnDefinition {
            name: column,
            name_ko: cell(record, &fields, Field::ColumnKo),
            data_type: cell(record, &fields, Field::DataType),
            data_length: cell(record, &fields, Field::DataLength),
            scale: cell(record, &fields, Field::Scale),
            primary_key: cell(record, &fields, Field::PrimaryKey)
                .is_some_and(|value| is_truthy(&value)),
            not_null: cell(record, &fields, Field::NullFlag)
                .is_some_and(|value| is_not_null_flag(&value)),
            default_value: cell(record, &fields, Field::Default),
        });
    }
    Ok(tables)
}

fn open(path: &Path) -> Result<std::fs::File> {
    Ok(std::fs::File::open(path)?)
}

fn load_records<R: Read>(reader: R) -> Result<Vec<csv::StringRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| Error::InvalidInput(format!("malformed csv: {err}")))
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn locate_header(
    records: &[csv::StringRecord],
    aliases: &[(Field, &[&str])],
    required: &[Field],
) -> Option<(usize, HashMap<Field, usize>)> {
    records
        .iter()
        .take(HEADER_SCAN_ROWS)
        .enumerate()
        .find_map(|(row_idx, record)| {
            let mut fields = HashMap::new();
            for (col_idx, raw) in record.iter().enumerate() {
                let norm = normalize_header(raw);
                if let Some((field, _)) = aliases
                    .iter()
                    .find(|(_, names)| names.contains(&norm.as_str()))
                {
                    fields.entry(*field).or_insert(col_idx);
                }
            }
            required
                .iter()
                .all(|field| fields.contains_key(field))
                .then_some((row_idx, fields))
        })
}

fn cell(record: &csv::StringRecord, fields: &HashMap<Field, usize>, field: Field) -> Option<String> {
    let value = record.get(*fields.get(&field)?)?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return None;
    }
    Some(value.to_string())
}
