use serde::{Deserialize, Serialize};

use crmseed_core::{ColumnSpec, DeclaredType, Error, Result, TableSchema, validate_table_schema};

use crate::naming::{quote_ident, sanitize_column_name, sanitize_table_name};

/// Table definition captured from a spreadsheet-style schema sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    /// Display name (entity name) kept as a table comment.
    pub name_ko: Option<String>,
    pub columns: Vec<ColumnDefinition>,
}

/// Column row of a schema sheet. Raw cells are kept as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub name_ko: Option<String>,
    pub data_type: Option<String>,
    pub data_length: Option<String>,
    pub scale: Option<String>,
    pub primary_key: bool,
    pub not_null: bool,
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn sql_type(&self) -> DeclaredType {
        normalize_sqlite_type(self.data_type.as_deref().unwrap_or(""))
    }

    pub fn length(&self) -> Option<u32> {
        self.data_length.as_deref().and_then(parse_positive_int)
    }

    pub fn scale_digits(&self) -> Option<u32> {
        self.scale
            .as_deref()
            .and_then(parse_int_like)
            .and_then(|value| u32::try_from(value).ok())
    }

    fn default_literal(&self) -> Option<&str> {
        self.default_value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

impl TableDefinition {
    /// Sanitized table name used for storage.
    pub fn table_name(&self) -> String {
        sanitize_table_name(&self.name)
    }

    /// Snapshot of the table this definition will create.
    pub fn to_schema(&self) -> TableSchema {
        let columns = self
            .columns
            .iter()
            .map(|col| {
                let declared_type = col.sql_type();
                ColumnSpec {
                    name: sanitize_column_name(&col.name),
                    declared_type,
                    is_primary_key: col.primary_key,
                    not_null: col.not_null,
                    default_value: col.default_literal().map(str::to_string),
                    max_length: if declared_type.is_text() {
                        col.length()
                    } else {
                        None
                    },
                }
            })
            .collect();
        TableSchema::new(self.table_name(), columns)
    }
}

/// Map spreadsheet type vocabulary onto SQLite storage types.
pub fn normalize_sqlite_type(raw: &str) -> DeclaredType {
    let upper = raw.trim().to_uppercase();
    match upper.as_str() {
        "" | "NAN" | "NAT" => DeclaredType::Text,
        "TEXT" | "VARCHAR" | "CHAR" | "STRING" | "NVARCHAR" | "VARCHAR2" | "CHARACTER"
        | "문자" => DeclaredType::Text,
        "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "NUMBER" | "NUMERIC" | "정수" => {
            DeclaredType::Integer
        }
        "REAL" | "FLOAT" | "DOUBLE" | "DECIMAL" | "실수" => DeclaredType::Real,
        "BLOB" | "BINARY" => DeclaredType::Blob,
        // Dates are stored as ISO text.
        "DATE" | "DATETIME" | "TIMESTAMP" | "날짜" | "일시" => DeclaredType::Text,
        _ => DeclaredType::Text,
    }
}

/// Build the `CREATE TABLE IF NOT EXISTS` statement for a definition.
///
/// A lone INTEGER key becomes `PRIMARY KEY AUTOINCREMENT`; two or more key
/// columns produce a table-level `PRIMARY KEY (...)` clause.
pub fn build_create_table_sql(definition: &TableDefinition) -> Result<String> {
    let schema = definition.to_schema();
    validate_table_schema(&schema)?;

    let pk_names: Vec<&str> = schema
        .columns
        .iter()
        .filter(|col| col.is_primary_key)
        .map(|col| col.name.as_str())
        .collect();
    let multi_pk = pk_names.len() >= 2;

    let mut parts = Vec::with_capacity(schema.columns.len() + 1);
    for (column, raw) in schema.columns.iter().zip(&definition.columns) {
        let name = quote_ident(&column.name);
        let sql_type = column.declared_type;
        let mut segment = format!("{name} {}", sql_type.as_sql());

        let is_pk = column.is_primary_key && !multi_pk;
        if is_pk {
            if sql_type.is_integer() {
                segment.push_str(" PRIMARY KEY AUTOINCREMENT");
            } else {
                segment.push_str(" PRIMARY KEY");
            }
        }
        if column.not_null && !is_pk {
            segment.push_str(" NOT NULL");
        }
        if let Some(default) = raw.default_literal() {
            segment.push_str(&default_clause(default, sql_type));
        }
        if sql_type.is_text()
            && let Some(length) = raw.length()
        {
            segment.push_str(&format!(" CHECK(length({name}) <= {length})"));
        }
        if sql_type.is_real()
            && let Some(scale) = raw.scale_digits()
        {
            segment.push_str(&format!(" CHECK({name} = round({name}, {scale}))"));
        }
        parts.push(segment);
    }

    if multi_pk {
        let columns: Vec<String> = pk_names.iter().map(|name| quote_ident(name)).collect();
        parts.push(format!("PRIMARY KEY ({})", columns.join(", ")));
    }

    if parts.is_empty() {
        return Err(Error::InvalidSchema("column definitions are empty".to_string()));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quote_ident(&schema.name),
        parts.join(",\n  ")
    ))
}

fn default_clause(default: &str, sql_type: DeclaredType) -> String {
    let upper = default.to_uppercase();
    if matches!(
        upper.as_str(),
        "CURRENT_TIMESTAMP" | "CURRENT_DATE" | "CURRENT_TIME"
    ) {
        return format!(" DEFAULT {upper}");
    }
    if (sql_type.is_integer() || sql_type.is_real()) && default.parse::<f64>().is_ok() {
        return format!(" DEFAULT {default}");
    }
    format!(" DEFAULT '{}'", sql_quote_string(default))
}

/// Escape a value for a single-quoted SQL literal.
///
/// Already doubled quotes (`''`) are treated as escaped and kept as is.
pub fn sql_quote_string(value: &str) -> String {
    value
        .split("''")
        .map(|segment| segment.replace('\'', "''"))
        .collect::<Vec<_>>()
        .join("''")
}

/// Spreadsheet truthiness for PK-style flags (`Y`, `예`, `1`, `○`, ...).
pub fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_uppercase().as_str(),
        "Y" | "YES" | "예" | "1" | "TRUE" | "T" | "O" | "○"
    )
}

/// Null-flag cells that mark a column as NOT NULL.
pub fn is_not_null_flag(raw: &str) -> bool {
    matches!(raw.trim().to_uppercase().as_str(), "N" | "NO" | "아니오")
}

/// Parse spreadsheet numbers written as `10`, `10.0` or ` 10 `.
pub fn parse_int_like(raw: &str) -> Option<i64> {
    let value = raw.trim().parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.trunc() as i64)
}

pub fn parse_positive_int(raw: &str) -> Option<u32> {
    parse_int_like(raw)
        .filter(|value| *value > 0)
        .and_then(|value| u32::try_from(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, data_type: &str) -> ColumnDefinition {
        ColumnDefinition {
            name: name.to_string(),
            data_type: Some(data_type.to_string()),
            ..ColumnDefinition::default()
        }
    }

    #[test]
    fn lone_integer_key_autoincrements() {
        let mut id = column("id", "NUMBER");
        id.primary_key = true;
        let mut name = column("name", "VARCHAR2");
        name.data_length = Some("20".to_string());
        name.not_null = true;
        let definition = TableDefinition {
            name: "loan detail".to_string(),
            name_ko: None,
            columns: vec![id, name],
        };

        let sql = build_create_table_sql(&definition).expect("build sql");
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"loan_detail\""));
        assert!(sql.contains("\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("\"name\" TEXT NOT NULL CHECK(length(\"name\") <= 20)"));
    }

    #[test]
    fn composite_keys_use_table_constraint() {
        let mut a = column("A", "INTEGER");
        a.primary_key = true;
        let mut b = column("B", "INTEGER");
        b.primary_key = true;
        let definition = TableDefinition {
            name: "pairs".to_string(),
            name_ko: None,
            columns: vec![a, b],
        };

        let sql = build_create_table_sql(&definition).expect("build sql");
        assert!(!sql.contains("AUTOINCREMENT"));
        assert!(sql.contains("PRIMARY KEY (\"A\", \"B\")"));
    }

    #[test]
    fn defaults_and_scales_render_per_type() {
        let mut rate = column("rate", "DECIMAL");
        rate.scale = Some("2".to_string());
        rate.default_value = Some("0.5".to_string());
        let mut created = column("created_at", "DATE");
        created.default_value = Some("current_date".to_string());
        let mut note = column("note", "TEXT");
        note.default_value = Some("it's".to_string());
        let definition = TableDefinition {
            name: "rates".to_string(),
            name_ko: None,
            columns: vec![rate, created, note],
        };

        let sql = build_create_table_sql(&definition).expect("build sql");
        assert!(sql.contains("\"rate\" REAL DEFAULT 0.5 CHECK(\"rate\" = round(\"rate\", 2))"));
        assert!(sql.contains("\"created_at\" TEXT DEFAULT CURRENT_DATE"));
        assert!(sql.contains("\"note\" TEXT DEFAULT 'it''s'"));
    }

    #[test]
    fn rejects_empty_definitions() {
        let definition = TableDefinition {
            name: "empty".to_string(),
            ..TableDefinition::default()
        };
        assert!(build_create_table_sql(&definition).is_err());
    }

    #[test]
    fn quote_escaping_is_not_doubled() {
        assert_eq!(sql_quote_string("it's"), "it''s");
        assert_eq!(sql_quote_string("it''s"), "it''s");
    }

    #[test]
    fn spreadsheet_flags() {
        assert!(is_truthy(" y "));
        assert!(is_truthy("○"));
        assert!(!is_truthy("N"));
        assert!(is_not_null_flag("아니오"));
        assert_eq!(parse_positive_int("16.0"), Some(16));
        assert_eq!(parse_positive_int("0"), None);
    }
}
