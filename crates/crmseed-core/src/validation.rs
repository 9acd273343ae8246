use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::TableSchema;

/// Validate internal consistency of a table schema.
///
/// This checks:
/// - the table has a name and at least one column
/// - column names are non-empty and unique (case-insensitive, as in SQLite)
/// - declared max lengths are positive
pub fn validate_table_schema(schema: &TableSchema) -> Result<()> {
    if schema.name.trim().is_empty() {
        return Err(Error::InvalidSchema("table name is empty".to_string()));
    }

    if schema.columns.is_empty() {
        return Err(Error::InvalidSchema(format!(
            "table has no columns: {}",
            schema.name
        )));
    }

    let mut seen = BTreeSet::new();
    for column in &schema.columns {
        if column.name.trim().is_empty() {
            return Err(Error::InvalidSchema(format!(
                "empty column name in table: {}",
                schema.name
            )));
        }

        if !seen.insert(column.name.to_lowercase()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate column name: {}.{}",
                schema.name, column.name
            )));
        }

        if column.max_length == Some(0) {
            return Err(Error::InvalidSchema(format!(
                "max length must be positive: {}.{}",
                schema.name, column.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSpec;
    use crate::types::DeclaredType;

    #[test]
    fn rejects_duplicate_columns_ignoring_case() {
        let schema = TableSchema::new(
            "customer",
            vec![
                ColumnSpec::new("CSTNO", DeclaredType::Text),
                ColumnSpec::new("cstno", DeclaredType::Text),
            ],
        );
        let err = validate_table_schema(&schema).expect_err("duplicate columns");
        assert!(err.to_string().contains("duplicate column name"));
    }

    #[test]
    fn rejects_empty_tables() {
        let schema = TableSchema::new("customer", Vec::new());
        assert!(validate_table_schema(&schema).is_err());
    }

    #[test]
    fn accepts_well_formed_schema() {
        let schema = TableSchema::new(
            "customer",
            vec![
                ColumnSpec::new("CSTNO", DeclaredType::Text).primary_key(),
                ColumnSpec::new("AGE", DeclaredType::Integer),
                ColumnSpec::new("FLAG_YN", DeclaredType::Text).with_max_length(1),
            ],
        );
        assert!(validate_table_schema(&schema).is_ok());
    }
}
