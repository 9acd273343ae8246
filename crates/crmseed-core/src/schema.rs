use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::DeclaredType;

/// Snapshot of a table's columns, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Number of columns participating in the primary key.
    pub fn primary_key_count(&self) -> usize {
        self.columns.iter().filter(|col| col.is_primary_key).count()
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|col| col.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }
}

/// Column metadata for a target table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ColumnSpec {
    pub name: String,
    pub declared_type: DeclaredType,
    pub is_primary_key: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Declared maximum length, only meaningful for text columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            is_primary_key: false,
            not_null: false,
            default_value: None,
            max_length: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }
}
