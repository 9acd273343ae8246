use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// SQL type affinity of a column as seen by the sample generator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredType {
    Integer,
    Real,
    Text,
    Blob,
}

impl DeclaredType {
    /// Resolve the affinity of a raw declared type (e.g. `VARCHAR(20)`, `bigint`).
    ///
    /// Follows SQLite's affinity rules, with `NUMERIC`/`DECIMAL` folded into
    /// [`DeclaredType::Real`] and an empty declaration treated as text.
    pub fn from_declared(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        if upper.is_empty() {
            return DeclaredType::Text;
        }
        if upper.contains("INT") {
            DeclaredType::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            DeclaredType::Text
        } else if upper.contains("BLOB") {
            DeclaredType::Blob
        } else if upper.contains("REAL")
            || upper.contains("FLOA")
            || upper.contains("DOUB")
            || upper.contains("NUM")
            || upper.contains("DEC")
        {
            DeclaredType::Real
        } else {
            DeclaredType::Text
        }
    }

    /// Canonical SQL keyword for the affinity.
    pub fn as_sql(&self) -> &'static str {
        match self {
            DeclaredType::Integer => "INTEGER",
            DeclaredType::Real => "REAL",
            DeclaredType::Text => "TEXT",
            DeclaredType::Blob => "BLOB",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DeclaredType::Integer)
    }

    pub fn is_real(&self) -> bool {
        matches!(self, DeclaredType::Real)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DeclaredType::Text)
    }
}
