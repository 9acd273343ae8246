use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Operator-supplied (min, max) pair constraining a column's sampled domain.
///
/// Values are kept as raw strings; they may hold integers, floats,
/// `YYYY-MM-DD` dates or single-character codes. Interpretation happens in
/// the generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ColumnBound {
    pub min_value: Option<String>,
    pub max_value: Option<String>,
}

impl ColumnBound {
    pub fn new(min_value: Option<&str>, max_value: Option<&str>) -> Self {
        Self {
            min_value: min_value.map(str::to_string),
            max_value: max_value.map(str::to_string),
        }
    }

    /// Shorthand for a bound with both ends present.
    pub fn range(min_value: &str, max_value: &str) -> Self {
        Self::new(Some(min_value), Some(max_value))
    }
}

/// One row of the bound definition table, keyed by table and column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct BoundRecord {
    pub table_name: String,
    pub column_name: String,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
}

impl BoundRecord {
    pub fn bound(&self) -> ColumnBound {
        ColumnBound {
            min_value: self.min_value.clone(),
            max_value: self.max_value.clone(),
        }
    }
}
