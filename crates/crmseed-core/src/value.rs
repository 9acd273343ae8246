use serde::{Deserialize, Serialize};

/// Generated value for a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SampleValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SampleValue::Null)
    }

    /// String form of the value as it would be stored in a text column.
    pub fn render(&self) -> Option<String> {
        match self {
            SampleValue::Null => None,
            SampleValue::Integer(value) => Some(value.to_string()),
            SampleValue::Real(value) => Some(value.to_string()),
            SampleValue::Text(value) => Some(value.clone()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SampleValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SampleValue::Integer(value) => Some(*value as f64),
            SampleValue::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SampleValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Row-major batch of generated values for one table.
///
/// Exists only between generation and insertion; the insert step takes it
/// by reference and nothing retains it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedTable {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SampleValue>>,
}

impl GeneratedTable {
    /// Assemble a table from per-column vectors of equal length.
    pub fn from_columns(table: impl Into<String>, columns: Vec<(String, Vec<SampleValue>)>) -> Self {
        let row_count = columns
            .iter()
            .map(|(_, values)| values.len())
            .max()
            .unwrap_or(0);
        let mut rows = vec![Vec::with_capacity(columns.len()); row_count];
        for (_, values) in &columns {
            for (index, row) in rows.iter_mut().enumerate() {
                row.push(values.get(index).cloned().unwrap_or(SampleValue::Null));
            }
        }

        Self {
            table: table.into(),
            columns: columns.into_iter().map(|(name, _)| name).collect(),
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&SampleValue>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }

    /// Copy of the first `n` rows, used for single-row diagnostics.
    pub fn head(&self, n: usize) -> GeneratedTable {
        GeneratedTable {
            table: self.table.clone(),
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}
