use serde::{Deserialize, Serialize};

/// Fixed-width textual identifier encoding, e.g. `C000000000000001`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentifierFormat {
    /// Column name the format applies to (case-insensitive).
    pub column: String,
    /// Literal prefix placed before the zero-padded number.
    pub prefix: String,
    /// Width of the zero-padded numeric suffix.
    pub digits: usize,
    /// Range used when no usable bound is recorded.
    pub default_min: u64,
    pub default_max: u64,
}

impl IdentifierFormat {
    /// Encode a number as `prefix + zero-padded digits`.
    pub fn encode(&self, number: u64) -> String {
        format!("{}{:0width$}", self.prefix, number, width = self.digits)
    }

    /// Decode a bound string back into its numeric part.
    ///
    /// The prefix is stripped case-insensitively when present; a bare number
    /// is accepted as well.
    pub fn decode(&self, raw: &str) -> Option<u64> {
        let trimmed = raw.trim();
        let digits = if !self.prefix.is_empty()
            && trimmed.len() >= self.prefix.len()
            && trimmed.is_char_boundary(self.prefix.len())
            && trimmed[..self.prefix.len()].eq_ignore_ascii_case(&self.prefix)
        {
            &trimmed[self.prefix.len()..]
        } else {
            trimmed
        };
        if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u64>().ok()
    }

    /// Largest number that still fits in `digits` characters.
    pub fn capacity(&self) -> u64 {
        u32::try_from(self.digits)
            .ok()
            .and_then(|digits| 10_u64.checked_pow(digits))
            .map(|limit| limit - 1)
            .unwrap_or(u64::MAX)
    }
}

/// Naming conventions that single out columns needing bespoke encoding.
///
/// These are schema-specific exceptions rather than general policy, so they
/// are carried as configuration and can be swapped out wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnConventions {
    /// Name suffixes marking Y/N flag columns.
    pub boolean_suffixes: Vec<String>,
    /// Substrings marking flag columns anywhere in the name.
    pub boolean_markers: Vec<String>,
    /// Columns constrained to a single character.
    pub single_char_columns: Vec<String>,
    pub identifiers: Vec<IdentifierFormat>,
}

impl Default for ColumnConventions {
    fn default() -> Self {
        Self {
            identifiers: vec![IdentifierFormat {
                column: "CSTNO".to_string(),
                prefix: "C".to_string(),
                digits: 15,
                default_min: 1,
                default_max: 999_999_999_999_999,
            }],
            boolean_suffixes: vec!["YN".to_string()],
            boolean_markers: vec!["여부".to_string()],
            single_char_columns: vec!["IVTG_CRED_CALG_CD".to_string()],
        }
    }
}

impl ColumnConventions {
    /// Conventions that match nothing.
    pub fn none() -> Self {
        Self {
            identifiers: Vec::new(),
            boolean_suffixes: Vec::new(),
            boolean_markers: Vec::new(),
            single_char_columns: Vec::new(),
        }
    }

    pub fn identifier_format(&self, column: &str) -> Option<&IdentifierFormat> {
        self.identifiers
            .iter()
            .find(|format| format.column.eq_ignore_ascii_case(column.trim()))
    }

    pub fn is_identifier_column(&self, column: &str) -> bool {
        self.identifier_format(column).is_some()
    }

    pub fn is_boolean_column(&self, column: &str) -> bool {
        let lower = column.trim().to_lowercase();
        self.boolean_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && lower.ends_with(&suffix.to_lowercase()))
            || self
                .boolean_markers
                .iter()
                .any(|marker| !marker.is_empty() && lower.contains(&marker.to_lowercase()))
    }

    pub fn is_single_char_column(&self, column: &str) -> bool {
        self.single_char_columns
            .iter()
            .any(|name| name.eq_ignore_ascii_case(column.trim()))
    }
}
