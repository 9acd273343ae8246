const DEFAULT_TABLE_NAME: &str = "uploaded_data";
const DEFAULT_COLUMN_NAME: &str = "col";

/// Normalize a table name for storage: non-word characters become `_`.
pub fn sanitize_table_name(name: &str) -> String {
    sanitize(name, DEFAULT_TABLE_NAME)
}

/// Normalize a column name for storage: non-word characters become `_`.
pub fn sanitize_column_name(name: &str) -> String {
    sanitize(name, DEFAULT_COLUMN_NAME)
}

/// Double-quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sanitize(name: &str, fallback: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    trimmed
        .chars()
        .map(|ch| if is_word_char(ch) { ch } else { '_' })
        .collect()
}

// Hangul jamo and syllables are kept alongside ASCII word characters.
fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || ch == '_'
        || ('\u{3130}'..='\u{318f}').contains(&ch)
        || ('\u{ac00}'..='\u{d7af}').contains(&ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_punctuation_and_spaces() {
        assert_eq!(sanitize_table_name("loan detail-2024"), "loan_detail_2024");
        assert_eq!(sanitize_column_name(" 고객 번호 "), "고객_번호");
    }

    #[test]
    fn falls_back_on_empty_names() {
        assert_eq!(sanitize_table_name("   "), "uploaded_data");
        assert_eq!(sanitize_column_name(""), "col");
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
