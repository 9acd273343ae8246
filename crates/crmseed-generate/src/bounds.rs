use chrono::NaiveDate;
use regex::Regex;

use crmseed_core::ColumnBound;

/// Bound strings after trimming, with NaN-like placeholders dropped.
///
/// Every accessor is a best-effort interpretation: a failed parse yields
/// `None` and never an error. Inverted ranges come back swapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBound {
    pub min: Option<String>,
    pub max: Option<String>,
}

impl NormalizedBound {
    pub fn new(min: Option<&str>, max: Option<&str>) -> Self {
        Self {
            min: normalize_raw(min),
            max: normalize_raw(max),
        }
    }

    pub fn from_bound(bound: Option<&ColumnBound>) -> Self {
        match bound {
            Some(bound) => Self::new(bound.min_value.as_deref(), bound.max_value.as_deref()),
            None => Self::default(),
        }
    }

    pub fn has_both(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    fn pair(&self) -> Option<(&str, &str)> {
        Some((self.min.as_deref()?, self.max.as_deref()?))
    }

    pub fn int_range(&self) -> Option<(i64, i64)> {
        let (min, max) = self.pair()?;
        Some(ordered(try_int(min)?, try_int(max)?))
    }

    /// Both bounds parse as finite floats and so does their difference.
    pub fn float_range(&self) -> Option<(f64, f64)> {
        let (min, max) = self.pair()?;
        Some(ordered(try_float(min)?, try_float(max)?)).filter(|(lo, hi)| (hi - lo).is_finite())
    }

    /// Both bounds are `YYYY-MM-DD` (optionally followed by a time part).
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let (min, max) = self.pair()?;
        Some(ordered(try_date(min)?, try_date(max)?))
    }

    /// First characters of both bounds, provided each is at most `max_len` chars.
    pub fn char_range(&self, max_len: usize) -> Option<(char, char)> {
        let (min, max) = self.pair()?;
        if min.chars().count() > max_len || max.chars().count() > max_len {
            return None;
        }
        Some(ordered(min.chars().next()?, max.chars().next()?))
    }

    /// Integer range lying entirely within `[0, 9]`.
    pub fn single_digit_range(&self) -> Option<(i64, i64)> {
        self.int_range()
            .filter(|(lo, hi)| (0..=9).contains(lo) && (0..=9).contains(hi))
    }

    /// Both bounds are exactly one character.
    pub fn single_chars(&self) -> Option<(char, char)> {
        self.char_range(1)
    }
}

fn normalize_raw(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty() || matches!(value, "nan" | "NaN" | "NAN" | "NaT" | "None") {
        return None;
    }
    Some(value.to_string())
}

pub(crate) fn ordered<T: PartialOrd>(lo: T, hi: T) -> (T, T) {
    if hi < lo { (hi, lo) } else { (lo, hi) }
}

/// Parse as a float, then truncate toward zero (`"3.9"` -> 3).
pub fn try_int(raw: &str) -> Option<i64> {
    let value = try_float(raw)?.trunc();
    if value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

pub fn try_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn try_date(raw: &str) -> Option<NaiveDate> {
    let re = Regex::new(r"^\d{4}-\d{2}-\d{2}").ok()?;
    if !re.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_nan_like_values_are_absent() {
        let bound = NormalizedBound::new(Some("  "), Some("NaN"));
        assert_eq!(bound, NormalizedBound::default());
        assert!(!NormalizedBound::new(Some("1"), None).has_both());
    }

    #[test]
    fn integers_truncate_through_float() {
        assert_eq!(try_int("3.9"), Some(3));
        assert_eq!(try_int("-3.9"), Some(-3));
        assert_eq!(try_int("1e3"), Some(1000));
        assert_eq!(try_int("inf"), None);
        assert_eq!(try_int("C0001"), None);
    }

    #[test]
    fn inverted_ranges_are_swapped() {
        let bound = NormalizedBound::new(Some("100"), Some("10"));
        assert_eq!(bound.int_range(), Some((10, 100)));
        assert_eq!(bound.float_range(), Some((10.0, 100.0)));

        let dates = NormalizedBound::new(Some("2024-12-31"), Some("2024-01-01 00:00:00"));
        let (lo, hi) = dates.date_range().expect("date range");
        assert_eq!(lo.to_string(), "2024-01-01");
        assert_eq!(hi.to_string(), "2024-12-31");

        let chars = NormalizedBound::new(Some("Z"), Some("A"));
        assert_eq!(chars.single_chars(), Some(('A', 'Z')));
    }

    #[test]
    fn float_range_rejects_spans_wider_than_f64() {
        let wide = NormalizedBound::new(Some("-1e308"), Some("1e308"));
        assert_eq!(wide.float_range(), None);
        let edge = NormalizedBound::new(Some("0"), Some("1.7e308"));
        assert_eq!(edge.float_range(), Some((0.0, 1.7e308)));
    }

    #[test]
    fn single_digit_range_requires_both_ends_in_range() {
        assert_eq!(
            NormalizedBound::new(Some("0"), Some("9")).single_digit_range(),
            Some((0, 9))
        );
        assert_eq!(
            NormalizedBound::new(Some("0"), Some("10")).single_digit_range(),
            None
        );
    }

    #[test]
    fn char_range_respects_length_limit() {
        let bound = NormalizedBound::new(Some("AB"), Some("CD"));
        assert_eq!(bound.char_range(2), Some(('A', 'C')));
        assert_eq!(bound.char_range(1), None);
        assert_eq!(
            NormalizedBound::new(Some("가"), Some("나")).single_chars(),
            Some(('가', '나'))
        );
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert_eq!(try_date("2024-13-01"), None);
        assert_eq!(try_date("20240101"), None);
    }
}
