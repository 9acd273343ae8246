use rand::Rng;

use crmseed_core::{ColumnConventions, ColumnSpec, IdentifierFormat, SampleValue};

use crate::bounds::{NormalizedBound, ordered};

/// How a column is populated before the sampling table is consulted.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnPlan {
    /// Fixed-width textual identifier, cycling through `lo..=hi`.
    Identifier {
        format: IdentifierFormat,
        lo: u64,
        hi: u64,
    },
    /// Column restricted to exactly one character.
    SingleChar,
    /// Lone integer key left NULL for the store to assign.
    StoreAssigned,
    /// Composite integer key cycling through its bound.
    Cyclic { lo: i64, hi: i64 },
    /// Composite integer key without a usable bound: `1, 2, 3, ...`.
    Sequential,
    /// Text key without an identifier format; never fabricated.
    Withheld,
    /// Regular column, handled by the sampling strategy table.
    Sample,
}

impl ColumnPlan {
    pub fn id(&self) -> &'static str {
        match self {
            ColumnPlan::Identifier { .. } => "key.identifier",
            ColumnPlan::SingleChar => "special.single_char",
            ColumnPlan::StoreAssigned => "key.store_assigned",
            ColumnPlan::Cyclic { .. } => "key.cyclic",
            ColumnPlan::Sequential => "key.sequential",
            ColumnPlan::Withheld => "key.withheld",
            ColumnPlan::Sample => "sample",
        }
    }

    /// Produce the column's values; `None` for [`ColumnPlan::Sample`].
    pub fn materialize(
        &self,
        bound: &NormalizedBound,
        rows: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Option<Vec<SampleValue>> {
        let values = match self {
            ColumnPlan::Identifier { format, lo, hi } => {
                let span = u128::from(*hi) - u128::from(*lo) + 1;
                (0..rows)
                    .map(|i| {
                        let offset = (i as u128 % span) as u64;
                        SampleValue::Text(format.encode(lo + offset))
                    })
                    .collect()
            }
            ColumnPlan::SingleChar => single_char_values(bound, rows, rng),
            ColumnPlan::StoreAssigned | ColumnPlan::Withheld => vec![SampleValue::Null; rows],
            ColumnPlan::Cyclic { lo, hi } => {
                let span = i128::from(*hi) - i128::from(*lo) + 1;
                (0..rows)
                    .map(|i| {
                        let value = i128::from(*lo) + (i as i128 % span);
                        SampleValue::Integer(value as i64)
                    })
                    .collect()
            }
            ColumnPlan::Sequential => (0..rows)
                .map(|i| SampleValue::Integer(i as i64 + 1))
                .collect(),
            ColumnPlan::Sample => return None,
        };
        Some(values)
    }
}

/// Decide how a column is populated. First match wins.
pub fn plan_column(
    column: &ColumnSpec,
    bound: &NormalizedBound,
    conventions: &ColumnConventions,
    primary_key_count: usize,
) -> ColumnPlan {
    if let Some(format) = conventions.identifier_format(&column.name) {
        let (lo, hi) = identifier_range(format, bound);
        return ColumnPlan::Identifier {
            format: format.clone(),
            lo,
            hi,
        };
    }

    if conventions.is_single_char_column(&column.name) {
        return ColumnPlan::SingleChar;
    }

    if !column.is_primary_key {
        return ColumnPlan::Sample;
    }

    if column.declared_type.is_integer() {
        if primary_key_count < 2 {
            return ColumnPlan::StoreAssigned;
        }
        return match bound.int_range() {
            Some((lo, hi)) => ColumnPlan::Cyclic { lo, hi },
            None => ColumnPlan::Sequential,
        };
    }

    if column.declared_type.is_text() {
        return ColumnPlan::Withheld;
    }

    ColumnPlan::Sample
}

fn identifier_range(format: &IdentifierFormat, bound: &NormalizedBound) -> (u64, u64) {
    let capacity = format.capacity();
    let decode = |raw: Option<&str>| {
        raw.and_then(|raw| format.decode(raw))
            .filter(|number| *number <= capacity)
    };
    let lo = decode(bound.min.as_deref()).unwrap_or(format.default_min.min(capacity));
    let hi = decode(bound.max.as_deref()).unwrap_or(format.default_max.min(capacity));
    ordered(lo, hi)
}

fn single_char_values(
    bound: &NormalizedBound,
    rows: usize,
    rng: &mut dyn rand::RngCore,
) -> Vec<SampleValue> {
    if let Some((lo, hi)) = bound.single_digit_range() {
        return (0..rows)
            .map(|_| SampleValue::Text(rng.random_range(lo..=hi).to_string()))
            .collect();
    }

    let first_chars = bound
        .min
        .as_deref()
        .zip(bound.max.as_deref())
        .and_then(|(min, max)| min.chars().next().zip(max.chars().next()));
    match first_chars {
        Some((a, b)) => {
            let (lo, hi) = if b < a { (b, a) } else { (a, b) };
            (0..rows)
                .map(|_| SampleValue::Text(random_char(lo, hi, rng).to_string()))
                .collect()
        }
        None => vec![SampleValue::Text("0".to_string()); rows],
    }
}

/// Uniform character between `lo` and `hi` inclusive (by code point).
pub fn random_char(lo: char, hi: char, rng: &mut dyn rand::RngCore) -> char {
    let code = rng.random_range(u32::from(lo)..=u32::from(hi));
    char::from_u32(code).unwrap_or(lo)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crmseed_core::DeclaredType;

    use super::*;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn identifier_columns_use_default_range_without_bounds() {
        let conventions = ColumnConventions::default();
        let column = ColumnSpec::new("cstno", DeclaredType::Text).primary_key();
        let plan = plan_column(&column, &NormalizedBound::default(), &conventions, 1);
        let values = plan
            .materialize(&NormalizedBound::default(), 3, &mut rng())
            .expect("identifier values");
        assert_eq!(
            values,
            vec![
                SampleValue::Text("C000000000000001".to_string()),
                SampleValue::Text("C000000000000002".to_string()),
                SampleValue::Text("C000000000000003".to_string()),
            ]
        );
    }

    #[test]
    fn identifier_bounds_cycle_and_accept_lowercase_prefix() {
        let conventions = ColumnConventions::default();
        let column = ColumnSpec::new("CSTNO", DeclaredType::Text);
        let bound = NormalizedBound::new(Some("c000000000000012"), Some("C000000000000010"));
        let plan = plan_column(&column, &bound, &conventions, 0);
        assert_eq!(plan.id(), "key.identifier");

        let values = plan.materialize(&bound, 4, &mut rng()).expect("values");
        let rendered: Vec<String> = values.iter().filter_map(SampleValue::render).collect();
        assert_eq!(
            rendered,
            vec![
                "C000000000000010",
                "C000000000000011",
                "C000000000000012",
                "C000000000000010"
            ]
        );
    }

    #[test]
    fn partial_identifier_bound_defaults_only_the_missing_end() {
        let conventions = ColumnConventions::default();
        let column = ColumnSpec::new("CSTNO", DeclaredType::Text);

        let bound = NormalizedBound::new(Some("C000000000000100"), None);
        let plan = plan_column(&column, &bound, &conventions, 0);
        let ColumnPlan::Identifier { lo, hi, .. } = plan else {
            panic!("expected identifier plan, got {plan:?}");
        };
        assert_eq!((lo, hi), (100, 999_999_999_999_999));

        let bound = NormalizedBound::new(Some("garbage"), Some("C000000000000005"));
        let plan = plan_column(&column, &bound, &conventions, 0);
        let ColumnPlan::Identifier { lo, hi, .. } = plan else {
            panic!("expected identifier plan, got {plan:?}");
        };
        assert_eq!((lo, hi), (1, 5));
    }

    #[test]
    fn misconfigured_identifier_defaults_do_not_underflow() {
        let inverted = IdentifierFormat {
            column: "ACCT_ID".to_string(),
            prefix: "A".to_string(),
            digits: 4,
            default_min: 10,
            default_max: 5,
        };
        let conventions = ColumnConventions {
            identifiers: vec![inverted],
            ..ColumnConventions::default()
        };
        let column = ColumnSpec::new("ACCT_ID", DeclaredType::Text);
        let plan = plan_column(&column, &NormalizedBound::default(), &conventions, 0);
        let values = plan
            .materialize(&NormalizedBound::default(), 7, &mut rng())
            .expect("values");
        let rendered: Vec<String> = values.iter().filter_map(SampleValue::render).collect();
        assert_eq!(
            rendered,
            vec!["A0005", "A0006", "A0007", "A0008", "A0009", "A0010", "A0005"]
        );

        let zero_width = IdentifierFormat {
            column: "ACCT_ID".to_string(),
            prefix: "A".to_string(),
            digits: 0,
            default_min: 1,
            default_max: 99,
        };
        let conventions = ColumnConventions {
            identifiers: vec![zero_width],
            ..ColumnConventions::default()
        };
        let plan = plan_column(&column, &NormalizedBound::default(), &conventions, 0);
        assert!(matches!(plan, ColumnPlan::Identifier { lo: 0, hi: 0, .. }));
        let values = plan
            .materialize(&NormalizedBound::default(), 2, &mut rng())
            .expect("values");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn lone_integer_key_is_left_to_the_store() {
        let conventions = ColumnConventions::default();
        let column = ColumnSpec::new("ID", DeclaredType::Integer).primary_key();
        let bound = NormalizedBound::new(Some("1"), Some("10"));
        let plan = plan_column(&column, &bound, &conventions, 1);
        assert_eq!(plan, ColumnPlan::StoreAssigned);
        assert_eq!(
            plan.materialize(&bound, 2, &mut rng()),
            Some(vec![SampleValue::Null, SampleValue::Null])
        );
    }

    #[test]
    fn composite_integer_keys_cycle_or_count() {
        let conventions = ColumnConventions::default();
        let a = ColumnSpec::new("A", DeclaredType::Integer).primary_key();
        let bound = NormalizedBound::new(Some("3"), Some("1"));
        let plan = plan_column(&a, &bound, &conventions, 2);
        assert_eq!(plan, ColumnPlan::Cyclic { lo: 1, hi: 3 });
        let values = plan.materialize(&bound, 5, &mut rng()).expect("values");
        let ints: Vec<i64> = values.iter().filter_map(SampleValue::as_i64).collect();
        assert_eq!(ints, vec![1, 2, 3, 1, 2]);

        let b = ColumnSpec::new("B", DeclaredType::Integer).primary_key();
        let plan = plan_column(&b, &NormalizedBound::default(), &conventions, 2);
        let values = plan
            .materialize(&NormalizedBound::default(), 3, &mut rng())
            .expect("values");
        let ints: Vec<i64> = values.iter().filter_map(SampleValue::as_i64).collect();
        assert_eq!(ints, vec![1, 2, 3]);
    }

    #[test]
    fn text_keys_without_format_are_withheld() {
        let conventions = ColumnConventions::default();
        let column = ColumnSpec::new("ACNO", DeclaredType::Text).primary_key();
        let bound = NormalizedBound::new(Some("A"), Some("Z"));
        assert_eq!(
            plan_column(&column, &bound, &conventions, 1),
            ColumnPlan::Withheld
        );
        let real_key = ColumnSpec::new("RATE", DeclaredType::Real).primary_key();
        assert_eq!(
            plan_column(&real_key, &bound, &conventions, 1),
            ColumnPlan::Sample
        );
    }

    #[test]
    fn single_char_column_falls_back_to_zero() {
        let conventions = ColumnConventions::default();
        let column = ColumnSpec::new("IVTG_CRED_CALG_CD", DeclaredType::Text);
        let plan = plan_column(&column, &NormalizedBound::default(), &conventions, 0);
        let values = plan
            .materialize(&NormalizedBound::default(), 2, &mut rng())
            .expect("values");
        assert_eq!(values, vec![SampleValue::Text("0".to_string()); 2]);

        let letters = NormalizedBound::new(Some("Z"), Some("X"));
        let values = plan.materialize(&letters, 50, &mut rng()).expect("values");
        for value in values {
            let text = value.as_str().expect("text");
            assert_eq!(text.chars().count(), 1);
            assert!(("X"..="Z").contains(&text));
        }

        let digits = NormalizedBound::new(Some("1"), Some("3"));
        let values = plan.materialize(&digits, 50, &mut rng()).expect("values");
        assert!(values
            .iter()
            .all(|value| matches!(value.as_str(), Some("1" | "2" | "3"))));
    }
}
