//! Ordered sampling strategies for regular (non-key) columns.
//!
//! The table is consulted top to bottom and the first strategy whose
//! `matches` accepts the column domain produces every value of the column.

use chrono::Duration;
use rand::Rng;

use crmseed_core::{ColumnSpec, SampleValue};

use crate::bounds::NormalizedBound;
use crate::keys::random_char;

/// Everything a strategy may look at when deciding and sampling.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDomain<'a> {
    pub column: &'a ColumnSpec,
    pub bound: &'a NormalizedBound,
    /// Column follows the Y/N flag naming convention.
    pub is_boolean: bool,
}

/// A sampling rule. Sampling is pure apart from the rng passed in.
pub trait SamplingStrategy: Send + Sync {
    fn id(&self) -> &'static str;

    fn matches(&self, domain: &ColumnDomain<'_>) -> bool;

    fn sample(
        &self,
        domain: &ColumnDomain<'_>,
        rows: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Vec<SampleValue>;
}

/// Ordered registry of sampling strategies.
pub struct StrategyTable {
    strategies: Vec<Box<dyn SamplingStrategy>>,
}

impl std::fmt::Debug for StrategyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl StrategyTable {
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// The built-in rules, in priority order.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register_strategy(Box::new(UnknownBound));
        table.register_strategy(Box::new(SingleDigit));
        table.register_strategy(Box::new(BooleanFlag));
        table.register_strategy(Box::new(CharRange {
            id: "char.single",
            max_len: 1,
        }));
        table.register_strategy(Box::new(IntRange {
            id: "int.declared",
            declared_only: true,
        }));
        table.register_strategy(Box::new(FloatRange {
            id: "float.declared",
            declared_only: true,
        }));
        table.register_strategy(Box::new(IntRange {
            id: "int.fallback",
            declared_only: false,
        }));
        table.register_strategy(Box::new(FloatRange {
            id: "float.fallback",
            declared_only: false,
        }));
        table.register_strategy(Box::new(DateRange));
        table.register_strategy(Box::new(CharRange {
            id: "char.short",
            max_len: 2,
        }));
        table.register_strategy(Box::new(Ambiguous));
        table
    }

    /// Append a strategy at the lowest priority.
    pub fn register_strategy(&mut self, strategy: Box<dyn SamplingStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn select(&self, domain: &ColumnDomain<'_>) -> Option<&dyn SamplingStrategy> {
        self.strategies
            .iter()
            .find(|strategy| strategy.matches(domain))
            .map(|strategy| strategy.as_ref())
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.id()).collect()
    }
}

struct UnknownBound;

impl SamplingStrategy for UnknownBound {
    fn id(&self) -> &'static str {
        "null.unknown_bound"
    }

    fn matches(&self, domain: &ColumnDomain<'_>) -> bool {
        !domain.bound.has_both()
    }

    fn sample(
        &self,
        _domain: &ColumnDomain<'_>,
        rows: usize,
        _rng: &mut dyn rand::RngCore,
    ) -> Vec<SampleValue> {
        vec![SampleValue::Null; rows]
    }
}

/// Digits 0-9 are emitted as one-character text so `CHECK(length <= 1)` holds.
struct SingleDigit;

impl SamplingStrategy for SingleDigit {
    fn id(&self) -> &'static str {
        "digit.single"
    }

    fn matches(&self, domain: &ColumnDomain<'_>) -> bool {
        domain.bound.single_digit_range().is_some()
    }

    fn sample(
        &self,
        domain: &ColumnDomain<'_>,
        rows: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Vec<SampleValue> {
        let Some((lo, hi)) = domain.bound.single_digit_range() else {
            return vec![SampleValue::Null; rows];
        };
        (0..rows)
            .map(|_| SampleValue::Text(rng.random_range(lo..=hi).to_string()))
            .collect()
    }
}

/// Flag columns only ever take one of their two recorded codes.
struct BooleanFlag;

impl SamplingStrategy for BooleanFlag {
    fn id(&self) -> &'static str {
        "boolean.flag"
    }

    fn matches(&self, domain: &ColumnDomain<'_>) -> bool {
        domain.is_boolean && domain.bound.single_chars().is_some()
    }

    fn sample(
        &self,
        domain: &ColumnDomain<'_>,
        rows: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Vec<SampleValue> {
        let (Some(min), Some(max)) = (domain.bound.min.as_deref(), domain.bound.max.as_deref())
        else {
            return vec![SampleValue::Null; rows];
        };
        (0..rows)
            .map(|_| {
                let pick = if rng.random_bool(0.5) { min } else { max };
                SampleValue::Text(pick.to_string())
            })
            .collect()
    }
}

struct CharRange {
    id: &'static str,
    max_len: usize,
}

impl SamplingStrategy for CharRange {
    fn id(&self) -> &'static str {
        self.id
    }

    fn matches(&self, domain: &ColumnDomain<'_>) -> bool {
        domain.bound.char_range(self.max_len).is_some()
    }

    fn sample(
        &self,
        domain: &ColumnDomain<'_>,
        rows: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Vec<SampleValue> {
        let Some((lo, hi)) = domain.bound.char_range(self.max_len) else {
            return vec![SampleValue::Null; rows];
        };
        (0..rows)
            .map(|_| SampleValue::Text(random_char(lo, hi, rng).to_string()))
            .collect()
    }
}

struct IntRange {
    id: &'static str,
    /// Only accept columns with integer affinity.
    declared_only: bool,
}

impl SamplingStrategy for IntRange {
    fn id(&self) -> &'static str {
        self.id
    }

    fn matches(&self, domain: &ColumnDomain<'_>) -> bool {
        (!self.declared_only || domain.column.declared_type.is_integer())
            && domain.bound.int_range().is_some()
    }

    fn sample(
        &self,
        domain: &ColumnDomain<'_>,
        rows: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Vec<SampleValue> {
        let Some((lo, hi)) = domain.bound.int_range() else {
            return vec![SampleValue::Null; rows];
        };
        (0..rows)
            .map(|_| SampleValue::Integer(rng.random_range(lo..=hi)))
            .collect()
    }
}

struct FloatRange {
    id: &'static str,
    declared_only: bool,
}

impl SamplingStrategy for FloatRange {
    fn id(&self) -> &'static str {
        self.id
    }

    fn matches(&self, domain: &ColumnDomain<'_>) -> bool {
        (!self.declared_only || domain.column.declared_type.is_real())
            && domain.bound.float_range().is_some()
    }

    fn sample(
        &self,
        domain: &ColumnDomain<'_>,
        rows: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Vec<SampleValue> {
        let Some((lo, hi)) = domain.bound.float_range() else {
            return vec![SampleValue::Null; rows];
        };
        (0..rows)
            .map(|_| SampleValue::Real(rng.random_range(lo..=hi)))
            .collect()
    }
}

struct DateRange;

impl SamplingStrategy for DateRange {
    fn id(&self) -> &'static str {
        "date.range"
    }

    fn matches(&self, domain: &ColumnDomain<'_>) -> bool {
        domain.bound.date_range().is_some()
    }

    fn sample(
        &self,
        domain: &ColumnDomain<'_>,
        rows: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Vec<SampleValue> {
        let Some((lo, hi)) = domain.bound.date_range() else {
            return vec![SampleValue::Null; rows];
        };
        let days = (hi - lo).num_days();
        (0..rows)
            .map(|_| {
                let date = lo + Duration::days(rng.random_range(0..=days));
                SampleValue::Text(date.format("%Y-%m-%d").to_string())
            })
            .collect()
    }
}

/// Bounds exist but admit no interpretation.
struct Ambiguous;

impl SamplingStrategy for Ambiguous {
    fn id(&self) -> &'static str {
        "null.ambiguous"
    }

    fn matches(&self, _domain: &ColumnDomain<'_>) -> bool {
        true
    }

    fn sample(
        &self,
        _domain: &ColumnDomain<'_>,
        rows: usize,
        _rng: &mut dyn rand::RngCore,
    ) -> Vec<SampleValue> {
        vec![SampleValue::Null; rows]
    }
}
