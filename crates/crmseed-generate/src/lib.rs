//! Constrained sample-data generation for crmseed.
//!
//! Given a table snapshot and recorded (min, max) bounds per column, this
//! crate plans key columns, samples the remaining ones through an ordered
//! strategy table and caps values at their declared lengths. Stores are only
//! read while generating; inserting is a separate step of
//! [`GenerationEngine::populate_table`].

pub mod bounds;
pub mod engine;
pub mod errors;
pub mod keys;
pub mod model;
pub mod output;
pub mod postprocess;
pub mod strategies;

pub use bounds::NormalizedBound;
pub use engine::GenerationEngine;
pub use errors::GenerationError;
pub use keys::{ColumnPlan, plan_column};
pub use model::{ColumnReport, GenerateOptions, GenerationReport, PopulateOutcome};
pub use output::csv::write_generated_csv;
pub use strategies::{ColumnDomain, SamplingStrategy, StrategyTable};
