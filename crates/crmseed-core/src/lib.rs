//! Core contracts and helpers for crmseed.
//!
//! This crate defines the table snapshot and bound types, generated values,
//! naming conventions, and the storage contract shared by the store, the
//! generator and the CLI.

pub mod bound;
pub mod conventions;
pub mod error;
pub mod schema;
pub mod store;
pub mod types;
pub mod validation;
pub mod value;

pub use bound::{BoundRecord, ColumnBound};
pub use conventions::{ColumnConventions, IdentifierFormat};
pub use error::{Error, Result};
pub use schema::{ColumnSpec, TableSchema};
pub use store::SampleStore;
pub use types::DeclaredType;
pub use validation::validate_table_schema;
pub use value::{GeneratedTable, SampleValue};
