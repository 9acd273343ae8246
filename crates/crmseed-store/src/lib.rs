//! SQLite storage for crmseed: schema snapshots, bounds, inserts and DDL.

pub mod ddl;
pub mod import;
pub mod naming;
pub mod options;
pub mod sqlite;

pub use ddl::{ColumnDefinition, TableDefinition, build_create_table_sql};
pub use import::{read_bounds_csv, read_rows_csv, read_schema_csv};
pub use naming::{sanitize_column_name, sanitize_table_name};
pub use options::StoreOptions;
pub use sqlite::SqliteStore;

pub use crmseed_core::SampleStore;
