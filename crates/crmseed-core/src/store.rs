use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::bound::ColumnBound;
use crate::error::Result;
use crate::schema::TableSchema;
use crate::value::GeneratedTable;

/// Storage collaborator consumed by the sample generator.
///
/// The generator only reads through this trait; inserting is a separate
/// step taken by the caller once a batch has been produced.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Returns the engine identifier (e.g. `sqlite`).
    fn engine(&self) -> &'static str;

    /// Column snapshot for a table, `None` when the table cannot be resolved.
    async fn get_schema(&self, table: &str) -> Result<Option<TableSchema>>;

    /// Recorded (min, max) bounds keyed by column name.
    async fn get_bounds(&self, table: &str) -> Result<BTreeMap<String, ColumnBound>>;

    /// Declared maximum lengths keyed by column name.
    async fn get_max_lengths(&self, table: &str) -> Result<BTreeMap<String, u32>>;

    /// Insert a batch, silently skipping rows that violate uniqueness.
    ///
    /// Returns the number of rows actually inserted.
    async fn insert_rows(&self, table: &str, rows: &GeneratedTable) -> Result<u64>;

    /// Attempt a plain insert of the first row and report why it fails.
    ///
    /// Returns `None` when the row would have been accepted. Never leaves
    /// the row behind.
    async fn insert_one_row_diagnostic(
        &self,
        table: &str,
        rows: &GeneratedTable,
    ) -> Result<Option<String>>;
}
