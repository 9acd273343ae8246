use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crmseed_core::{
    BoundRecord, ColumnBound, ColumnSpec, Error, GeneratedTable, Result, SampleStore, SampleValue,
    TableSchema,
};

use crate::ddl::{TableDefinition, build_create_table_sql};
use crate::naming::{quote_ident, sanitize_column_name, sanitize_table_name};
use crate::options::StoreOptions;

mod mapper;
mod queries;

pub use mapper::{AlignedBatch, align_batch, parse_check_lengths};

use queries::{
    COLUMN_COMMENT_TABLE, COLUMN_MIN_MAX_TABLE, META_TABLE, TABLE_COMMENT_TABLE, db_err,
};

/// SQLite-backed sample store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` with default options.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Self::connect_with_options(path, StoreOptions::default()).await
    }

    pub async fn connect_with_options(path: impl AsRef<Path>, opts: StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        if opts.create_if_missing
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let connect_opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(opts.create_if_missing);
        let pool = SqlitePoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(opts.acquire_timeout)
            .connect_with(connect_opts)
            .await
            .map_err(db_err)?;

        debug!(path = %path.display(), "sqlite store opened");
        Self::from_pool(pool).await
    }

    /// Private in-memory database; a single connection keeps it alive.
    pub async fn connect_in_memory() -> Result<Self> {
        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:").map_err(db_err)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_opts)
            .await
            .map_err(db_err)?;
        Self::from_pool(pool).await
    }

    /// Wrap a pre-configured pool, creating the metadata tables if needed.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        queries::ensure_meta_tables(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let table = sanitize_table_name(table);
        Ok(queries::fetch_table_sql(&self.pool, &table).await?.is_some())
    }

    /// Registered tables that still exist, sorted by name.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let existing: BTreeSet<String> = queries::list_existing_tables(&self.pool)
            .await?
            .into_iter()
            .collect();
        let mut names: Vec<String> = queries::list_registered_tables(&self.pool)
            .await?
            .into_iter()
            .filter(|name| existing.contains(name))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Tables with at least one recorded bound.
    pub async fn tables_with_bounds(&self) -> Result<Vec<String>> {
        queries::list_tables_with_bounds(&self.pool).await
    }

    pub async fn row_count(&self, table: &str) -> Result<u64> {
        let table = self.require_table(table).await?;
        let count = queries::count_rows(&self.pool, &table).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Drop a table and forget its registration.
    pub async fn drop_table(&self, table: &str) -> Result<()> {
        let table = sanitize_table_name(table);
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(&table)))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query(&format!("DELETE FROM {META_TABLE} WHERE name = ?"))
            .bind(&table)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        info!(table = %table, "table dropped");
        Ok(())
    }

    /// Delete every row of a table, keeping its definition and bounds.
    ///
    /// Returns the number of rows removed.
    pub async fn clear_table(&self, table: &str) -> Result<u64> {
        let table = self.require_table(table).await?;
        let result = sqlx::query(&format!("DELETE FROM {}", quote_ident(&table)))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        let removed = result.rows_affected();
        info!(table = %table, removed, "table cleared");
        Ok(removed)
    }

    /// Upsert (min, max) bounds. Records missing a table or column are skipped.
    pub async fn save_bounds(&self, records: &[BoundRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "INSERT OR REPLACE INTO {COLUMN_MIN_MAX_TABLE} (table_name, column_name, min_val, max_val)
             VALUES (?, ?, ?, ?)"
        );
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut saved = 0;
        for record in records {
            if record.table_name.trim().is_empty() || record.column_name.trim().is_empty() {
                continue;
            }
            sqlx::query(&sql)
                .bind(sanitize_table_name(&record.table_name))
                .bind(sanitize_column_name(&record.column_name))
                .bind(mapper::non_blank(record.min_value.clone()))
                .bind(mapper::non_blank(record.max_value.clone()))
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            saved += 1;
        }
        tx.commit().await.map_err(db_err)?;

        let skipped = records.len() as u64 - saved;
        if skipped > 0 {
            warn!(skipped, "bound records without table or column were skipped");
        }
        info!(saved, "bounds saved");
        Ok(saved)
    }

    /// Create a table from a schema-sheet definition and record its metadata.
    ///
    /// Returns the executed DDL.
    pub async fn create_table(&self, definition: &TableDefinition) -> Result<String> {
        let sql = build_create_table_sql(definition)?;
        let table = definition.table_name();

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(&sql).execute(&mut *tx).await.map_err(db_err)?;
        sqlx::query(&format!("INSERT OR REPLACE INTO {META_TABLE} (name) VALUES (?)"))
            .bind(&table)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if let Some(name_ko) = mapper::non_blank(definition.name_ko.clone()) {
            sqlx::query(&format!(
                "INSERT OR REPLACE INTO {TABLE_COMMENT_TABLE} (table_name, name_ko) VALUES (?, ?)"
            ))
            .bind(&table)
            .bind(name_ko)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        let column_sql = format!(
            "INSERT OR REPLACE INTO {COLUMN_COMMENT_TABLE}
             (table_name, column_name, name_ko, data_type, data_length, scale_val, pk, null_yn, default_val)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        for column in &definition.columns {
            sqlx::query(&column_sql)
                .bind(&table)
                .bind(sanitize_column_name(&column.name))
                .bind(mapper::non_blank(column.name_ko.clone()))
                .bind(mapper::non_blank(column.data_type.clone()))
                .bind(mapper::non_blank(column.data_length.clone()))
                .bind(mapper::non_blank(column.scale.clone()))
                .bind(if column.primary_key { "Y" } else { "N" })
                .bind(if column.not_null { "N" } else { "Y" })
                .bind(mapper::non_blank(column.default_value.clone()))
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;

        info!(table = %table, columns = definition.columns.len(), "table created");
        Ok(sql)
    }

    async fn require_table(&self, table: &str) -> Result<String> {
        let table = sanitize_table_name(table);
        if queries::fetch_table_sql(&self.pool, &table).await?.is_none() {
            return Err(Error::InvalidInput(format!("table '{table}' does not exist")));
        }
        Ok(table)
    }

    async fn load_schema(&self, table: &str) -> Result<Option<TableSchema>> {
        let Some(ddl) = queries::fetch_table_sql(&self.pool, table).await? else {
            return Ok(None);
        };
        let check_lengths = parse_check_lengths(&ddl);
        let columns = mapper::map_columns(queries::list_columns(&self.pool, table).await?, &check_lengths);
        Ok(Some(TableSchema::new(table, columns)))
    }

    async fn aligned_batch(&self, table: &str, rows: &GeneratedTable) -> Result<(String, AlignedBatch)> {
        if rows.is_empty() {
            return Err(Error::InvalidInput("no rows to insert".to_string()));
        }
        let table = sanitize_table_name(table);
        let schema = self
            .load_schema(&table)
            .await?
            .ok_or_else(|| Error::InvalidInput(format!("table '{table}' does not exist")))?;
        let target: &[ColumnSpec] = &schema.columns;
        Ok((table, align_batch(target, rows)))
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &SampleValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SampleValue::Null => query.bind(None::<String>),
        SampleValue::Integer(value) => query.bind(*value),
        SampleValue::Real(value) => query.bind(*value),
        SampleValue::Text(value) => query.bind(value.clone()),
    }
}

fn diagnostic_message(err: &sqlx::Error) -> String {
    let message = err
        .as_database_error()
        .map(|db| db.message().to_string())
        .unwrap_or_else(|| err.to_string());
    if message.trim().is_empty() {
        "unknown insert failure".to_string()
    } else {
        message
    }
}

#[async_trait::async_trait]
impl SampleStore for SqliteStore {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    async fn get_schema(&self, table: &str) -> Result<Option<TableSchema>> {
        self.load_schema(&sanitize_table_name(table)).await
    }

    async fn get_bounds(&self, table: &str) -> Result<BTreeMap<String, ColumnBound>> {
        let table = sanitize_table_name(table);
        Ok(mapper::map_bounds(queries::list_bounds(&self.pool, &table).await?))
    }

    async fn get_max_lengths(&self, table: &str) -> Result<BTreeMap<String, u32>> {
        let table = sanitize_table_name(table);
        Ok(mapper::map_data_lengths(
            queries::list_data_lengths(&self.pool, &table).await?,
        ))
    }

    async fn insert_rows(&self, table: &str, rows: &GeneratedTable) -> Result<u64> {
        let (table, aligned) = self.aligned_batch(table, rows).await?;
        let sql = aligned.insert_sql(&table, true);

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut inserted = 0;
        for row in &aligned.rows {
            let mut query = sqlx::query(&sql);
            for value in row {
                query = bind_value(query, value);
            }
            inserted += query.execute(&mut *tx).await.map_err(db_err)?.rows_affected();
        }
        tx.commit().await.map_err(db_err)?;

        info!(
            table = %table,
            generated = rows.row_count(),
            inserted,
            "rows inserted"
        );
        Ok(inserted)
    }

    async fn insert_one_row_diagnostic(
        &self,
        table: &str,
        rows: &GeneratedTable,
    ) -> Result<Option<String>> {
        let (table, aligned) = self.aligned_batch(table, &rows.head(1)).await?;
        let sql = aligned.insert_sql(&table, false);

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut query = sqlx::query(&sql);
        if let Some(row) = aligned.rows.first() {
            for value in row {
                query = bind_value(query, value);
            }
        }
        let outcome = query.execute(&mut *tx).await;
        tx.rollback().await.map_err(db_err)?;

        match outcome {
            Ok(_) => Ok(None),
            Err(err) => {
                let message = diagnostic_message(&err);
                debug!(table = %table, error = %message, "diagnostic insert rejected");
                Ok(Some(message))
            }
        }
    }
}
