use sqlx::{Row, SqlitePool};

use crmseed_core::{Error, Result};

use crate::naming::quote_ident;

pub const META_TABLE: &str = "_crm_tables";
pub const TABLE_COMMENT_TABLE: &str = "_table_comment";
pub const COLUMN_COMMENT_TABLE: &str = "_column_comment";
pub const COLUMN_MIN_MAX_TABLE: &str = "_column_min_max";

pub(crate) fn db_err(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

pub async fn ensure_meta_tables(pool: &SqlitePool) -> Result<()> {
    let statements = [
        format!("CREATE TABLE IF NOT EXISTS {META_TABLE} (name TEXT PRIMARY KEY)"),
        format!(
            "CREATE TABLE IF NOT EXISTS {TABLE_COMMENT_TABLE} (
              table_name TEXT PRIMARY KEY,
              name_ko TEXT
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {COLUMN_COMMENT_TABLE} (
              table_name TEXT,
              column_name TEXT,
              name_ko TEXT,
              data_type TEXT,
              data_length TEXT,
              scale_val TEXT,
              pk TEXT,
              null_yn TEXT,
              default_val TEXT,
              PRIMARY KEY (table_name, column_name)
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {COLUMN_MIN_MAX_TABLE} (
              table_name TEXT,
              column_name TEXT,
              min_val TEXT,
              max_val TEXT,
              PRIMARY KEY (table_name, column_name)
            )"
        ),
    ];

    for sql in &statements {
        sqlx::query(sql).execute(pool).await.map_err(db_err)?;
    }
    Ok(())
}

/// DDL of a table as stored in `sqlite_master`, `None` if the table is missing.
pub async fn fetch_table_sql(pool: &SqlitePool, table: &str) -> Result<Option<String>> {
    let row = sqlx::query("select name, sql from sqlite_master where type = 'table' and name = ?")
        .bind(table)
        .fetch_optional(pool)
        .await
        .map_err(db_err)?;

    match row {
        Some(row) => {
            let sql: Option<String> = row.try_get("sql").map_err(db_err)?;
            Ok(Some(sql.unwrap_or_default()))
        }
        None => Ok(None),
    }
}

pub async fn list_existing_tables(pool: &SqlitePool) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>("select name from sqlite_master where type = 'table'")
        .fetch_all(pool)
        .await
        .map_err(db_err)
}

pub async fn list_registered_tables(pool: &SqlitePool) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(&format!("select name from {META_TABLE} order by name"))
        .fetch_all(pool)
        .await
        .map_err(db_err)
}

pub struct RawColumn {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    /// 1-based position within the primary key, 0 when not a key column.
    pub pk_position: i64,
}

pub async fn list_columns(pool: &SqlitePool, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", quote_ident(table)))
        .fetch_all(pool)
        .await
        .map_err(db_err)?;

    rows.into_iter()
        .map(|row| {
            let declared_type: Option<String> = row.try_get("type").map_err(db_err)?;
            let not_null: i64 = row.try_get("notnull").map_err(db_err)?;
            Ok(RawColumn {
                name: row.try_get("name").map_err(db_err)?,
                declared_type: declared_type.unwrap_or_default(),
                not_null: not_null != 0,
                default_value: row.try_get("dflt_value").map_err(db_err)?,
                pk_position: row.try_get("pk").map_err(db_err)?,
            })
        })
        .collect()
}

pub struct RawBound {
    pub column_name: String,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
}

pub async fn list_bounds(pool: &SqlitePool, table: &str) -> Result<Vec<RawBound>> {
    let rows = sqlx::query(&format!(
        "select column_name, min_val, max_val from {COLUMN_MIN_MAX_TABLE} where table_name = ? order by column_name"
    ))
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    rows.into_iter()
        .map(|row| {
            Ok(RawBound {
                column_name: row.try_get("column_name").map_err(db_err)?,
                min_value: row.try_get("min_val").map_err(db_err)?,
                max_value: row.try_get("max_val").map_err(db_err)?,
            })
        })
        .collect()
}

pub async fn list_tables_with_bounds(pool: &SqlitePool) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(&format!(
        "select distinct table_name from {COLUMN_MIN_MAX_TABLE} order by table_name"
    ))
    .fetch_all(pool)
    .await
    .map_err(db_err)
}

pub struct RawDataLength {
    pub column_name: String,
    pub data_length: String,
}

pub async fn list_data_lengths(pool: &SqlitePool, table: &str) -> Result<Vec<RawDataLength>> {
    let rows = sqlx::query(&format!(
        "select column_name, data_length from {COLUMN_COMMENT_TABLE}
         where table_name = ? and data_length is not null and data_length != ''"
    ))
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    rows.into_iter()
        .map(|row| {
            Ok(RawDataLength {
                column_name: row.try_get("column_name").map_err(db_err)?,
                data_length: row.try_get("data_length").map_err(db_err)?,
            })
        })
        .collect()
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(&format!("select count(*) from {}", quote_ident(table)))
        .fetch_one(pool)
        .await
        .map_err(db_err)
}
