use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use crmseed_core::{BoundRecord, DeclaredType, GeneratedTable, SampleStore, SampleValue};
use crmseed_store::{ColumnDefinition, SqliteStore, TableDefinition, read_rows_csv};

fn temp_db_path(label: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "crmseed_store_{label}_{}/crm.sqlite",
        uuid::Uuid::new_v4()
    ));
    path
}

fn column(name: &str, data_type: &str) -> ColumnDefinition {
    ColumnDefinition {
        name: name.to_string(),
        data_type: Some(data_type.to_string()),
        ..ColumnDefinition::default()
    }
}

fn customer_definition() -> TableDefinition {
    let mut cstno = column("CSTNO", "VARCHAR");
    cstno.primary_key = true;
    cstno.data_length = Some("16".to_string());
    cstno.name_ko = Some("고객번호".to_string());

    let mut flag = column("IVTG_CRED_CALG_CD", "CHAR");
    flag.data_length = Some("1".to_string());
    flag.not_null = true;

    let mut balance = column("BAL_AMT", "NUMBER");
    balance.not_null = true;

    TableDefinition {
        name: "customer".to_string(),
        name_ko: Some("고객".to_string()),
        columns: vec![cstno, flag, balance, column("MEMO", "TEXT")],
    }
}

fn text(value: &str) -> SampleValue {
    SampleValue::Text(value.to_string())
}

#[tokio::test]
async fn created_table_round_trips_through_schema_snapshot() -> Result<()> {
    let store = SqliteStore::connect(temp_db_path("schema")).await?;
    let ddl = store.create_table(&customer_definition()).await?;
    assert!(ddl.contains("CHECK(length(\"CSTNO\") <= 16)"));

    let schema = store
        .get_schema("customer")
        .await?
        .ok_or_else(|| anyhow!("expected customer schema"))?;
    let names: Vec<&str> = schema.columns.iter().map(|col| col.name.as_str()).collect();
    assert_eq!(names, vec!["CSTNO", "IVTG_CRED_CALG_CD", "BAL_AMT", "MEMO"]);

    let cstno = schema.column("cstno").context("CSTNO column")?;
    assert!(cstno.is_primary_key);
    assert_eq!(cstno.declared_type, DeclaredType::Text);
    assert_eq!(cstno.max_length, Some(16));

    let flag = schema.column("IVTG_CRED_CALG_CD").context("flag column")?;
    assert!(flag.not_null);
    assert_eq!(flag.max_length, Some(1));

    let lengths = store.get_max_lengths("customer").await?;
    assert_eq!(lengths.get("CSTNO"), Some(&16));
    assert_eq!(lengths.get("IVTG_CRED_CALG_CD"), Some(&1));
    assert!(!lengths.contains_key("MEMO"));

    assert_eq!(store.list_tables().await?, vec!["customer".to_string()]);
    assert!(store.get_schema("missing").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn bounds_are_upserted_and_blank_values_stored_as_null() -> Result<()> {
    let store = SqliteStore::connect(temp_db_path("bounds")).await?;
    let records = vec![
        BoundRecord {
            table_name: "customer".to_string(),
            column_name: "BAL_AMT".to_string(),
            min_value: Some("0".to_string()),
            max_value: Some("1000".to_string()),
        },
        BoundRecord {
            table_name: "customer".to_string(),
            column_name: "MEMO".to_string(),
            min_value: Some("  ".to_string()),
            max_value: None,
        },
        BoundRecord {
            table_name: " ".to_string(),
            column_name: "ignored".to_string(),
            min_value: None,
            max_value: None,
        },
    ];
    assert_eq!(store.save_bounds(&records).await?, 2);

    let replacement = vec![BoundRecord {
        table_name: "customer".to_string(),
        column_name: "BAL_AMT".to_string(),
        min_value: Some("10".to_string()),
        max_value: Some("20".to_string()),
    }];
    store.save_bounds(&replacement).await?;

    let bounds = store.get_bounds("customer").await?;
    let balance = bounds.get("BAL_AMT").context("balance bound")?;
    assert_eq!(balance.min_value.as_deref(), Some("10"));
    assert_eq!(balance.max_value.as_deref(), Some("20"));
    let memo = bounds.get("MEMO").context("memo bound")?;
    assert_eq!(memo.min_value, None);

    assert_eq!(store.tables_with_bounds().await?, vec!["customer".to_string()]);
    Ok(())
}

#[tokio::test]
async fn insert_skips_duplicates_and_fills_not_null_columns() -> Result<()> {
    let store = SqliteStore::connect(temp_db_path("insert")).await?;
    store.create_table(&customer_definition()).await?;

    let batch = GeneratedTable::from_columns(
        "customer",
        vec![
            (
                "CSTNO".to_string(),
                vec![
                    text("C000000000000001"),
                    text("C000000000000002"),
                    text("C000000000000001"),
                ],
            ),
            (
                "IVTG_CRED_CALG_CD".to_string(),
                vec![text("A"), text("B"), text("C")],
            ),
        ],
    );

    let inserted = store.insert_rows("customer", &batch).await?;
    assert_eq!(inserted, 2);
    assert_eq!(store.row_count("customer").await?, 2);

    let balances: Vec<i64> = sqlx::query_scalar("select BAL_AMT from customer order by CSTNO")
        .fetch_all(store.pool())
        .await?;
    assert_eq!(balances, vec![0, 0]);
    Ok(())
}

#[tokio::test]
async fn diagnostic_insert_reports_violation_and_leaves_no_row() -> Result<()> {
    let store = SqliteStore::connect(temp_db_path("diagnostic")).await?;
    store.create_table(&customer_definition()).await?;

    let batch = GeneratedTable::from_columns(
        "customer",
        vec![
            ("CSTNO".to_string(), vec![text("C000000000000001")]),
            ("IVTG_CRED_CALG_CD".to_string(), vec![text("TOO_LONG")]),
        ],
    );

    assert_eq!(store.insert_rows("customer", &batch).await?, 0);
    let message = store
        .insert_one_row_diagnostic("customer", &batch)
        .await?
        .ok_or_else(|| anyhow!("expected a diagnostic message"))?;
    assert!(message.to_lowercase().contains("check"), "message: {message}");
    assert_eq!(store.row_count("customer").await?, 0);

    let valid = GeneratedTable::from_columns(
        "customer",
        vec![
            ("CSTNO".to_string(), vec![text("C000000000000009")]),
            ("IVTG_CRED_CALG_CD".to_string(), vec![text("0")]),
        ],
    );
    assert_eq!(store.insert_one_row_diagnostic("customer", &valid).await?, None);
    assert_eq!(store.row_count("customer").await?, 0);
    Ok(())
}

#[tokio::test]
async fn insert_rejects_empty_batches_and_unknown_tables() -> Result<()> {
    let store = SqliteStore::connect_in_memory().await?;
    store.create_table(&customer_definition()).await?;

    let empty = GeneratedTable::from_columns("customer", Vec::new());
    assert!(store.insert_rows("customer", &empty).await.is_err());

    let batch = GeneratedTable::from_columns("nowhere", vec![("A".to_string(), vec![text("x")])]);
    assert!(store.insert_rows("nowhere", &batch).await.is_err());
    Ok(())
}

#[tokio::test]
async fn lone_integer_key_is_assigned_by_the_store() -> Result<()> {
    let store = SqliteStore::connect_in_memory().await?;
    let mut id = column("ID", "INTEGER");
    id.primary_key = true;
    let definition = TableDefinition {
        name: "events".to_string(),
        name_ko: None,
        columns: vec![id, column("KIND", "TEXT")],
    };
    store.create_table(&definition).await?;

    let batch = GeneratedTable::from_columns(
        "events",
        vec![
            ("ID".to_string(), vec![SampleValue::Null, SampleValue::Null]),
            ("KIND".to_string(), vec![text("a"), text("b")]),
        ],
    );
    assert_eq!(store.insert_rows("events", &batch).await?, 2);

    let ids: Vec<i64> = sqlx::query_scalar("select ID from events order by ID")
        .fetch_all(store.pool())
        .await?;
    assert_eq!(ids, vec![1, 2]);

    store.drop_table("events").await?;
    assert!(store.list_tables().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn csv_rows_load_with_na_tokens_and_duplicate_keys() -> Result<()> {
    let store = SqliteStore::connect(temp_db_path("load")).await?;
    store.create_table(&customer_definition()).await?;

    let csv_path = std::env::temp_dir().join(format!("crmseed_load_{}.csv", uuid::Uuid::new_v4()));
    std::fs::write(
        &csv_path,
        "CSTNO,IVTG_CRED_CALG_CD,BAL_AMT,EXTRA\n\
         C000000000000001,A,1500,x\n\
         C000000000000002,B,#N/A,y\n\
         C000000000000001,C,99,z\n",
    )?;
    let batch = read_rows_csv(&csv_path, "customer")?;
    let _ = std::fs::remove_file(&csv_path);
    assert_eq!(batch.row_count(), 3);
    assert_eq!(batch.rows[1][2], SampleValue::Null);

    assert_eq!(store.insert_rows("customer", &batch).await?, 2);
    let balances: Vec<i64> = sqlx::query_scalar("select BAL_AMT from customer order by CSTNO")
        .fetch_all(store.pool())
        .await?;
    assert_eq!(balances, vec![1500, 0]);

    assert_eq!(store.insert_rows("customer", &batch).await?, 0);
    let reason = store
        .insert_one_row_diagnostic("customer", &batch)
        .await?
        .context("duplicate key diagnostic")?;
    assert!(reason.contains("UNIQUE"));
    Ok(())
}

#[tokio::test]
async fn clear_table_keeps_definition_and_bounds() -> Result<()> {
    let store = SqliteStore::connect(temp_db_path("clear")).await?;
    store.create_table(&customer_definition()).await?;
    store
        .save_bounds(&[BoundRecord {
            table_name: "customer".to_string(),
            column_name: "BAL_AMT".to_string(),
            min_value: Some("0".to_string()),
            max_value: Some("1000".to_string()),
        }])
        .await?;

    let batch = GeneratedTable::from_columns(
        "customer",
        vec![(
            "CSTNO".to_string(),
            vec![text("C000000000000001"), text("C000000000000002")],
        )],
    );
    assert_eq!(store.insert_rows("customer", &batch).await?, 2);

    assert_eq!(store.clear_table("customer").await?, 2);
    assert_eq!(store.row_count("customer").await?, 0);
    assert_eq!(store.list_tables().await?, vec!["customer".to_string()]);
    assert_eq!(store.tables_with_bounds().await?, vec!["customer".to_string()]);
    assert_eq!(store.insert_rows("customer", &batch).await?, 2);

    assert!(store.clear_table("missing").await.is_err());
    Ok(())
}
