use reportdb::core::{Column, ColumnDef, DataType};
use reportdb::schema::SCHEMA_TABLE;
use reportdb::service::CreateTableRequest;
use reportdb::storage::{NamedRow, TableSchema};
use reportdb::ReportDb;
use serde_json::{Value as Json, json};

fn named(pairs: &[(&str, Json)]) -> NamedRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn table_request(name: &str, column: &str) -> CreateTableRequest {
    CreateTableRequest {
        table_name: name.to_string(),
        columns: vec![ColumnDef::new(column, "TEXT")],
    }
}

#[tokio::test]
async fn test_initialize_rebuilds_bindings_from_schema_store() {
    let db = ReportDb::in_memory().await.unwrap();
    db.tables.create_table(&table_request("alpha", "a")).await.unwrap();
    db.tables.create_table(&table_request("beta", "b")).await.unwrap();

    // force path: clears the registered bindings, then rebuilds them from
    // the persisted schema rows
    let summary = db.registry.force_reinitialize().await.unwrap();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);

    let status = db.registry.initialization_status().await;
    assert!(status.initialized);
    assert_eq!(status.model_count, 2);
    assert!(status.registered_models.contains(&"alpha".to_string()));
    assert!(status.registered_models.contains(&"beta".to_string()));
}

#[tokio::test]
async fn test_initialize_is_idempotent_until_forced() {
    let db = ReportDb::in_memory().await.unwrap();
    db.tables.create_table(&table_request("alpha", "a")).await.unwrap();

    let first = db.registry.initialize_all_models().await.unwrap();
    assert_eq!(first.succeeded, 1);
    assert!(db.registry.is_ready());

    // second call is a deliberate no-op
    let second = db.registry.initialize_all_models().await.unwrap();
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.failed, 0);
    assert_eq!(db.registry.initialization_status().await.model_count, 1);
}

#[tokio::test]
async fn test_malformed_schema_row_is_isolated() {
    let db = ReportDb::in_memory().await.unwrap();
    db.tables.create_table(&table_request("alpha", "a")).await.unwrap();
    db.tables.create_table(&table_request("beta", "b")).await.unwrap();

    // a corrupted row: columns is not an array
    db.engine
        .insert_row(
            SCHEMA_TABLE,
            &named(&[
                ("table_name", json!("broken")),
                ("schema_json", json!(r#"{"tableName":"broken","columns":"oops"}"#)),
            ]),
        )
        .await
        .unwrap();

    let summary = db.registry.force_reinitialize().await.unwrap();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_tables, vec!["broken".to_string()]);

    // the corrupted table never produced a binding
    assert!(db.registry.get_model("broken").await.is_none());
    assert!(db.registry.get_model("alpha").await.is_some());
}

#[tokio::test]
async fn test_initialize_recreates_missing_physical_table() {
    let db = ReportDb::in_memory().await.unwrap();

    // a schema row without a physical table behind it (fresh database)
    let mut qty = ColumnDef::new("qty", "INTEGER");
    qty.required = true;
    db.schema_store.save_schema("virtual", &[qty]).await.unwrap();

    let summary = db.registry.initialize_all_models().await.unwrap();
    assert_eq!(summary.succeeded, 1);

    // binding is immediately query-capable
    db.tables
        .insert_data("virtual", &named(&[("qty", json!(3))]))
        .await
        .unwrap();
    let rows = db.tables.get_table_data("virtual").await.unwrap();
    assert_eq!(rows[0]["qty"], json!(3));
    assert_eq!(rows[0]["id"], json!(1));
}

#[tokio::test]
async fn test_auto_discovery_registers_engine_tables() {
    let db = ReportDb::in_memory().await.unwrap();

    // defined outside the dynamic path, as a fixed-schema table would be
    db.engine
        .create_table(TableSchema::new(
            "sales_table",
            vec![
                Column::new("id", DataType::Integer).primary_key().auto_increment(),
                Column::new("location", DataType::Text),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(db.registry.initialization_status().await.model_count, 0);

    let binding = db.registry.get_model("sales_table").await.unwrap();
    assert!(binding.has_attribute("location").await);

    // discovery registered it as a side effect
    let status = db.registry.initialization_status().await;
    assert_eq!(status.model_count, 1);
    assert!(status.registered_models.contains(&"sales_table".to_string()));

    assert!(db.registry.get_model("nowhere").await.is_none());
}

#[tokio::test]
async fn test_register_model_overwrites_in_place() {
    let db = ReportDb::in_memory().await.unwrap();
    db.tables.create_table(&table_request("alpha", "a")).await.unwrap();

    let binding = db.registry.get_model("alpha").await.unwrap();
    binding
        .add_attribute(reportdb::model::Attribute {
            name: "extra".to_string(),
            data_type: DataType::Text,
            nullable: true,
            primary_key: false,
            auto_increment: false,
        })
        .await;
    assert!(binding.has_attribute("extra").await);

    // re-registration replaces the binding; the ad-hoc attribute is gone
    let summary = db.registry.force_reinitialize().await.unwrap();
    assert_eq!(summary.succeeded, 1);
    let rebuilt = db.registry.get_model("alpha").await.unwrap();
    assert!(!rebuilt.has_attribute("extra").await);
}
