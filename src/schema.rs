//! Persistence of dynamic table schemas.
//!
//! One row per dynamically-created table lives in the `table_schemas`
//! metadata table: the table name plus a JSON-encoded column list. This is
//! the source of truth the model registry rebuilds bindings from after a
//! process restart.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::core::{Column, ColumnDef, DataType, DbError, Result, Value};
use crate::storage::{NamedRow, StorageEngine, TableSchema};

pub const SCHEMA_TABLE: &str = "table_schemas";

/// Persisted form of one dynamic table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchemaDef {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

pub struct SchemaStore {
    engine: Arc<StorageEngine>,
}

impl SchemaStore {
    pub fn new(engine: Arc<StorageEngine>) -> Self {
        Self { engine }
    }

    /// Create the metadata table on a fresh database.
    pub async fn ensure_table(&self) -> Result<()> {
        if self.engine.table_exists(SCHEMA_TABLE).await {
            return Ok(());
        }
        let columns = vec![
            Column::new("id", DataType::Integer).primary_key().auto_increment(),
            Column::new("table_name", DataType::Text).not_null().unique(),
            Column::new("schema_json", DataType::Text),
            Column::new("created_at", DataType::Timestamp).default_now(),
        ];
        self.engine
            .create_table(TableSchema::new(SCHEMA_TABLE, columns))
            .await
    }

    /// Upsert the schema row for `table_name`.
    ///
    /// Last write wins: a conflicting row has its column list replaced
    /// outright, never merged.
    pub async fn save_schema(&self, table_name: &str, columns: &[ColumnDef]) -> Result<()> {
        let def = TableSchemaDef {
            table_name: table_name.to_string(),
            columns: columns.to_vec(),
        };
        let schema_json = serde_json::to_string(&def)
            .map_err(|e| DbError::ExecutionError(format!("Failed to encode schema: {}", e)))?;

        let mut changes = NamedRow::new();
        changes.insert("schema_json".to_string(), Json::String(schema_json.clone()));
        let updated = self
            .engine
            .update_where(
                SCHEMA_TABLE,
                "table_name",
                &Value::Text(table_name.to_string()),
                &changes,
            )
            .await?;

        if updated == 0 {
            let mut row = NamedRow::new();
            row.insert("table_name".to_string(), Json::String(table_name.to_string()));
            row.insert("schema_json".to_string(), Json::String(schema_json));
            self.engine.insert_row(SCHEMA_TABLE, &row).await?;
        }
        Ok(())
    }

    /// Column list persisted for `table_name`, or `None` when the table was
    /// never created through this subsystem.
    pub async fn load_schema(&self, table_name: &str) -> Result<Option<Vec<ColumnDef>>> {
        let rows = self
            .engine
            .select_eq(
                SCHEMA_TABLE,
                "table_name",
                &Value::Text(table_name.to_string()),
            )
            .await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let raw = row.get("schema_json").and_then(|v| v.as_str()).unwrap_or("null");
        let def: TableSchemaDef = serde_json::from_str(raw)
            .map_err(|e| DbError::SchemaCorrupted(table_name.to_string(), e.to_string()))?;
        Ok(Some(def.columns))
    }

    /// Every persisted schema row as `(table_name, raw schema_json)`.
    ///
    /// The JSON is handed back unparsed so that startup reconstruction can
    /// isolate a malformed row to that one table.
    pub async fn load_all_schemas(&self) -> Result<Vec<(String, String)>> {
        let rows = self.engine.scan(SCHEMA_TABLE).await?;
        let mut schemas = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(table_name) = row.get("table_name").and_then(|v| v.as_str()) else {
                continue;
            };
            let schema_json = row
                .get("schema_json")
                .and_then(|v| v.as_str())
                .unwrap_or("null")
                .to_string();
            schemas.push((table_name.to_string(), schema_json));
        }
        Ok(schemas)
    }

    /// Names of every table created through this subsystem.
    pub async fn list_table_names(&self) -> Result<Vec<String>> {
        let rows = self.engine.scan(SCHEMA_TABLE).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("table_name").and_then(|v| v.as_str()))
            .map(|name| name.to_string())
            .collect())
    }
}
