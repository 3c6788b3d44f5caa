//! The report field catalog.
//!
//! Each row of `report_column_fields` describes one reportable field: a
//! unique key, the owning table, the `<table>.<column>` field name the UI
//! requests it by, display labels, and usability flags. Rows are created
//! manually (seed data) or as a side effect of adding a dynamic field; they
//! are never updated in place and never deleted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::core::{Column, DataType, DbError, Result, Value};
use crate::storage::{NamedRow, StorageEngine, TableSchema};

pub const FIELD_CATALOG_TABLE: &str = "report_column_fields";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCatalogEntry {
    pub field_key: String,
    pub source_table: String,
    /// Always of the form `<source_table>.<column>`.
    pub field_name: String,
    pub name: String,
    pub label: String,
    pub data_type: String,
    pub is_filterable: bool,
    pub is_sortable: bool,
    pub is_groupable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_type: Option<String>,
}

pub struct FieldCatalog {
    engine: Arc<StorageEngine>,
}

impl FieldCatalog {
    pub fn new(engine: Arc<StorageEngine>) -> Self {
        Self { engine }
    }

    /// Create the catalog table on a fresh database.
    pub async fn ensure_table(&self) -> Result<()> {
        if self.engine.table_exists(FIELD_CATALOG_TABLE).await {
            return Ok(());
        }
        let columns = vec![
            Column::new("id", DataType::Integer).primary_key().auto_increment(),
            Column::new("field_key", DataType::Text).not_null().unique(),
            Column::new("source_table", DataType::Text).not_null(),
            Column::new("field_name", DataType::Text).not_null(),
            Column::new("name", DataType::Text).not_null(),
            Column::new("label", DataType::Text).not_null(),
            Column::new("data_type", DataType::Text).not_null(),
            Column::new("is_filterable", DataType::Boolean).not_null(),
            Column::new("is_sortable", DataType::Boolean).not_null(),
            Column::new("is_groupable", DataType::Boolean).not_null(),
            Column::new("aggregation_type", DataType::Text),
            Column::new("created_at", DataType::Timestamp).default_now(),
        ];
        self.engine
            .create_table(TableSchema::new(FIELD_CATALOG_TABLE, columns))
            .await
    }

    /// Persist one entry. A duplicate `field_key` is a constraint violation.
    pub async fn insert(&self, entry: &FieldCatalogEntry) -> Result<()> {
        let row = entry_to_row(entry)?;
        self.engine.insert_row(FIELD_CATALOG_TABLE, &row).await?;
        Ok(())
    }

    /// Exact-match lookup by the `<table>.<column>` field name the report UI
    /// sends. The first matching row wins when several entries share a
    /// field name.
    pub async fn find_by_field_name(&self, field_name: &str) -> Result<Option<FieldCatalogEntry>> {
        let rows = self
            .engine
            .select_eq(
                FIELD_CATALOG_TABLE,
                "field_name",
                &Value::Text(field_name.to_string()),
            )
            .await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(entry_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<FieldCatalogEntry>> {
        let rows = self.engine.scan(FIELD_CATALOG_TABLE).await?;
        rows.into_iter().map(entry_from_row).collect()
    }
}

fn entry_to_row(entry: &FieldCatalogEntry) -> Result<NamedRow> {
    match serde_json::to_value(entry) {
        Ok(Json::Object(row)) => Ok(row),
        Ok(_) => Err(DbError::ExecutionError(
            "Catalog entry did not serialize to an object".to_string(),
        )),
        Err(e) => Err(DbError::ExecutionError(format!(
            "Failed to encode catalog entry: {}",
            e
        ))),
    }
}

fn entry_from_row(row: NamedRow) -> Result<FieldCatalogEntry> {
    serde_json::from_value(Json::Object(row))
        .map_err(|e| DbError::ExecutionError(format!("Failed to decode catalog entry: {}", e)))
}
