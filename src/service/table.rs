//! Dynamic table creation and row-level operations.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{Column, ColumnDef, DataType, DbError, Result, Value};
use crate::model::{ModelBinding, ModelRegistry};
use crate::schema::SchemaStore;
use crate::storage::{NamedRow, StorageEngine, TableSchema};

use super::field::{AddFieldRequest, FieldService};

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Payload for `POST /table/create-table`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

/// Outcome of a row delete: the removed row plus the affected-row count.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub deleted_record: NamedRow,
    pub affected_rows: usize,
}

pub struct TableService {
    engine: Arc<StorageEngine>,
    registry: Arc<ModelRegistry>,
    schema_store: Arc<SchemaStore>,
    field_service: Arc<FieldService>,
}

impl TableService {
    pub fn new(
        engine: Arc<StorageEngine>,
        registry: Arc<ModelRegistry>,
        schema_store: Arc<SchemaStore>,
        field_service: Arc<FieldService>,
    ) -> Self {
        Self {
            engine,
            registry,
            schema_store,
            field_service,
        }
    }

    /// Create a dynamic table from a column-definition payload.
    ///
    /// The sequence — derive attributes, DDL, persist schema, register the
    /// binding, seed catalog entries — is not transactional: a failure
    /// partway leaves the earlier steps in place.
    pub async fn create_table(&self, request: &CreateTableRequest) -> Result<String> {
        let table_name = &request.table_name;
        if table_name.is_empty() || request.columns.is_empty() {
            return Err(DbError::Validation("Invalid table schema".to_string()));
        }
        if !IDENTIFIER_RE.is_match(table_name) {
            return Err(DbError::Validation(format!(
                "Invalid table name '{}'",
                table_name
            )));
        }

        // Already registered: treat as created. No schema comparison happens
        // here, so a repeat call with a different column list keeps the
        // first registration.
        if self.registry.get_model(table_name).await.is_some() {
            return Ok(table_name.clone());
        }

        let mut physical: Vec<Column> = Vec::with_capacity(request.columns.len() + 2);
        let mut has_primary_key = false;
        for def in &request.columns {
            let column = def.to_column();
            has_primary_key |= column.primary_key;
            physical.push(column);
        }
        if !has_primary_key && !physical.iter().any(|c| c.name == "id") {
            physical.push(Column::new("id", DataType::Integer).primary_key().auto_increment());
        }
        if !physical.iter().any(|c| c.name == "created_at") {
            physical.push(Column::new("created_at", DataType::Timestamp).default_now());
        }

        // Non-destructive DDL: never touches an existing physical table.
        if !self.engine.table_exists(table_name).await {
            self.engine
                .create_table(TableSchema::new(table_name.clone(), physical.clone()))
                .await?;
        }

        self.schema_store
            .save_schema(table_name, &request.columns)
            .await?;

        let handle = self.engine.handle(table_name).await?;
        let binding = Arc::new(ModelBinding::new(table_name.clone(), &physical, handle));
        self.registry.register_model(table_name, binding).await;

        // Every input column becomes reportable right away.
        for def in &request.columns {
            let seed = AddFieldRequest {
                source_table: table_name.clone(),
                field_name: def.name.clone(),
                field_type: def.type_tag.clone(),
            };
            self.field_service.add_fields_in_db(&seed, true).await?;
        }

        info!(table = %table_name, columns = request.columns.len(), "dynamic table created");
        Ok(table_name.clone())
    }

    /// Insert one row, cross-checking required columns against the
    /// persisted schema first.
    pub async fn insert_data(&self, table_name: &str, data: &NamedRow) -> Result<NamedRow> {
        let binding = self.resolve(table_name).await?;
        self.check_required_fields(table_name, data).await?;

        let handle = binding.query_handle();
        let inserted = {
            let mut table = handle.write().await;
            table.insert_named(data)?
        };
        self.engine.checkpoint().await?;
        Ok(inserted)
    }

    /// All rows of the table, no pagination or filtering at this layer.
    pub async fn get_table_data(&self, table_name: &str) -> Result<Vec<NamedRow>> {
        let binding = self.resolve(table_name).await?;
        let handle = binding.query_handle();
        let rows = handle.read().await.scan_named();
        Ok(rows)
    }

    /// Partial update keyed by row identifier. Zero affected rows is a
    /// not-found failure, not a silent success.
    pub async fn update_table_data(
        &self,
        table_name: &str,
        id: &str,
        data: &NamedRow,
    ) -> Result<NamedRow> {
        if data.is_empty() {
            return Err(DbError::Validation(
                "No data provided for update".to_string(),
            ));
        }
        let binding = self.resolve(table_name).await?;
        self.check_required_fields(table_name, data).await?;

        let id_value = parse_row_id(id);
        let handle = binding.query_handle();
        let updated = {
            let mut table = handle.write().await;
            table.update(&id_value, data)?
        };
        if !updated {
            return Err(DbError::RecordNotFound(
                id.to_string(),
                table_name.to_string(),
            ));
        }
        self.engine.checkpoint().await?;

        let row = handle.read().await.get(&id_value);
        row.ok_or_else(|| DbError::RecordNotFound(id.to_string(), table_name.to_string()))
    }

    /// Delete keyed by row identifier, confirming existence first and
    /// returning the removed row's prior content.
    pub async fn delete_table_data(&self, table_name: &str, id: &str) -> Result<DeleteOutcome> {
        let binding = self.resolve(table_name).await?;

        let id_value = parse_row_id(id);
        let handle = binding.query_handle();
        let removed = {
            let mut table = handle.write().await;
            if table.get(&id_value).is_none() {
                return Err(DbError::RecordNotFound(
                    id.to_string(),
                    table_name.to_string(),
                ));
            }
            table.delete(&id_value)
        };
        let Some(deleted_record) = removed else {
            return Err(DbError::RecordNotFound(
                id.to_string(),
                table_name.to_string(),
            ));
        };
        self.engine.checkpoint().await?;

        Ok(DeleteOutcome {
            deleted_record,
            affected_rows: 1,
        })
    }

    /// Shared precondition of every row operation: a valid identifier that
    /// resolves to a binding. No raw fallback path exists past this point.
    async fn resolve(&self, table_name: &str) -> Result<Arc<ModelBinding>> {
        if !IDENTIFIER_RE.is_match(table_name) {
            return Err(DbError::Validation(format!(
                "Invalid table name '{}'",
                table_name
            )));
        }
        self.registry
            .get_model(table_name)
            .await
            .ok_or_else(|| DbError::TableNotFound(table_name.to_string()))
    }

    async fn check_required_fields(&self, table_name: &str, data: &NamedRow) -> Result<()> {
        if let Some(defs) = self.schema_store.load_schema(table_name).await? {
            for def in &defs {
                if def.required && !data.contains_key(&def.name) {
                    return Err(DbError::MissingRequiredField(def.name.clone()));
                }
            }
        }
        Ok(())
    }
}

/// Path identifiers arrive as strings; integers match the synthesized
/// auto-increment key, anything else is matched as text.
fn parse_row_id(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(id) => Value::Integer(id),
        Err(_) => Value::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_pattern() {
        assert!(IDENTIFIER_RE.is_match("orders"));
        assert!(IDENTIFIER_RE.is_match("_tmp_2"));
        assert!(!IDENTIFIER_RE.is_match("2fast"));
        assert!(!IDENTIFIER_RE.is_match("drop table"));
        assert!(!IDENTIFIER_RE.is_match("bad-name"));
        assert!(!IDENTIFIER_RE.is_match(""));
    }

    #[test]
    fn test_parse_row_id() {
        assert_eq!(parse_row_id("42"), Value::Integer(42));
        assert_eq!(parse_row_id("abc"), Value::Text("abc".to_string()));
    }
}
