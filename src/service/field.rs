//! Dynamic field addition.
//!
//! Two entry points: [`FieldService::add_field_to_table`] alters a live
//! table and keeps its registered binding in sync, and
//! [`FieldService::add_fields_in_db`] synthesizes a field-catalog entry and
//! then runs the ALTER as an explicitly sequenced follow-on step.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{FieldCatalog, FieldCatalogEntry};
use crate::core::{Column, DataType, DbError, Result};
use crate::model::{Attribute, ModelRegistry};
use crate::naming;
use crate::storage::StorageEngine;

/// Payload for `POST /report/add-field`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFieldRequest {
    pub source_table: String,
    pub field_name: String,
    pub field_type: String,
}

pub struct FieldService {
    engine: Arc<StorageEngine>,
    registry: Arc<ModelRegistry>,
    catalog: Arc<FieldCatalog>,
}

impl FieldService {
    pub fn new(
        engine: Arc<StorageEngine>,
        registry: Arc<ModelRegistry>,
        catalog: Arc<FieldCatalog>,
    ) -> Self {
        Self {
            engine,
            registry,
            catalog,
        }
    }

    /// Add a nullable column of the mapped storage type to a live table,
    /// then update the registered binding's attribute set in place.
    /// A column that already exists makes the whole call a no-op.
    pub async fn add_field_to_table(
        &self,
        table_name: &str,
        field_name: &str,
        type_tag: &str,
    ) -> Result<()> {
        if self.column_exists(table_name, field_name).await? {
            info!(table = %table_name, field = %field_name, "column already exists, skipping");
            return Ok(());
        }

        let column = Column::new(field_name, DataType::from_tag(type_tag));
        self.engine.add_column(table_name, column.clone()).await?;

        // Keep the live binding in sync without a registry rebuild.
        if let Some(binding) = self.registry.get_model(table_name).await {
            binding.add_attribute(Attribute::from(&column)).await;
        }

        info!(table = %table_name, field = %field_name, "column added");
        Ok(())
    }

    /// Synthesize and persist a catalog entry for a human-entered field
    /// name, then run the ALTER + binding-update follow-on.
    ///
    /// During table creation (`is_table_create`) the usability flags default
    /// to false — the column is reportable but not yet curated for UI
    /// affordances — and the follow-on finds the column already present.
    /// A failed follow-on fails the call but leaves the catalog row in
    /// place; no compensating delete is performed.
    pub async fn add_fields_in_db(
        &self,
        request: &AddFieldRequest,
        is_table_create: bool,
    ) -> Result<FieldCatalogEntry> {
        let label = naming::capitalize_words(&request.field_name);
        let key = naming::to_underscore(&request.field_name);
        if key.is_empty() {
            return Err(DbError::Validation("Field name is required".to_string()));
        }

        let entry = FieldCatalogEntry {
            field_key: key.clone(),
            source_table: request.source_table.clone(),
            field_name: format!("{}.{}", request.source_table, key),
            name: label.clone(),
            label,
            data_type: request.field_type.to_lowercase(),
            is_filterable: !is_table_create,
            is_sortable: !is_table_create,
            is_groupable: false,
            aggregation_type: None,
        };
        self.catalog.insert(&entry).await?;

        // Explicit follow-on: persist first, alter second. The two effects
        // are visibly sequenced here rather than hidden in a storage hook.
        self.add_field_to_table(&request.source_table, &key, &request.field_type)
            .await?;

        Ok(entry)
    }

    async fn column_exists(&self, table_name: &str, column_name: &str) -> Result<bool> {
        match self.engine.describe_table(table_name).await {
            Ok(columns) => Ok(columns.iter().any(|c| c.name == column_name)),
            // An unknown table reads as "no such column"; the ALTER that
            // follows reports the missing table itself.
            Err(DbError::TableNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
