//! The reporting query layer.
//!
//! Reports are column-wise projections, not joins: every requested field is
//! resolved through the catalog and queried independently, and the result
//! arrays are positional, aligned by each field's own query order. Fields
//! sourced from tables with different row counts come back with different
//! lengths — callers own that constraint.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::catalog::{FieldCatalog, FieldCatalogEntry};
use crate::core::{DbError, Result, Value};
use crate::model::ModelRegistry;
use crate::schema::SchemaStore;
use crate::storage::NamedRow;

use super::export::{self, ExportField};

/// Column every report read filters on.
pub const REPORT_DATE_COLUMN: &str = "doc_date";

/// One requested report column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportColumnRef {
    pub field_name: String,
}

/// Payload for the report and export endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub columns: Vec<ReportColumnRef>,
    pub date: String,
}

pub struct ReportService {
    registry: Arc<ModelRegistry>,
    catalog: Arc<FieldCatalog>,
    schema_store: Arc<SchemaStore>,
}

impl ReportService {
    pub fn new(
        registry: Arc<ModelRegistry>,
        catalog: Arc<FieldCatalog>,
        schema_store: Arc<SchemaStore>,
    ) -> Self {
        Self {
            registry,
            catalog,
            schema_store,
        }
    }

    pub async fn get_available_fields(&self) -> Result<Vec<FieldCatalogEntry>> {
        self.catalog.list_all().await
    }

    /// Names of every table created through the dynamic path.
    pub async fn get_table_names(&self) -> Result<Vec<String>> {
        self.schema_store.list_table_names().await
    }

    /// Column-wise report assembly: one array of values per resolved field,
    /// keyed by the bare column name. A `field_name` with no catalog entry
    /// is silently omitted from the result, never an error.
    pub async fn get_report_data(&self, request: &ReportRequest) -> Result<NamedRow> {
        let mut result = NamedRow::new();
        for column in &request.columns {
            let Some(entry) = self.catalog.find_by_field_name(&column.field_name).await? else {
                continue;
            };
            let bare = bare_column_name(&column.field_name);
            let rows = self.field_rows(&entry, &request.date).await?;
            let values: Vec<Json> = rows
                .iter()
                .map(|row| row.get(bare).cloned().unwrap_or(Json::Null))
                .collect();
            result.insert(bare.to_string(), Json::Array(values));
        }
        Ok(result)
    }

    /// Same resolution as [`get_report_data`](Self::get_report_data), but
    /// per-field metadata is preserved and the result is rendered as a CSV
    /// grid: a label header, one row per index across the longest column,
    /// blanks padding the shorter ones, and a totals row when any field
    /// carries an aggregation type.
    pub async fn export_report_data(&self, request: &ReportRequest) -> Result<Vec<u8>> {
        let mut fields: Vec<ExportField> = Vec::new();
        for column in &request.columns {
            let Some(entry) = self.catalog.find_by_field_name(&column.field_name).await? else {
                continue;
            };
            let bare = bare_column_name(&column.field_name);
            let rows = self.field_rows(&entry, &request.date).await?;
            let values: Vec<Json> = rows
                .iter()
                .map(|row| row.get(bare).cloned().unwrap_or(Json::Null))
                .collect();
            let total = export::compute_total(&entry, &values);
            fields.push(ExportField {
                label: entry.label.clone(),
                values,
                total,
            });
        }
        Ok(export::render_csv(&fields))
    }

    /// One independent read per field: resolve the owning table to a binding
    /// (auto-discovery covers fixed tables) and filter on the exact date.
    async fn field_rows(&self, entry: &FieldCatalogEntry, date: &str) -> Result<Vec<NamedRow>> {
        let binding = self
            .registry
            .get_model(&entry.source_table)
            .await
            .ok_or_else(|| DbError::TableNotFound(entry.source_table.clone()))?;
        let handle = binding.query_handle();
        let table = handle.read().await;
        table.select_eq(REPORT_DATE_COLUMN, &Value::Text(date.to_string()))
    }
}

/// Strip the `table.` prefix off a catalog field name.
fn bare_column_name(field_name: &str) -> &str {
    field_name.rsplit('.').next().unwrap_or(field_name)
}
