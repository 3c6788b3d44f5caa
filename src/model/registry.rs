use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::core::{Column, DataType, DbError, Result};
use crate::schema::{SchemaStore, TableSchemaDef};
use crate::storage::{StorageEngine, TableSchema};

use super::ModelBinding;

/// Outcome of one bulk initialization pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub failed_tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializationStatus {
    pub initialized: bool,
    pub model_count: usize,
    pub registered_models: Vec<String>,
}

/// In-memory mapping from table name to a live model binding.
///
/// Constructed once at startup and injected into every consumer; the
/// initialized flag and the map are only reachable through the operations
/// below.
pub struct ModelRegistry {
    engine: Arc<StorageEngine>,
    schema_store: Arc<SchemaStore>,
    models: RwLock<HashMap<String, Arc<ModelBinding>>>,
    initialized: AtomicBool,
}

impl ModelRegistry {
    pub fn new(engine: Arc<StorageEngine>, schema_store: Arc<SchemaStore>) -> Self {
        Self {
            engine,
            schema_store,
            models: RwLock::new(HashMap::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Insert or overwrite the binding for `table_name` unconditionally.
    pub async fn register_model(&self, table_name: &str, binding: Arc<ModelBinding>) {
        self.models
            .write()
            .await
            .insert(table_name.to_string(), binding);
    }

    /// Registered binding for `table_name`, falling back to auto-discovery
    /// against the engine when the name was never explicitly registered.
    pub async fn get_model(&self, table_name: &str) -> Option<Arc<ModelBinding>> {
        if let Some(binding) = self.models.read().await.get(table_name) {
            return Some(Arc::clone(binding));
        }
        self.discover_model(table_name).await
    }

    /// Auto-discovery: bridge tables defined outside the dynamic path (fixed
    /// schema tables) into the registry on first lookup, registering the
    /// discovered binding as a side effect.
    async fn discover_model(&self, table_name: &str) -> Option<Arc<ModelBinding>> {
        let known = self.engine.list_tables().await;
        if !known.iter().any(|name| name == table_name) {
            warn!(table = %table_name, "model not found for table");
            return None;
        }
        let columns = match self.engine.describe_table(table_name).await {
            Ok(columns) => columns,
            Err(_) => return None,
        };
        let handle = match self.engine.handle(table_name).await {
            Ok(handle) => handle,
            Err(_) => return None,
        };
        let binding = Arc::new(ModelBinding::new(table_name, &columns, handle));
        self.register_model(table_name, Arc::clone(&binding)).await;
        Some(binding)
    }

    /// Startup bulk path: rebuild one binding per persisted schema row.
    ///
    /// Reconstruction tasks run concurrently and fail independently — a
    /// corrupted row costs that one table, never the whole registry. The
    /// operation is a no-op once the registry is initialized, unless
    /// [`force_reinitialize`](Self::force_reinitialize) is used.
    pub async fn initialize_all_models(&self) -> Result<InitSummary> {
        if self.initialized.load(Ordering::Acquire) {
            info!("models already initialized, skipping");
            return Ok(InitSummary::default());
        }

        let schemas = self.schema_store.load_all_schemas().await?;
        if schemas.is_empty() {
            warn!("no table schemas found in database");
            self.initialized.store(true, Ordering::Release);
            return Ok(InitSummary::default());
        }
        info!(count = schemas.len(), "initializing models from persisted schemas");

        let tasks = schemas.into_iter().map(|(table_name, schema_json)| async move {
            match self.reconstruct_model(&table_name, &schema_json).await {
                Ok(binding) => {
                    self.register_model(&table_name, binding).await;
                    info!(table = %table_name, "model initialized");
                    Ok(table_name)
                }
                Err(err) => {
                    error!(table = %table_name, error = %err, "failed to initialize model");
                    Err(table_name)
                }
            }
        });
        let results = join_all(tasks).await;

        let mut summary = InitSummary::default();
        for result in results {
            match result {
                Ok(_) => summary.succeeded += 1,
                Err(table_name) => {
                    summary.failed += 1;
                    summary.failed_tables.push(table_name);
                }
            }
        }
        if summary.failed > 0 {
            warn!(tables = ?summary.failed_tables, "failed to initialize tables");
        }
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "model initialization complete"
        );
        self.initialized.store(true, Ordering::Release);
        Ok(summary)
    }

    /// Clear every binding and run initialization again.
    pub async fn force_reinitialize(&self) -> Result<InitSummary> {
        info!("forcing model re-initialization");
        self.initialized.store(false, Ordering::Release);
        self.models.write().await.clear();
        self.initialize_all_models().await
    }

    pub fn is_ready(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub async fn initialization_status(&self) -> InitializationStatus {
        let models = self.models.read().await;
        let mut registered: Vec<String> = models.keys().cloned().collect();
        registered.sort();
        InitializationStatus {
            initialized: self.initialized.load(Ordering::Acquire),
            model_count: models.len(),
            registered_models: registered,
        }
    }

    pub async fn registered_models(&self) -> Vec<String> {
        self.models.read().await.keys().cloned().collect()
    }

    /// Rebuild one binding from its persisted schema JSON: attributes via
    /// the type mapper, a synthesized auto-increment `id` primary key when
    /// none is declared, and a `created_at` timestamp column.
    async fn reconstruct_model(
        &self,
        table_name: &str,
        schema_json: &str,
    ) -> Result<Arc<ModelBinding>> {
        let def: TableSchemaDef = serde_json::from_str(schema_json)
            .map_err(|e| DbError::SchemaCorrupted(table_name.to_string(), e.to_string()))?;

        let mut columns: Vec<Column> = Vec::with_capacity(def.columns.len() + 2);
        let mut has_primary_key = false;
        for column_def in &def.columns {
            let column = column_def.to_column();
            has_primary_key |= column.primary_key;
            columns.push(column);
        }
        if !has_primary_key && !columns.iter().any(|c| c.name == "id") {
            columns.push(Column::new("id", DataType::Integer).primary_key().auto_increment());
        }
        if !columns.iter().any(|c| c.name == "created_at") {
            columns.push(Column::new("created_at", DataType::Timestamp).default_now());
        }

        // A schema row can outlive its physical table (fresh database with no
        // snapshot): recreate it so the binding is query-capable right away.
        if !self.engine.table_exists(table_name).await {
            self.engine
                .create_table(TableSchema::new(table_name, columns.clone()))
                .await?;
        }

        let handle = self.engine.handle(table_name).await?;
        Ok(Arc::new(ModelBinding::new(table_name, &columns, handle)))
    }
}
