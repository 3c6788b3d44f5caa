//! The assembled backend: engine, metadata stores, registry and services
//! wired together once at startup and shared by reference everywhere.

use std::path::Path;
use std::sync::Arc;

use crate::catalog::FieldCatalog;
use crate::core::Result;
use crate::model::ModelRegistry;
use crate::schema::SchemaStore;
use crate::service::{FieldService, ReportService, TableService};
use crate::storage::{SnapshotStore, StorageEngine};

pub struct ReportDb {
    pub engine: Arc<StorageEngine>,
    pub schema_store: Arc<SchemaStore>,
    pub catalog: Arc<FieldCatalog>,
    pub registry: Arc<ModelRegistry>,
    pub tables: Arc<TableService>,
    pub fields: Arc<FieldService>,
    pub reports: Arc<ReportService>,
}

impl ReportDb {
    /// Wire every component over the given engine and make sure the two
    /// metadata tables exist.
    pub async fn new(engine: StorageEngine) -> Result<Self> {
        let engine = Arc::new(engine);

        let schema_store = Arc::new(SchemaStore::new(Arc::clone(&engine)));
        let catalog = Arc::new(FieldCatalog::new(Arc::clone(&engine)));
        schema_store.ensure_table().await?;
        catalog.ensure_table().await?;

        let registry = Arc::new(ModelRegistry::new(
            Arc::clone(&engine),
            Arc::clone(&schema_store),
        ));
        let fields = Arc::new(FieldService::new(
            Arc::clone(&engine),
            Arc::clone(&registry),
            Arc::clone(&catalog),
        ));
        let tables = Arc::new(TableService::new(
            Arc::clone(&engine),
            Arc::clone(&registry),
            Arc::clone(&schema_store),
            Arc::clone(&fields),
        ));
        let reports = Arc::new(ReportService::new(
            Arc::clone(&registry),
            Arc::clone(&catalog),
            Arc::clone(&schema_store),
        ));

        Ok(Self {
            engine,
            schema_store,
            catalog,
            registry,
            tables,
            fields,
            reports,
        })
    }

    /// Purely in-memory backend; nothing survives the process.
    pub async fn in_memory() -> Result<Self> {
        Self::new(StorageEngine::new()).await
    }

    /// Snapshot-backed backend rooted at `data_dir`.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let snapshots = SnapshotStore::new(data_dir)?;
        Self::new(StorageEngine::open(snapshots)?).await
    }
}
