use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::core::{Column, DbError, Result, Value};

use super::{NamedRow, SnapshotStore, Table, TableSchema};

/// The embedded relational driver.
///
/// Holds every physical table behind its own lock so concurrent requests on
/// different tables never contend. The name→handle map has a separate lock
/// and is only held for lookups and DDL.
pub struct StorageEngine {
    tables: RwLock<HashMap<String, Arc<RwLock<Table>>>>,
    snapshots: Option<SnapshotStore>,
}

impl StorageEngine {
    /// Purely in-memory engine, nothing survives the process.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            snapshots: None,
        }
    }

    /// Engine backed by a snapshot store; any previously persisted tables
    /// are restored before the engine is handed out.
    pub fn open(snapshots: SnapshotStore) -> Result<Self> {
        let mut map = HashMap::new();
        if let Some(tables) = snapshots.load()? {
            for (name, table) in tables {
                map.insert(name, Arc::new(RwLock::new(table)));
            }
        }
        Ok(Self {
            tables: RwLock::new(map),
            snapshots: Some(snapshots),
        })
    }

    pub async fn table_exists(&self, name: &str) -> bool {
        self.tables.read().await.contains_key(name)
    }

    pub async fn list_tables(&self) -> Vec<String> {
        self.tables.read().await.keys().cloned().collect()
    }

    /// Shared handle for concurrent access to one table.
    pub async fn handle(&self, name: &str) -> Result<Arc<RwLock<Table>>> {
        self.tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub async fn create_table(&self, schema: TableSchema) -> Result<()> {
        let name = schema.name().to_string();
        {
            let mut tables = self.tables.write().await;
            if tables.contains_key(&name) {
                return Err(DbError::TableExists(name));
            }
            tables.insert(name.clone(), Arc::new(RwLock::new(Table::new(schema))));
        }
        debug!(table = %name, "created table");
        self.checkpoint().await
    }

    pub async fn add_column(&self, table_name: &str, column: Column) -> Result<()> {
        let handle = self.handle(table_name).await?;
        {
            let mut table = handle.write().await;
            table.add_column(column)?;
        }
        debug!(table = %table_name, "added column");
        self.checkpoint().await
    }

    /// Current column set of a table.
    pub async fn describe_table(&self, name: &str) -> Result<Vec<Column>> {
        let handle = self.handle(name).await?;
        let table = handle.read().await;
        Ok(table.columns().to_vec())
    }

    pub async fn insert_row(&self, table_name: &str, values: &NamedRow) -> Result<NamedRow> {
        let handle = self.handle(table_name).await?;
        let inserted = {
            let mut table = handle.write().await;
            table.insert_named(values)?
        };
        self.checkpoint().await?;
        Ok(inserted)
    }

    pub async fn scan(&self, table_name: &str) -> Result<Vec<NamedRow>> {
        let handle = self.handle(table_name).await?;
        let table = handle.read().await;
        Ok(table.scan_named())
    }

    pub async fn select_eq(
        &self,
        table_name: &str,
        column: &str,
        value: &Value,
    ) -> Result<Vec<NamedRow>> {
        let handle = self.handle(table_name).await?;
        let table = handle.read().await;
        table.select_eq(column, value)
    }

    pub async fn update_where(
        &self,
        table_name: &str,
        column: &str,
        value: &Value,
        changes: &NamedRow,
    ) -> Result<usize> {
        let handle = self.handle(table_name).await?;
        let touched = {
            let mut table = handle.write().await;
            table.update_where(column, value, changes)?
        };
        if touched > 0 {
            self.checkpoint().await?;
        }
        Ok(touched)
    }

    /// Persist a full snapshot when a snapshot store is configured.
    ///
    /// Callers that mutate a table through a shared handle (rather than one
    /// of the methods above) invoke this themselves afterwards.
    pub async fn checkpoint(&self) -> Result<()> {
        let Some(store) = &self.snapshots else {
            return Ok(());
        };
        let tables = self.tables.read().await;
        let mut copy = HashMap::with_capacity(tables.len());
        for (name, handle) in tables.iter() {
            copy.insert(name.clone(), handle.read().await.clone());
        }
        store.save(copy)
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}
