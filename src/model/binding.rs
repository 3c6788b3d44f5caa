use std::sync::Arc;

use tokio::sync::RwLock;

use crate::core::{Column, DataType};
use crate::storage::Table;

/// One attribute of a live model binding.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
}

impl From<&Column> for Attribute {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            data_type: column.data_type,
            nullable: column.nullable,
            primary_key: column.primary_key,
            auto_increment: column.auto_increment,
        }
    }
}

/// The ordered, mutable attribute set a binding owns.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    pub fn from_columns(columns: &[Column]) -> Self {
        Self {
            attributes: columns.iter().map(Attribute::from).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.attributes.iter().map(|a| a.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// Append an attribute; a duplicate name is a no-op.
    pub fn add(&mut self, attribute: Attribute) {
        if !self.contains(&attribute.name) {
            self.attributes.push(attribute);
        }
    }
}

/// A live, query-capable handle for one table.
///
/// The attribute set is derived from the persisted table schema; the query
/// handle is the engine's shared per-table handle, so row operations through
/// a binding hit the same table the engine serves.
pub struct ModelBinding {
    table_name: String,
    attributes: RwLock<AttributeSet>,
    query_handle: Arc<RwLock<Table>>,
}

impl ModelBinding {
    pub fn new(
        table_name: impl Into<String>,
        columns: &[Column],
        query_handle: Arc<RwLock<Table>>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            attributes: RwLock::new(AttributeSet::from_columns(columns)),
            query_handle,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn query_handle(&self) -> Arc<RwLock<Table>> {
        Arc::clone(&self.query_handle)
    }

    pub async fn attributes(&self) -> AttributeSet {
        self.attributes.read().await.clone()
    }

    pub async fn has_attribute(&self, name: &str) -> bool {
        self.attributes.read().await.contains(name)
    }

    /// In-place attribute addition: row operations on this binding see the
    /// new attribute immediately, no registry rebuild required.
    pub async fn add_attribute(&self, attribute: Attribute) {
        self.attributes.write().await.add(attribute);
    }
}
