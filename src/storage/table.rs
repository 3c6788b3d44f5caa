use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::core::{Column, DbError, Result, Schema, Value};

pub type Row = Vec<Value>;

/// A row keyed by column name, as it crosses the driver boundary.
pub type NamedRow = serde_json::Map<String, Json>;

/// Name + ordered column list of one physical table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    schema: Schema,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            schema: Schema::new(columns),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// A single in-memory table: ordered columns plus integer-keyed rows.
///
/// Row keys increase monotonically from 1 and double as the value of an
/// auto-increment primary-key column when the payload does not supply one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<i64, Row>,
    next_row_id: i64,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_row_id: 1,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn columns(&self) -> &[Column] {
        self.schema.schema().columns()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn insert_named(&mut self, values: &NamedRow) -> Result<NamedRow> {
        let row_id = self.next_row_id;
        let row = self.named_to_row(values, row_id)?;
        self.check_unique(&row, None)?;
        let inserted = self.row_to_named(&row);
        self.rows.insert(row_id, row);
        self.next_row_id += 1;
        Ok(inserted)
    }

    pub fn scan_named(&self) -> Vec<NamedRow> {
        self.rows.values().map(|row| self.row_to_named(row)).collect()
    }

    pub fn select_eq(&self, column: &str, value: &Value) -> Result<Vec<NamedRow>> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .values()
            .filter(|row| &row[idx] == value)
            .map(|row| self.row_to_named(row))
            .collect())
    }

    pub fn get(&self, id: &Value) -> Option<NamedRow> {
        let key = self.locate(id)?;
        self.rows.get(&key).map(|row| self.row_to_named(row))
    }

    /// Apply a partial update to the row identified by `id`.
    /// Returns false when no row matches.
    pub fn update(&mut self, id: &Value, changes: &NamedRow) -> Result<bool> {
        let Some(key) = self.locate(id) else {
            return Ok(false);
        };
        let Some(current) = self.rows.get(&key).cloned() else {
            return Ok(false);
        };
        let updated = self.apply_changes(current, changes)?;
        self.check_unique(&updated, Some(key))?;
        self.rows.insert(key, updated);
        Ok(true)
    }

    /// Apply a partial update to every row whose `column` cell equals
    /// `value`. Returns the number of rows touched.
    pub fn update_where(&mut self, column: &str, value: &Value, changes: &NamedRow) -> Result<usize> {
        let idx = self.column_index(column)?;
        let keys: Vec<i64> = self
            .rows
            .iter()
            .filter(|(_, row)| &row[idx] == value)
            .map(|(key, _)| *key)
            .collect();
        for key in &keys {
            let Some(current) = self.rows.get(key).cloned() else {
                continue;
            };
            let updated = self.apply_changes(current, changes)?;
            self.check_unique(&updated, Some(*key))?;
            self.rows.insert(*key, updated);
        }
        Ok(keys.len())
    }

    /// Remove the row identified by `id`, returning its prior content.
    pub fn delete(&mut self, id: &Value) -> Option<NamedRow> {
        let key = self.locate(id)?;
        let row = self.rows.remove(&key)?;
        Some(self.row_to_named(&row))
    }

    /// Append a column; existing rows are backfilled with NULL.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.schema.schema().has_column(&column.name) {
            return Err(DbError::ColumnExists(
                column.name.clone(),
                self.schema.name().to_string(),
            ));
        }
        self.schema.schema.push_column(column);
        for row in self.rows.values_mut() {
            row.push(Value::Null);
        }
        Ok(())
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.schema
            .schema()
            .find_column_index(column)
            .ok_or_else(|| {
                DbError::ColumnNotFound(column.to_string(), self.schema.name().to_string())
            })
    }

    /// Row lookup key: the primary-key cell when the table declares one, the
    /// internal row id otherwise.
    fn locate(&self, id: &Value) -> Option<i64> {
        match self.columns().iter().position(|c| c.primary_key) {
            Some(idx) => self
                .rows
                .iter()
                .find(|(_, row)| &row[idx] == id)
                .map(|(key, _)| *key),
            None => id.as_i64().filter(|key| self.rows.contains_key(key)),
        }
    }

    fn named_to_row(&self, values: &NamedRow, row_id: i64) -> Result<Row> {
        for key in values.keys() {
            if !self.schema.schema().has_column(key) {
                return Err(DbError::ColumnNotFound(
                    key.clone(),
                    self.schema.name().to_string(),
                ));
            }
        }

        let mut row = Vec::with_capacity(self.columns().len());
        for column in self.columns() {
            let cell = match values.get(&column.name) {
                Some(json) => Value::from_json(json, &column.data_type)?,
                None if column.auto_increment => Value::Integer(row_id),
                None if column.default_now => Value::Text(Utc::now().to_rfc3339()),
                None => Value::Null,
            };
            column.validate(&cell)?;
            row.push(cell);
        }
        Ok(row)
    }

    fn apply_changes(&self, mut row: Row, changes: &NamedRow) -> Result<Row> {
        for (name, json) in changes {
            let idx = self.column_index(name)?;
            let column = &self.columns()[idx];
            let cell = Value::from_json(json, &column.data_type)?;
            column.validate(&cell)?;
            row[idx] = cell;
        }
        Ok(row)
    }

    fn check_unique(&self, candidate: &Row, skip: Option<i64>) -> Result<()> {
        for (idx, column) in self.columns().iter().enumerate() {
            if !(column.primary_key || column.unique) {
                continue;
            }
            let value = &candidate[idx];
            if value.is_null() {
                continue;
            }
            for (key, row) in &self.rows {
                if Some(*key) == skip {
                    continue;
                }
                if &row[idx] == value {
                    return Err(DbError::ConstraintViolation(format!(
                        "Column '{}' already contains value {}",
                        column.name, value
                    )));
                }
            }
        }
        Ok(())
    }

    fn row_to_named(&self, row: &Row) -> NamedRow {
        let mut named = NamedRow::new();
        for (column, cell) in self.columns().iter().zip(row.iter()) {
            named.insert(column.name.clone(), cell.to_json());
        }
        named
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;
    use serde_json::json;

    fn orders_table() -> Table {
        Table::new(TableSchema::new(
            "orders",
            vec![
                Column::new("amount", DataType::Decimal).not_null(),
                Column::new("id", DataType::Integer).primary_key().auto_increment(),
                Column::new("created_at", DataType::Timestamp).default_now(),
            ],
        ))
    }

    fn named(pairs: &[(&str, Json)]) -> NamedRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_insert_fills_defaults() {
        let mut table = orders_table();
        let inserted = table.insert_named(&named(&[("amount", json!(42.5))])).unwrap();
        assert_eq!(inserted["amount"], json!(42.5));
        assert_eq!(inserted["id"], json!(1));
        assert!(inserted["created_at"].is_string());

        let second = table.insert_named(&named(&[("amount", json!(7))])).unwrap();
        assert_eq!(second["id"], json!(2));
    }

    #[test]
    fn test_insert_rejects_unknown_column() {
        let mut table = orders_table();
        let err = table
            .insert_named(&named(&[("amount", json!(1)), ("extra", json!(2))]))
            .unwrap_err();
        assert!(matches!(err, DbError::ColumnNotFound(..)));
    }

    #[test]
    fn test_insert_enforces_not_null() {
        let mut table = orders_table();
        let err = table.insert_named(&NamedRow::new()).unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }

    #[test]
    fn test_unique_violation() {
        let mut table = Table::new(TableSchema::new(
            "keys",
            vec![
                Column::new("field_key", DataType::Text).not_null().unique(),
                Column::new("id", DataType::Integer).primary_key().auto_increment(),
            ],
        ));
        table.insert_named(&named(&[("field_key", json!("a"))])).unwrap();
        let err = table
            .insert_named(&named(&[("field_key", json!("a"))]))
            .unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation(_)));
    }

    #[test]
    fn test_update_and_delete_by_primary_key() {
        let mut table = orders_table();
        table.insert_named(&named(&[("amount", json!(10))])).unwrap();

        let touched = table
            .update(&Value::Integer(1), &named(&[("amount", json!(20))]))
            .unwrap();
        assert!(touched);
        let row = table.get(&Value::Integer(1)).unwrap();
        assert_eq!(row["amount"], json!(20.0));

        assert!(!table.update(&Value::Integer(99), &named(&[("amount", json!(1))])).unwrap());

        let removed = table.delete(&Value::Integer(1)).unwrap();
        assert_eq!(removed["amount"], json!(20.0));
        assert!(table.delete(&Value::Integer(1)).is_none());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_add_column_backfills_null() {
        let mut table = orders_table();
        table.insert_named(&named(&[("amount", json!(1))])).unwrap();
        table
            .add_column(Column::new("note", DataType::Text))
            .unwrap();
        let rows = table.scan_named();
        assert_eq!(rows[0]["note"], Json::Null);

        let err = table.add_column(Column::new("note", DataType::Text)).unwrap_err();
        assert!(matches!(err, DbError::ColumnExists(..)));
    }

    #[test]
    fn test_select_eq_filters() {
        let mut table = Table::new(TableSchema::new(
            "sales",
            vec![
                Column::new("location", DataType::Text),
                Column::new("doc_date", DataType::Date),
                Column::new("id", DataType::Integer).primary_key().auto_increment(),
            ],
        ));
        table
            .insert_named(&named(&[("location", json!("NY")), ("doc_date", json!("2023-01-15"))]))
            .unwrap();
        table
            .insert_named(&named(&[("location", json!("LA")), ("doc_date", json!("2023-01-16"))]))
            .unwrap();

        let rows = table
            .select_eq("doc_date", &Value::Text("2023-01-15".into()))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["location"], json!("NY"));

        assert!(table.select_eq("missing", &Value::Null).is_err());
    }
}
