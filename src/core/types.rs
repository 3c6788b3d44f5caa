use serde::{Deserialize, Serialize};

use super::{DataType, DbError, Result, Value};

/// A materialized column on a physical table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub auto_increment: bool,
    pub default_now: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            unique: false,
            auto_increment: false,
            default_now: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Default the cell to the current timestamp when absent from a payload.
    pub fn default_now(mut self) -> Self {
        self.default_now = true;
        self
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            if !self.nullable {
                return Err(DbError::ConstraintViolation(format!(
                    "Column '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.data_type.is_compatible(value) {
            return Err(DbError::TypeMismatch(format!(
                "Column '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        Ok(())
    }
}

/// Ordered column list of one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.find_column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.find_column_index(name).is_some()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub(crate) fn push_column(&mut self, column: Column) {
        self.columns.push(column);
    }
}

/// One column definition as supplied by the create-table payload and as
/// persisted inside `table_schemas.schema_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            length: None,
            required: false,
            primary_key: false,
        }
    }

    /// Derive the physical column: storage type via the type mapper,
    /// nullability from `required`, key flag as declared.
    pub fn to_column(&self) -> Column {
        let mut column = Column::new(&self.name, DataType::from_tag(&self.type_tag));
        if self.required {
            column = column.not_null();
        }
        if self.primary_key {
            column = column.primary_key();
        }
        column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_def_wire_format() {
        let json = r#"{"name":"amount","type":"DECIMAL","required":true,"primaryKey":false}"#;
        let def: ColumnDef = serde_json::from_str(json).unwrap();
        assert_eq!(def.name, "amount");
        assert_eq!(def.type_tag, "DECIMAL");
        assert!(def.required);
        assert!(!def.primary_key);

        // omitted flags default to false
        let def: ColumnDef = serde_json::from_str(r#"{"name":"note","type":"TEXT"}"#).unwrap();
        assert!(!def.required);
        assert!(!def.primary_key);
    }

    #[test]
    fn test_to_column_flags() {
        let mut def = ColumnDef::new("code", "INTEGER");
        def.required = true;
        def.primary_key = true;
        let column = def.to_column();
        assert_eq!(column.data_type, DataType::Integer);
        assert!(!column.nullable);
        assert!(column.primary_key);
    }

    #[test]
    fn test_not_null_validation() {
        let column = Column::new("location", DataType::Text).not_null();
        assert!(column.validate(&Value::Null).is_err());
        assert!(column.validate(&Value::Text("x".into())).is_ok());
        assert!(column.validate(&Value::Integer(1)).is_err());
    }
}
