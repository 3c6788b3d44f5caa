use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::core::{DbError, Result};

/// A single table cell.
///
/// Dates, timestamps and JSON documents are carried as text; their declared
/// [`DataType`] keeps the validation and coercion rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce a JSON payload value into a typed cell for `data_type`.
    ///
    /// Numeric strings are accepted for numeric columns the way a SQL driver
    /// would coerce them; anything else incompatible is a type mismatch.
    pub fn from_json(json: &Json, data_type: &DataType) -> Result<Value> {
        let value = match json {
            Json::Null => Value::Null,
            Json::Bool(b) => match data_type {
                DataType::Boolean => Value::Boolean(*b),
                DataType::Text | DataType::Json => Value::Text(b.to_string()),
                _ => return Err(mismatch(json, data_type)),
            },
            Json::Number(n) => match data_type {
                DataType::Integer | DataType::BigInt => {
                    Value::Integer(n.as_i64().ok_or_else(|| mismatch(json, data_type))?)
                }
                DataType::Float | DataType::Decimal => {
                    Value::Float(n.as_f64().ok_or_else(|| mismatch(json, data_type))?)
                }
                DataType::Text | DataType::Json => Value::Text(n.to_string()),
                _ => return Err(mismatch(json, data_type)),
            },
            Json::String(s) => match data_type {
                DataType::Text | DataType::Date | DataType::Timestamp | DataType::Json => {
                    Value::Text(s.clone())
                }
                DataType::Integer | DataType::BigInt => match s.parse::<i64>() {
                    Ok(i) => Value::Integer(i),
                    Err(_) => return Err(mismatch(json, data_type)),
                },
                DataType::Float | DataType::Decimal => match s.parse::<f64>() {
                    Ok(f) => Value::Float(f),
                    Err(_) => return Err(mismatch(json, data_type)),
                },
                DataType::Boolean => return Err(mismatch(json, data_type)),
            },
            Json::Array(_) | Json::Object(_) => match data_type {
                DataType::Json => Value::Text(json.to_string()),
                _ => return Err(mismatch(json, data_type)),
            },
        };
        Ok(value)
    }

    pub fn to_json(&self) -> Json {
        match self {
            Self::Null => Json::Null,
            Self::Integer(i) => Json::Number((*i).into()),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::Text(s) => Json::String(s.clone()),
            Self::Boolean(b) => Json::Bool(*b),
        }
    }
}

fn mismatch(json: &Json, data_type: &DataType) -> DbError {
    let kind = match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    };
    DbError::TypeMismatch(format!("Cannot store {} into a {} column", kind, data_type))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => (a - b).abs() < f64::EPSILON,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            // Integer and Float compare numerically
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64 - f).abs() < f64::EPSILON
            }
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Null, _) => Some(Ordering::Less),
            (_, Self::Null) => Some(Ordering::Greater),

            (Self::Integer(a), Self::Integer(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Integer(i), Self::Float(f)) => (*i as f64).partial_cmp(f),
            (Self::Float(f), Self::Integer(i)) => f.partial_cmp(&(*i as f64)),

            (Self::Text(a), Self::Text(b)) => a.partial_cmp(b),
            (Self::Boolean(a), Self::Boolean(b)) => a.partial_cmp(b),

            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Concrete storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Text,
    Integer,
    BigInt,
    Float,
    Decimal,
    Boolean,
    Date,
    Timestamp,
    Json,
}

impl DataType {
    /// Map an abstract column-type tag to a storage type.
    ///
    /// Case-insensitive. Unknown tags fall back to `Text` so that an
    /// unrecognized type never blocks table creation.
    pub fn from_tag(tag: &str) -> DataType {
        match tag.trim().to_ascii_uppercase().as_str() {
            "STRING" | "VARCHAR" | "TEXT" => Self::Text,
            "INTEGER" | "INT" => Self::Integer,
            "BIGINT" => Self::BigInt,
            "FLOAT" | "DOUBLE" => Self::Float,
            "DECIMAL" => Self::Decimal,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "DATE" | "DATEONLY" => Self::Date,
            "DATETIME" => Self::Timestamp,
            "JSON" | "JSONB" => Self::Json,
            _ => Self::Text,
        }
    }

    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer | Self::BigInt, Value::Integer(_)) => true,
            // Integer widens into floating/fixed point columns
            (Self::Float | Self::Decimal, Value::Float(_) | Value::Integer(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Text | Self::Date | Self::Timestamp | Self::Json, Value::Text(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Float => "FLOAT",
            Self::Decimal => "DECIMAL",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::Json => "JSON",
        };
        write!(f, "{}", name)
    }
}
