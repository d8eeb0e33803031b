//! Row and statement values.

use serde_json::Value;

/// An open row: column name to scalar value, in wire order.
pub type Row = serde_json::Map<String, Value>;

/// A positional parameter bound to a local statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// 64-bit integer (booleans bind as 0/1)
    Integer(i64),
    /// Floating point
    Real(f64),
    /// Text
    Text(String),
}

impl SqlValue {
    /// Convert a JSON value into a bindable parameter.
    ///
    /// Nested arrays and objects bind as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Integer(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Real).unwrap_or(Self::Null),
            },
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A SQL statement with its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text, `?` placeholders
    pub sql: String,
    /// Arguments in placeholder order
    pub args: Vec<SqlValue>,
}

impl Statement {
    /// A statement without arguments.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// A statement with positional arguments.
    pub fn with_args(sql: impl Into<String>, args: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}
