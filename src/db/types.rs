//! Execution result types for TalkToDB.
//!
//! Defines the structures returned by the execution adapter and their JSON
//! shape on the wire.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

use crate::safety::StatementKind;

/// Outcome of running one accepted statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Rows produced by a read.
    Select { rows_returned: usize, data: Vec<Row> },

    /// Confirmation of a committed mutation.
    Mutation {
        kind: StatementKind,
        affected_rows: u64,
        message: String,
    },
}

impl ExecutionResult {
    /// Creates a read result; `rows_returned` is taken from `data`.
    pub fn select(data: Vec<Row>) -> Self {
        Self::Select {
            rows_returned: data.len(),
            data,
        }
    }

    /// Creates a mutation result with the standard confirmation message.
    pub fn mutation(kind: StatementKind, affected_rows: u64) -> Self {
        Self::Mutation {
            kind,
            affected_rows,
            message: format!(
                "{kind} executed successfully. {affected_rows} row(s) affected."
            ),
        }
    }

    /// Returns the number of rows read or written.
    pub fn row_count(&self) -> u64 {
        match self {
            Self::Select { rows_returned, .. } => *rows_returned as u64,
            Self::Mutation { affected_rows, .. } => *affected_rows,
        }
    }
}

impl Serialize for ExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        match self {
            Self::Select {
                rows_returned,
                data,
            } => {
                map.serialize_entry("type", &StatementKind::Select)?;
                map.serialize_entry("rows_returned", rows_returned)?;
                map.serialize_entry("data", data)?;
            }
            Self::Mutation {
                kind,
                affected_rows,
                message,
            } => {
                map.serialize_entry("type", kind)?;
                map.serialize_entry("affected_rows", affected_rows)?;
                map.serialize_entry("message", message)?;
            }
        }
        map.end()
    }
}

/// A result row: column names paired with values, in select-list order.
///
/// Serializes as a JSON object whose keys keep the column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column value.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((column.into(), value.into()));
    }

    /// Builder-style variant of [`Row::push`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Returns the value of the first column named `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns the column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Represents a single value from a database row.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Unsigned integer (for `UNSIGNED` columns).
    UInt(u64),

    /// Floating point number.
    Float(f64),

    /// Text, and anything rendered as text (decimals, dates, JSON).
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Converts the value to a display string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => match std::str::from_utf8(b) {
                Ok(text) => text.to_string(),
                Err(_) => format!("<{} bytes>", b.len()),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(_) => serializer.serialize_str(&self.to_display_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}
