//! Query outcome types.
//!
//! Defines the structures used to represent what a statement produced and how
//! it is serialized back to HTTP callers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// The classified result of executing one SQL statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// Rows produced by a row-returning statement, in result-set order.
    RowSet(Vec<Row>),

    /// Affected-row count of a statement that returned no result set.
    Mutation(MutationSummary),
}

impl Outcome {
    /// Creates a mutation outcome with the given affected-row count.
    pub fn mutation(affected_rows: u64) -> Self {
        Self::Mutation(MutationSummary { affected_rows })
    }

    /// Returns a short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RowSet(_) => "rows",
            Self::Mutation(_) => "mutation",
        }
    }

    /// Row count for a row set, affected rows for a mutation.
    pub fn count(&self) -> u64 {
        match self {
            Self::RowSet(rows) => rows.len() as u64,
            Self::Mutation(summary) => summary.affected_rows,
        }
    }
}

/// Summary of a statement that did not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MutationSummary {
    pub affected_rows: u64,
}

/// A single result row: column names mapped to values, in column order.
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
    ///
    /// A repeated column name keeps its first position and takes the new value.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Looks up a value by column name.
    #[cfg(test)]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Represents a single value from a database row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value.
    Null,

    /// Signed integer (up to i64).
    Int(i64),

    /// Unsigned integer (up to u64).
    UInt(u64),

    /// Floating point number.
    Float(f64),

    /// Exact numeric, kept as the server's text to avoid rounding.
    Decimal(String),

    /// Text value, including dates, times and JSON documents.
    String(String),

    /// Binary data that is not valid UTF-8.
    Bytes(Vec<u8>),
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Decimal(s) | Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&STANDARD.encode(b)),
        }
    }
}
