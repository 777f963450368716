//! Value, Tuple and Row types for textdb
//!
//! A [`Tuple`] is a row as it lives on disk: a list of position-tagged
//! fields. A [`Row`] is the same data keyed by column name, which is what
//! lookups and queries hand back to callers.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

use crate::catalog::Schema;
use crate::error::{Error, Result};
use crate::storage::codec;

/// 1-based column position, as written in position tags.
pub type Position = u16;

/// Literal text stored for a value that was never supplied.
pub const NULL_SENTINEL: &str = "null";

/// A value in a row
///
/// Every value is text. `Null` is the `null` sentinel and renders as that
/// string, so comparisons and ordering treat it as the word `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Not supplied
    Null,
    /// Supplied text
    Set(String),
}

impl Value {
    /// Build a value from stored text, mapping the sentinel to `Null`.
    pub fn from_stored(text: impl Into<String>) -> Self {
        let text = text.into();
        if text == NULL_SENTINEL {
            Value::Null
        } else {
            Value::Set(text)
        }
    }

    /// Check if this value is the null sentinel
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The raw text of this value (`null` for the sentinel)
    pub fn as_str(&self) -> &str {
        match self {
            Value::Null => NULL_SENTINEL,
            Value::Set(s) => s,
        }
    }

    /// Lexicographic comparison of the raw text.
    ///
    /// Numeric-looking values are not parsed: `"100" < "32"`.
    pub fn compare(&self, other: &Value) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::from_stored(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::from_stored(s)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Set(s) => serializer.serialize_str(s),
        }
    }
}

/// A row as stored: position-tagged fields, independent of the schema line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    fields: Vec<(Position, Value)>,
}

impl Tuple {
    /// Create a tuple from tagged fields
    pub fn new(fields: Vec<(Position, Value)>) -> Self {
        Self { fields }
    }

    /// Create a tuple tagging `values` 1, 2, 3, ... in order
    pub fn from_values(values: Vec<Value>) -> Self {
        let fields = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| ((i + 1) as Position, v))
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[(Position, Value)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the value tagged with `position`
    pub fn get(&self, position: Position) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(p, _)| *p == position)
            .map(|(_, v)| v)
    }

    /// The row id (the value tagged 1)
    pub fn id(&self) -> Option<&str> {
        self.get(1).map(Value::as_str)
    }

    /// Replace the value tagged with `position`. Returns false if no such field.
    pub fn set(&mut self, position: Position, value: Value) -> bool {
        match self.fields.iter_mut().find(|(p, _)| *p == position) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Drop the field tagged `position` and shift every later tag down by one.
    pub fn remove_position(&mut self, position: Position) {
        self.fields.retain(|(p, _)| *p != position);
        for (p, _) in self.fields.iter_mut() {
            if *p > position {
                *p -= 1;
            }
        }
    }

    /// Retag fields 1, 2, 3, ... in their current order
    pub(crate) fn retag_in_order(&mut self) {
        for (i, (p, _)) in self.fields.iter_mut().enumerate() {
            *p = (i + 1) as Position;
        }
    }

    /// Whether the tags are exactly 1..=len in some order
    pub(crate) fn has_contiguous_tags(&self) -> bool {
        let mut tags: Vec<Position> = self.fields.iter().map(|(p, _)| *p).collect();
        tags.sort_unstable();
        tags.iter()
            .enumerate()
            .all(|(i, p)| *p as usize == i + 1)
    }
}

/// A row keyed by column name, in schema order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: IndexMap<String, Value>,
}

impl Row {
    /// Resolve a stored tuple against its table schema
    pub(crate) fn from_tuple(schema: &Schema, tuple: &Tuple) -> Self {
        let values = schema
            .columns()
            .iter()
            .map(|col| {
                let value = tuple.get(col.position).cloned().unwrap_or(Value::Null);
                (col.name.clone(), value)
            })
            .collect();
        Self { values }
    }

    /// Keep only `columns`, in that order
    pub(crate) fn project(&self, columns: &[String]) -> Self {
        let values = columns
            .iter()
            .map(|c| (c.clone(), self.values.get(c).cloned().unwrap_or(Value::Null)))
            .collect();
        Self { values }
    }

    /// Get the value of a column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// The row id, or an empty string if the row carries no `id` column
    pub fn id(&self) -> &str {
        self.values.get("id").map(Value::as_str).unwrap_or("")
    }

    /// Column names in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.values()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Row {
    /// Renders as a row line: `|1| id |2| value ...`, spaces escaped
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.values().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "|{}| {}", i + 1, codec::escape(value.as_str()))?;
        }
        Ok(())
    }
}

/// A snapshot of rows from one table, with the column names they carry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rows {
    #[serde(skip)]
    table: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Rows {
    pub fn new(table: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            table: table.into(),
            columns,
            rows,
        }
    }

    /// Name of the table these rows were read from
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn into_vec(self) -> Vec<Row> {
        self.rows
    }

    /// Sort ascending by the raw text of `column`
    pub fn order_by_ascend(&mut self, column: &str) -> Result<()> {
        self.order_by(column, false)
    }

    /// Sort descending by the raw text of `column`
    pub fn order_by_descend(&mut self, column: &str) -> Result<()> {
        self.order_by(column, true)
    }

    fn order_by(&mut self, column: &str, descend: bool) -> Result<()> {
        if !self.columns.iter().any(|c| c == column) {
            return Err(Error::column_not_found(column, &self.table));
        }
        self.rows.sort_by(|a, b| {
            let ord = match (a.get(column), b.get(column)) {
                (Some(x), Some(y)) => x.compare(y),
                _ => Ordering::Equal,
            };
            if descend {
                ord.reverse()
            } else {
                ord
            }
        });
        Ok(())
    }
}

impl Deref for Rows {
    type Target = [Row];

    fn deref(&self) -> &[Row] {
        &self.rows
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
