//! Table storage for textdb
//!
//! A [`Table`] is one parsed table segment held in memory. All row and
//! column mutations happen here; the caller decides when the segment is
//! written back to disk.

use std::fmt;

use uuid::Uuid;

use super::codec;
use super::tuple::{Position, Row, Rows, Tuple, Value};
use crate::catalog::{Schema, ID_COLUMN};
use crate::error::{Error, Result};

/// A table: name, schema and rows in file order
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name, without the fence
    name: String,
    /// Column schema
    schema: Schema,
    /// Row bodies in file order
    tuples: Vec<Tuple>,
}

impl Table {
    /// Create an empty table; `id` is prepended as column 1
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            schema: Schema::new(columns),
            tuples: Vec::new(),
        }
    }

    pub(crate) fn from_parts(name: impl Into<String>, schema: Schema, tuples: Vec<Tuple>) -> Self {
        Self {
            name: name.into(),
            schema,
            tuples,
        }
    }

    /// Get table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get table schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    /// Index where the next appended row lands (the placeholder cursor)
    pub fn insertion_point(&self) -> usize {
        self.tuples.len()
    }

    /// Get row count
    pub fn row_count(&self) -> usize {
        self.tuples.len()
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // ========== Mutations ==========

    /// Append a row with a fresh id, `value` in `column` and `null` elsewhere.
    ///
    /// Returns the generated id.
    pub fn add_value(&mut self, column: &str, value: &str) -> Result<String> {
        let position = self.position_of(column)?;
        codec::check_value(value)?;

        let id = Uuid::new_v4().to_string();
        let values = self
            .schema
            .columns()
            .iter()
            .map(|c| {
                if c.position == 1 {
                    Value::Set(id.clone())
                } else if c.position == position {
                    Value::Set(value.to_string())
                } else {
                    Value::Null
                }
            })
            .collect();
        self.append(Tuple::from_values(values));
        Ok(id)
    }

    /// Append a row filling columns in order.
    ///
    /// With `generate_id` a fresh id is generated and `values` fill columns
    /// 2..N. Without it the first value is the row id. Missing trailing
    /// values are stored as `null`. Returns the row id.
    pub fn add_values<S: AsRef<str>>(&mut self, values: &[S], generate_id: bool) -> Result<String> {
        let mut row: Vec<Value> = Vec::with_capacity(self.schema.column_count());
        if generate_id {
            row.push(Value::Set(Uuid::new_v4().to_string()));
        }
        for value in values {
            codec::check_value(value.as_ref())?;
            row.push(Value::from_stored(value.as_ref()));
        }

        if row.len() > self.schema.column_count() {
            return Err(Error::Validation(format!(
                "table '{}' has {} columns, got {} values",
                self.name,
                self.schema.column_count(),
                row.len()
            )));
        }

        let id = match row.first() {
            Some(Value::Set(id)) if !id.is_empty() => id.clone(),
            _ => return Err(Error::Validation("row id is required".to_string())),
        };
        if self.find(&id).is_some() {
            return Err(Error::Validation(format!(
                "row id '{}' already exists in table '{}'",
                id, self.name
            )));
        }

        row.resize(self.schema.column_count(), Value::Null);
        self.append(Tuple::from_values(row));
        Ok(id)
    }

    /// Replace one field of the row with `id`
    pub fn update_value(&mut self, column: &str, id: &str, value: &str) -> Result<()> {
        let position = self.position_of(column)?;
        codec::check_value(value)?;
        let index = self
            .find(id)
            .ok_or_else(|| Error::row_not_found(id, &self.name))?;
        self.tuples[index].set(position, Value::from_stored(value));
        Ok(())
    }

    /// Rename a column, keeping its position
    pub fn update_column_name(&mut self, old: &str, new: &str) -> Result<()> {
        if old == ID_COLUMN {
            return Err(Error::Validation("the id column cannot be renamed".to_string()));
        }
        codec::check_name("column", new)?;
        if !self.schema.rename_column(old, new) {
            return Err(Error::column_not_found(old, &self.name));
        }
        Ok(())
    }

    /// Remove the row with `id` and return it
    pub fn delete_row(&mut self, id: &str) -> Result<Tuple> {
        let index = self
            .find(id)
            .ok_or_else(|| Error::row_not_found(id, &self.name))?;
        Ok(self.tuples.remove(index))
    }

    /// Remove a column from the schema and from every row, renumbering tags
    pub fn delete_column(&mut self, column: &str) -> Result<()> {
        if column == ID_COLUMN {
            return Err(Error::Validation("the id column cannot be deleted".to_string()));
        }
        let position = self
            .schema
            .remove_column(column)
            .ok_or_else(|| Error::column_not_found(column, &self.name))?;
        for tuple in self.tuples.iter_mut() {
            tuple.remove_position(position);
        }
        Ok(())
    }

    // ========== Lookups ==========

    /// Get a row by exact id match
    pub fn get_row_by_id(&self, id: &str) -> Result<Row> {
        self.find(id)
            .map(|i| Row::from_tuple(&self.schema, &self.tuples[i]))
            .ok_or_else(|| Error::row_not_found(id, &self.name))
    }

    /// Get all rows in file order
    pub fn get_rows(&self) -> Rows {
        let rows = self
            .tuples
            .iter()
            .map(|t| Row::from_tuple(&self.schema, t))
            .collect();
        Rows::new(&self.name, self.schema.column_names(), rows)
    }

    /// Get column names in position order
    pub fn get_columns(&self) -> Vec<String> {
        self.schema.column_names()
    }

    /// First row whose `column` equals `value`
    pub fn search_one(&self, column: &str, value: &str) -> Result<Row> {
        let position = self.position_of(column)?;
        self.tuples
            .iter()
            .find(|t| t.get(position).map(Value::as_str) == Some(value))
            .map(|t| Row::from_tuple(&self.schema, t))
            .ok_or_else(|| Error::ValueNotFound {
                value: value.to_string(),
                column: column.to_string(),
            })
    }

    /// All rows whose `column` equals `value`
    pub fn search_all(&self, column: &str, value: &str) -> Result<Rows> {
        self.search_where(column, |v| v.as_str() == value)
    }

    /// All rows whose `column` value satisfies `predicate`
    pub fn search_where<F>(&self, column: &str, mut predicate: F) -> Result<Rows>
    where
        F: FnMut(&Value) -> bool,
    {
        let position = self.position_of(column)?;
        let rows = self
            .tuples
            .iter()
            .filter(|t| t.get(position).map_or(false, &mut predicate))
            .map(|t| Row::from_tuple(&self.schema, t))
            .collect();
        Ok(Rows::new(&self.name, self.schema.column_names(), rows))
    }

    fn append(&mut self, tuple: Tuple) {
        let at = self.insertion_point();
        self.tuples.insert(at, tuple);
    }

    fn find(&self, id: &str) -> Option<usize> {
        self.tuples.iter().position(|t| t.id() == Some(id))
    }

    fn position_of(&self, column: &str) -> Result<Position> {
        self.schema
            .position_of(column)
            .ok_or_else(|| Error::column_not_found(column, &self.name))
    }
}

impl fmt::Display for Table {
    /// Renders the table segment as it appears in the file
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::render_table(self))
    }
}
