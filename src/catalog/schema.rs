//! Schema definitions for textdb
//!
//! A schema is the ordered list of columns written on a table's second
//! line. Column 1 is always `id`.

use serde::Serialize;

use crate::storage::tuple::Position;

/// Name of the first column of every table
pub const ID_COLUMN: &str = "id";

/// Column definition in a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Column position (1-indexed, matches the position tag)
    pub position: Position,
    /// Column name
    pub name: String,
}

impl Column {
    pub fn new(position: Position, name: impl Into<String>) -> Self {
        Self {
            position,
            name: name.into(),
        }
    }
}

/// Table schema - defines the structure of a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    /// Ordered list of columns, positions 1..=N
    columns: Vec<Column>,
}

impl Schema {
    /// Create a schema from column names, prepending `id` unless the first
    /// name already is `id`.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.first().map(String::as_str) != Some(ID_COLUMN) {
            names.insert(0, ID_COLUMN.to_string());
        }
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column::new((i + 1) as Position, name))
            .collect();
        Self { columns }
    }

    /// Create a schema from already-positioned columns
    pub(crate) fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get column names in position order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Get number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column position by name
    pub fn position_of(&self, name: &str) -> Option<Position> {
        self.get_column(name).map(|c| c.position)
    }

    /// Check if column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    /// Rename a column in place. Returns false if `old` is not a column.
    pub fn rename_column(&mut self, old: &str, new: &str) -> bool {
        match self.columns.iter_mut().find(|c| c.name == old) {
            Some(col) => {
                col.name = new.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a column and return the position it held.
    ///
    /// The column that followed it takes over the freed position, and every
    /// later column shifts down by one, so positions stay 1..=N.
    pub fn remove_column(&mut self, name: &str) -> Option<Position> {
        let index = self.columns.iter().position(|c| c.name == name)?;
        let removed = self.columns.remove(index);
        for col in self.columns.iter_mut() {
            if col.position > removed.position {
                col.position -= 1;
            }
        }
        Some(removed.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_prepended() {
        let schema = Schema::new(["name", "age"]);
        assert_eq!(schema.column_names(), vec!["id", "name", "age"]);
        assert_eq!(schema.position_of("age"), Some(3));

        let schema = Schema::new(["id", "name"]);
        assert_eq!(schema.column_count(), 2);

        let schema = Schema::new(Vec::<String>::new());
        assert_eq!(schema.column_names(), vec!["id"]);
    }

    #[test]
    fn test_remove_column_leaves_no_gaps() {
        let mut schema = Schema::new(["a", "b", "c"]);
        assert_eq!(schema.remove_column("a"), Some(2));

        let positions: Vec<Position> = schema.columns().iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert_eq!(schema.position_of("b"), Some(2));
        assert_eq!(schema.position_of("c"), Some(3));
        assert_eq!(schema.remove_column("a"), None);
    }

    #[test]
    fn test_rename_column() {
        let mut schema = Schema::new(["name", "age"]);
        assert!(schema.rename_column("name", "username"));
        assert!(!schema.rename_column("name", "other"));
        assert_eq!(schema.position_of("username"), Some(2));
    }
}
