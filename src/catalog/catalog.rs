//! Table catalog for textdb
//!
//! The catalog is the ordered list of table segments parsed from one
//! database file. Order is file order and is preserved on rewrite.

use tracing::debug;

use super::links::LINKS_TABLE;
use super::schema::ID_COLUMN;
use crate::error::{Error, Result};
use crate::storage::codec;
use crate::storage::Table;

/// All tables of a database, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tables: Vec<Table>,
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn into_tables(self) -> Vec<Table> {
        self.tables
    }

    /// List all table names in file order
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name().to_string()).collect()
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name() == name)
    }

    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Get a table by name for mutation
    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Get a table for a caller-driven mutation. The `Links` table only
    /// changes through the foreign-key operations.
    pub fn writable_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        if name == LINKS_TABLE {
            return Err(reserved_links());
        }
        self.get_table_mut(name)
    }

    /// Append a new empty table; `id` is prepended to `columns`
    pub fn create_table<S: AsRef<str>>(&mut self, name: &str, columns: &[S]) -> Result<&Table> {
        codec::check_name("table", name)?;
        if name == LINKS_TABLE {
            return Err(reserved_links());
        }
        for column in columns {
            let column = column.as_ref();
            codec::check_name("column", column)?;
            if column == ID_COLUMN {
                return Err(Error::Validation(format!(
                    "'{}' is added to every table and cannot be listed as a column",
                    ID_COLUMN
                )));
            }
        }

        let table = Table::new(name, columns.iter().map(|c| c.as_ref().to_string()));
        debug!(table = name, columns = ?table.get_columns(), "creating table");
        self.tables.push(table);
        Ok(&self.tables[self.tables.len() - 1])
    }

    /// Drop a table, along with every foreign key that mentions it
    pub fn drop_table(&mut self, name: &str) -> Result<Table> {
        if name == LINKS_TABLE {
            return Err(reserved_links());
        }
        let index = self
            .tables
            .iter()
            .position(|t| t.name() == name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        let table = self.tables.remove(index);
        let purged = self.purge_links(|key| key.mentions(name))?;
        if purged > 0 {
            debug!(table = name, purged, "removed foreign keys of dropped table");
        }
        Ok(table)
    }

    /// Rename a table, keeping header, footer and foreign keys consistent
    pub fn rename_table(&mut self, old: &str, new: &str) -> Result<()> {
        codec::check_name("table", new)?;
        if new == LINKS_TABLE {
            return Err(reserved_links());
        }
        self.writable_table_mut(old)?.set_name(new);
        self.rename_in_links(old, new)?;
        Ok(())
    }

    /// Rename a column, rewriting the foreign keys that use it
    pub fn rename_column(&mut self, table: &str, old: &str, new: &str) -> Result<()> {
        self.writable_table_mut(table)?.update_column_name(old, new)?;
        self.rename_column_in_links(table, old, new)
    }

    /// Delete a column along with every foreign key that uses it
    pub fn delete_column(&mut self, table: &str, column: &str) -> Result<()> {
        self.writable_table_mut(table)?.delete_column(column)?;
        let purged = self.purge_links(|key| key.uses_column(table, column))?;
        if purged > 0 {
            debug!(table, column, purged, "removed foreign keys of deleted column");
        }
        Ok(())
    }

    pub(crate) fn insert_front(&mut self, table: Table) {
        self.tables.insert(0, table);
    }
}

fn reserved_links() -> Error {
    Error::Validation(format!("'{}' is reserved for foreign keys", LINKS_TABLE))
}
