//! Foreign-key relationships
//!
//! Relationships are ordinary rows of the reserved `Links` table, which is
//! prepended to the file the first time a foreign key is registered. All
//! lookups are linear scans over those rows.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::Catalog;
use crate::error::{Error, Result};
use crate::storage::{Row, Rows, Table};

/// Name of the reserved relationship table
pub const LINKS_TABLE: &str = "Links";

/// Columns of the relationship table, after `id`
pub const LINK_COLUMNS: [&str; 4] = ["table1", "columnLink1", "table2", "columnLink2"];

/// A relationship `table.column -> foreign_table.foreign_column`
///
/// `table` is the source: deleting one of its rows with cascade removes the
/// `foreign_table` rows whose `foreign_column` holds that row's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    pub foreign_table: String,
    pub foreign_column: String,
}

impl ForeignKey {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            foreign_table: foreign_table.into(),
            foreign_column: foreign_column.into(),
        }
    }

    fn from_row(row: &Row) -> Option<Self> {
        let field = |name: &str| row.get(name).map(|v| v.as_str().to_string());
        Some(Self {
            table: field(LINK_COLUMNS[0])?,
            column: field(LINK_COLUMNS[1])?,
            foreign_table: field(LINK_COLUMNS[2])?,
            foreign_column: field(LINK_COLUMNS[3])?,
        })
    }

    fn as_values(&self) -> [&str; 4] {
        [
            &self.table,
            &self.column,
            &self.foreign_table,
            &self.foreign_column,
        ]
    }

    pub(crate) fn mentions(&self, table: &str) -> bool {
        self.table == table || self.foreign_table == table
    }

    pub(crate) fn uses_column(&self, table: &str, column: &str) -> bool {
        (self.table == table && self.column == column)
            || (self.foreign_table == table && self.foreign_column == column)
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.table, self.column, self.foreign_table, self.foreign_column
        )
    }
}

/// Rows of one dependent table found through a foreign key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedRows {
    pub table: String,
    pub rows: Rows,
}

impl Catalog {
    /// Register a foreign key, creating the `Links` table if needed
    pub fn add_foreign_key(&mut self, key: &ForeignKey) -> Result<()> {
        if key.mentions(LINKS_TABLE) {
            return Err(Error::Validation(format!(
                "'{}' cannot take part in a foreign key",
                LINKS_TABLE
            )));
        }
        let source = self.get_table(&key.table)?;
        if !source.schema().has_column(&key.column) {
            return Err(Error::column_not_found(&key.column, &key.table));
        }
        let target = self.get_table(&key.foreign_table)?;
        if !target.schema().has_column(&key.foreign_column) {
            return Err(Error::column_not_found(&key.foreign_column, &key.foreign_table));
        }

        if self.foreign_keys()?.contains(key) {
            return Err(Error::DuplicateRelation(key.to_string()));
        }

        if !self.table_exists(LINKS_TABLE) {
            debug!("materializing {} table", LINKS_TABLE);
            self.insert_front(Table::new(LINKS_TABLE, LINK_COLUMNS));
        }
        self.get_table_mut(LINKS_TABLE)?
            .add_values(&key.as_values(), true)?;
        debug!(foreign_key = %key, "registered foreign key");
        Ok(())
    }

    /// Register several foreign keys in order, stopping at the first failure
    pub fn add_foreign_keys(&mut self, keys: &[ForeignKey]) -> Result<()> {
        for key in keys {
            self.add_foreign_key(key)?;
        }
        Ok(())
    }

    /// Remove a registered foreign key
    pub fn remove_foreign_key(&mut self, key: &ForeignKey) -> Result<()> {
        let id = self
            .link_entries()?
            .into_iter()
            .find(|(_, k)| k == key)
            .map(|(id, _)| id)
            .ok_or_else(|| Error::ForeignKeyNotFound(key.to_string()))?;
        self.get_table_mut(LINKS_TABLE)?.delete_row(&id)?;
        debug!(foreign_key = %key, "removed foreign key");
        Ok(())
    }

    /// All registered foreign keys, in registration order
    pub fn foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        Ok(self.link_entries()?.into_iter().map(|(_, k)| k).collect())
    }

    /// Foreign keys whose source is `table`.
    ///
    /// Fails with `ForeignKeyNotFound` if no relationship mentions `table`
    /// on either side.
    pub fn foreign_keys_from(&self, table: &str) -> Result<Vec<ForeignKey>> {
        let keys = self.foreign_keys()?;
        if !keys.iter().any(|k| k.mentions(table)) {
            return Err(Error::ForeignKeyNotFound(table.to_string()));
        }
        Ok(keys.into_iter().filter(|k| k.table == table).collect())
    }

    /// For each relationship with `table` as source, the rows of the
    /// dependent table whose foreign column equals `id`
    pub fn search_by_foreign_key(&self, table: &str, id: &str) -> Result<Vec<RelatedRows>> {
        self.get_table(table)?;
        self.foreign_keys_from(table)?
            .into_iter()
            .map(|key| {
                let rows = self
                    .get_table(&key.foreign_table)?
                    .search_all(&key.foreign_column, id)?;
                Ok(RelatedRows {
                    table: key.foreign_table,
                    rows,
                })
            })
            .collect()
    }

    /// Delete a row, optionally removing its dependents one level deep.
    ///
    /// Returns the number of rows deleted, the row itself included.
    pub fn delete_row(&mut self, table: &str, id: &str, cascade: bool) -> Result<usize> {
        self.writable_table_mut(table)?.get_row_by_id(id)?;

        let mut dependents = Vec::new();
        if cascade {
            match self.search_by_foreign_key(table, id) {
                Ok(related) => {
                    for group in related {
                        for row in &group.rows {
                            dependents.push((group.table.clone(), row.id().to_string()));
                        }
                    }
                }
                Err(Error::ForeignKeyNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        self.get_table_mut(table)?.delete_row(id)?;
        let mut deleted = 1;
        for (dependent, dependent_id) in dependents {
            // A self-referencing key may list the row already removed above.
            let target = self.get_table_mut(&dependent)?;
            if target.get_row_by_id(&dependent_id).is_ok() {
                target.delete_row(&dependent_id)?;
                deleted += 1;
            }
        }
        if deleted > 1 {
            debug!(table, id, cascaded = deleted - 1, "cascade delete");
        }
        Ok(deleted)
    }

    /// Remove every relationship matching `stale`; returns how many
    pub(crate) fn purge_links<F>(&mut self, stale: F) -> Result<usize>
    where
        F: Fn(&ForeignKey) -> bool,
    {
        let stale: Vec<String> = self
            .link_entries()?
            .into_iter()
            .filter(|(_, k)| stale(k))
            .map(|(id, _)| id)
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }
        let links = self.get_table_mut(LINKS_TABLE)?;
        for id in &stale {
            links.delete_row(id)?;
        }
        Ok(stale.len())
    }

    /// Rewrite `old` to `new` in every relationship
    pub(crate) fn rename_in_links(&mut self, old: &str, new: &str) -> Result<()> {
        let entries = self.link_entries()?;
        if entries.is_empty() {
            return Ok(());
        }
        let links = self.get_table_mut(LINKS_TABLE)?;
        for (id, key) in entries {
            if key.table == old {
                links.update_value(LINK_COLUMNS[0], &id, new)?;
            }
            if key.foreign_table == old {
                links.update_value(LINK_COLUMNS[2], &id, new)?;
            }
        }
        Ok(())
    }

    /// Rewrite column `old` of `table` to `new` in every relationship
    pub(crate) fn rename_column_in_links(&mut self, table: &str, old: &str, new: &str) -> Result<()> {
        let entries = self.link_entries()?;
        if entries.is_empty() {
            return Ok(());
        }
        let links = self.get_table_mut(LINKS_TABLE)?;
        for (id, key) in entries {
            if key.table == table && key.column == old {
                links.update_value(LINK_COLUMNS[1], &id, new)?;
            }
            if key.foreign_table == table && key.foreign_column == old {
                links.update_value(LINK_COLUMNS[3], &id, new)?;
            }
        }
        Ok(())
    }

    /// `(row id, relationship)` for every Links row
    fn link_entries(&self) -> Result<Vec<(String, ForeignKey)>> {
        let links = match self.get_table(LINKS_TABLE) {
            Ok(links) => links,
            Err(Error::TableNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        links
            .get_rows()
            .iter()
            .map(|row| {
                ForeignKey::from_row(row)
                    .map(|key| (row.id().to_string(), key))
                    .ok_or_else(|| {
                        Error::MalformedFormat(format!(
                            "{} table is missing relationship columns",
                            LINKS_TABLE
                        ))
                    })
            })
            .collect()
    }
}
