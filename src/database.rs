//! Database handle
//!
//! A [`Database`] owns the path and the session envelope of one database
//! file. Every call re-reads the file, applies its change to the in-memory
//! [`Catalog`] and rewrites the whole file. A call that fails before the
//! rewrite leaves the file untouched.
//!
//! There is no locking: two handles mutating the same file race and the
//! last writer wins.

use std::path::Path;

use tracing::{debug, info};

use crate::catalog::{Catalog, ForeignKey, RelatedRows};
use crate::config::{DbConfig, SeedTable};
use crate::error::{Error, Result};
use crate::executor::{ExecutionEngine, QueryResult};
use crate::sql::SqlStatement;
use crate::storage::{DiskManager, Envelope, Table};

/// An open database file
#[derive(Debug)]
pub struct Database {
    /// Database name as configured
    name: String,
    /// File access through the session envelope
    disk: DiskManager,
}

impl Database {
    /// Open a database, creating the file if it does not exist.
    ///
    /// With an encryption key, a plaintext file is sealed in place before
    /// first use. A sealed file opened without a key is a `Decryption`
    /// error. Seed tables are applied last and only add rows whose id is
    /// missing.
    pub fn open(config: &DbConfig) -> Result<Self> {
        config.validate()?;

        let envelope = config.passphrase().map(Envelope::from_passphrase);
        let disk = DiskManager::new(&config.database_name, envelope);

        if disk.exists() {
            disk.seal_in_place()?;
        } else {
            info!(
                path = %disk.path().display(),
                encrypted = disk.is_encrypted(),
                "creating database file"
            );
            disk.save(&Catalog::new())?;
        }

        let db = Self {
            name: config.database_name.clone(),
            disk,
        };

        let mut catalog = db.disk.load()?;
        let seeded = apply_seed(&mut catalog, &config.seed)?;
        if seeded > 0 {
            db.disk.save(&catalog)?;
        }

        info!(
            database = %db.name,
            tables = catalog.tables().len(),
            seeded,
            encrypted = db.is_encrypted(),
            "database opened"
        );
        Ok(db)
    }

    /// Get database name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        self.disk.path()
    }

    /// Whether reads and writes go through the encryption envelope
    pub fn is_encrypted(&self) -> bool {
        self.disk.is_encrypted()
    }

    /// Snapshot of every table in the file
    pub fn catalog(&self) -> Result<Catalog> {
        self.disk.load()
    }

    pub fn tables(&self) -> Result<Vec<Table>> {
        Ok(self.disk.load()?.into_tables())
    }

    /// List all table names in file order
    pub fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.disk.load()?.list_tables())
    }

    /// Snapshot of one table
    pub fn table(&self, name: &str) -> Result<Table> {
        self.disk.load()?.get_table(name).cloned()
    }

    /// Plaintext rendering of the whole file
    pub fn dump(&self) -> Result<String> {
        self.disk.read()
    }

    // ========== Tables ==========

    /// Create an empty table; `id` is prepended to `columns`
    pub fn create_table<S: AsRef<str>>(&self, name: &str, columns: &[S]) -> Result<Table> {
        let table = self.mutate(|catalog| catalog.create_table(name, columns).cloned())?;
        info!(table = name, "created table");
        Ok(table)
    }

    /// Delete a table and every foreign key that mentions it
    pub fn delete_table(&self, name: &str) -> Result<()> {
        self.mutate(|catalog| catalog.drop_table(name).map(|_| ()))?;
        info!(table = name, "deleted table");
        Ok(())
    }

    pub fn rename_table(&self, old: &str, new: &str) -> Result<()> {
        self.mutate(|catalog| catalog.rename_table(old, new))?;
        info!(old, new, "renamed table");
        Ok(())
    }

    /// Rename a column; foreign keys using it follow the new name
    pub fn rename_column(&self, table: &str, old: &str, new: &str) -> Result<()> {
        self.mutate(|catalog| catalog.rename_column(table, old, new))
    }

    /// Remove a column from the schema and every row, dropping the foreign
    /// keys that use it
    pub fn delete_column(&self, table: &str, column: &str) -> Result<()> {
        self.mutate(|catalog| catalog.delete_column(table, column))?;
        debug!(table, column, "deleted column");
        Ok(())
    }

    // ========== Rows ==========

    /// Append a row with `value` in `column` and `null` elsewhere; returns the new id
    pub fn add_value(&self, table: &str, column: &str, value: &str) -> Result<String> {
        self.mutate_table(table, |t| t.add_value(column, value))
    }

    /// Append a row filling columns 2..N in order; returns the new id
    pub fn add_values<S: AsRef<str>>(&self, table: &str, values: &[S]) -> Result<String> {
        self.mutate_table(table, |t| t.add_values(values, true))
    }

    /// Append a row whose first value is its id
    pub fn add_values_with_id<S: AsRef<str>>(&self, table: &str, values: &[S]) -> Result<String> {
        self.mutate_table(table, |t| t.add_values(values, false))
    }

    pub fn update_value(&self, table: &str, column: &str, id: &str, value: &str) -> Result<()> {
        self.mutate_table(table, |t| t.update_value(column, id, value))
    }

    /// Delete a row; with `cascade`, dependent rows go too. Returns the
    /// number of rows removed.
    pub fn delete_row(&self, table: &str, id: &str, cascade: bool) -> Result<usize> {
        self.mutate(|catalog| catalog.delete_row(table, id, cascade))
    }

    // ========== Foreign keys ==========

    pub fn add_foreign_key(&self, key: &ForeignKey) -> Result<()> {
        self.mutate(|catalog| catalog.add_foreign_key(key))
    }

    /// Register keys in order. Keys registered before a failure are kept.
    pub fn add_foreign_keys(&self, keys: &[ForeignKey]) -> Result<()> {
        for key in keys {
            self.add_foreign_key(key)?;
        }
        Ok(())
    }

    pub fn remove_foreign_key(&self, key: &ForeignKey) -> Result<()> {
        self.mutate(|catalog| catalog.remove_foreign_key(key))
    }

    pub fn foreign_keys(&self) -> Result<Vec<ForeignKey>> {
        self.disk.load()?.foreign_keys()
    }

    pub fn search_by_foreign_key(&self, table: &str, id: &str) -> Result<Vec<RelatedRows>> {
        self.disk.load()?.search_by_foreign_key(table, id)
    }

    // ========== Queries ==========

    /// Execute one statement of the query dialect
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        let statement = SqlStatement::parse(sql)?;
        let mut catalog = self.disk.load()?;
        let result = ExecutionEngine::new(&mut catalog).execute(&statement)?;
        if statement.is_mutating() {
            self.disk.save(&catalog)?;
        }
        debug!(
            verb = statement.verb(),
            affected_rows = result.affected_rows,
            rows = result.rows.len(),
            "statement executed"
        );
        Ok(result)
    }

    // ========== Encryption ==========

    /// Rewrite the file as plaintext and return a handle without a key
    pub fn remove_encryption(self) -> Result<Database> {
        if !self.is_encrypted() {
            return Err(Error::Validation(format!(
                "database '{}' is not encrypted",
                self.name
            )));
        }
        self.disk.unseal_in_place()?;
        let disk = DiskManager::new(self.disk.path(), None);
        Ok(Database {
            name: self.name,
            disk,
        })
    }

    fn mutate<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Catalog) -> Result<T>,
    {
        let mut catalog = self.disk.load()?;
        let out = op(&mut catalog)?;
        self.disk.save(&catalog)?;
        Ok(out)
    }

    fn mutate_table<T, F>(&self, table: &str, op: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<T>,
    {
        self.mutate(|catalog| op(catalog.writable_table_mut(table)?))
    }
}

/// Create missing seed tables and add rows whose id is absent.
///
/// Returns the number of tables and rows added.
fn apply_seed(catalog: &mut Catalog, seed: &[SeedTable]) -> Result<usize> {
    let mut added = 0;
    for seed_table in seed {
        if !catalog.table_exists(&seed_table.name) {
            catalog.create_table(&seed_table.name, seed_table.data_columns())?;
            added += 1;
        }
        let table = catalog.writable_table_mut(&seed_table.name)?;
        for row in &seed_table.rows {
            let Some(id) = row.first() else { continue };
            if table.get_row_by_id(id).is_ok() {
                continue;
            }
            table.add_values(row, false)?;
            added += 1;
        }
        debug!(table = %seed_table.name, "applied seed data");
    }
    Ok(added)
}
