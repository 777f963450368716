//! Database configuration
//!
//! A [`DbConfig`] names the database file, optionally carries the
//! encryption passphrase, and lists seed tables applied when the database
//! is opened.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::catalog::ID_COLUMN;
use crate::error::{Error, Result};

/// Required extension of a database file
pub const DATABASE_EXTENSION: &str = "txt";

/// Static rows imported into one table when the database is opened.
///
/// Every row starts with its id, so re-running the import only adds rows
/// whose id is not yet present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeedTable {
    /// Table name
    pub name: String,
    /// Column names, with or without a leading `id`
    pub columns: Vec<String>,
    /// Rows, each starting with its id
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl SeedTable {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Add a row; the first value is the row id
    pub fn row<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    /// Column names without a leading `id`
    pub fn data_columns(&self) -> &[String] {
        match self.columns.first() {
            Some(first) if first.eq_ignore_ascii_case(ID_COLUMN) => &self.columns[1..],
            _ => &self.columns,
        }
    }

    /// Number of values every row must carry
    pub fn row_arity(&self) -> usize {
        self.data_columns().len() + 1
    }

    fn problems(&self) -> Vec<String> {
        if self.name.trim().is_empty() {
            return vec!["seed table name is required".to_string()];
        }
        if self.data_columns().is_empty() {
            return vec![format!("seed table '{}' has no columns", self.name)];
        }
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.len() != self.row_arity())
            .map(|(i, row)| {
                format!(
                    "seed table '{}' row {}: expected {} values, got {}",
                    self.name,
                    i + 1,
                    self.row_arity(),
                    row.len()
                )
            })
            .collect()
    }
}

/// Database configuration
#[derive(Clone, Default, PartialEq, Deserialize)]
pub struct DbConfig {
    /// Path of the database file, ending in `.txt`
    pub database_name: String,
    /// Passphrase for encryption at rest; blank means no encryption
    #[serde(default)]
    pub encryption_key: Option<String>,
    /// Seed tables applied on open
    #[serde(default)]
    pub seed: Vec<SeedTable>,
}

impl DbConfig {
    /// Create a config for the given database file
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            ..Self::default()
        }
    }

    /// Set the encryption passphrase
    pub fn encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    /// Add a seed table
    pub fn seed(mut self, table: SeedTable) -> Self {
        self.seed.push(table);
        self
    }

    /// Load a config from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Validation(format!("invalid database config: {}", e)))
    }

    /// The passphrase, unless absent or blank
    pub fn passphrase(&self) -> Option<&str> {
        self.encryption_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    /// Check the file name and every seed table, reporting all problems at once
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.database_name.trim().is_empty() {
            problems.push("database name is required".to_string());
        } else if !has_database_extension(&self.database_name) {
            problems.push(format!(
                "database name '{}' must be a .{} file",
                self.database_name, DATABASE_EXTENSION
            ));
        }

        for table in &self.seed {
            problems.extend(table.problems());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(problems.join("\n")))
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("database_name", &self.database_name)
            .field("encryption_key", &self.passphrase().map(|_| "<redacted>"))
            .field("seed", &self.seed)
            .finish()
    }
}

/// `name.txt` with exactly one dot in the file name
fn has_database_extension(path: &str) -> bool {
    let Some(file_name) = Path::new(path).file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let parts: Vec<&str> = file_name.split('.').collect();
    parts.len() == 2 && !parts[0].is_empty() && parts[1] == DATABASE_EXTENSION
}
