//! Query Executor for textdb
//!
//! This module runs classified statements against the in-memory catalog.
//! It only calls the same table and catalog operations a direct API caller
//! would; persisting the catalog afterwards is the caller's job.

use serde::Serialize;
use tracing::debug;

use crate::catalog::{Catalog, ID_COLUMN};
use crate::error::{Error, Result};
use crate::sql::{Assignment, Predicate, Projection, SqlStatement};
use crate::storage::{Row, Rows, Table};

/// Query result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// Number of affected rows (for INSERT/UPDATE/DELETE)
    pub affected_rows: usize,
    /// Result rows (for SELECT)
    pub rows: Rows,
}

impl QueryResult {
    /// Create a new empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a result carrying rows
    pub fn with_rows(rows: Rows) -> Self {
        Self {
            affected_rows: 0,
            rows,
        }
    }

    /// Create a result with affected rows count
    pub fn with_affected_rows(count: usize) -> Self {
        Self {
            affected_rows: count,
            rows: Rows::default(),
        }
    }
}

/// Execution Engine
pub struct ExecutionEngine<'a> {
    /// Catalog the statement runs against
    catalog: &'a mut Catalog,
}

impl<'a> ExecutionEngine<'a> {
    /// Create a new execution engine
    pub fn new(catalog: &'a mut Catalog) -> Self {
        Self { catalog }
    }

    /// Execute a statement
    pub fn execute(&mut self, statement: &SqlStatement) -> Result<QueryResult> {
        debug!(verb = statement.verb(), table = statement.table(), "executing statement");
        match statement {
            SqlStatement::Select {
                table,
                projection,
                predicate,
            } => self.execute_select(table, projection, predicate.as_ref()),
            SqlStatement::Update {
                table,
                assignments,
                predicate,
            } => self.execute_update(table, assignments, predicate.as_ref()),
            SqlStatement::Delete { table, predicate } => {
                self.execute_delete(table, predicate.as_ref())
            }
            SqlStatement::Insert {
                table,
                columns,
                values,
            } => self.execute_insert(table, columns, values),
            SqlStatement::Drop { table } => self.execute_drop_table(table),
        }
    }

    fn execute_select(
        &mut self,
        table_name: &str,
        projection: &Projection,
        predicate: Option<&Predicate>,
    ) -> Result<QueryResult> {
        let table = self.catalog.get_table(table_name)?;

        let columns = match projection {
            Projection::All => table.get_columns(),
            Projection::Columns(columns) => {
                for column in columns {
                    ensure_column(table, column)?;
                }
                columns.clone()
            }
        };

        let matched = match predicate {
            Some(predicate) => filter(table, predicate)?,
            None => table.get_rows(),
        };

        let rows: Vec<Row> = matched.iter().map(|r| r.project(&columns)).collect();
        Ok(QueryResult::with_rows(Rows::new(table_name, columns, rows)))
    }

    fn execute_update(
        &mut self,
        table_name: &str,
        assignments: &[Assignment],
        predicate: Option<&Predicate>,
    ) -> Result<QueryResult> {
        let table = self.catalog.get_table(table_name)?;
        for assignment in assignments {
            if assignment.column == ID_COLUMN {
                return Err(Error::Validation("the id column cannot be updated".to_string()));
            }
            ensure_column(table, &assignment.column)?;
        }

        // Without a predicate no rows resolve.
        let ids = match predicate {
            Some(predicate) => matching_ids(table, predicate)?,
            None => Vec::new(),
        };

        let table = self.catalog.writable_table_mut(table_name)?;
        for id in &ids {
            for assignment in assignments {
                table.update_value(&assignment.column, id, &assignment.value)?;
            }
        }

        Ok(QueryResult::with_affected_rows(ids.len()))
    }

    fn execute_delete(
        &mut self,
        table_name: &str,
        predicate: Option<&Predicate>,
    ) -> Result<QueryResult> {
        let table = self.catalog.get_table(table_name)?;
        let ids = match predicate {
            Some(predicate) => matching_ids(table, predicate)?,
            None => Vec::new(),
        };

        let table = self.catalog.writable_table_mut(table_name)?;
        for id in &ids {
            table.delete_row(id)?;
        }

        Ok(QueryResult::with_affected_rows(ids.len()))
    }

    fn execute_insert(
        &mut self,
        table_name: &str,
        columns: &[String],
        values: &[String],
    ) -> Result<QueryResult> {
        let table = self.catalog.writable_table_mut(table_name)?;
        let table_columns = table.get_columns();

        for column in columns {
            ensure_column(table, column)?;
        }

        // Either every column but id (ids are generated) or every column.
        let explicit_id = columns.iter().any(|c| c == ID_COLUMN);
        let targets: Vec<&String> = table_columns
            .iter()
            .filter(|c| explicit_id || c.as_str() != ID_COLUMN)
            .collect();
        if !columns.is_empty()
            && (columns.len() != targets.len() || targets.iter().any(|t| !columns.contains(*t)))
        {
            return Err(Error::Validation(format!(
                "INSERT into '{}' must list the columns {:?}",
                table_name, targets
            )));
        }

        if targets.is_empty() || values.is_empty() || values.len() % targets.len() != 0 {
            return Err(Error::Validation(format!(
                "{} values do not fill rows of {} columns",
                values.len(),
                targets.len()
            )));
        }

        // Index into each value group for every target column, in schema order
        let order: Vec<usize> = if columns.is_empty() {
            (0..targets.len()).collect()
        } else {
            targets
                .iter()
                .filter_map(|t| columns.iter().position(|c| c == *t))
                .collect()
        };

        let mut inserted = 0;
        for group in values.chunks(targets.len()) {
            let row: Vec<&str> = order.iter().map(|&i| group[i].as_str()).collect();
            table.add_values(&row, !explicit_id)?;
            inserted += 1;
        }

        Ok(QueryResult::with_affected_rows(inserted))
    }

    fn execute_drop_table(&mut self, table_name: &str) -> Result<QueryResult> {
        self.catalog.drop_table(table_name)?;
        Ok(QueryResult::empty())
    }
}

fn ensure_column(table: &Table, column: &str) -> Result<()> {
    if table.schema().has_column(column) {
        Ok(())
    } else {
        Err(Error::column_not_found(column, table.name()))
    }
}

fn filter(table: &Table, predicate: &Predicate) -> Result<Rows> {
    table.search_where(&predicate.column, |value| {
        predicate.op.evaluate(value, &predicate.value)
    })
}

fn matching_ids(table: &Table, predicate: &Predicate) -> Result<Vec<String>> {
    Ok(filter(table, predicate)?
        .iter()
        .map(|row| row.id().to_string())
        .collect())
}
