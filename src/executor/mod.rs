//! Query execution module
//!
//! This module dispatches classified statements to table and catalog
//! operations.

pub mod executor;

pub use executor::{ExecutionEngine, QueryResult};
