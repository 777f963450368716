//! textdb - An embedded record store kept in a single human-readable text file
//!
//! This library provides:
//! - Storage engine (text codec, encryption envelope, table engine)
//! - Catalog (schemas, table list, foreign keys)
//! - SQL-like queries (lexer, statement classification, executor)
//! - The `Database` handle tying them together

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;

pub use catalog::{Catalog, ForeignKey, RelatedRows};
pub use config::{DbConfig, SeedTable};
pub use database::Database;
pub use error::{Error, Result};
pub use executor::QueryResult;
pub use storage::{Row, Rows, Table, Value};
