//! Catalog module
//!
//! This module contains the ordered table list, schema definitions and the
//! foreign-key relationships kept in the reserved `Links` table.

pub mod catalog;
pub mod links;
pub mod schema;

pub use catalog::Catalog;
pub use links::{ForeignKey, RelatedRows, LINKS_TABLE};
pub use schema::{Column, Schema, ID_COLUMN};
