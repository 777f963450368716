//! Storage engine module
//!
//! This module contains the storage engine components:
//! - Text codec for the on-disk format
//! - Encryption envelope
//! - Disk manager
//! - Table engine and row types

pub mod codec;
pub mod disk;
pub mod envelope;
pub mod table;
pub mod tuple;

pub use disk::DiskManager;
pub use envelope::Envelope;
pub use table::Table;
pub use tuple::{Position, Row, Rows, Tuple, Value};
