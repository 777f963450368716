//! SQL module
//!
//! Tokenizer and statement classification for the textdb query dialect:
//! SELECT, UPDATE, DELETE, INSERT and DROP TABLE with at most one predicate.

pub mod lexer;
pub mod statement;
pub mod token;

pub use lexer::Lexer;
pub use statement::{Assignment, Predicate, Projection, SqlStatement};
pub use token::{CompareOp, Token};
