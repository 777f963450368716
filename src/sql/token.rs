//! SQL Token definitions
//!
//! This module defines all tokens that can appear in a textdb statement.

use std::cmp::Ordering;
use std::fmt;

use crate::storage::Value;

/// SQL Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // ========== Keywords ==========
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Table,
    Into,
    Values,
    Set,
    From,
    Where,

    // ========== Literals ==========
    /// Bare word: table name, column name or unquoted value
    Word(String),
    /// String literal (single-quoted)
    StringLiteral(String),

    // ========== Operators ==========
    /// =
    Eq,
    /// <> or !=
    Neq,
    /// <
    Lt,
    /// >
    Gt,
    /// <=
    Lte,
    /// >=
    Gte,
    /// *
    Asterisk,

    // ========== Delimiters ==========
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// ;
    Semicolon,

    // ========== Special ==========
    /// End of input
    Eof,
}

impl Token {
    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Select
                | Token::Insert
                | Token::Update
                | Token::Delete
                | Token::Drop
                | Token::Table
                | Token::Into
                | Token::Values
                | Token::Set
                | Token::From
                | Token::Where
        )
    }

    /// Separators carry no meaning between list items
    pub fn is_separator(&self) -> bool {
        matches!(self, Token::Comma | Token::LParen | Token::RParen)
    }

    /// Try to parse a keyword from a string
    pub fn from_keyword(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            "SELECT" => Some(Token::Select),
            "INSERT" => Some(Token::Insert),
            "UPDATE" => Some(Token::Update),
            "DELETE" => Some(Token::Delete),
            "DROP" => Some(Token::Drop),
            "TABLE" => Some(Token::Table),
            "INTO" => Some(Token::Into),
            "VALUES" => Some(Token::Values),
            "SET" => Some(Token::Set),
            "FROM" => Some(Token::From),
            "WHERE" => Some(Token::Where),
            _ => None,
        }
    }

    /// The comparison operator this token stands for, if any
    pub fn as_compare_op(&self) -> Option<CompareOp> {
        match self {
            Token::Eq => Some(CompareOp::Eq),
            Token::Neq => Some(CompareOp::NotEq),
            Token::Lt => Some(CompareOp::Lt),
            Token::Lte => Some(CompareOp::LtEq),
            Token::Gt => Some(CompareOp::Gt),
            Token::Gte => Some(CompareOp::GtEq),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Select => write!(f, "SELECT"),
            Token::Insert => write!(f, "INSERT"),
            Token::Update => write!(f, "UPDATE"),
            Token::Delete => write!(f, "DELETE"),
            Token::Drop => write!(f, "DROP"),
            Token::Table => write!(f, "TABLE"),
            Token::Into => write!(f, "INTO"),
            Token::Values => write!(f, "VALUES"),
            Token::Set => write!(f, "SET"),
            Token::From => write!(f, "FROM"),
            Token::Where => write!(f, "WHERE"),
            Token::Word(s) => write!(f, "{}", s),
            Token::StringLiteral(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "<>"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Lte => write!(f, "<="),
            Token::Gte => write!(f, ">="),
            Token::Asterisk => write!(f, "*"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Comparison operator of a WHERE predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    /// Compare a stored value against a literal by raw text
    pub fn evaluate(&self, value: &Value, literal: &str) -> bool {
        let ord = value.as_str().cmp(literal);
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::NotEq => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::LtEq => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::GtEq => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_parsing() {
        assert_eq!(Token::from_keyword("SELECT"), Some(Token::Select));
        assert_eq!(Token::from_keyword("select"), Some(Token::Select));
        assert_eq!(Token::from_keyword("SeLeCt"), Some(Token::Select));
        assert_eq!(Token::from_keyword("unknown"), None);
    }

    #[test]
    fn test_is_keyword() {
        assert!(Token::Select.is_keyword());
        assert!(Token::Values.is_keyword());
        assert!(!Token::Asterisk.is_keyword());
        assert!(!Token::Word("users".to_string()).is_keyword());
    }

    #[test]
    fn test_compare_is_lexicographic() {
        let age = Value::from("100");
        assert!(CompareOp::Lt.evaluate(&age, "32"));
        assert!(CompareOp::GtEq.evaluate(&age, "100"));
        assert!(CompareOp::NotEq.evaluate(&age, "54"));
        assert!(!CompareOp::Eq.evaluate(&Value::Null, "pedro"));
        assert!(CompareOp::Eq.evaluate(&Value::Null, "null"));
    }
}
