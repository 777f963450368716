//! SQL statement classification
//!
//! Statements are classified by their first token and read left to right
//! with no backtracking. There is no expression grammar: a predicate is a
//! single `column OP value` and separators between list items are ignored.

use std::fmt;

use super::lexer::Lexer;
use super::token::{CompareOp, Token};
use crate::error::{Error, Result};

/// Columns returned by a SELECT
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`
    All,
    Columns(Vec<String>),
}

/// A single `column OP value` filter
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: CompareOp,
    pub value: String,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.value)
    }
}

/// `column = value` in an UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: String,
}

/// A classified statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlStatement {
    Select {
        table: String,
        projection: Projection,
        predicate: Option<Predicate>,
    },
    Update {
        table: String,
        assignments: Vec<Assignment>,
        predicate: Option<Predicate>,
    },
    Delete {
        table: String,
        predicate: Option<Predicate>,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<String>,
    },
    Drop {
        table: String,
    },
}

impl SqlStatement {
    /// Tokenize and classify one statement
    pub fn parse(sql: &str) -> Result<Self> {
        let tokens = Lexer::new(sql).tokenize()?;
        let mut parser = Parser {
            tokens,
            position: 0,
        };
        let statement = parser.parse_statement()?;
        parser.expect_end()?;
        Ok(statement)
    }

    /// Table the statement targets
    pub fn table(&self) -> &str {
        match self {
            SqlStatement::Select { table, .. }
            | SqlStatement::Update { table, .. }
            | SqlStatement::Delete { table, .. }
            | SqlStatement::Insert { table, .. }
            | SqlStatement::Drop { table } => table,
        }
    }

    /// Verb keyword of the statement
    pub fn verb(&self) -> &'static str {
        match self {
            SqlStatement::Select { .. } => "SELECT",
            SqlStatement::Update { .. } => "UPDATE",
            SqlStatement::Delete { .. } => "DELETE",
            SqlStatement::Insert { .. } => "INSERT",
            SqlStatement::Drop { .. } => "DROP",
        }
    }

    /// Whether executing the statement rewrites the file
    pub fn is_mutating(&self) -> bool {
        !matches!(self, SqlStatement::Select { .. })
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn parse_statement(&mut self) -> Result<SqlStatement> {
        match self.current() {
            Token::Select => self.parse_select(),
            Token::Update => self.parse_update(),
            Token::Delete => self.parse_delete(),
            Token::Insert => self.parse_insert(),
            Token::Drop => self.parse_drop(),
            other => Err(Error::syntax(format!(
                "SELECT, UPDATE, DELETE, INSERT or DROP, found '{}'",
                other
            ))),
        }
    }

    // ========== SELECT Statement ==========

    fn parse_select(&mut self) -> Result<SqlStatement> {
        self.expect(&Token::Select)?;

        let projection = if self.check(&Token::Asterisk) {
            self.advance();
            Projection::All
        } else {
            let columns = self.parse_word_list(&Token::From)?;
            if columns.is_empty() {
                return Err(Error::syntax("column list or '*'"));
            }
            Projection::Columns(columns)
        };

        self.expect(&Token::From)?;
        let table = self.expect_table()?;
        let predicate = self.parse_where()?;

        Ok(SqlStatement::Select {
            table,
            projection,
            predicate,
        })
    }

    // ========== UPDATE Statement ==========

    fn parse_update(&mut self) -> Result<SqlStatement> {
        self.expect(&Token::Update)?;
        let table = self.expect_table()?;
        self.expect(&Token::Set)?;

        let mut assignments = Vec::new();
        loop {
            self.skip_separators();
            if self.check(&Token::Where) || self.at_statement_end() {
                break;
            }
            let column = self.expect_word("column name")?;
            if !self.check(&Token::Eq) {
                return Err(Error::syntax(format!("'=' after '{}'", column)));
            }
            self.advance();
            let value = self.expect_value()?;
            assignments.push(Assignment { column, value });
        }
        if assignments.is_empty() {
            return Err(Error::syntax("assignment after SET"));
        }

        let predicate = self.parse_where()?;

        Ok(SqlStatement::Update {
            table,
            assignments,
            predicate,
        })
    }

    // ========== DELETE Statement ==========

    fn parse_delete(&mut self) -> Result<SqlStatement> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;
        let table = self.expect_table()?;
        let predicate = self.parse_where()?;

        Ok(SqlStatement::Delete { table, predicate })
    }

    // ========== INSERT Statement ==========

    fn parse_insert(&mut self) -> Result<SqlStatement> {
        self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;
        let table = self.expect_table()?;

        let columns = self.parse_word_list(&Token::Values)?;
        self.expect(&Token::Values)?;

        let mut values = Vec::new();
        loop {
            self.skip_separators();
            if self.at_statement_end() {
                break;
            }
            values.push(self.expect_value()?);
        }

        Ok(SqlStatement::Insert {
            table,
            columns,
            values,
        })
    }

    // ========== DROP Statement ==========

    fn parse_drop(&mut self) -> Result<SqlStatement> {
        self.expect(&Token::Drop)?;
        self.expect(&Token::Table)?;
        let table = self.expect_table()?;
        Ok(SqlStatement::Drop { table })
    }

    // ========== Clauses ==========

    fn parse_where(&mut self) -> Result<Option<Predicate>> {
        if !self.check(&Token::Where) {
            return Ok(None);
        }
        self.advance();

        let column = self.expect_word("column name after WHERE")?;
        let op = self
            .current()
            .as_compare_op()
            .ok_or_else(|| Error::syntax(format!("comparison operator after '{}'", column)))?;
        self.advance();
        let value = self.expect_value()?;

        Ok(Some(Predicate { column, op, value }))
    }

    /// Words up to `stop`, ignoring separators
    fn parse_word_list(&mut self, stop: &Token) -> Result<Vec<String>> {
        let mut words = Vec::new();
        loop {
            self.skip_separators();
            if self.check(stop) {
                return Ok(words);
            }
            if self.at_statement_end() {
                return Err(Error::syntax(stop.to_string()));
            }
            words.push(self.expect_word("column name")?);
        }
    }

    // ========== Helpers ==========

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.current(), Token::Eof | Token::Semicolon)
    }

    fn skip_separators(&mut self) {
        while self.current().is_separator() {
            self.advance();
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(Error::syntax(format!("{}, found '{}'", token, self.current())))
        }
    }

    fn expect_word(&mut self, what: &str) -> Result<String> {
        match self.current().clone() {
            Token::Word(word) => {
                self.advance();
                Ok(word)
            }
            other => Err(Error::syntax(format!("{}, found '{}'", what, other))),
        }
    }

    fn expect_table(&mut self) -> Result<String> {
        self.expect_word("table name")
    }

    fn expect_value(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Word(value) | Token::StringLiteral(value) => {
                self.advance();
                Ok(value)
            }
            other => Err(Error::syntax(format!("value, found '{}'", other))),
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        if self.check(&Token::Semicolon) {
            self.advance();
        }
        match self.current() {
            Token::Eof => Ok(()),
            other => Err(Error::syntax(format!("end of statement, found '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(err: Error) -> String {
        match err {
            Error::SqlSyntax { expected } => expected,
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_select() {
        let stmt = SqlStatement::parse("SELECT * FROM Users").unwrap();
        assert_eq!(
            stmt,
            SqlStatement::Select {
                table: "Users".to_string(),
                projection: Projection::All,
                predicate: None,
            }
        );
        assert!(!stmt.is_mutating());
    }

    #[test]
    fn test_parse_select_with_where() {
        let stmt = SqlStatement::parse("select name, age from Users where age = 54;").unwrap();
        match stmt {
            SqlStatement::Select {
                table,
                projection,
                predicate,
            } => {
                assert_eq!(table, "Users");
                assert_eq!(
                    projection,
                    Projection::Columns(vec!["name".to_string(), "age".to_string()])
                );
                let predicate = predicate.unwrap();
                assert_eq!(predicate.column, "age");
                assert_eq!(predicate.op, CompareOp::Eq);
                assert_eq!(predicate.value, "54");
            }
            _ => panic!("Expected SELECT statement"),
        }
    }

    #[test]
    fn test_parse_update() {
        let stmt = SqlStatement::parse("UPDATE Users SET age=25, name = 'ana maria' WHERE age=32")
            .unwrap();
        match stmt {
            SqlStatement::Update {
                table,
                assignments,
                predicate,
            } => {
                assert_eq!(table, "Users");
                assert_eq!(assignments.len(), 2);
                assert_eq!(assignments[1].column, "name");
                assert_eq!(assignments[1].value, "ana maria");
                assert_eq!(predicate.unwrap().value, "32");
            }
            _ => panic!("Expected UPDATE statement"),
        }
    }

    #[test]
    fn test_parse_insert_multi_row() {
        let stmt =
            SqlStatement::parse("INSERT INTO Users (name, age) VALUES (maria, 20, carlitos, 32)")
                .unwrap();
        assert_eq!(
            stmt,
            SqlStatement::Insert {
                table: "Users".to_string(),
                columns: vec!["name".to_string(), "age".to_string()],
                values: vec![
                    "maria".to_string(),
                    "20".to_string(),
                    "carlitos".to_string(),
                    "32".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_parse_delete_and_drop() {
        let stmt = SqlStatement::parse("DELETE FROM Users WHERE name != pedro").unwrap();
        assert_eq!(stmt.verb(), "DELETE");
        assert!(stmt.is_mutating());

        let stmt = SqlStatement::parse("drop table Users").unwrap();
        assert_eq!(
            stmt,
            SqlStatement::Drop {
                table: "Users".to_string()
            }
        );
    }

    #[test]
    fn test_missing_required_tokens() {
        assert!(expected(SqlStatement::parse("SELECT name Users").unwrap_err()).contains("FROM"));
        assert!(expected(SqlStatement::parse("UPDATE Users age=1").unwrap_err()).contains("SET"));
        assert!(expected(SqlStatement::parse("INSERT Users VALUES (a)").unwrap_err()).contains("INTO"));
        assert!(
            expected(SqlStatement::parse("INSERT INTO Users (name) (a)").unwrap_err())
                .contains("VALUES")
        );
        assert!(expected(SqlStatement::parse("DROP Users").unwrap_err()).contains("TABLE"));
        assert!(expected(SqlStatement::parse("DELETE Users").unwrap_err()).contains("FROM"));
    }

    #[test]
    fn test_unknown_verb_names_token() {
        let err = SqlStatement::parse("TRUNCATE Users").unwrap_err();
        assert!(expected(err).contains("TRUNCATE"));
        assert!(SqlStatement::parse("").is_err());
    }

    #[test]
    fn test_bad_predicate() {
        assert!(SqlStatement::parse("SELECT * FROM Users WHERE age 54").is_err());
        assert!(SqlStatement::parse("SELECT * FROM Users WHERE age = 54 extra").is_err());
    }
}
