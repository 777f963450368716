//! Text format reader/writer
//!
//! A database file is a sequence of table segments separated by the
//! boundary token:
//!
//! ```text
//! ////
//! -----Users-----
//! [1] id [2] name [3] age
//! |1| 1 |2| pedro |3| 32
//! |1| 2 |2| juan |3| 54
//! !*!
//! -----Users_End-----
//! ////
//! ```
//!
//! The schema line tags columns with `[pos]`, row lines tag values with
//! `|pos|`. The `!*!` cursor appears exactly once per table, right before
//! the footer, and marks where the next row is appended. Spaces inside
//! values are written as `U+0020`.

use tracing::warn;

use crate::catalog::{Column, Schema};
use crate::error::{Error, Result};
use crate::sql::Token;
use crate::storage::table::Table;
use crate::storage::tuple::{Position, Tuple, Value};

/// Marker surrounding every table segment
pub const BOUNDARY: &str = "////";
/// Fence wrapping table names in header and footer lines
pub const FENCE: &str = "-----";
/// Placeholder cursor marking the next row insertion point
pub const CURSOR: &str = "!*!";
/// Suffix of the table name in the footer line
pub const END_SUFFIX: &str = "_End";
/// Replacement for a literal space inside a value
pub const SPACE_ESCAPE: &str = "U+0020";

/// Parse a whole plaintext file into its table segments, in file order
pub fn parse(text: &str) -> Result<Vec<Table>> {
    let text = text.replace('\r', "");
    text.split(BOUNDARY)
        .filter(|segment| !segment.trim().is_empty())
        .map(parse_table)
        .collect()
}

/// Render table segments back into file text
///
/// Every segment is surrounded by exactly one boundary token. An empty
/// table list renders to an empty file.
pub fn render(tables: &[Table]) -> String {
    if tables.is_empty() {
        return String::new();
    }
    let mut out = String::from(BOUNDARY);
    for table in tables {
        out.push_str(&render_table(table));
        out.push_str(BOUNDARY);
    }
    out
}

/// Render one table segment (without the surrounding boundary tokens)
pub fn render_table(table: &Table) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&fenced(table.name()));
    out.push('\n');
    out.push_str(&encode_column_schema(table.schema()));
    out.push('\n');
    // Rows go in front of the cursor; the cursor stays put for the next append.
    for tuple in &table.tuples()[..table.insertion_point()] {
        out.push_str(&encode_row(tuple));
        out.push('\n');
    }
    out.push_str(CURSOR);
    out.push('\n');
    out.push_str(&fenced(&format!("{}{}", table.name(), END_SUFFIX)));
    out.push('\n');
    out
}

/// Parse one table segment
pub fn parse_table(segment: &str) -> Result<Table> {
    let lines: Vec<&str> = segment.trim_matches('\n').split('\n').collect();
    if lines.len() < 4 {
        return Err(Error::MalformedFormat(format!(
            "table segment has {} lines, expected at least 4",
            lines.len()
        )));
    }

    let name = unfence(lines[0]).ok_or_else(|| {
        Error::MalformedFormat(format!("invalid table header '{}'", lines[0]))
    })?;

    let footer = lines[lines.len() - 1];
    let expected_footer = fenced(&format!("{}{}", name, END_SUFFIX));
    if footer != expected_footer {
        return Err(Error::MalformedFormat(format!(
            "table '{}' has footer '{}', expected '{}'",
            name, footer, expected_footer
        )));
    }

    if lines[lines.len() - 2] != CURSOR {
        return Err(Error::MalformedFormat(format!(
            "table '{}' is missing its placeholder cursor",
            name
        )));
    }

    let schema = decode_column_schema(lines[1])?;

    let mut tuples = Vec::new();
    for line in &lines[2..lines.len() - 2] {
        if line.trim().is_empty() {
            continue;
        }
        if *line == CURSOR {
            return Err(Error::MalformedFormat(format!(
                "table '{}' has more than one placeholder cursor",
                name
            )));
        }
        let mut tuple = decode_row(line)?;
        if tuple.len() != schema.column_count() {
            return Err(Error::MalformedFormat(format!(
                "row '{}' in table '{}' has {} fields, expected {}",
                line,
                name,
                tuple.len(),
                schema.column_count()
            )));
        }
        if !tuple.has_contiguous_tags() {
            warn!(
                "row '{}' in table '{}' has position tags out of sequence, retagging by order",
                line, name
            );
            tuple.retag_in_order();
        }
        tuples.push(tuple);
    }

    Ok(Table::from_parts(name, schema, tuples))
}

/// Encode a schema as `[1] id [2] name ...`
pub fn encode_column_schema(schema: &Schema) -> String {
    schema
        .columns()
        .iter()
        .map(|c| format!("[{}] {}", c.position, c.name))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode a schema line
///
/// Columns are positioned by the order they appear in; tags that are out
/// of sequence are tolerated and renumbered.
pub fn decode_column_schema(line: &str) -> Result<Schema> {
    let tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.is_empty() || tokens.len() % 2 != 0 {
        return Err(Error::MalformedFormat(format!("invalid schema line '{}'", line)));
    }

    let mut columns = Vec::with_capacity(tokens.len() / 2);
    for (i, pair) in tokens.chunks(2).enumerate() {
        let position = (i + 1) as Position;
        let tag = parse_tag(pair[0], '[', ']').ok_or_else(|| {
            Error::MalformedFormat(format!("invalid column tag '{}' in '{}'", pair[0], line))
        })?;
        if tag != position {
            warn!(tag, position, "column tag out of sequence, renumbering");
        }
        columns.push(Column::new(position, pair[1]));
    }
    Ok(Schema::from_columns(columns))
}

/// Encode a tuple as `|1| value |2| value ...`, escaping spaces
pub fn encode_row(tuple: &Tuple) -> String {
    tuple
        .fields()
        .iter()
        .map(|(pos, value)| format!("|{}| {}", pos, escape(value.as_str())))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode a row line
pub fn decode_row(line: &str) -> Result<Tuple> {
    // Split on single spaces so an empty value stays an empty token.
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() % 2 != 0 {
        return Err(Error::MalformedFormat(format!("invalid row line '{}'", line)));
    }

    let mut fields = Vec::with_capacity(tokens.len() / 2);
    for pair in tokens.chunks(2) {
        let tag = parse_tag(pair[0], '|', '|').ok_or_else(|| {
            Error::MalformedFormat(format!("invalid field tag '{}' in '{}'", pair[0], line))
        })?;
        fields.push((tag, Value::from_stored(unescape(pair[1]))));
    }
    Ok(Tuple::new(fields))
}

/// Replace literal spaces with the escape token
pub fn escape(value: &str) -> String {
    value.replace(' ', SPACE_ESCAPE)
}

/// Restore literal spaces from the escape token
pub fn unescape(value: &str) -> String {
    value.replace(SPACE_ESCAPE, " ")
}

/// Reject table or column names that would break the line format
pub(crate) fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation(format!("{} name is required", kind)));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(Error::Validation(format!(
            "{} name '{}' may not contain whitespace",
            kind, name
        )));
    }
    if [FENCE, BOUNDARY, CURSOR].iter().any(|t| name.contains(t)) {
        return Err(Error::Validation(format!(
            "{} name '{}' contains a reserved token",
            kind, name
        )));
    }
    // Queries read keywords in any case, so such a name could never be referenced.
    if Token::from_keyword(name).is_some() {
        return Err(Error::Validation(format!(
            "{} name '{}' is a query keyword",
            kind, name
        )));
    }
    Ok(())
}

/// Reject values that would break the line format
pub(crate) fn check_value(value: &str) -> Result<()> {
    if value.contains('\n') || value.contains('\r') {
        return Err(Error::Validation("values may not contain line breaks".to_string()));
    }
    if [BOUNDARY, CURSOR, SPACE_ESCAPE].iter().any(|t| value.contains(t)) {
        return Err(Error::Validation(format!(
            "value '{}' contains a reserved token",
            value
        )));
    }
    Ok(())
}

fn fenced(name: &str) -> String {
    format!("{}{}{}", FENCE, name, FENCE)
}

fn unfence(line: &str) -> Option<&str> {
    line.strip_prefix(FENCE)
        .and_then(|rest| rest.strip_suffix(FENCE))
        .filter(|name| !name.is_empty())
}

fn parse_tag(token: &str, open: char, close: char) -> Option<Position> {
    token
        .strip_prefix(open)?
        .strip_suffix(close)?
        .parse()
        .ok()
        .filter(|p| *p > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS: &str = "////
-----Users-----
[1] id [2] name [3] age
|1| 1 |2| pedro |3| 32
|1| 2 |2| juan |3| 54
!*!
-----Users_End-----
////";

    #[test]
    fn test_parse_users_layout() {
        let tables = parse(USERS).unwrap();
        assert_eq!(tables.len(), 1);

        let users = &tables[0];
        assert_eq!(users.name(), "Users");
        assert_eq!(users.schema().column_names(), vec!["id", "name", "age"]);
        assert_eq!(users.tuples().len(), 2);
        assert_eq!(users.tuples()[1].get(2), Some(&Value::from("juan")));
    }

    #[test]
    fn test_render_reproduces_layout() {
        let tables = parse(USERS).unwrap();
        assert_eq!(render(&tables), USERS);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_crlf_is_accepted() {
        let tables = parse(&USERS.replace('\n', "\r\n")).unwrap();
        assert_eq!(tables[0].tuples().len(), 2);
    }

    #[test]
    fn test_space_escaping() {
        let tuple = Tuple::from_values(vec!["1".into(), "pedro avenue".into()]);
        let line = encode_row(&tuple);
        assert_eq!(line, "|1| 1 |2| pedroU+0020avenue");

        let decoded = decode_row(&line).unwrap();
        assert_eq!(decoded.get(2), Some(&Value::from("pedro avenue")));
    }

    #[test]
    fn test_empty_value_survives() {
        let tuple = Tuple::from_values(vec!["1".into(), "".into(), "x".into()]);
        let decoded = decode_row(&encode_row(&tuple)).unwrap();
        assert_eq!(decoded, tuple);
    }

    #[test]
    fn test_missing_cursor_is_malformed() {
        let broken = USERS.replace("!*!\n", "");
        assert!(matches!(parse(&broken), Err(Error::MalformedFormat(_))));
    }

    #[test]
    fn test_duplicate_cursor_is_malformed() {
        let broken = USERS.replace("!*!", "!*!\n!*!");
        assert!(matches!(parse(&broken), Err(Error::MalformedFormat(_))));
    }

    #[test]
    fn test_arity_mismatch_is_malformed() {
        let broken = USERS.replace("|1| 2 |2| juan |3| 54", "|1| 2 |2| juan");
        assert!(matches!(parse(&broken), Err(Error::MalformedFormat(_))));
    }

    #[test]
    fn test_mismatched_footer_is_malformed() {
        let broken = USERS.replace("Users_End", "Other_End");
        assert!(matches!(parse(&broken), Err(Error::MalformedFormat(_))));
    }

    #[test]
    fn test_out_of_sequence_tags_are_renumbered() {
        let legacy = "////
-----Links-----
[1] id [2] table1 [3] columnLink1 [3] table2 [4] columnLink2
|1| a |2| Users |3| id |3| Invoice |4| owner
!*!
-----Links_End-----
////";
        let tables = parse(legacy).unwrap();
        let links = &tables[0];
        assert_eq!(links.schema().position_of("columnLink2"), Some(5));
        assert_eq!(links.tuples()[0].get(4), Some(&Value::from("Invoice")));
    }

    #[test]
    fn test_check_name_and_value() {
        assert!(check_name("table", "Users").is_ok());
        assert!(check_name("table", "my table").is_err());
        assert!(check_name("table", "a-----b").is_err());
        assert!(check_name("column", "values").is_err());
        assert!(check_name("table", "Select").is_err());
        assert!(check_name("column", "value").is_ok());
        assert!(check_name("column", "").is_err());

        assert!(check_value("pedro avenue").is_ok());
        assert!(check_value("two\nlines").is_err());
        assert!(check_value("a////b").is_err());
    }
}
