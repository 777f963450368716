//! textdb - CLI shell
//!
//! Usage: `textdb-cli <file.txt> [--key <passphrase>]`
//!
//! The passphrase may also be given through `TEXTDB_KEY`.

use std::env;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::error;
use tracing_subscriber::EnvFilter;

use textdb::storage::codec;
use textdb::{Database, DbConfig, QueryResult};

/// Print welcome banner
fn print_banner(db: &Database) {
    println!(
        "textdb shell on '{}'{}\nType '.help' for help, '.quit' to exit",
        db.name(),
        if db.is_encrypted() { " (encrypted)" } else { "" }
    );
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .quit              Exit
  .tables            List all tables
  .schema <table>    Show table schema
  .keys              List foreign keys
  .dump              Print the database file as plain text
  .json              Toggle JSON output

Statements:
  SELECT <cols|*> FROM <table> [WHERE col OP value]
  UPDATE <table> SET col=value, ... WHERE col OP value
  DELETE FROM <table> WHERE col OP value
  INSERT INTO <table> (cols) VALUES (values, ...)
  DROP TABLE <table>

  OP is one of = != <> < <= > >= and compares text.
  Quote values containing spaces or commas: 'pedro avenue'.
"#
    );
}

/// Format query results as a table
fn format_results(result: &QueryResult) -> String {
    let columns = result.rows.columns();
    let rows = &result.rows;

    // Calculate column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();

    for row in rows {
        for (i, value) in row.values().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(value.as_str().len());
            }
        }
    }

    let mut output = String::new();

    // Header separator
    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+\n", separator);

    // Header
    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!(" {:^width$} ", c, width = *w))
        .collect::<Vec<_>>()
        .join("|");
    output.push_str(&format!("|{}|\n", header));
    output.push_str(&separator);

    // Rows
    for row in rows {
        let row_str: String = row
            .values()
            .zip(&widths)
            .map(|(v, w)| format!(" {:<width$} ", v.as_str(), width = *w))
            .collect::<Vec<_>>()
            .join("|");
        output.push_str(&format!("|{}|\n", row_str));
    }

    if !rows.is_empty() {
        output.push_str(&separator);
    }

    output.push_str(&format!("{} row(s) returned\n", rows.len()));

    output
}

struct Shell {
    db: Database,
    json: bool,
}

impl Shell {
    /// Execute one statement and print its result
    fn execute_sql(&self, sql: &str) {
        let result = match self.db.execute(sql) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        };

        if self.json {
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: {}", e),
            }
        } else if !result.rows.columns().is_empty() {
            print!("{}", format_results(&result));
        } else {
            println!("{} row(s) affected", result.affected_rows);
        }
    }

    /// Handle special dot commands. Returns false when the shell should exit.
    fn handle_special_command(&mut self, cmd: &str) -> bool {
        let parts: Vec<&str> = cmd.split_whitespace().collect();

        match parts.first().copied() {
            Some(".help") => print_help(),
            Some(".quit") | Some(".exit") => return false,
            Some(".tables") => match self.db.list_tables() {
                Ok(tables) if tables.is_empty() => println!("No tables found."),
                Ok(tables) => {
                    for table in tables {
                        println!("  {}", table);
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            },
            Some(".schema") => match parts.get(1) {
                Some(name) => match self.db.table(name) {
                    Ok(table) => println!(
                        "{}: {}",
                        table.name(),
                        codec::encode_column_schema(table.schema())
                    ),
                    Err(e) => eprintln!("Error: {}", e),
                },
                None => match self.db.tables() {
                    Ok(tables) => {
                        for table in tables {
                            println!(
                                "{}: {}",
                                table.name(),
                                codec::encode_column_schema(table.schema())
                            );
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                },
            },
            Some(".keys") => match self.db.foreign_keys() {
                Ok(keys) if keys.is_empty() => println!("No foreign keys."),
                Ok(keys) => {
                    for key in keys {
                        println!("  {}", key);
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            },
            Some(".dump") => match self.db.dump() {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Error: {}", e),
            },
            Some(".json") => {
                self.json = !self.json;
                println!("JSON output {}", if self.json { "on" } else { "off" });
            }
            Some(cmd) => {
                eprintln!("Unknown command: {}", cmd);
                eprintln!("Type '.help' for available commands.");
            }
            None => {}
        }
        true
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_args() -> Result<DbConfig> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut path = None;
    let mut key = env::var("TEXTDB_KEY").ok();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--key" | "-k" => {
                key = Some(args.get(i + 1).cloned().context("--key needs a passphrase")?);
                i += 1;
            }
            "--help" | "-h" => {
                println!("Usage: textdb-cli <file.txt> [--key <passphrase>]");
                std::process::exit(0);
            }
            arg if path.is_none() => path = Some(arg.to_string()),
            arg => bail!("unexpected argument '{}'", arg),
        }
        i += 1;
    }

    let path = path.context("usage: textdb-cli <file.txt> [--key <passphrase>]")?;
    let mut config = DbConfig::new(path);
    if let Some(key) = key {
        config = config.encryption_key(key);
    }
    Ok(config)
}

/// Main REPL loop
fn run() -> Result<()> {
    init_logging();

    let config = parse_args()?;
    let db = Database::open(&config)
        .with_context(|| format!("cannot open database '{}'", config.database_name))?;

    let mut editor = DefaultEditor::new()?;
    print_banner(&db);
    let mut shell = Shell { db, json: false };

    loop {
        match editor.readline("textdb> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                if line.starts_with('.') {
                    if !shell.handle_special_command(line) {
                        break;
                    }
                } else {
                    shell.execute_sql(line);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("Readline error: {}", e);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
