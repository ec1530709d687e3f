// Interactive shell: read SQL text, run it against a backend, print tables.

use crate::ast::Statement;
use crate::backend::{Backend, BackendError, QueryResults};
use crate::error::ParseError;
use crate::parser::parse;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::io::{self, BufRead, Write};
use tabled::builder::Builder;
use tabled::settings::Style;
use thiserror::Error;
use tracing::{info, warn};

/// Shell settings, usually built from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplConfig {
    pub prompt: String,
    /// Echo each statement in canonical form before running it
    pub show_ast: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        ReplConfig {
            prompt: "# ".to_string(),
            show_ast: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Execution error: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Readline(#[from] ReadlineError),
}

const CONTINUATION_PROMPT: &str = "... ";
const QUIT_COMMANDS: [&str; 3] = ["\\q", "quit", "exit"];

/// What the input loop should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Repl<B: Backend> {
    backend: B,
    config: ReplConfig,
}

impl<B: Backend> Repl<B> {
    pub fn new(backend: B, config: ReplConfig) -> Self {
        Repl { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Parse and run a whole script, stopping at the first failure.
    /// Nothing runs if the script does not parse.
    pub fn execute_script<W: Write>(&mut self, source: &str, out: &mut W) -> Result<(), ShellError> {
        let ast = parse(source)?;

        for statement in &ast.statements {
            self.execute_statement(statement, out)?;
        }

        Ok(())
    }

    fn execute_statement<W: Write>(&mut self, statement: &Statement, out: &mut W) -> Result<(), ShellError> {
        if self.config.show_ast {
            writeln!(out, "{}", format!("{};", statement).dimmed())?;
        }

        match self.backend.execute(statement)? {
            Some(results) => render_table(&results, out)?,
            None => writeln!(out, "ok")?,
        }
        info!(kind = statement.name(), "executed statement");

        Ok(())
    }

    fn prompt(&self, buffer: &str) -> &str {
        if buffer.is_empty() {
            self.config.prompt.as_str()
        } else {
            CONTINUATION_PROMPT
        }
    }

    /// Feed one input line into `buffer`. Once the buffer ends with `;` it
    /// is run as a script; failures are printed and the loop carries on.
    fn handle_line<W: Write>(&mut self, buffer: &mut String, line: &str, out: &mut W) -> io::Result<Flow> {
        if buffer.is_empty() && QUIT_COMMANDS.contains(&line.trim()) {
            return Ok(Flow::Quit);
        }

        buffer.push_str(line);
        buffer.push('\n');

        if buffer.trim().is_empty() {
            buffer.clear();
            return Ok(Flow::Continue);
        }
        if !buffer.trim_end().ends_with(';') {
            return Ok(Flow::Continue);
        }

        let source = std::mem::take(buffer);
        match self.execute_script(&source, out) {
            Ok(()) => {}
            Err(ShellError::Io(error)) => return Err(error),
            Err(error) => {
                warn!(error = %error, "statement failed");
                writeln!(out, "{}", error.to_string().red())?;
            }
        }

        Ok(Flow::Continue)
    }

    /// Read statements from `input` until EOF or a quit command. Input is
    /// buffered until a line ends with `;`, so statements may span lines.
    /// Used for piped input; terminals go through [`Repl::run_interactive`].
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        writeln!(out, "Welcome to minisql.")?;

        let mut lines = input.lines();
        let mut buffer = String::new();

        loop {
            write!(out, "{}", self.prompt(&buffer))?;
            out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };

            if self.handle_line(&mut buffer, &line?, out)? == Flow::Quit {
                break;
            }
        }

        Ok(())
    }

    /// Line-edited session on the terminal, with history.
    /// Ctrl-C drops a half-typed statement, or leaves when there is none.
    pub fn run_interactive<W: Write>(&mut self, out: &mut W) -> Result<(), ShellError> {
        let mut editor = Editor::<(), DefaultHistory>::new()?;
        writeln!(out, "Welcome to minisql.")?;

        let mut buffer = String::new();

        loop {
            match editor.readline(self.prompt(&buffer)) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(line.as_str())?;
                    }

                    if self.handle_line(&mut buffer, &line, out)? == Flow::Quit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) if !buffer.is_empty() => buffer.clear(),
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(error) => return Err(error.into()),
            }
        }

        Ok(())
    }
}

/// Write results as a markdown-style table followed by a row count
pub fn render_table<W: Write>(results: &QueryResults, out: &mut W) -> io::Result<()> {
    if !results.columns.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(results.columns.iter().map(|column| column.name.clone()));
        for row in &results.rows {
            builder.push_record(row.iter().map(|cell| cell.to_string()));
        }

        let mut table = builder.build();
        table.with(Style::markdown());
        writeln!(out, "{}", table)?;
    }

    let count = results.rows.len();
    writeln!(out, "({} row{})", count, if count == 1 { "" } else { "s" })
}
