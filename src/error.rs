// Error values for the lexer and parser, plus the furthest-failure tracker
// that turns a dozen failed grammar alternatives into one useful message.

use crate::token::{Keyword, Location};
use colored::*;
use std::cell::RefCell;
use std::fmt;
use strsim::jaro_winkler;
use thiserror::Error;
use tracing::debug;

/// The lexer found a character no sub-lexer accepts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to lex token{hint}, at {}:{}", .location.line, .location.column)]
pub struct LexError {
    pub location: Location,
    /// Previously lexed token and the offending character
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected statement")]
    ExpectedStatement,

    #[error("expected semicolon delimiter between statements")]
    ExpectedDelimiter,

    #[error("expected {0}")]
    ExpectedToken(String),

    #[error(transparent)]
    Lex(#[from] LexError),
}

/// Our error type with helpful information
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Zero-based, like token locations
    pub location: Location,
    pub suggestion: Option<String>,
    pub context: Option<String>,
}

impl ParseError {
    /// An error at a known location, with the source line rendered as context
    pub fn new(kind: ParseErrorKind, message: String, location: Location, input: &str) -> Self {
        ParseError {
            kind,
            message,
            location,
            suggestion: None,
            context: get_error_context(input, location),
        }
    }

    pub fn from_lex(error: LexError, input: &str) -> Self {
        let location = error.location;
        let message = error.to_string();
        ParseError::new(ParseErrorKind::Lex(error), message, location, input)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} at line {}:{}",
            "Parse error".red().bold(),
            self.location.line + 1,
            self.location.column + 1
        )?;

        writeln!(f, "  {}", self.message)?;

        if let Some(ref suggestion) = self.suggestion {
            writeln!(f, "  {} {}", "Did you mean:".yellow(), suggestion.green())?;
        }

        if let Some(ref context) = self.context {
            writeln!(f, "\n{}", context)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ParseErrorKind::Lex(error) => Some(error),
            _ => None,
        }
    }
}

/// Furthest-failure tracking.
///
/// Grammar alternatives are tried against the same tokens and each failed
/// step is recorded here. Only failures at the furthest token position
/// survive; failures at the same position merge their expectations. The
/// parser methods take `&self`, so the state lives in a `RefCell`.
#[derive(Debug, Default)]
pub struct Backtrace {
    inner: RefCell<Option<BacktraceInner>>,
}

#[derive(Debug, Clone)]
struct BacktraceInner {
    furthest_pos: usize,
    expected: Vec<String>,
    found: Option<String>,
    location: Location,
}

impl Backtrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an error if it's the furthest we've reached.
    /// `pos` is a token index; `found` is `None` at end of input.
    pub fn track_error(&self, pos: usize, location: Location, expected: &str, found: Option<&str>) {
        debug!(
            line = location.line,
            column = location.column,
            expected,
            found = found.unwrap_or("end of input"),
            "expectation failed"
        );

        let mut inner = self.inner.borrow_mut();

        match &mut *inner {
            Some(existing) if pos < existing.furthest_pos => {}
            Some(existing) if pos == existing.furthest_pos => {
                if !existing.expected.iter().any(|e| e == expected) {
                    existing.expected.push(expected.to_string());
                }
            }
            _ => {
                *inner = Some(BacktraceInner {
                    furthest_pos: pos,
                    expected: vec![expected.to_string()],
                    found: found.map(|s| s.to_string()),
                    location,
                });
            }
        }
    }

    pub fn furthest_position(&self) -> Option<usize> {
        self.inner.borrow().as_ref().map(|inner| inner.furthest_pos)
    }

    /// Forget everything tracked so far
    pub fn reset(&self) {
        self.inner.borrow_mut().take();
    }

    /// Get the best error message with suggestions
    pub fn get_error(&self, input: &str) -> ParseError {
        let inner = self.inner.borrow();

        match &*inner {
            None => ParseError::new(
                ParseErrorKind::ExpectedStatement,
                "Unexpected error".to_string(),
                Location::default(),
                input,
            ),
            Some(inner) => {
                let expected_str = if inner.expected.len() == 1 {
                    inner.expected[0].clone()
                } else {
                    format!("one of: {}", inner.expected.join(", "))
                };

                let message = match &inner.found {
                    Some(found) => format!("Expected {}, found '{}'", expected_str, found),
                    None => format!("Expected {}, reached end of input", expected_str),
                };

                let mut error = ParseError::new(
                    ParseErrorKind::ExpectedToken(expected_str),
                    message,
                    inner.location,
                    input,
                );
                error.suggestion = inner.found.as_deref().and_then(suggest_keyword);
                error
            }
        }
    }
}

/// Suggest similar keywords using Jaro-Winkler distance
pub fn suggest_keyword(input: &str) -> Option<String> {
    let input_upper = input.to_uppercase();

    Keyword::ALL
        .iter()
        .map(|keyword| keyword.to_string())
        .filter(|keyword| *keyword != input_upper)
        .map(|keyword| {
            let score = jaro_winkler(&input_upper, &keyword);
            (keyword, score)
        })
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(keyword, _)| keyword)
}

/// Render the source line of `location` with a caret under its column
fn get_error_context(input: &str, location: Location) -> Option<String> {
    let line = input.lines().nth(location.line)?;
    let line_num = location.line + 1;

    let mut result = String::new();

    // Show the line
    result.push_str(&format!("  {} | {}\n", line_num, line));

    // Show the error pointer
    result.push_str(&format!("  {} | ", " ".repeat(line_num.to_string().len())));
    result.push_str(&" ".repeat(location.column));
    result.push_str(&"^".red().to_string());

    Some(result)
}
