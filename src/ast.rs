// Statement tree produced by the parser.
// Every token stored here came out of the lexer; nothing is synthesized.

use crate::expr::Expression;
use crate::token::{Keyword, Token, TokenKind};
use std::fmt;

/// The parse result: one statement per semicolon-terminated statement, in
/// source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    pub statements: Vec<Statement>,
}

/// SQL Statement types
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableStatement),
    Insert(InsertStatement),
    Select(SelectStatement),
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub name: Token,
    pub columns: Vec<ColumnDefinition>,
}

/// A column name and its type keyword. The parser accepts any keyword
/// here; the backend decides which types exist.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: Token,
    pub datatype: Token,
}

/// INSERT INTO ... VALUES statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: Token,
    pub values: Vec<Expression>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub items: Vec<Expression>,
    pub from: Option<Token>,
}

impl Statement {
    pub fn name(&self) -> &'static str {
        match self {
            Statement::CreateTable(_) => "create table",
            Statement::Insert(_) => "insert",
            Statement::Select(_) => "select",
        }
    }
}

// Display renders canonical SQL that lexes and parses back to the same tree

/// Write a token the way the lexer would read it back
pub(crate) fn write_token(f: &mut fmt::Formatter<'_>, token: &Token) -> fmt::Result {
    match token.kind {
        TokenKind::Keyword => write!(f, "{}", token.value.to_uppercase()),
        TokenKind::Symbol | TokenKind::Numeric => write!(f, "{}", token.value),
        TokenKind::String => write!(f, "'{}'", token.value.replace('\'', "''")),
        TokenKind::Identifier if needs_quotes(&token.value) => {
            write!(f, "\"{}\"", token.value.replace('"', "\"\""))
        }
        TokenKind::Identifier => write!(f, "{}", token.value),
    }
}

/// Whether an identifier would lex differently without quotes. Keywords
/// match without a word boundary, so any keyword prefix forces quoting.
fn needs_quotes(value: &str) -> bool {
    let mut chars = value.chars();
    let starts_with_letter = chars.next().map_or(false, |c| c.is_ascii_lowercase());
    let plain_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '$' || c == '_');

    !starts_with_letter
        || !plain_tail
        || Keyword::ALL
            .iter()
            .any(|keyword| value.starts_with(keyword.as_str()))
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{};", statement)?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::CreateTable(s) => write!(f, "{}", s),
            Statement::Insert(s) => write!(f, "{}", s),
            Statement::Select(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for CreateTableStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE TABLE ")?;
        write_token(f, &self.name)?;
        write!(f, " (")?;
        write_list(f, &self.columns)?;
        write!(f, ")")
    }
}

impl fmt::Display for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_token(f, &self.name)?;
        write!(f, " ")?;
        write_token(f, &self.datatype)
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO ")?;
        write_token(f, &self.table)?;
        write!(f, " VALUES (")?;
        write_list(f, &self.values)?;
        write!(f, ")")
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT")?;

        if !self.items.is_empty() {
            write!(f, " ")?;
            write_list(f, &self.items)?;
        }

        if let Some(from) = &self.from {
            write!(f, " FROM ")?;
            write_token(f, from)?;
        }

        Ok(())
    }
}
