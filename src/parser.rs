// Recursive-descent parser.
// Every grammar function takes a token cursor by value and returns the node
// together with the advanced cursor, or `None` with the caller's cursor left
// as it was. Backtracking is just trying the next function.

use crate::ast::{
    Ast, ColumnDefinition, CreateTableStatement, InsertStatement, SelectStatement, Statement,
};
use crate::error::{Backtrace, ParseError, ParseErrorKind};
use crate::expr::describe;
use crate::lexer::lex;
use crate::token::{Keyword, Location, Symbol, Token, TokenKind};
use tracing::debug;

pub type ParseResult<T> = Result<T, ParseError>;

/// The parser structure with error tracking
pub struct Parser<'a> {
    tokens: &'a [Token],
    backtrace: &'a Backtrace,
    input: &'a str, // Original input for error messages
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], backtrace: &'a Backtrace, input: &'a str) -> Self {
        Parser {
            tokens,
            backtrace,
            input,
        }
    }

    /// Token at `cursor`, if any remain
    pub fn current(&self, cursor: usize) -> Option<&'a Token> {
        self.tokens.get(cursor)
    }

    /// Whether the token at `cursor` equals `expected` (kind and value)
    pub fn expect_token(&self, cursor: usize, expected: &Token) -> bool {
        self.current(cursor).map_or(false, |token| token == expected)
    }

    pub(crate) fn at_keyword(&self, cursor: usize, keyword: Keyword) -> bool {
        self.current(cursor).map_or(false, |token| token.is_keyword(keyword))
    }

    pub(crate) fn at_symbol(&self, cursor: usize, symbol: Symbol) -> bool {
        self.current(cursor).map_or(false, |token| token.is_symbol(symbol))
    }

    /// Take the token at `cursor` if it has the given kind
    pub fn parse_token(&self, cursor: usize, kind: TokenKind) -> Option<(Token, usize)> {
        let token = self.current(cursor)?;
        (token.kind == kind).then(|| (token.clone(), cursor + 1))
    }

    /// Record a failed expectation at `cursor`. Past the last token the
    /// failure is reported at the last token's location.
    pub fn help_message(&self, cursor: usize, expected: &str) {
        match self.current(cursor) {
            Some(token) => {
                self.backtrace
                    .track_error(cursor, token.location, expected, Some(&token.value))
            }
            None => self
                .backtrace
                .track_error(cursor, self.end_location(), expected, None),
        }
    }

    fn end_location(&self) -> Location {
        self.tokens.last().map(|token| token.location).unwrap_or_default()
    }

    /// Parse every statement in the token stream. Each statement must be
    /// followed by at least one semicolon.
    pub fn parse_ast(&self) -> ParseResult<Ast> {
        let mut ast = Ast::default();
        let mut cursor = 0;

        while cursor < self.tokens.len() {
            self.backtrace.reset();

            let Some((statement, next)) = self.parse_statement(cursor) else {
                return Err(self.statement_error(cursor));
            };
            debug!(kind = statement.name(), statement = %statement, "parsed statement");

            cursor = next;
            ast.statements.push(statement);

            let mut at_least_one_semicolon = false;
            while self.at_symbol(cursor, Symbol::Semicolon) {
                cursor += 1;
                at_least_one_semicolon = true;
            }

            if !at_least_one_semicolon {
                return Err(self.delimiter_error(cursor));
            }
        }

        Ok(ast)
    }

    /// No grammar matched at `cursor`. If some grammar got past its leading
    /// keyword, the deepest failure explains the problem best; otherwise
    /// the statement itself was not recognized.
    fn statement_error(&self, cursor: usize) -> ParseError {
        let furthest = self.backtrace.get_error(self.input);
        let got_past_start = self
            .backtrace
            .furthest_position()
            .map_or(false, |pos| pos > cursor);

        match self.current(cursor) {
            Some(token) if !got_past_start => {
                let mut error = ParseError::new(
                    ParseErrorKind::ExpectedStatement,
                    format!("Expected statement, found '{}'", token.value),
                    token.location,
                    self.input,
                );
                error.suggestion = furthest.suggestion;
                error
            }
            _ => furthest,
        }
    }

    fn delimiter_error(&self, cursor: usize) -> ParseError {
        let (message, location) = match self.current(cursor) {
            Some(token) => (
                format!(
                    "Expected ';' delimiter between statements, found '{}'",
                    token.value
                ),
                token.location,
            ),
            None => (
                "Expected ';' delimiter after statement, reached end of input".to_string(),
                self.end_location(),
            ),
        };
        debug!(
            line = location.line,
            column = location.column,
            "missing statement delimiter"
        );

        ParseError::new(ParseErrorKind::ExpectedDelimiter, message, location, self.input)
    }

    /// Try each statement grammar in turn at the same cursor
    pub fn parse_statement(&self, cursor: usize) -> Option<(Statement, usize)> {
        let semicolon = Token::symbol(Symbol::Semicolon);

        if let Some((select, next)) = self.parse_select_statement(cursor, &semicolon) {
            return Some((Statement::Select(select), next));
        }

        if let Some((insert, next)) = self.parse_insert_statement(cursor) {
            return Some((Statement::Insert(insert), next));
        }

        if let Some((create, next)) = self.parse_create_table_statement(cursor) {
            return Some((Statement::CreateTable(create), next));
        }

        None
    }

    /// Expect `expected` at `cursor` and step past it
    fn expect_step(&self, cursor: usize, expected: &Token) -> Option<usize> {
        if self.expect_token(cursor, expected) {
            Some(cursor + 1)
        } else {
            self.help_message(cursor, &describe(expected));
            None
        }
    }

    fn expect_identifier(&self, cursor: usize, what: &str) -> Option<(Token, usize)> {
        let parsed = self.parse_token(cursor, TokenKind::Identifier);
        if parsed.is_none() {
            self.help_message(cursor, what);
        }
        parsed
    }

    /// `SELECT <expressions> [FROM <table>]`
    pub fn parse_select_statement(
        &self,
        initial_cursor: usize,
        delimiter: &Token,
    ) -> Option<(SelectStatement, usize)> {
        let from_keyword = Token::keyword(Keyword::From);

        let cursor = self.expect_step(initial_cursor, &Token::keyword(Keyword::Select))?;

        let (items, mut cursor) =
            self.parse_expressions(cursor, &[from_keyword.clone(), delimiter.clone()])?;

        let mut from = None;
        if self.at_keyword(cursor, Keyword::From) {
            let (table, next) = self.expect_identifier(cursor + 1, "table name")?;
            from = Some(table);
            cursor = next;
        }

        Some((SelectStatement { items, from }, cursor))
    }

    /// `INSERT INTO <table> VALUES ( <expressions> )`
    pub fn parse_insert_statement(&self, initial_cursor: usize) -> Option<(InsertStatement, usize)> {
        let right_paren = Token::symbol(Symbol::RightParen);

        let cursor = self.expect_step(initial_cursor, &Token::keyword(Keyword::Insert))?;
        let cursor = self.expect_step(cursor, &Token::keyword(Keyword::Into))?;
        let (table, cursor) = self.expect_identifier(cursor, "table name")?;
        let cursor = self.expect_step(cursor, &Token::keyword(Keyword::Values))?;
        let cursor = self.expect_step(cursor, &Token::symbol(Symbol::LeftParen))?;
        let (values, cursor) = self.parse_expressions(cursor, &[right_paren.clone()])?;
        let cursor = self.expect_step(cursor, &right_paren)?;

        Some((InsertStatement { table, values }, cursor))
    }

    /// `CREATE TABLE <table> ( <column definitions> )`
    pub fn parse_create_table_statement(
        &self,
        initial_cursor: usize,
    ) -> Option<(CreateTableStatement, usize)> {
        let right_paren = Token::symbol(Symbol::RightParen);

        let cursor = self.expect_step(initial_cursor, &Token::keyword(Keyword::Create))?;
        let cursor = self.expect_step(cursor, &Token::keyword(Keyword::Table))?;
        let (name, cursor) = self.expect_identifier(cursor, "table name")?;
        let cursor = self.expect_step(cursor, &Token::symbol(Symbol::LeftParen))?;
        let (columns, cursor) = self.parse_column_definitions(cursor, &right_paren)?;
        let cursor = self.expect_step(cursor, &right_paren)?;

        Some((CreateTableStatement { name, columns }, cursor))
    }

    /// Comma-separated `<name> <type>` pairs up to `delimiter`
    fn parse_column_definitions(
        &self,
        initial_cursor: usize,
        delimiter: &Token,
    ) -> Option<(Vec<ColumnDefinition>, usize)> {
        let comma = Token::symbol(Symbol::Comma);
        let mut cursor = initial_cursor;
        let mut columns = Vec::new();

        loop {
            let Some(current) = self.current(cursor) else {
                self.help_message(cursor, &describe(delimiter));
                return None;
            };

            if current == delimiter {
                break;
            }

            if !columns.is_empty() {
                cursor = self.expect_step(cursor, &comma)?;
            }

            let (name, next) = self.expect_identifier(cursor, "column name")?;
            cursor = next;

            let Some((datatype, next)) = self.parse_token(cursor, TokenKind::Keyword) else {
                self.help_message(cursor, "column type");
                return None;
            };
            cursor = next;

            columns.push(ColumnDefinition { name, datatype });
        }

        Some((columns, cursor))
    }
}

/// Lex and parse `source` into an AST.
/// All or nothing: the first failure aborts the whole parse.
pub fn parse(source: &str) -> ParseResult<Ast> {
    let tokens = lex(source).map_err(|error| ParseError::from_lex(error, source))?;

    let backtrace = Backtrace::new();
    let parser = Parser::new(&tokens, &backtrace, source);

    parser.parse_ast()
}
