// Expressions and the comma-separated lists they appear in.
// Only literals exist so far: a single identifier, number or string token.

use crate::ast::write_token;
use crate::parser::Parser;
use crate::token::{Symbol, Token, TokenKind};
use std::fmt;

/// Expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// An identifier, numeric or string token taken verbatim
    Literal(Token),
}

const LITERAL_KINDS: [TokenKind; 3] = [TokenKind::Identifier, TokenKind::Numeric, TokenKind::String];

impl<'a> Parser<'a> {
    /// Parse a single expression at `cursor`
    pub fn parse_expression(&self, cursor: usize) -> Option<(Expression, usize)> {
        LITERAL_KINDS.iter().find_map(|&kind| {
            self.parse_token(cursor, kind)
                .map(|(token, next)| (Expression::Literal(token), next))
        })
    }

    /// Parse comma-separated expressions up to, not including, the first
    /// token equal to one of `delimiters`. The list is empty only when a
    /// delimiter comes first. When `;` is a delimiter, end of input also
    /// ends the list, leaving the missing `;` to the statement loop.
    pub fn parse_expressions(
        &self,
        initial_cursor: usize,
        delimiters: &[Token],
    ) -> Option<(Vec<Expression>, usize)> {
        let ends_at_semicolon = delimiters
            .iter()
            .any(|delimiter| delimiter.is_symbol(Symbol::Semicolon));
        let mut cursor = initial_cursor;
        let mut expressions = Vec::new();

        loop {
            let Some(current) = self.current(cursor) else {
                if ends_at_semicolon {
                    break;
                }
                self.help_message(cursor, &describe_any(delimiters));
                return None;
            };

            if delimiters.iter().any(|delimiter| delimiter == current) {
                break;
            }

            if !expressions.is_empty() {
                if !self.at_symbol(cursor, Symbol::Comma) {
                    self.help_message(cursor, "','");
                    return None;
                }

                cursor += 1;
            }

            let Some((expression, next)) = self.parse_expression(cursor) else {
                self.help_message(cursor, "expression");
                return None;
            };

            cursor = next;
            expressions.push(expression);
        }

        Some((expressions, cursor))
    }
}

/// Human-readable name of a pattern token, as used in error messages
pub fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Keyword => token.value.to_uppercase(),
        TokenKind::Symbol => format!("'{}'", token.value),
        _ => token.value.clone(),
    }
}

fn describe_any(tokens: &[Token]) -> String {
    tokens.iter().map(describe).collect::<Vec<_>>().join(" or ")
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(token) => write_token(f, token),
        }
    }
}
