// Token model shared by the lexer, the parser and the backend.
// Tokens own their text: keywords are canonicalised, identifiers folded and
// string escapes resolved, so the value rarely matches the raw source slice.

use std::fmt;

/// A zero-based position in the source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Symbol,
    Identifier,
    String,
    Numeric,
}

/// Reserved words, in their canonical lower-case spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Select,
    From,
    Table,
    Create,
    Insert,
    Into,
    Values,
    Int,
    Text,
    Where,
}

impl Keyword {
    /// Candidate set for the keyword lexer
    pub const ALL: [Keyword; 10] = [
        Keyword::Select,
        Keyword::Insert,
        Keyword::Values,
        Keyword::Table,
        Keyword::Create,
        Keyword::Where,
        Keyword::From,
        Keyword::Into,
        Keyword::Int,
        Keyword::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Select => "select",
            Keyword::From => "from",
            Keyword::Table => "table",
            Keyword::Create => "create",
            Keyword::Insert => "insert",
            Keyword::Into => "into",
            Keyword::Values => "values",
            Keyword::Int => "int",
            Keyword::Text => "text",
            Keyword::Where => "where",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Punctuation kept in the token stream. Whitespace never becomes a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Semicolon,
    Asterisk,
    Comma,
    LeftParen,
    RightParen,
}

impl Symbol {
    pub const ALL: [Symbol; 5] = [
        Symbol::Comma,
        Symbol::LeftParen,
        Symbol::RightParen,
        Symbol::Semicolon,
        Symbol::Asterisk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::Semicolon => ";",
            Symbol::Asterisk => "*",
            Symbol::Comma => ",",
            Symbol::LeftParen => "(",
            Symbol::RightParen => ")",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.as_str())
    }
}

/// A classified lexical unit.
///
/// Two tokens are equal when their kind and value are equal; the location is
/// diagnostic metadata only, so a token built with [`Token::keyword`] or
/// [`Token::symbol`] can be compared against lexed tokens.
#[derive(Debug, Clone, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, location: Location) -> Self {
        Token {
            kind,
            value: value.into(),
            location,
        }
    }

    /// Pattern token for matching a keyword
    pub fn keyword(keyword: Keyword) -> Self {
        Token::new(TokenKind::Keyword, keyword.as_str(), Location::default())
    }

    /// Pattern token for matching a symbol
    pub fn symbol(symbol: Symbol) -> Self {
        Token::new(TokenKind::Symbol, symbol.as_str(), Location::default())
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword && self.value == keyword.as_str()
    }

    pub fn is_symbol(&self, symbol: Symbol) -> bool {
        self.kind == TokenKind::Symbol && self.value == symbol.as_str()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.value)
    }
}
