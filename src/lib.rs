// Library exports for minisql
// Lexer and parser for a small SQL dialect, plus an in-memory backend and
// the shell that ties them together.

pub mod ast;
pub mod backend;
pub mod cli;
pub mod error;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod token;

// Re-export commonly used types
pub use ast::{Ast, ColumnDefinition, CreateTableStatement, InsertStatement, SelectStatement, Statement};
pub use backend::{Backend, BackendError, MemoryBackend, QueryResults};
pub use error::{LexError, ParseError, ParseErrorKind};
pub use expr::Expression;
pub use lexer::lex;
pub use parser::parse;
pub use token::{Keyword, Location, Symbol, Token, TokenKind};
