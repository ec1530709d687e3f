// Hand-written lexer.
// At each position five sub-lexers are tried in priority order; each one
// takes the cursor by value and hands back a new cursor only on success.

use crate::error::LexError;
use crate::token::{Keyword, Location, Symbol, Token, TokenKind};
use std::collections::HashSet;
use tracing::{debug, trace};

/// A scanning position: byte offset into the source plus its location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub offset: usize,
    pub location: Location,
}

impl Cursor {
    /// Step over one character of the source
    fn bump(&mut self, ch: char) {
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.location.line += 1;
            self.location.column = 0;
        } else {
            self.location.column += 1;
        }
    }

    /// Step over `len` ASCII characters that contain no newline
    fn bump_ascii(&mut self, len: usize) {
        self.offset += len;
        self.location.column += len;
    }
}

/// `Some((None, cursor))` means input was consumed without producing a token
type LexResult = Option<(Option<Token>, Cursor)>;

type SubLexer = fn(&str, Cursor) -> LexResult;

/// Keywords before identifiers, symbols (and whitespace) before literals
const LEXERS: [SubLexer; 5] = [
    lex_keyword,
    lex_symbol,
    lex_string,
    lex_numeric,
    lex_identifier,
];

/// Tokenize `source`. The first unrecognized character fails the whole call.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut cursor = Cursor::default();

    'lex: while cursor.offset < source.len() {
        for lexer in LEXERS {
            if let Some((token, next)) = lexer(source, cursor) {
                cursor = next;

                if let Some(token) = token {
                    trace!(token = %token, location = %token.location, "lexed token");
                    tokens.push(token);
                }
                continue 'lex;
            }
        }

        let offending = source[cursor.offset..].chars().next().unwrap_or_default();
        let hint = match tokens.last() {
            Some(previous) => format!(" after {}: '{}'", previous.value, offending),
            None => format!(" '{}'", offending),
        };
        debug!(lexed = tokens.len(), hint = %hint, "lexing failed");

        return Err(LexError {
            location: cursor.location,
            hint,
        });
    }

    Ok(tokens)
}

/// Find the longest option that exactly matches a prefix of the source at
/// `ic`, compared case-insensitively.
///
/// The candidate prefix grows one character at a time. An option drops out
/// once the prefix stops being a prefix of it; an option equal to the prefix
/// becomes the best match so far, but scanning goes on so that `INTO` wins
/// over `INT`. Scanning stops when every option has dropped out.
fn longest_match(source: &str, ic: Cursor, options: &[&'static str]) -> Option<&'static str> {
    let mut value = String::new();
    let mut eliminated: HashSet<usize> = HashSet::new();
    let mut best: Option<&'static str> = None;

    for ch in source[ic.offset..].chars() {
        value.push(ch.to_ascii_lowercase());

        for (i, option) in options.iter().enumerate() {
            if eliminated.contains(&i) {
                continue;
            }

            if *option == value {
                eliminated.insert(i);
                if best.map_or(true, |b| option.len() > b.len()) {
                    best = Some(*option);
                }
                continue;
            }

            if value.len() > option.len() || !option.starts_with(value.as_str()) {
                eliminated.insert(i);
            }
        }

        if eliminated.len() == options.len() {
            break;
        }
    }

    best
}

fn lex_keyword(source: &str, ic: Cursor) -> LexResult {
    let options = Keyword::ALL.map(Keyword::as_str);
    let matched = longest_match(source, ic, &options)?;

    let mut cursor = ic;
    cursor.bump_ascii(matched.len());

    Some((
        Some(Token::new(TokenKind::Keyword, matched, ic.location)),
        cursor,
    ))
}

fn lex_symbol(source: &str, ic: Cursor) -> LexResult {
    let c = source[ic.offset..].chars().next()?;
    let mut cursor = ic;

    // Whitespace is consumed but never kept
    if matches!(c, ' ' | '\t' | '\n') {
        cursor.bump(c);
        return Some((None, cursor));
    }

    let options = Symbol::ALL.map(Symbol::as_str);
    let matched = longest_match(source, ic, &options)?;
    cursor.bump_ascii(matched.len());

    Some((
        Some(Token::new(TokenKind::Symbol, matched, ic.location)),
        cursor,
    ))
}

/// Delimiter-bounded literal. A doubled delimiter stands for one literal
/// delimiter; an unterminated literal is not a token at all.
fn lex_character_delimited(source: &str, ic: Cursor, delimiter: char, kind: TokenKind) -> LexResult {
    let mut chars = source[ic.offset..].chars().peekable();
    if chars.next()? != delimiter {
        return None;
    }

    let mut cursor = ic;
    cursor.bump(delimiter);

    let mut value = String::new();
    while let Some(c) = chars.next() {
        cursor.bump(c);

        if c == delimiter {
            if chars.peek() == Some(&delimiter) {
                chars.next();
                cursor.bump(delimiter);
                value.push(delimiter);
                continue;
            }

            return Some((Some(Token::new(kind, value, ic.location)), cursor));
        }

        value.push(c);
    }

    None
}

fn lex_string(source: &str, ic: Cursor) -> LexResult {
    lex_character_delimited(source, ic, '\'', TokenKind::String)
}

/// Digits with at most one period and at most one `e` exponent marker,
/// optionally signed. A lone `.` is accepted as a number.
fn lex_numeric(source: &str, ic: Cursor) -> LexResult {
    let bytes = source.as_bytes();
    let mut cursor = ic;

    let mut period_found = false;
    let mut exp_marker_found = false;

    while cursor.offset < bytes.len() {
        let c = bytes[cursor.offset];

        let is_digit = c.is_ascii_digit();
        let is_period = c == b'.';
        let is_exp_marker = c == b'e';

        // Must start with a digit or period
        if cursor.offset == ic.offset {
            if !is_digit && !is_period {
                return None;
            }

            period_found = is_period;
            cursor.bump_ascii(1);
            continue;
        }

        if is_period {
            if period_found {
                return None;
            }

            period_found = true;
            cursor.bump_ascii(1);
            continue;
        }

        if is_exp_marker {
            if exp_marker_found {
                return None;
            }

            // No periods allowed after the exponent marker
            period_found = true;
            exp_marker_found = true;

            if cursor.offset == bytes.len() - 1 {
                return None;
            }

            if matches!(bytes[cursor.offset + 1], b'-' | b'+') {
                cursor.bump_ascii(1);
            }

            cursor.bump_ascii(1);
            continue;
        }

        if !is_digit {
            break;
        }

        cursor.bump_ascii(1);
    }

    if cursor.offset == ic.offset {
        return None;
    }

    Some((
        Some(Token::new(
            TokenKind::Numeric,
            &source[ic.offset..cursor.offset],
            ic.location,
        )),
        cursor,
    ))
}

fn lex_identifier(source: &str, ic: Cursor) -> LexResult {
    // Double-quoted identifiers keep their case
    if let Some(quoted) = lex_character_delimited(source, ic, '"', TokenKind::Identifier) {
        return Some(quoted);
    }

    let rest = &source.as_bytes()[ic.offset..];
    if !rest.first()?.is_ascii_alphabetic() {
        return None;
    }

    let len = 1 + rest[1..]
        .iter()
        .take_while(|&&c| c.is_ascii_alphanumeric() || c == b'$' || c == b'_')
        .count();

    let mut cursor = ic;
    cursor.bump_ascii(len);

    // Unquoted identifiers are case-insensitive
    let value = source[ic.offset..cursor.offset].to_ascii_lowercase();

    Some((
        Some(Token::new(TokenKind::Identifier, value, ic.location)),
        cursor,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, value: &str, line: usize, column: usize) -> Token {
        Token::new(kind, value, Location::new(line, column))
    }

    /// Token equality ignores locations, so compare them separately
    fn assert_tokens(source: &str, expected: &[Token]) {
        let tokens = lex(source).unwrap();
        assert_eq!(tokens, expected, "{}", source);
        let locations: Vec<_> = tokens.iter().map(|t| t.location).collect();
        let expected_locations: Vec<_> = expected.iter().map(|t| t.location).collect();
        assert_eq!(locations, expected_locations, "{}", source);
    }

    #[test]
    fn test_lex_create_table() {
        use TokenKind::*;

        assert_tokens(
            "CREATE TABLE users (id INT, name TEXT);",
            &[
                token(Keyword, "create", 0, 0),
                token(Keyword, "table", 0, 7),
                token(Identifier, "users", 0, 13),
                token(Symbol, "(", 0, 19),
                token(Identifier, "id", 0, 20),
                token(Keyword, "int", 0, 23),
                token(Symbol, ",", 0, 26),
                token(Identifier, "name", 0, 28),
                token(Keyword, "text", 0, 33),
                token(Symbol, ")", 0, 37),
                token(Symbol, ";", 0, 38),
            ],
        );
    }

    #[test]
    fn test_lex_insert() {
        use TokenKind::*;

        assert_tokens(
            "INSERT INTO users VALUES (1, 'Phil');",
            &[
                token(Keyword, "insert", 0, 0),
                token(Keyword, "into", 0, 7),
                token(Identifier, "users", 0, 12),
                token(Keyword, "values", 0, 18),
                token(Symbol, "(", 0, 25),
                token(Numeric, "1", 0, 26),
                token(Symbol, ",", 0, 27),
                token(String, "Phil", 0, 29),
                token(Symbol, ")", 0, 35),
                token(Symbol, ";", 0, 36),
            ],
        );
    }

    #[test]
    fn test_longest_match_prefers_into() {
        let tokens = lex("INTO").unwrap();
        assert_eq!(tokens, vec![Token::keyword(Keyword::Into)]);

        let tokens = lex("int,").unwrap();
        assert_eq!(
            tokens,
            vec![Token::keyword(Keyword::Int), Token::symbol(Symbol::Comma)]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(lex("CREATE").unwrap(), lex("create").unwrap());
        assert_eq!(lex("SeLeCt").unwrap(), vec![Token::keyword(Keyword::Select)]);
    }

    #[test]
    fn test_keyword_needs_no_word_boundary() {
        use TokenKind::*;

        assert_tokens(
            "textbook",
            &[token(Keyword, "text", 0, 0), token(Identifier, "book", 0, 4)],
        );
    }

    #[test]
    fn test_identifiers() {
        use TokenKind::*;

        assert_tokens(
            "Users u$er_2 \"MixedCase\"",
            &[
                token(Identifier, "users", 0, 0),
                token(Identifier, "u$er_2", 0, 6),
                token(Identifier, "MixedCase", 0, 13),
            ],
        );
    }

    #[test]
    fn test_doubled_delimiter_is_escape() {
        let tokens = lex("'Phil''s'").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "Phil's");

        let tokens = lex("\"a\"\"b\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].value, "a\"b");
    }

    #[test]
    fn test_unterminated_string_fails() {
        let error = lex("'abc").unwrap_err();
        assert_eq!(error.location, Location::new(0, 0));

        assert!(lex("SELECT 'it''s").is_err());
    }

    #[test]
    fn test_numeric_literals() {
        for source in ["1", "123", "1.5", ".5", "1.", "1e5", "1.5e-3", "2e+10", "."] {
            let tokens = lex(source).unwrap();
            assert_eq!(tokens.len(), 1, "{}", source);
            assert_eq!(tokens[0].kind, TokenKind::Numeric, "{}", source);
            assert_eq!(tokens[0].value, source);
        }
    }

    #[test]
    fn test_numeric_quirks_are_preserved() {
        // A sign right after the marker is taken even at end of input
        let tokens = lex("1e+").unwrap();
        assert_eq!(tokens[0].value, "1e+");

        // A trailing marker is not
        assert!(lex("1e").is_err());
        assert!(lex("1.2.3").is_err());
        assert!(lex("1e5e5").is_err());
        assert!(lex("1e5.0").is_err());
    }

    #[test]
    fn test_numeric_stops_at_non_digit() {
        use TokenKind::*;

        assert_tokens(
            "(12,3)",
            &[
                token(Symbol, "(", 0, 0),
                token(Numeric, "12", 0, 1),
                token(Symbol, ",", 0, 3),
                token(Numeric, "3", 0, 4),
                token(Symbol, ")", 0, 5),
            ],
        );
    }

    #[test]
    fn test_newline_tracking() {
        use TokenKind::*;

        assert_tokens(
            "SELECT\n\tid\nFROM users;",
            &[
                token(Keyword, "select", 0, 0),
                token(Identifier, "id", 1, 1),
                token(Keyword, "from", 2, 0),
                token(Identifier, "users", 2, 5),
                token(Symbol, ";", 2, 10),
            ],
        );
    }

    #[test]
    fn test_multiline_string_advances_line() {
        let tokens = lex("'a\nb' x").unwrap();
        assert_eq!(tokens[0].value, "a\nb");
        assert_eq!(tokens[1].location, Location::new(1, 3));
    }

    #[test]
    fn test_whitespace_only() {
        assert!(lex(" \t\n ").unwrap().is_empty());
        assert!(lex("").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_character_reports_location_and_hint() {
        let error = lex("SELECT id\nFROM users WHERE a = 1;").unwrap_err();
        assert_eq!(error.location, Location::new(1, 19));
        assert_eq!(error.hint, " after a: '='");

        let error = lex("#").unwrap_err();
        assert_eq!(error.hint, " '#'");
    }

    #[test]
    fn test_failed_sub_lexer_leaves_cursor() {
        let start = Cursor {
            offset: 0,
            location: Location::new(4, 2),
        };
        assert!(lex_string("'open", start).is_none());
        assert!(lex_numeric("abc", start).is_none());
        assert!(lex_keyword("users", start).is_none());
    }

    #[test]
    fn test_longest_match_direct() {
        let options = ["int", "into", "insert"];
        assert_eq!(longest_match("intox", Cursor::default(), &options), Some("into"));
        assert_eq!(longest_match("integer", Cursor::default(), &options), Some("int"));
        assert_eq!(longest_match("in", Cursor::default(), &options), None);
    }
}
