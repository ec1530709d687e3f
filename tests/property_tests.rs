// Property-based tests using proptest
use minisql::expr::Expression;
use minisql::token::Keyword;
use minisql::{lex, parse, Statement, TokenKind};
use proptest::prelude::*;

// Strategy for generating identifiers that lex as a single identifier.
// Keywords match without a word boundary, so no keyword may be a prefix.
fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,10}".prop_filter_map("no keyword prefix", |s| {
        if Keyword::ALL.iter().any(|keyword| s.starts_with(keyword.as_str())) {
            None
        } else {
            Some(s)
        }
    })
}

// Strategy for generating numeric literals
fn number_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0i64..10000).prop_map(|n| n.to_string()),
        (0u32..1000, 0u32..100).prop_map(|(a, b)| format!("{}.{}", a, b)),
        (1u32..10, 0u32..20).prop_map(|(a, e)| format!("{}e{}", a, e)),
    ]
}

// Strategy for generating string literals, quotes included
fn string_literal_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,20}".prop_map(|s| format!("'{}'", s))
}

fn expression_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        identifier_strategy(),
        number_strategy(),
        string_literal_strategy(),
    ]
}

fn create_statement_strategy() -> impl Strategy<Value = String> {
    (
        identifier_strategy(),
        prop::collection::vec(
            (identifier_strategy(), prop::sample::select(vec!["INT", "TEXT"])),
            0..5,
        ),
    )
        .prop_map(|(table, columns)| {
            let columns: Vec<String> = columns
                .iter()
                .map(|(name, datatype)| format!("{} {}", name, datatype))
                .collect();
            format!("CREATE TABLE {} ({})", table, columns.join(", "))
        })
}

fn insert_statement_strategy() -> impl Strategy<Value = String> {
    (
        identifier_strategy(),
        prop::collection::vec(expression_strategy(), 0..5),
    )
        .prop_map(|(table, values)| format!("INSERT INTO {} VALUES ({})", table, values.join(", ")))
}

fn select_statement_strategy() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(expression_strategy(), 0..5),
        prop::option::of(identifier_strategy()),
    )
        .prop_map(|(items, from)| match from {
            Some(table) => format!("SELECT {} FROM {}", items.join(", "), table),
            None => format!("SELECT {}", items.join(", ")),
        })
}

fn statement_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        create_statement_strategy(),
        insert_statement_strategy(),
        select_statement_strategy(),
    ]
}

proptest! {
    #[test]
    fn test_lexer_never_panics(input in ".*") {
        // The lexer should never panic on any input
        let _ = lex(&input);
    }

    #[test]
    fn test_parser_never_panics(input in ".*") {
        // The parser should never panic, even on invalid SQL
        let _ = parse(&input);
    }

    #[test]
    fn test_valid_statements_always_parse(sql in statement_strategy()) {
        let sql = format!("{};", sql);
        prop_assert!(parse(&sql).is_ok(), "failed to parse: {}", sql);
    }

    #[test]
    fn test_statement_count(
        statements in prop::collection::vec(statement_strategy(), 0..8)
    ) {
        let sql: String = statements.iter().map(|s| format!("{};\n", s)).collect();
        let ast = parse(&sql).unwrap();
        prop_assert_eq!(ast.statements.len(), statements.len());
    }

    #[test]
    fn test_display_round_trip(
        statements in prop::collection::vec(statement_strategy(), 1..5)
    ) {
        let sql: String = statements.iter().map(|s| format!("{};", s)).collect();
        let ast = parse(&sql).unwrap();

        let rendered = ast.to_string();
        let reparsed = parse(&rendered);
        prop_assert!(reparsed.is_ok(), "failed to reparse: {}", rendered);
        prop_assert_eq!(reparsed.unwrap(), ast);
    }

    #[test]
    fn test_keywords_are_case_insensitive(
        select in "[sS][eE][lL][eE][cC][tT]",
        from in "[fF][rR][oO][mM]",
        col in identifier_strategy(),
        table in identifier_strategy()
    ) {
        let sql = format!("{} {} {} {};", select, col, from, table);
        let expected = parse(&format!("SELECT {} FROM {};", col, table)).unwrap();
        prop_assert_eq!(parse(&sql).unwrap(), expected);
    }

    #[test]
    fn test_string_escapes(content in "[a-zA-Z0-9 ']{0,20}") {
        let sql = format!("SELECT '{}';", content.replace('\'', "''"));
        let ast = parse(&sql).unwrap();

        let Statement::Select(select) = &ast.statements[0] else {
            panic!("expected SELECT");
        };
        let Expression::Literal(token) = &select.items[0];
        prop_assert_eq!(token.kind, TokenKind::String);
        prop_assert_eq!(&token.value, &content);
    }

    #[test]
    fn test_whitespace_handling(
        col in identifier_strategy(),
        table in identifier_strategy(),
        ws1 in prop::collection::vec(prop::sample::select(vec![" ", "\t", "\n"]), 1..5),
        ws2 in prop::collection::vec(prop::sample::select(vec![" ", "\t", "\n"]), 1..5)
    ) {
        let ws1_str = ws1.join("");
        let ws2_str = ws2.join("");

        let sql = format!("SELECT{}{}{}FROM{}{}{};", ws1_str, col, ws2_str, ws1_str, table, ws2_str);
        let expected = parse(&format!("SELECT {} FROM {};", col, table)).unwrap();
        prop_assert_eq!(parse(&sql).unwrap(), expected);
    }

    #[test]
    fn test_token_locations_increase(sql in statement_strategy()) {
        let tokens = lex(&sql).unwrap();

        for pair in tokens.windows(2) {
            let (a, b) = (pair[0].location, pair[1].location);
            prop_assert!((a.line, a.column) < (b.line, b.column));
        }
    }
}

// Additional property tests for error reporting
proptest! {
    #[test]
    fn test_typo_suggestions_are_keywords(
        keyword in prop::sample::select(vec!["SELECT", "INSERT", "CREATE", "VALUES"]),
        typo_char in prop::char::range('A', 'Z')
    ) {
        // Create a typo by replacing one character
        let mut typo = keyword.to_string();
        let idx = typo.len() / 2;
        typo.replace_range(idx..idx + 1, &typo_char.to_string());

        let sql = format!("{} a FROM users;", typo);

        if let Err(error) = parse(&sql) {
            if let Some(suggestion) = error.suggestion {
                let valid_keywords: Vec<String> =
                    Keyword::ALL.iter().map(|k| k.to_string()).collect();
                prop_assert!(valid_keywords.contains(&suggestion));
            }
        }
    }

    #[test]
    fn test_furthest_error_tracking(
        good_part in select_statement_strategy(),
        bad_token in "[A-Z]{5,10}"
    ) {
        let sql = format!("{} {} extra;", good_part, bad_token);

        // The error should be reported after the good part
        let error = parse(&sql).unwrap_err();
        prop_assert_eq!(error.location.line, 0);
        prop_assert!(error.location.column > good_part.len());
        prop_assert!(!error.message.is_empty());
    }
}
