#[cfg(test)]
mod scanner_tests {
    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_class_syntax() {
        assert_token_sequence(
            "class B < A { init() { super.init(); this.x = 1; } }",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "B"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "A"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::IDENTIFIER, "init"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::SUPER, "super"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "init"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::THIS, "this"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_comments_and_lines() {
        let source = "// leading comment\nvar a = \"two\nlines\";\n\n<= // trailing";
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(Result::ok)
            .collect();

        let summary: Vec<(&str, usize)> = tokens
            .iter()
            .map(|t| (t.token_type.name(), t.line))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("VAR", 2),
                ("IDENTIFIER", 2),
                ("EQUAL", 2),
                ("STRING", 3),
                ("SEMICOLON", 3),
                ("LESS_EQUAL", 5),
                ("EOF", 5),
            ]
        );

        assert_eq!(tokens[3].token_type, TokenType::STRING(String::new()));
        if let TokenType::STRING(s) = &tokens[3].token_type {
            assert_eq!(s, "two\nlines");
        }
    }

    #[test]
    fn test_token_display() {
        let tokens: Vec<String> = Scanner::new(b"42 3.25 \"hi\" orchid")
            .filter_map(Result::ok)
            .map(|t| t.to_string())
            .collect();

        assert_eq!(
            tokens,
            vec![
                "NUMBER 42 42.0",
                "NUMBER 3.25 3.25",
                "STRING \"hi\" hi",
                "IDENTIFIER orchid null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let results: Vec<_> = Scanner::new(b",.$(#").collect();

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert!(matches!(&results[2], Err(LoxError::Lex { line: 1, .. })));
        assert!(matches!(&results[4], Err(LoxError::Lex { .. })));

        let messages: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            messages,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        assert!(results[5].as_ref().is_ok_and(Token::is_eof));
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = Scanner::new(b"print \"oops").scan_all();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.token_type.name()), Some("EOF"));
    }

    #[test]
    fn test_scanner_is_fused() {
        let mut scanner = Scanner::new(b"");
        assert!(scanner.next().is_some_and(|t| t.is_ok_and(|t| t.is_eof())));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
