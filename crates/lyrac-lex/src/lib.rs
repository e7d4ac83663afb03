//! lyrac-lex - Lexical Analyzer
//!
//! Transforms Lyra source text into a token stream. Tokens carry their
//! kind, text, and source span; comments are emitted as tokens and the
//! stream always ends with an end-of-file marker. Lexical errors produce
//! error tokens without stopping the scan.

pub mod cursor;
mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{is_operator_char, is_punct_char, Keyword, Token, TokenKind};

#[cfg(test)]
mod stream_tests {
    use super::*;
    use lyrac_util::Handler;
    use proptest::prelude::*;

    fn lex(source: &str) -> Vec<Token> {
        let handler = Handler::new();
        Lexer::new(source, &handler).tokenize()
    }

    /// Every byte not covered by a token span must be whitespace, and
    /// token spans must not overlap.
    fn check_coverage(source: &str, tokens: &[Token]) {
        let mut covered = vec![false; source.len()];
        for token in tokens {
            for slot in &mut covered[token.span.start..token.span.end] {
                assert!(!*slot, "token spans overlap");
                *slot = true;
            }
        }
        for (i, byte) in source.bytes().enumerate() {
            if !covered[i] {
                assert!(
                    matches!(byte, b' ' | b'\t' | b'\r' | b'\n'),
                    "uncovered non-whitespace byte {:?} at {}",
                    byte as char,
                    i
                );
            }
        }
    }

    proptest! {
        #[test]
        fn positions_monotone(source in "[ \\t\\n a-z0-9#\"\\\\+*/<>=!;(){},.:-]{0,80}") {
            let tokens = lex(&source);
            let mut last = 0usize;
            for token in &tokens {
                prop_assert!(token.span.start >= last);
                prop_assert!(token.span.end >= token.span.start);
                last = token.span.start;
            }
            prop_assert!(tokens.last().is_some_and(Token::is_eof));
        }

        #[test]
        fn spans_plus_whitespace_cover_source(
            source in "[ \\t\\n a-z0-9#\"\\\\+*/<>=!;(){},.:-]{0,80}"
        ) {
            let tokens = lex(&source);
            check_coverage(&source, &tokens);
        }
    }

    #[test]
    fn coverage_with_comments_and_strings() {
        let source = "let s = \"a b\"; # trailing note\nexit(0);";
        let tokens = lex(source);
        check_coverage(source, &tokens);
    }
}
