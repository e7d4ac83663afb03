//! Operator token lexing.
//!
//! Operators are a greedy maximal munch over the operator character set,
//! so `==`, `<=`, `&&`, `**`, `->` and any user-declared spelling come out
//! as a single token.

use crate::token::{is_operator_char, Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a maximal run of operator characters.
    pub(crate) fn lex_operator(&mut self) -> Token {
        while is_operator_char(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(self.token_start).to_owned();
        self.make_token(TokenKind::Operator, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyrac_util::Handler;

    fn texts(source: &str) -> Vec<String> {
        let handler = Handler::new();
        Lexer::new(source, &handler)
            .tokenize()
            .into_iter()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.text.as_str().to_owned())
            .collect()
    }

    #[test]
    fn test_multi_char_operators() {
        assert_eq!(texts("a == b"), vec!["=="]);
        assert_eq!(texts("a <= b"), vec!["<="]);
        assert_eq!(texts("a && b"), vec!["&&"]);
        assert_eq!(texts("a ** b"), vec!["**"]);
        assert_eq!(texts("a -> b"), vec!["->"]);
        assert_eq!(texts("a <<b>> c"), vec!["<<", ">>"]);
        assert_eq!(texts("x += 1"), vec!["+="]);
    }

    #[test]
    fn test_maximal_munch_is_greedy() {
        // Adjacent operator characters fuse into one token.
        assert_eq!(texts("a +- b"), vec!["+-"]);
        assert_eq!(texts("a +< b +> c"), vec!["+<", "+>"]);
    }

    #[test]
    fn test_spaces_split_operators() {
        assert_eq!(texts("- - x"), vec!["-", "-"]);
    }

    #[test]
    fn test_punctuation_ends_operator() {
        assert_eq!(texts("-(x)"), vec!["-"]);
    }
}
