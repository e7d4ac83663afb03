//! Number literal lexing.
//!
//! Numbers are digit-first and become floats on a decimal point followed
//! by a digit, or on a well-formed exponent. The raw text is kept; numeric
//! parsing is deferred to code generation.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an integer or floating-point literal.
    ///
    /// `123abc` produces the integer `123`; the identifier is lexed
    /// separately. `1.x` produces the integer `1` followed by the `.`
    /// operator.
    pub(crate) fn lex_number(&mut self) -> Token {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        let mut is_float = false;

        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            is_float = true;
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        let c = self.cursor.current_char();
        if c == 'e' || c == 'E' {
            let after_sign = match self.cursor.peek_char(1) {
                '+' | '-' => 2,
                _ => 1,
            };
            if self.cursor.peek_char(after_sign).is_ascii_digit() {
                is_float = true;
                self.cursor.advance();
                if matches!(self.cursor.current_char(), '+' | '-') {
                    self.cursor.advance();
                }
                while self.cursor.current_char().is_ascii_digit() {
                    self.cursor.advance();
                }
            }
        }

        let text = self.cursor.slice_from(self.token_start).to_owned();
        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        self.make_token(kind, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyrac_util::Handler;

    fn first(source: &str) -> Token {
        let handler = Handler::new();
        let mut lexer = Lexer::new(source, &handler);
        lexer.next_token()
    }

    #[test]
    fn test_integer() {
        let tok = first("42;");
        assert_eq!(tok.kind, TokenKind::Int);
        assert_eq!(tok.text.as_str(), "42");
    }

    #[test]
    fn test_float_fraction() {
        let tok = first("3.14");
        assert_eq!(tok.kind, TokenKind::Float);
        assert_eq!(tok.text.as_str(), "3.14");
    }

    #[test]
    fn test_float_exponent() {
        assert_eq!(first("1e10").kind, TokenKind::Float);
        assert_eq!(first("2.5e-3").kind, TokenKind::Float);
        assert_eq!(first("2E+7").kind, TokenKind::Float);
    }

    #[test]
    fn test_integer_then_identifier() {
        let handler = Handler::new();
        let tokens = Lexer::new("123abc", &handler).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].text.as_str(), "123");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].text.as_str(), "abc");
    }

    #[test]
    fn test_dot_without_digit_stays_integer() {
        let handler = Handler::new();
        let tokens = Lexer::new("1.x", &handler).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[1].kind, TokenKind::Operator);
        assert_eq!(tokens[1].text.as_str(), ".");
        assert_eq!(tokens[2].kind, TokenKind::Ident);
    }

    #[test]
    fn test_bare_e_is_not_exponent() {
        let handler = Handler::new();
        let tokens = Lexer::new("7e", &handler).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].text.as_str(), "7");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].text.as_str(), "e");
    }
}
