//! Line comment lexing.
//!
//! `#` comments run to end of line and are emitted as tokens so the driver
//! can dump them; the parser skips them.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a `#` comment up to (not including) the newline.
    pub(crate) fn lex_comment(&mut self) -> Token {
        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(self.token_start).to_owned();
        self.make_token(TokenKind::Comment, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyrac_util::Handler;

    #[test]
    fn test_comment_to_eol() {
        let handler = Handler::new();
        let tokens = Lexer::new("# note\nlet", &handler).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text.as_str(), "# note");
        assert_eq!(tokens[1].text.as_str(), "let");
    }

    #[test]
    fn test_comment_at_eof() {
        let handler = Handler::new();
        let tokens = Lexer::new("1 # trailing", &handler).tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Comment);
        assert!(tokens[2].is_eof());
    }

    #[test]
    fn test_comment_swallows_operators() {
        let handler = Handler::new();
        let tokens = Lexer::new("# + - * /", &handler).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert!(tokens[1].is_eof());
    }
}
