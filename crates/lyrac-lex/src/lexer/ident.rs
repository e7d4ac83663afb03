//! Identifier and keyword lexing.

use crate::token::{Keyword, Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an identifier or keyword: `[A-Za-z_][A-Za-z0-9_]*`.
    pub(crate) fn lex_ident(&mut self) -> Token {
        loop {
            let c = self.cursor.current_char();
            if c.is_ascii_alphanumeric() || c == '_' {
                self.cursor.advance();
            } else {
                break;
            }
        }

        let text = self.cursor.slice_from(self.token_start).to_owned();
        let kind = match Keyword::from_str(&text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident,
        };
        self.make_token(kind, &text)
    }
}
