//! Core lexer implementation.
//!
//! The lexer is a stateful single-pass scanner. Each call to
//! [`Lexer::next_token`] skips whitespace, records the token start, and
//! dispatches on the first character to a specialized submodule. Error
//! tokens never halt scanning; subsequent tokens are still produced so a
//! single run yields as many diagnostics as possible.

mod comment;
mod ident;
mod number;
mod operator;
mod string;

use lyrac_util::{Diagnostic, Handler, Span, Stage, Symbol};

use crate::cursor::Cursor;
use crate::token::{is_operator_char, is_punct_char, Token, TokenKind};

/// Lexer for Lyra source text.
pub struct Lexer<'a> {
    /// Character cursor over the source.
    pub(crate) cursor: Cursor<'a>,

    /// Handler for lexical diagnostics.
    handler: &'a Handler,

    /// Byte offset where the current token starts.
    pub(crate) token_start: usize,

    /// Line where the current token starts (1-based).
    pub(crate) token_line: u32,

    /// Column where the current token starts (1-based).
    pub(crate) token_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over `source`.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_line: 1,
            token_column: 1,
        }
    }

    /// Returns the next token, or `Eof` at the end of input.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        self.token_start = self.cursor.position();
        self.token_line = self.cursor.line();
        self.token_column = self.cursor.column();

        if self.cursor.is_at_end() {
            let pos = self.cursor.position();
            return Token {
                kind: TokenKind::Eof,
                text: Symbol::intern(""),
                span: Span::new(pos, pos, self.token_line, self.token_column, self.token_column),
                error_offset: 0,
            };
        }

        let c = self.cursor.current_char();
        match c {
            '#' => self.lex_comment(),
            '"' => self.lex_string(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident(),
            c if is_operator_char(c) => self.lex_operator(),
            c if is_punct_char(c) => {
                self.cursor.advance();
                self.make_token(TokenKind::Punct, &c.to_string())
            }
            c => {
                self.cursor.advance();
                self.error_token(format!("unexpected character '{}'", c), 0)
            }
        }
    }

    /// Materializes the whole token stream, ending with `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    /// Skips space, tab, carriage return, and newline.
    fn skip_whitespace(&mut self) {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\r' | '\n' => self.cursor.advance(),
                _ => return,
            }
        }
    }

    /// The span from the token start to the current cursor position.
    pub(crate) fn token_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_line,
            self.token_column,
            self.cursor.column(),
        )
    }

    /// Builds a token of `kind` with the given text over the current span.
    pub(crate) fn make_token(&self, kind: TokenKind, text: &str) -> Token {
        Token {
            kind,
            text: Symbol::intern(text),
            span: self.token_span(),
            error_offset: 0,
        }
    }

    /// Builds an error token over the current span, reporting a diagnostic
    /// whose caret points `offset` characters into the span.
    pub(crate) fn error_token(&mut self, message: String, offset: usize) -> Token {
        let span = self.token_span();
        self.handler.emit(
            Diagnostic::error(Stage::Lex, message, span).with_caret_offset(offset),
        );
        Token {
            kind: TokenKind::Error,
            text: Symbol::intern(self.cursor.slice_from(self.token_start)),
            span,
            error_offset: offset,
        }
    }

    /// Character offset of the cursor within the current token.
    pub(crate) fn offset_in_token(&self) -> usize {
        (self.cursor.column() - self.token_column) as usize
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.is_eof() {
            None
        } else {
            Some(token)
        }
    }
}
