//! lyrac-par - Parser
//!
//! Recursive descent over the token stream. Statement dispatch reads one
//! keyword to pick a production; expressions come out as flat operator
//! sequences (see [`ast::OpSeqExpr`]) — precedence is resolved later.
//!
//! On a syntax error the parser records a diagnostic and synchronizes by
//! skipping to a `;` (consumed), a `}` (left for the enclosing block), or
//! a statement-starter keyword. "Expected but missing" errors are anchored
//! at the end column of the previous non-comment token so the diagnostic
//! points at the actual defect.

pub mod ast;
pub mod dump;
mod expr;
mod stmt;

use lyrac_lex::{Keyword, Token, TokenKind};
use lyrac_util::{Handler, Span, Stage};

use ast::Stmt;

/// Parser over a materialized token stream.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    handler: &'a Handler,
    /// Last consumed non-comment token; anchors "missing token" errors.
    prev: Option<Token>,
}

impl<'a> Parser<'a> {
    /// Creates a parser. `tokens` must end with an `Eof` token, as
    /// produced by `Lexer::tokenize`.
    pub fn new(tokens: Vec<Token>, handler: &'a Handler) -> Self {
        Self {
            tokens,
            pos: 0,
            handler,
            prev: None,
        }
    }

    /// Parses the whole program as a statement list.
    pub fn parse_program(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        loop {
            if self.peek().is_eof() {
                return stmts;
            }
            let before = self.pos;
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(()) => {
                    self.synchronize();
                    // A stray `}` at top level is not a sync target for
                    // anyone else; consume it to guarantee progress.
                    if self.pos == before && !self.peek().is_eof() {
                        self.bump();
                    }
                }
            }
        }
    }

    fn skip_comments(&mut self) {
        while self.tokens[self.pos].is_comment() {
            self.pos += 1;
        }
    }

    /// Next significant token, without consuming it.
    pub(crate) fn peek(&mut self) -> Token {
        self.skip_comments();
        self.tokens[self.pos]
    }

    /// Consumes and returns the next significant token. `Eof` is never
    /// consumed.
    pub(crate) fn bump(&mut self) -> Token {
        self.skip_comments();
        let token = self.tokens[self.pos];
        if !token.is_eof() {
            self.pos += 1;
            self.prev = Some(token);
        }
        token
    }

    /// Point span just past the previously consumed token.
    fn prev_end_point(&self) -> Span {
        match self.prev {
            Some(t) => Span::point(t.span.line, t.span.end_column),
            None => Span::point(1, 1),
        }
    }

    /// Reports an error at an explicit span.
    pub(crate) fn error_at(&self, span: Span, message: impl Into<String>) {
        self.handler.error(Stage::Parse, message, span);
    }

    /// Reports an "expected but missing" error anchored at the end of the
    /// previous token.
    pub(crate) fn error_missing(&self, message: impl Into<String>) {
        self.handler.error(Stage::Parse, message, self.prev_end_point());
    }

    /// Consumes the given punctuation or reports a missing-token error.
    pub(crate) fn expect_punct(&mut self, c: char) -> Result<Token, ()> {
        if self.peek().is_punct(c) {
            Ok(self.bump())
        } else {
            self.error_missing(format!("expected `{}`", c));
            Err(())
        }
    }

    /// Consumes a `;` statement terminator.
    pub(crate) fn expect_semi(&mut self) -> Result<Token, ()> {
        self.expect_punct(';')
    }

    /// Consumes an identifier token.
    pub(crate) fn expect_ident(&mut self, what: &str) -> Result<Token, ()> {
        if self.peek().kind == TokenKind::Ident {
            Ok(self.bump())
        } else {
            self.error_missing(format!("expected {}", what));
            Err(())
        }
    }

    /// Human-readable description of a token for error messages.
    pub(crate) fn describe(token: &Token) -> String {
        match token.kind {
            TokenKind::Eof => "end of file".to_string(),
            _ => format!("`{}`", token.text),
        }
    }

    /// Skips tokens until a likely statement boundary.
    fn synchronize(&mut self) {
        loop {
            let token = self.peek();
            if token.is_eof() {
                return;
            }
            if token.is_punct(';') {
                self.bump();
                return;
            }
            if token.is_punct('}') {
                return;
            }
            if matches!(
                token.keyword(),
                Some(
                    Keyword::Let
                        | Keyword::Func
                        | Keyword::Operator
                        | Keyword::If
                        | Keyword::Return
                        | Keyword::While
                )
            ) {
                return;
            }
            self.bump();
        }
    }
}
