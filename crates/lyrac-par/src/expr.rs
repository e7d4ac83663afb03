//! Expression parsing.
//!
//! Expressions are parsed as flat operator sequences: the parser
//! alternates between "expecting operand or operator" and "just saw an
//! operand", appending items without resolving precedence. Consecutive
//! operator tokens are legal (they may later fold as prefix/postfix), and
//! two adjacent operands terminate the expression.

use lyrac_lex::{Keyword, Token, TokenKind};

use crate::ast::{
    BoolLit, CallExpr, Expr, IdentExpr, Lit, OpSeqExpr, OpSeqItem, OpToken,
};
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parses one expression as an operator sequence; a single operand
    /// collapses to the bare operand.
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ()> {
        let mut items: Vec<OpSeqItem> = Vec::new();
        let mut last_was_operand = false;

        loop {
            let token = self.peek();
            if token.kind == TokenKind::Operator {
                self.bump();
                items.push(OpSeqItem::Operator(OpToken {
                    symbol: token.text,
                    span: token.span,
                }));
                last_was_operand = false;
                continue;
            }
            if Self::starts_primary(&token) {
                if last_was_operand {
                    break;
                }
                let operand = self.parse_primary()?;
                items.push(OpSeqItem::Operand(operand));
                last_was_operand = true;
                continue;
            }
            break;
        }

        if items.is_empty() {
            let token = self.peek();
            self.error_at(
                token.span,
                format!("expected expression, found {}", Self::describe(&token)),
            );
            return Err(());
        }

        if items.len() == 1 {
            if matches!(items[0], OpSeqItem::Operand(_)) {
                if let Some(OpSeqItem::Operand(expr)) = items.pop() {
                    return Ok(expr);
                }
            }
        }

        let first = match &items[0] {
            OpSeqItem::Operand(e) => e.span(),
            OpSeqItem::Operator(op) => op.span,
        };
        let last = match items.last() {
            Some(OpSeqItem::Operand(e)) => e.span(),
            Some(OpSeqItem::Operator(op)) => op.span,
            None => first,
        };
        Ok(Expr::OpSeq(OpSeqExpr {
            items,
            span: first.merge(last),
            ty: None,
        }))
    }

    /// Returns true if `token` can begin a primary expression.
    fn starts_primary(token: &Token) -> bool {
        match token.kind {
            TokenKind::Int | TokenKind::Float | TokenKind::Str | TokenKind::Ident => true,
            TokenKind::Keyword(Keyword::True) | TokenKind::Keyword(Keyword::False) => true,
            _ => token.is_punct('('),
        }
    }

    /// Parses a literal, identifier (with optional call suffix), or
    /// parenthesized sub-expression.
    fn parse_primary(&mut self) -> Result<Expr, ()> {
        let token = self.peek();
        match token.kind {
            TokenKind::Int => {
                self.bump();
                Ok(Expr::Int(Lit {
                    text: token.text,
                    span: token.span,
                    ty: None,
                }))
            }
            TokenKind::Float => {
                self.bump();
                Ok(Expr::Float(Lit {
                    text: token.text,
                    span: token.span,
                    ty: None,
                }))
            }
            TokenKind::Str => {
                self.bump();
                Ok(Expr::Str(Lit {
                    text: token.text,
                    span: token.span,
                    ty: None,
                }))
            }
            TokenKind::Keyword(Keyword::True) | TokenKind::Keyword(Keyword::False) => {
                self.bump();
                Ok(Expr::Bool(BoolLit {
                    value: token.is_keyword(Keyword::True),
                    span: token.span,
                    ty: None,
                }))
            }
            TokenKind::Ident => {
                self.bump();
                if self.peek().is_punct('(') {
                    return self.parse_call(token);
                }
                Ok(Expr::Ident(IdentExpr {
                    name: token.text,
                    span: token.span,
                    ty: None,
                }))
            }
            _ if token.is_punct('(') => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect_punct(')')?;
                Ok(inner)
            }
            _ => {
                self.error_at(
                    token.span,
                    format!("expected expression, found {}", Self::describe(&token)),
                );
                Err(())
            }
        }
    }

    /// Parses the argument list of a call whose callee token was just
    /// consumed. Arguments are comma-separated, the list may be empty,
    /// and a trailing comma is rejected.
    fn parse_call(&mut self, callee: Token) -> Result<Expr, ()> {
        self.bump();
        let callee_expr = Expr::Ident(IdentExpr {
            name: callee.text,
            span: callee.span,
            ty: None,
        });
        let mut args = Vec::new();
        if self.peek().is_punct(')') {
            let close = self.bump();
            return Ok(Expr::Call(CallExpr {
                callee: Box::new(callee_expr),
                args,
                span: callee.span.merge(close.span),
                ty: None,
            }));
        }
        loop {
            args.push(self.parse_expr()?);
            if self.peek().is_punct(',') {
                self.bump();
                continue;
            }
            let close = self.expect_punct(')')?;
            return Ok(Expr::Call(CallExpr {
                callee: Box::new(callee_expr),
                args,
                span: callee.span.merge(close.span),
                ty: None,
            }));
        }
    }
}
