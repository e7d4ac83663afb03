//! Statement productions.

use lyrac_lex::{Keyword, TokenKind};
use lyrac_util::Ty;

use crate::ast::{
    Assoc, Block, ElseArm, FuncDecl, IfStmt, LetStmt, OpPosition, OperatorDecl, Param, ReturnStmt,
    Stmt, WhileStmt,
};
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parses one statement. Dispatch reads a single keyword; anything
    /// else falls back to an expression statement.
    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, ()> {
        let token = self.peek();
        match token.keyword() {
            Some(Keyword::Let) => self.parse_let(),
            Some(Keyword::Func) => self.parse_func(),
            Some(Keyword::Operator) => self.parse_operator_decl(),
            Some(Keyword::If) => self.parse_if().map(Stmt::If),
            Some(Keyword::Return) => self.parse_return(),
            Some(Keyword::While) => self.parse_while(),
            _ if token.is_punct('{') => self.parse_block().map(Stmt::Block),
            _ => {
                let expr = self.parse_expr()?;
                self.expect_semi()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// `let NAME (':' TYPE)? '=' EXPR ';'`
    fn parse_let(&mut self) -> Result<Stmt, ()> {
        let kw = self.bump();
        let name = self.expect_ident("variable name")?;
        let declared_ty = if self.peek().is_punct(':') {
            self.bump();
            Some(self.parse_type()?)
        } else {
            None
        };
        if !self.peek().is_operator("=") {
            self.error_missing("expected `=` in `let` statement");
            return Err(());
        }
        self.bump();
        let init = self.parse_expr()?;
        self.expect_semi()?;
        let span = kw.span.merge(init.span());
        Ok(Stmt::Let(LetStmt {
            name: name.text,
            name_span: name.span,
            declared_ty,
            init,
            span,
        }))
    }

    /// `func NAME '(' PARAMS ')' (':' TYPE)? ( BLOCK | ';' )`
    fn parse_func(&mut self) -> Result<Stmt, ()> {
        let kw = self.bump();
        let name = self.expect_ident("function name")?;
        self.expect_punct('(')?;
        let params = self.parse_params()?;
        let ret = if self.peek().is_punct(':') {
            self.bump();
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = if self.peek().is_punct(';') {
            self.bump();
            None
        } else {
            Some(self.parse_block()?)
        };
        Ok(Stmt::Func(FuncDecl {
            name: name.text,
            params,
            ret,
            body,
            span: kw.span.merge(name.span),
        }))
    }

    /// `operator (prefix|infix|postfix) OP '(' PARAMS ')' ':' TYPE`
    /// `( 'prec' INT ('assoc_left'|'assoc_right')? )? ( BLOCK | ';' )`
    ///
    /// `prec` is required for infix operators and forbidden elsewhere;
    /// parameter counts are checked here, not deferred.
    fn parse_operator_decl(&mut self) -> Result<Stmt, ()> {
        let kw = self.bump();
        let position = match self.peek().keyword() {
            Some(Keyword::Prefix) => {
                self.bump();
                OpPosition::Prefix
            }
            Some(Keyword::Infix) => {
                self.bump();
                OpPosition::Infix
            }
            Some(Keyword::Postfix) => {
                self.bump();
                OpPosition::Postfix
            }
            _ => {
                self.error_missing("expected `prefix`, `infix`, or `postfix`");
                return Err(());
            }
        };
        if self.peek().kind != TokenKind::Operator {
            self.error_missing("expected operator symbol");
            return Err(());
        }
        let op = self.bump();
        self.expect_punct('(')?;
        let params = self.parse_params()?;
        if !self.peek().is_punct(':') {
            self.error_missing("expected `:` and a return type");
            return Err(());
        }
        self.bump();
        let ret = self.parse_type()?;

        let mut prec = 0i64;
        let mut prec_span = None;
        let mut assoc = if position == OpPosition::Infix {
            Assoc::Left
        } else {
            Assoc::None
        };
        if self.peek().is_keyword(Keyword::Prec) {
            let prec_kw = self.bump();
            prec_span = Some(prec_kw.span);
            if self.peek().kind != TokenKind::Int {
                self.error_missing("expected precedence integer");
                return Err(());
            }
            let int_tok = self.bump();
            prec = match int_tok.text.as_str().parse::<i64>() {
                Ok(value) => value,
                Err(_) => {
                    self.error_at(int_tok.span, "precedence integer out of range");
                    return Err(());
                }
            };
            match self.peek().keyword() {
                Some(Keyword::AssocLeft) => {
                    self.bump();
                    assoc = Assoc::Left;
                }
                Some(Keyword::AssocRight) => {
                    self.bump();
                    assoc = Assoc::Right;
                }
                _ => {}
            }
        }

        let body = if self.peek().is_punct(';') {
            self.bump();
            None
        } else {
            Some(self.parse_block()?)
        };

        let mut bad = false;
        match position {
            OpPosition::Infix => {
                if prec_span.is_none() {
                    self.error_at(op.span, "infix operator declarations require a `prec` clause");
                    bad = true;
                }
                if params.len() != 2 {
                    self.error_at(op.span, "infix operators take exactly two parameters");
                    bad = true;
                }
            }
            OpPosition::Prefix | OpPosition::Postfix => {
                if let Some(span) = prec_span {
                    self.error_at(span, "`prec` is only allowed on infix operators");
                    bad = true;
                }
                if params.len() != 1 {
                    self.error_at(
                        op.span,
                        format!(
                            "{} operators take exactly one parameter",
                            position.as_str()
                        ),
                    );
                    bad = true;
                }
            }
        }
        if bad {
            return Err(());
        }

        Ok(Stmt::Operator(OperatorDecl {
            symbol: op.text,
            position,
            params,
            ret,
            prec,
            assoc,
            body,
            span: kw.span.merge(op.span),
        }))
    }

    /// `if EXPR BLOCK ( else ( IF | BLOCK ) )?`
    fn parse_if(&mut self) -> Result<IfStmt, ()> {
        let kw = self.bump();
        let cond = self.parse_expr()?;
        let then_block = self.parse_block()?;
        let else_arm = if self.peek().is_keyword(Keyword::Else) {
            self.bump();
            if self.peek().is_keyword(Keyword::If) {
                Some(Box::new(ElseArm::If(self.parse_if()?)))
            } else {
                Some(Box::new(ElseArm::Block(self.parse_block()?)))
            }
        } else {
            None
        };
        Ok(IfStmt {
            cond,
            then_block,
            else_arm,
            span: kw.span,
        })
    }

    /// `return EXPR? ';'`
    fn parse_return(&mut self) -> Result<Stmt, ()> {
        let kw = self.bump();
        if self.peek().is_punct(';') {
            self.bump();
            return Ok(Stmt::Return(ReturnStmt {
                value: None,
                span: kw.span,
            }));
        }
        let value = self.parse_expr()?;
        self.expect_semi()?;
        Ok(Stmt::Return(ReturnStmt {
            value: Some(value),
            span: kw.span,
        }))
    }

    /// `while EXPR BLOCK`
    fn parse_while(&mut self) -> Result<Stmt, ()> {
        let kw = self.bump();
        let cond = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::While(WhileStmt {
            cond,
            body,
            span: kw.span,
        }))
    }

    /// `'{' STMT* '}'`
    pub(crate) fn parse_block(&mut self) -> Result<Block, ()> {
        let open = self.expect_punct('{')?;
        let mut stmts = Vec::new();
        loop {
            let token = self.peek();
            if token.is_punct('}') {
                let close = self.bump();
                return Ok(Block {
                    stmts,
                    span: open.span.merge(close.span),
                });
            }
            if token.is_eof() {
                self.error_missing("expected `}`");
                return Ok(Block {
                    stmts,
                    span: open.span,
                });
            }
            let before = self.pos;
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(()) => {
                    self.synchronize();
                    if self.pos == before
                        && !self.peek().is_punct('}')
                        && !self.peek().is_eof()
                    {
                        self.bump();
                    }
                }
            }
        }
    }

    /// `NAME (':' TYPE)?` list; empty allowed, trailing comma not.
    /// Consumes the closing `)`.
    fn parse_params(&mut self) -> Result<Vec<Param>, ()> {
        let mut params = Vec::new();
        if self.peek().is_punct(')') {
            self.bump();
            return Ok(params);
        }
        loop {
            let name = self.expect_ident("parameter name")?;
            let ty = if self.peek().is_punct(':') {
                self.bump();
                Some(self.parse_type()?)
            } else {
                None
            };
            params.push(Param {
                name: name.text,
                ty,
                span: name.span,
            });
            if self.peek().is_punct(',') {
                self.bump();
                continue;
            }
            self.expect_punct(')')?;
            return Ok(params);
        }
    }

    /// A type annotation is a bare identifier.
    pub(crate) fn parse_type(&mut self) -> Result<Ty, ()> {
        if self.peek().kind == TokenKind::Ident {
            let token = self.bump();
            Ok(Ty::from_name(token.text))
        } else {
            self.error_missing("expected type name");
            Err(())
        }
    }
}
