//! Operator resolver.
//!
//! Rewrites the parser's flat operator sequences into binary/unary trees
//! using the global operator table. Two steps per sequence:
//!
//! 1. Greedy prefix/postfix folding: a run of prefix operators, an
//!    operand, then greedily-consumed postfix operators, leaving
//!    `operand (infix operand)*` with fully built unary subtrees.
//! 2. Precedence-directed splitting: the range is split at the operator
//!    with the lowest precedence (left-associative operators prefer the
//!    rightmost occurrence, right-associative the leftmost); operators at
//!    one precedence level that disagree on associativity are an error
//!    anchored at the later operator.
//!
//! The resolver mutates the AST in place and is idempotent: a second run
//! finds no sequence nodes and changes nothing.

use lyrac_par::ast::{
    Assoc, BinaryExpr, Block, BoolLit, ElseArm, Expr, IfStmt, OpPosition, OpSeqExpr, OpSeqItem,
    OpToken, Stmt, UnaryExpr,
};
use lyrac_util::{Handler, Span, Stage, Symbol};

use crate::table::SymbolTable;

/// An infix operator recorded during folding.
#[derive(Clone, Copy)]
struct InfixOp {
    symbol: Symbol,
    prec: i64,
    assoc: Assoc,
    span: Span,
}

/// Resolves operator sequences throughout an AST.
pub struct OperatorResolver<'a> {
    table: &'a SymbolTable,
    handler: &'a Handler,
}

impl<'a> OperatorResolver<'a> {
    pub fn new(table: &'a SymbolTable, handler: &'a Handler) -> Self {
        Self { table, handler }
    }

    /// Rewrites every expression in the program.
    pub fn resolve_program(&self, stmts: &mut [Stmt]) {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Let(s) => self.resolve_expr(&mut s.init),
            Stmt::Func(s) => {
                if let Some(body) = &mut s.body {
                    self.resolve_block(body);
                }
            }
            Stmt::Operator(s) => {
                if let Some(body) = &mut s.body {
                    self.resolve_block(body);
                }
            }
            Stmt::If(s) => self.resolve_if(s),
            Stmt::Return(s) => {
                if let Some(value) = &mut s.value {
                    self.resolve_expr(value);
                }
            }
            Stmt::While(s) => {
                self.resolve_expr(&mut s.cond);
                self.resolve_block(&mut s.body);
            }
            Stmt::Expr(e) => self.resolve_expr(e),
            Stmt::Block(b) => self.resolve_block(b),
        }
    }

    fn resolve_if(&self, s: &mut IfStmt) {
        self.resolve_expr(&mut s.cond);
        self.resolve_block(&mut s.then_block);
        match s.else_arm.as_deref_mut() {
            Some(ElseArm::If(nested)) => self.resolve_if(nested),
            Some(ElseArm::Block(b)) => self.resolve_block(b),
            None => {}
        }
    }

    fn resolve_block(&self, block: &mut Block) {
        for stmt in &mut block.stmts {
            self.resolve_stmt(stmt);
        }
    }

    /// Rewrites one expression. Non-sequence nodes just recurse.
    pub fn resolve_expr(&self, expr: &mut Expr) {
        match expr {
            Expr::OpSeq(_) => {
                let span = expr.span();
                let placeholder = Expr::Bool(BoolLit {
                    value: false,
                    span,
                    ty: None,
                });
                let Expr::OpSeq(seq) = std::mem::replace(expr, placeholder) else {
                    return;
                };
                if let Ok(tree) = self.resolve_sequence(seq) {
                    *expr = tree;
                }
            }
            Expr::Binary(e) => {
                self.resolve_expr(&mut e.lhs);
                self.resolve_expr(&mut e.rhs);
            }
            Expr::Unary(e) => self.resolve_expr(&mut e.operand),
            Expr::Call(e) => {
                self.resolve_expr(&mut e.callee);
                for arg in &mut e.args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Int(_) | Expr::Float(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Ident(_) => {}
        }
    }

    /// Step 1: fold prefix/postfix applications, leaving alternating
    /// operands and infix operators; then step 2: build the infix tree.
    fn resolve_sequence(&self, seq: OpSeqExpr) -> Result<Expr, ()> {
        let mut items = seq.items;
        for item in &mut items {
            if let OpSeqItem::Operand(operand) = item {
                self.resolve_expr(operand);
            }
        }

        let mut operands: Vec<Option<Expr>> = Vec::new();
        let mut infixes: Vec<InfixOp> = Vec::new();
        let mut iter = items.into_iter().peekable();

        loop {
            // Collect the prefix run.
            let mut prefixes: Vec<OpToken> = Vec::new();
            loop {
                let op = match iter.peek() {
                    Some(OpSeqItem::Operator(op)) => *op,
                    _ => break,
                };
                if self.table.has_operator(op.symbol, OpPosition::Prefix) {
                    prefixes.push(op);
                    iter.next();
                } else {
                    self.error_not_position(&op, OpPosition::Prefix);
                    return Err(());
                }
            }

            // Expect an operand.
            let mut operand = match iter.next() {
                Some(OpSeqItem::Operand(operand)) => operand,
                _ => {
                    let span = prefixes
                        .last()
                        .map(|op| op.span)
                        .or_else(|| infixes.last().map(|op| op.span))
                        .unwrap_or(seq.span);
                    self.handler
                        .error(Stage::Resolve, "expected an operand", span);
                    return Err(());
                }
            };

            // Wrap prefixes innermost-outward.
            for op in prefixes.into_iter().rev() {
                operand = Expr::Unary(UnaryExpr {
                    op: op.symbol,
                    position: OpPosition::Prefix,
                    operand: Box::new(operand),
                    span: op.span,
                    ty: None,
                });
            }

            // Greedily consume postfix operators. The first operator that
            // is not a valid postfix becomes the infix candidate, even if
            // it could also be read as infix.
            loop {
                let op = match iter.peek() {
                    Some(OpSeqItem::Operator(op)) => *op,
                    _ => break,
                };
                if !self.table.has_operator(op.symbol, OpPosition::Postfix) {
                    break;
                }
                iter.next();
                operand = Expr::Unary(UnaryExpr {
                    op: op.symbol,
                    position: OpPosition::Postfix,
                    operand: Box::new(operand),
                    span: op.span,
                    ty: None,
                });
            }

            operands.push(Some(operand));

            // Either the sequence ends or an infix operator follows.
            match iter.next() {
                None => break,
                Some(OpSeqItem::Operator(op)) => match self.table.infix_info(op.symbol) {
                    Some((prec, assoc)) => infixes.push(InfixOp {
                        symbol: op.symbol,
                        prec,
                        assoc,
                        span: op.span,
                    }),
                    None => {
                        self.error_not_position(&op, OpPosition::Infix);
                        return Err(());
                    }
                },
                Some(OpSeqItem::Operand(operand)) => {
                    // The parser never emits adjacent operands; guard the
                    // structural invariant anyway.
                    self.handler.error(
                        Stage::Resolve,
                        "expected an operator between operands",
                        operand.span(),
                    );
                    return Err(());
                }
            }
        }

        debug_assert_eq!(operands.len(), infixes.len() + 1);
        let hi = operands.len() - 1;
        self.build_range(&mut operands, &infixes, 0, hi)
    }

    /// Step 2: recursive precedence-directed split over
    /// `operands[lo..=hi]` joined by `infixes[lo..hi]`.
    fn build_range(
        &self,
        operands: &mut [Option<Expr>],
        infixes: &[InfixOp],
        lo: usize,
        hi: usize,
    ) -> Result<Expr, ()> {
        if lo == hi {
            return operands[lo].take().ok_or(());
        }

        let range = &infixes[lo..hi];
        let Some(min_prec) = range.iter().map(|op| op.prec).min() else {
            return Err(());
        };

        // Pick the split point among the lowest-precedence operators and
        // reject mixed associativity on the way.
        let mut split: Option<usize> = None;
        let mut base: Option<(Symbol, Assoc)> = None;
        for (i, op) in range.iter().enumerate() {
            if op.prec != min_prec {
                continue;
            }
            match base {
                None => {
                    base = Some((op.symbol, op.assoc));
                    split = Some(i);
                }
                Some((first_symbol, first_assoc)) => {
                    if first_assoc != op.assoc {
                        self.handler.error(
                            Stage::Resolve,
                            format!(
                                "operator `{}` mixes associativity with `{}` at precedence {}",
                                op.symbol, first_symbol, min_prec
                            ),
                            op.span,
                        );
                        return Err(());
                    }
                    // Left-associative: prefer the rightmost occurrence so
                    // the left subtree grows; right-associative keeps the
                    // leftmost.
                    if first_assoc != Assoc::Right {
                        split = Some(i);
                    }
                }
            }
        }
        let Some(rel) = split else {
            return Err(());
        };
        let at = lo + rel;
        let op = infixes[at];

        let lhs = self.build_range(operands, infixes, lo, at)?;
        let rhs = self.build_range(operands, infixes, at + 1, hi)?;
        Ok(Expr::Binary(BinaryExpr {
            op: op.symbol,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span: op.span,
            ty: None,
        }))
    }

    fn error_not_position(&self, op: &OpToken, position: OpPosition) {
        let message = if self.table.operator_declared(op.symbol) {
            format!("`{}` is not {} operator", op.symbol, article(position))
        } else {
            format!("unknown operator `{}`", op.symbol)
        };
        self.handler.error(Stage::Resolve, message, op.span);
    }
}

fn article(position: OpPosition) -> &'static str {
    match position {
        OpPosition::Prefix => "a prefix",
        OpPosition::Infix => "an infix",
        OpPosition::Postfix => "a postfix",
    }
}
