//! Type checker.
//!
//! Bottom-up inference over the resolved AST. Literals yield their obvious
//! types; identifiers look up a scope stack maintained by the checker
//! itself (mirroring traversal order, distinct from the symbol table's
//! scope tree); operators and calls select overloads by parameter-type
//! tuple. Every expression gets its inferred type written exactly once.
//!
//! Unknown identifiers are tolerated (their type stays empty) because an
//! expression may refer to a function or operator rather than a variable;
//! genuinely undefined names surface later, in code generation.

use lyrac_par::ast::{Block, ElseArm, Expr, IfStmt, OpPosition, Param, Stmt};
use lyrac_util::{FxHashMap, Handler, Stage, Symbol, Ty};

use crate::table::{FnSig, SymbolTable};

/// Type checker state.
pub struct TypeChecker<'a> {
    table: &'a SymbolTable,
    handler: &'a Handler,
    /// Innermost-last stack of name → type frames.
    scopes: Vec<FxHashMap<Symbol, Ty>>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(table: &'a SymbolTable, handler: &'a Handler) -> Self {
        Self {
            table,
            handler,
            scopes: Vec::new(),
        }
    }

    /// Checks and annotates the whole program.
    pub fn check_program(&mut self, stmts: &mut [Stmt]) {
        self.scopes.push(FxHashMap::default());
        for stmt in stmts {
            self.check_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn bind(&mut self, name: Symbol, ty: Ty) {
        if let Some(frame) = self.scopes.last_mut() {
            frame.insert(name, ty);
        }
    }

    fn lookup(&self, name: Symbol) -> Option<Ty> {
        self.scopes
            .iter()
            .rev()
            .find_map(|frame| frame.get(&name).copied())
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Let(s) => {
                let found = self.check_expr(&mut s.init);
                match s.declared_ty {
                    Some(declared) => {
                        if let Some(found) = found {
                            if found != declared {
                                self.handler.error(
                                    Stage::Types,
                                    format!(
                                        "`{}` is declared as `{}` but its initializer has type `{}`",
                                        s.name, declared, found
                                    ),
                                    s.init.span(),
                                );
                            }
                        }
                        self.bind(s.name, declared);
                    }
                    None => {
                        if let Some(found) = found {
                            self.bind(s.name, found);
                        }
                    }
                }
            }
            Stmt::Func(s) => {
                if let Some(body) = &mut s.body {
                    self.check_body(&s.params, body);
                }
            }
            Stmt::Operator(s) => {
                if let Some(body) = &mut s.body {
                    self.check_body(&s.params, body);
                }
            }
            Stmt::If(s) => self.check_if(s),
            Stmt::Return(s) => {
                if let Some(value) = &mut s.value {
                    self.check_expr(value);
                }
            }
            Stmt::While(s) => {
                self.check_condition(&mut s.cond, "while");
                self.check_block(&mut s.body);
            }
            Stmt::Expr(e) => {
                self.check_expr(e);
            }
            Stmt::Block(b) => self.check_block(b),
        }
    }

    fn check_if(&mut self, s: &mut IfStmt) {
        self.check_condition(&mut s.cond, "if");
        self.check_block(&mut s.then_block);
        match s.else_arm.as_deref_mut() {
            Some(ElseArm::If(nested)) => self.check_if(nested),
            Some(ElseArm::Block(b)) => self.check_block(b),
            None => {}
        }
    }

    fn check_condition(&mut self, cond: &mut Expr, what: &str) {
        if let Some(ty) = self.check_expr(cond) {
            if ty != Ty::Bool {
                self.handler.error(
                    Stage::Types,
                    format!("`{}` condition must be `bool`, found `{}`", what, ty),
                    cond.span(),
                );
            }
        }
    }

    fn check_body(&mut self, params: &[Param], body: &mut Block) {
        self.scopes.push(FxHashMap::default());
        for param in params {
            if let Some(ty) = param.ty {
                self.bind(param.name, ty);
            }
        }
        for stmt in &mut body.stmts {
            self.check_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn check_block(&mut self, block: &mut Block) {
        self.scopes.push(FxHashMap::default());
        for stmt in &mut block.stmts {
            self.check_stmt(stmt);
        }
        self.scopes.pop();
    }

    /// Infers and records the type of one expression.
    fn check_expr(&mut self, expr: &mut Expr) -> Option<Ty> {
        let ty = match expr {
            Expr::Int(_) => Some(Ty::I32),
            Expr::Float(_) => Some(Ty::F64),
            Expr::Str(_) => Some(Ty::Str),
            Expr::Bool(_) => Some(Ty::Bool),
            Expr::Ident(e) => self.lookup(e.name),
            Expr::Binary(e) => {
                let lhs = self.check_expr(&mut e.lhs);
                let rhs = self.check_expr(&mut e.rhs);
                self.select_operator(e.op, OpPosition::Infix, &[lhs, rhs], e.span)
            }
            Expr::Unary(e) => {
                let position = e.position;
                let operand = self.check_expr(&mut e.operand);
                self.select_operator(e.op, position, &[operand], e.span)
            }
            Expr::Call(e) => {
                let arg_tys: Vec<Option<Ty>> =
                    e.args.iter_mut().map(|arg| self.check_expr(arg)).collect();
                let Expr::Ident(callee) = e.callee.as_ref() else {
                    self.handler.error(
                        Stage::Types,
                        "call target must be a function name",
                        e.callee.span(),
                    );
                    return None;
                };
                let overloads = self.table.functions_named(callee.name);
                if overloads.is_empty() {
                    self.handler.error(
                        Stage::Types,
                        format!("unknown function `{}`", callee.name),
                        callee.span,
                    );
                    None
                } else {
                    Some(best_overload(overloads, &arg_tys).ret)
                }
            }
            // The resolver eliminates sequences before checking; an
            // unresolved one means an earlier pass already failed.
            Expr::OpSeq(_) => None,
        };
        if let Some(ty) = ty {
            expr.set_ty(ty);
        }
        ty
    }

    /// Selects an operator overload by exact parameter-type match. With
    /// partially unknown operands the first overload's return type is
    /// used; a full mismatch with known types is an error.
    fn select_operator(
        &self,
        symbol: Symbol,
        position: OpPosition,
        operands: &[Option<Ty>],
        span: lyrac_util::Span,
    ) -> Option<Ty> {
        let overloads = self.table.operator_overloads(symbol, position);
        if overloads.is_empty() {
            // The resolver already rejected undeclared operators.
            return None;
        }
        let known: Option<Vec<Ty>> = operands.iter().copied().collect();
        match known {
            Some(tys) => {
                for sig in overloads {
                    if sig.params == tys {
                        return Some(sig.ret);
                    }
                }
                let rendered = tys
                    .iter()
                    .map(|t| format!("`{}`", t))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.handler.error(
                    Stage::Types,
                    format!(
                        "no overload of {} `{}` matches operand types ({})",
                        position.as_str(),
                        symbol,
                        rendered
                    ),
                    span,
                );
                None
            }
            None => overloads.first().map(|sig| sig.ret),
        }
    }
}

/// Picks the function overload whose parameters best match: exact types
/// first, then matching arity, then the first declaration.
fn best_overload<'s>(overloads: &'s [FnSig], args: &[Option<Ty>]) -> &'s FnSig {
    let known: Option<Vec<Ty>> = args.iter().copied().collect();
    if let Some(tys) = known {
        if let Some(sig) = overloads.iter().find(|sig| sig.params == tys) {
            return sig;
        }
    }
    overloads
        .iter()
        .find(|sig| sig.params.len() == args.len())
        .unwrap_or(&overloads[0])
}
