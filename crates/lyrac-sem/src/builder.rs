//! Symbol-table builder.
//!
//! A recursive AST traversal that populates the scope tree and the global
//! overload tables. The builder runs twice: first over the prelude (every
//! inserted symbol tagged [`Origin::Prelude`]), then over the user AST.
//! Function and operator declarations are collected at global scope only;
//! nested declarations are rejected.

use lyrac_par::ast::{ElseArm, FuncDecl, IfStmt, OperatorDecl, Param, Stmt};
use lyrac_util::{Handler, Stage, Ty};

use crate::table::{FnSig, OpSig, Origin, ScopeId, ScopeKind, SymbolTable, VarBinding};

/// Builds the hierarchical symbol table for one compilation unit.
pub struct SymbolTableBuilder<'a> {
    table: &'a mut SymbolTable,
    handler: &'a Handler,
    origin: Origin,
    current: ScopeId,
}

impl<'a> SymbolTableBuilder<'a> {
    pub fn new(table: &'a mut SymbolTable, handler: &'a Handler, origin: Origin) -> Self {
        let current = table.root;
        Self {
            table,
            handler,
            origin,
            current,
        }
    }

    /// Walks a statement list, collecting declarations.
    pub fn build(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(s) => {
                let binding = VarBinding {
                    name: s.name,
                    ty: s.declared_ty,
                    span: s.name_span,
                    origin: self.origin,
                };
                if self.table.bind_var(self.current, binding).is_err() {
                    self.handler.error(
                        Stage::Symbols,
                        format!("`{}` is already defined in this scope", s.name),
                        s.name_span,
                    );
                }
            }
            Stmt::Func(s) => self.walk_func(s),
            Stmt::Operator(s) => self.walk_operator(s),
            Stmt::If(s) => self.walk_if(s),
            Stmt::While(s) => self.walk_block(&s.body.stmts, s.body.span.line, s.body.span.column),
            Stmt::Block(b) => self.walk_block(&b.stmts, b.span.line, b.span.column),
            Stmt::Return(_) | Stmt::Expr(_) => {}
        }
    }

    fn walk_if(&mut self, s: &IfStmt) {
        self.walk_block(
            &s.then_block.stmts,
            s.then_block.span.line,
            s.then_block.span.column,
        );
        match s.else_arm.as_deref() {
            Some(ElseArm::If(nested)) => self.walk_if(nested),
            Some(ElseArm::Block(b)) => self.walk_block(&b.stmts, b.span.line, b.span.column),
            None => {}
        }
    }

    fn walk_block(&mut self, stmts: &[Stmt], line: u32, column: u32) {
        let scope = self.table.push_scope(
            self.current,
            ScopeKind::Block,
            format!("block at {}:{}", line, column),
        );
        let saved = self.current;
        self.current = scope;
        for stmt in stmts {
            self.walk_stmt(stmt);
        }
        self.current = saved;
    }

    fn walk_func(&mut self, decl: &FuncDecl) {
        if self.current != self.table.root {
            self.handler.error(
                Stage::Symbols,
                "nested function declarations are not supported (closures are unimplemented)",
                decl.span,
            );
            return;
        }
        let params = self.require_annotations(&decl.params);
        self.table.add_function(FnSig {
            name: decl.name,
            params,
            ret: decl.ret.unwrap_or(Ty::Void),
            declaration_only: decl.body.is_none(),
            origin: self.origin,
            span: decl.span,
        });
        if let Some(body) = &decl.body {
            self.walk_body(
                format!("function {}", decl.name),
                &decl.params,
                &body.stmts,
            );
        }
    }

    fn walk_operator(&mut self, decl: &OperatorDecl) {
        if self.current != self.table.root {
            self.handler.error(
                Stage::Symbols,
                "nested operator declarations are not supported (closures are unimplemented)",
                decl.span,
            );
            return;
        }
        let params = self.require_annotations(&decl.params);
        self.table.add_operator(OpSig {
            symbol: decl.symbol,
            position: decl.position,
            params,
            ret: decl.ret,
            prec: decl.prec,
            assoc: decl.assoc,
            declaration_only: decl.body.is_none(),
            origin: self.origin,
            span: decl.span,
        });
        if let Some(body) = &decl.body {
            self.walk_body(
                format!("operator {}", decl.symbol),
                &decl.params,
                &body.stmts,
            );
        }
    }

    /// Opens a function scope, inserts the parameters, and walks the body.
    fn walk_body(&mut self, description: String, params: &[Param], stmts: &[Stmt]) {
        let scope = self
            .table
            .push_scope(self.current, ScopeKind::Function, description);
        let saved = self.current;
        self.current = scope;
        for param in params {
            let binding = VarBinding {
                name: param.name,
                ty: param.ty,
                span: param.span,
                origin: self.origin,
            };
            if self.table.bind_var(scope, binding).is_err() {
                self.handler.error(
                    Stage::Symbols,
                    format!("`{}` is already defined in this scope", param.name),
                    param.span,
                );
            }
        }
        for stmt in stmts {
            self.walk_stmt(stmt);
        }
        self.current = saved;
    }

    /// Parameter annotations are mandatory; missing ones are reported at
    /// the parameter's location and replaced with `void` so the signature
    /// keeps its arity.
    fn require_annotations(&self, params: &[Param]) -> Vec<Ty> {
        params
            .iter()
            .map(|param| match param.ty {
                Some(ty) => ty,
                None => {
                    self.handler.error(
                        Stage::Symbols,
                        format!(
                            "parameter `{}` needs a type annotation (generics are unimplemented)",
                            param.name
                        ),
                        param.span,
                    );
                    Ty::Void
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyrac_lex::Lexer;
    use lyrac_par::Parser;

    fn build(source: &str) -> (SymbolTable, Handler) {
        let handler = Handler::new();
        let tokens = Lexer::new(source, &handler).tokenize();
        let stmts = Parser::new(tokens, &handler).parse_program();
        assert!(!handler.has_errors(), "parse: {:?}", handler.diagnostics());
        let mut table = SymbolTable::new();
        SymbolTableBuilder::new(&mut table, &handler, Origin::User).build(&stmts);
        (table, handler)
    }

    #[test]
    fn test_global_function_collected() {
        let (table, handler) = build("func add(a: i32, b: i32): i32 { return a; }");
        assert!(!handler.has_errors());
        let sigs = table.functions_named(lyrac_util::Symbol::intern("add"));
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].params, vec![Ty::I32, Ty::I32]);
        assert_eq!(sigs[0].ret, Ty::I32);
        assert!(!sigs[0].declaration_only);
    }

    #[test]
    fn test_nested_function_rejected() {
        let (_, handler) = build("func outer(): void { func inner(): void { } }");
        assert!(handler.has_errors());
        assert!(handler.diagnostics()[0].message.contains("nested function"));
    }

    #[test]
    fn test_missing_parameter_annotation() {
        let (_, handler) = build("func f(a): void { }");
        assert!(handler.has_errors());
        let diag = &handler.diagnostics()[0];
        assert!(diag.message.contains("type annotation"));
        // Points at the parameter.
        assert_eq!(diag.span.column, 8);
    }

    #[test]
    fn test_duplicate_let_in_one_scope() {
        let (_, handler) = build("func f(): void { let x = 1; let x = 2; }");
        assert!(handler.has_errors());
        assert!(handler.diagnostics()[0].message.contains("already defined"));
    }

    #[test]
    fn test_shadowing_in_inner_block_allowed() {
        let (_, handler) = build("func f(): void { let x = 1; { let x = 2; } }");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_scope_tree_shape() {
        let (table, _) = build("func f(n: i32): void { if n < 1 { } while n < 2 { } }");
        let root = &table.scopes[table.root];
        assert_eq!(root.children.len(), 1);
        let func_scope = &table.scopes[root.children[0]];
        assert_eq!(func_scope.description, "function f");
        // if-then block and while body, in encounter order.
        assert_eq!(func_scope.children.len(), 2);
        assert!(table.scopes[func_scope.children[0]]
            .description
            .starts_with("block at"));
    }

    #[test]
    fn test_declaration_only_function() {
        let (table, handler) = build("func exit(code: i32): void;");
        assert!(!handler.has_errors());
        let sigs = table.functions_named(lyrac_util::Symbol::intern("exit"));
        assert!(sigs[0].declaration_only);
    }

    #[test]
    fn test_overload_by_type_tolerated() {
        let (table, handler) = build(
            "operator infix ***(a: i32, b: i32): i32 prec 85;\n\
             operator infix ***(a: f64, b: f64): f64 prec 85;",
        );
        assert!(!handler.has_errors());
        let overloads = table.operator_overloads(
            lyrac_util::Symbol::intern("***"),
            lyrac_par::ast::OpPosition::Infix,
        );
        assert_eq!(overloads.len(), 2);
    }
}
