//! AST dumper.
//!
//! One function switching on the node tag, writing an indented tree. Used
//! by `--parse` (unresolved AST) and `--dump-ast` (resolved AST); the same
//! printer serves both since resolution only changes which variants occur.

use std::fmt::Write as _;

use crate::ast::{Block, ElseArm, Expr, OpSeqItem, Param, Stmt};

/// Renders a statement list as an indented tree.
pub fn dump_program(stmts: &[Stmt]) -> String {
    let mut out = String::new();
    for stmt in stmts {
        write_stmt(&mut out, stmt, 0);
    }
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_params(out: &mut String, params: &[Param]) {
    out.push('(');
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}", param.name);
        if let Some(ty) = param.ty {
            let _ = write!(out, ": {}", ty);
        }
    }
    out.push(')');
}

fn write_block(out: &mut String, block: &Block, depth: usize) {
    for stmt in &block.stmts {
        write_stmt(out, stmt, depth);
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    indent(out, depth);
    match stmt {
        Stmt::Let(s) => {
            let _ = write!(out, "let {}", s.name);
            if let Some(ty) = s.declared_ty {
                let _ = write!(out, ": {}", ty);
            }
            out.push('\n');
            write_expr(out, &s.init, depth + 1);
        }
        Stmt::Func(s) => {
            let _ = write!(out, "func {}", s.name);
            write_params(out, &s.params);
            if let Some(ret) = s.ret {
                let _ = write!(out, ": {}", ret);
            }
            match &s.body {
                Some(body) => {
                    out.push('\n');
                    write_block(out, body, depth + 1);
                }
                None => out.push_str(" extern\n"),
            }
        }
        Stmt::Operator(s) => {
            let _ = write!(out, "operator {} {}", s.position.as_str(), s.symbol);
            write_params(out, &s.params);
            let _ = write!(out, ": {}", s.ret);
            if s.position == crate::ast::OpPosition::Infix {
                let _ = write!(out, " prec {}", s.prec);
                let _ = write!(
                    out,
                    " {}",
                    match s.assoc {
                        crate::ast::Assoc::Right => "assoc_right",
                        _ => "assoc_left",
                    }
                );
            }
            match &s.body {
                Some(body) => {
                    out.push('\n');
                    write_block(out, body, depth + 1);
                }
                None => out.push_str(" extern\n"),
            }
        }
        Stmt::If(s) => {
            out.push_str("if\n");
            write_expr(out, &s.cond, depth + 1);
            indent(out, depth);
            out.push_str("then\n");
            write_block(out, &s.then_block, depth + 1);
            if let Some(arm) = &s.else_arm {
                indent(out, depth);
                out.push_str("else\n");
                match arm.as_ref() {
                    ElseArm::If(nested) => write_stmt(out, &Stmt::If(nested.clone()), depth + 1),
                    ElseArm::Block(block) => write_block(out, block, depth + 1),
                }
            }
        }
        Stmt::Return(s) => {
            out.push_str("return\n");
            if let Some(value) = &s.value {
                write_expr(out, value, depth + 1);
            }
        }
        Stmt::While(s) => {
            out.push_str("while\n");
            write_expr(out, &s.cond, depth + 1);
            indent(out, depth);
            out.push_str("do\n");
            write_block(out, &s.body, depth + 1);
        }
        Stmt::Expr(e) => {
            out.push_str("expr\n");
            write_expr(out, e, depth + 1);
        }
        Stmt::Block(b) => {
            out.push_str("block\n");
            write_block(out, b, depth + 1);
        }
    }
}

fn write_expr(out: &mut String, expr: &Expr, depth: usize) {
    indent(out, depth);
    let ty_suffix = |out: &mut String| {
        if let Some(ty) = expr.ty() {
            let _ = write!(out, " : {}", ty);
        }
    };
    match expr {
        Expr::Int(lit) => {
            let _ = write!(out, "int {}", lit.text);
            ty_suffix(out);
            out.push('\n');
        }
        Expr::Float(lit) => {
            let _ = write!(out, "float {}", lit.text);
            ty_suffix(out);
            out.push('\n');
        }
        Expr::Str(lit) => {
            let _ = write!(out, "string {:?}", lit.text.as_str());
            ty_suffix(out);
            out.push('\n');
        }
        Expr::Bool(lit) => {
            let _ = write!(out, "bool {}", lit.value);
            ty_suffix(out);
            out.push('\n');
        }
        Expr::Ident(e) => {
            let _ = write!(out, "ident {}", e.name);
            ty_suffix(out);
            out.push('\n');
        }
        Expr::Binary(e) => {
            let _ = write!(out, "binary {}", e.op);
            ty_suffix(out);
            out.push('\n');
            write_expr(out, &e.lhs, depth + 1);
            write_expr(out, &e.rhs, depth + 1);
        }
        Expr::Unary(e) => {
            let _ = write!(out, "unary {} {}", e.position.as_str(), e.op);
            ty_suffix(out);
            out.push('\n');
            write_expr(out, &e.operand, depth + 1);
        }
        Expr::OpSeq(e) => {
            out.push_str("opseq\n");
            for item in &e.items {
                match item {
                    OpSeqItem::Operand(operand) => write_expr(out, operand, depth + 1),
                    OpSeqItem::Operator(op) => {
                        indent(out, depth + 1);
                        let _ = write!(out, "op {}", op.symbol);
                        out.push('\n');
                    }
                }
            }
        }
        Expr::Call(e) => {
            out.push_str("call");
            ty_suffix(out);
            out.push('\n');
            write_expr(out, &e.callee, depth + 1);
            for arg in &e.args {
                write_expr(out, arg, depth + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use lyrac_lex::Lexer;
    use lyrac_util::Handler;

    fn dump(source: &str) -> String {
        let handler = Handler::new();
        let tokens = Lexer::new(source, &handler).tokenize();
        let stmts = Parser::new(tokens, &handler).parse_program();
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        dump_program(&stmts)
    }

    #[test]
    fn test_dump_let_sequence() {
        let out = dump("let x = 1 + 2;");
        assert!(out.starts_with("let x\n"));
        assert!(out.contains("opseq\n"));
        assert!(out.contains("op +"));
        assert!(out.contains("int 1"));
    }

    #[test]
    fn test_dump_extern_func() {
        let out = dump("func exit(code: i32): void;");
        assert_eq!(out, "func exit(code: i32): void extern\n");
    }

    #[test]
    fn test_dump_if_else() {
        let out = dump("if true { } else { exit(0); }");
        assert!(out.contains("if\n"));
        assert!(out.contains("then\n"));
        assert!(out.contains("else\n"));
        assert!(out.contains("call\n"));
    }
}
