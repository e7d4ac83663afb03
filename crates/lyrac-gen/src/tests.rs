//! IR-level tests: run the whole front end over small programs and
//! inspect the printed module.

use inkwell::context::Context;
use lyrac_lex::Lexer;
use lyrac_par::Parser;
use lyrac_sem::{
    load_prelude, OperatorResolver, Origin, SymbolTable, SymbolTableBuilder, TypeChecker,
};
use lyrac_util::Handler;

use crate::CodeGen;

/// Front end + codegen; panics on front-end errors, returns the IR and
/// the handler so tests can inspect codegen diagnostics.
fn lower(source: &str) -> (String, Handler) {
    let handler = Handler::new();
    let mut table = SymbolTable::new();
    load_prelude(&mut table, &handler);
    let tokens = Lexer::new(source, &handler).tokenize();
    let mut stmts = Parser::new(tokens, &handler).parse_program();
    SymbolTableBuilder::new(&mut table, &handler, Origin::User).build(&stmts);
    OperatorResolver::new(&table, &handler).resolve_program(&mut stmts);
    TypeChecker::new(&table, &handler).check_program(&mut stmts);
    assert!(
        !handler.has_errors(),
        "front-end: {:?}",
        handler.diagnostics()
    );

    let context = Context::create();
    let mut gen = CodeGen::new(&context, "test", &table, &handler);
    let result = gen.compile(&stmts);
    assert!(result.is_ok(), "fatal codegen error: {:?}", result.err());
    (gen.print_ir(), handler)
}

fn lower_clean(source: &str) -> String {
    let (ir, handler) = lower(source);
    assert!(!handler.has_errors(), "codegen: {:?}", handler.diagnostics());
    ir
}

#[test]
fn test_constant_program_calls_exit() {
    let ir = lower_clean("exit(42);");
    assert!(ir.contains("__lyra_entry"));
    assert!(ir.contains("call void @exit(i32 42)"));
    // The entry falls off the end with status zero and main wraps it.
    assert!(ir.contains("ret i32 0"));
    assert!(ir.contains("define i32 @main()"));
}

#[test]
fn test_recursive_function_verifies() {
    let ir = lower_clean(
        "func fib(n: i32): i32 { if n <= 1 { return n; } return fib(n - 1) + fib(n - 2); }\n\
         exit(fib(10));",
    );
    assert!(ir.contains("define i32 @fib(i32"));
    assert!(ir.contains("call i32 @fib"));
}

#[test]
fn test_builtin_arithmetic_is_native_not_a_call() {
    let ir = lower_clean("func f(a: i32, b: i32): i32 { return a + b; }");
    assert!(ir.contains("add "));
    for line in ir.lines() {
        if line.contains("call") {
            assert!(
                !line.contains("+$i32$i32"),
                "built-in `+` must not lower to a mangled call: {}",
                line
            );
        }
    }
}

#[test]
fn test_signed_division_and_comparison_predicates() {
    let ir = lower_clean("func f(a: i32, b: i32): bool { let q = a / b; return q < b; }");
    assert!(ir.contains("sdiv"));
    assert!(ir.contains("icmp slt"));
}

#[test]
fn test_float_compare_is_ordered_and_pow_is_intrinsic() {
    let ir = lower_clean(
        "func f(a: f64, b: f64): bool { let p = a ** b; return p == b; }",
    );
    assert!(ir.contains("llvm.pow"));
    assert!(ir.contains("fcmp oeq"));
}

#[test]
fn test_user_operator_overloads_get_distinct_mangled_symbols() {
    let ir = lower_clean(
        "operator infix ***(a: i32, b: i32): i32 prec 85 { return a * b; }\n\
         operator infix ***(a: f64, b: f64): f64 prec 85 { return a * b; }\n\
         let x = 3 *** 4;\n\
         let y = 2.0 *** 3.0;",
    );
    assert!(ir.contains("***$i32$i32"));
    assert!(ir.contains("***$f64$f64"));
    let call_lines: Vec<&str> = ir.lines().filter(|l| l.contains("call")).collect();
    assert!(call_lines.iter().any(|l| l.contains("***$i32$i32")));
    assert!(call_lines.iter().any(|l| l.contains("***$f64$f64")));
}

#[test]
fn test_variables_live_in_stack_slots() {
    let ir = lower_clean("func f(n: i32): i32 { let x = n; return x; }");
    assert!(ir.contains("alloca i32"));
    assert!(ir.contains("store i32"));
    assert!(ir.contains("load i32"));
}

#[test]
fn test_compound_assignment_stores_back() {
    let ir = lower_clean("func f(): i32 { let x = 1; x += 2; return x; }");
    // load slot, add, store back.
    assert!(ir.contains("add "));
    let stores = ir.matches("store i32").count();
    assert!(stores >= 2, "expected init store plus compound store:\n{}", ir);
}

#[test]
fn test_short_circuit_and_uses_control_flow() {
    let ir = lower_clean(
        "func f(a: bool, b: bool): bool { return a && b; }",
    );
    assert!(ir.contains("and.rhs"));
    assert!(ir.contains("phi i1"));
}

#[test]
fn test_short_circuit_or_uses_control_flow() {
    let ir = lower_clean("func f(a: bool, b: bool): bool { return a || b; }");
    assert!(ir.contains("or.rhs"));
    assert!(ir.contains("phi i1"));
}

#[test]
fn test_while_loop_block_structure() {
    let ir = lower_clean(
        "func f(n: i32): i32 { let i = 0; while i < n { i += 1; } return i; }",
    );
    assert!(ir.contains("while.cond"));
    assert!(ir.contains("while.body"));
    assert!(ir.contains("while.end"));
}

#[test]
fn test_branch_ending_in_return_gets_no_fallthrough() {
    // Both arms return; the merge block must still verify.
    let ir = lower_clean(
        "func f(c: bool): i32 { if c { return 1; } else { return 2; } }",
    );
    assert!(ir.contains("if.then"));
    assert!(ir.contains("if.else"));
}

#[test]
fn test_string_literal_becomes_global_constant() {
    let ir = lower_clean("puts(\"hello\");");
    assert!(ir.contains(".str.0"));
    assert!(ir.contains("hello"));
}

#[test]
fn test_undefined_variable_is_a_codegen_diagnostic() {
    let (_, handler) = lower("exit(zzz);");
    assert!(handler.has_errors());
    assert!(handler.diagnostics()[0]
        .message
        .contains("undefined variable `zzz`"));
}

#[test]
fn test_assignment_to_non_identifier_rejected() {
    let (_, handler) = lower("func f(): void { 1 = 2; }");
    assert!(handler.has_errors());
    assert!(handler.diagnostics()[0]
        .message
        .contains("assignment target"));
}

#[test]
fn test_prelude_functions_are_declarations_only() {
    let ir = lower_clean("exit(0);");
    assert!(ir.contains("declare void @exit(i32)"));
    assert!(ir.contains("declare i32 @putchar(i32)"));
}
