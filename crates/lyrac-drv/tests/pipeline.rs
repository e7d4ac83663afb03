//! Pipeline integration tests driving the library entry point.

use std::path::PathBuf;

use lyrac_drv::{run, Cli, DriverError};
use tempfile::TempDir;

fn cli(input: PathBuf) -> Cli {
    Cli {
        input,
        lex: false,
        parse: false,
        emit_llvm: false,
        compile: false,
        run: false,
        output: None,
        dump_ast: false,
        dump_symbols: false,
        hide_prelude: false,
        verbose: false,
    }
}

fn write_source(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).expect("write source");
    path
}

#[test]
fn test_missing_input_is_a_system_failure() {
    let err = run(&cli(PathBuf::from("no/such/file.lyr"))).expect_err("must fail");
    assert!(matches!(err, DriverError::Io { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_lex_mode_reports_errors_with_exit_one() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "bad.lyr", "let s = \"a\\q\";");
    let mut args = cli(path);
    args.lex = true;
    let err = run(&args).expect_err("lexical error");
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_parse_mode_succeeds_on_well_formed_input() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "ok.lyr", "let x = 1 + 2 * 3;\n");
    let mut args = cli(path);
    args.parse = true;
    assert_eq!(run(&args).expect("parse mode"), 0);
}

#[test]
fn test_syntax_error_exits_one() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "bad.lyr", "let x = 1\nlet y = 2;\n");
    let err = run(&cli(path)).expect_err("syntax error");
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_type_error_exits_one() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "bad.lyr", "let x: i32 = 3.14;\n");
    let err = run(&cli(path)).expect_err("type error");
    assert!(matches!(err, DriverError::CompileFailed));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_dump_symbols_mode_runs_front_end_only() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "ok.lyr", "func f(a: i32): i32 { return a; }\n");
    let mut args = cli(path);
    args.dump_symbols = true;
    args.hide_prelude = true;
    assert_eq!(run(&args).expect("dump"), 0);
}

#[test]
fn test_mixed_associativity_program_fails_in_resolver() {
    let dir = TempDir::new().expect("tempdir");
    let source = "\
operator infix +<(a: i32, b: i32): i32 prec 90 assoc_left;
operator infix +>(a: i32, b: i32): i32 prec 90 assoc_right;
func f(a: i32, b: i32, c: i32): i32 { return a +< b +> c; }
";
    let path = write_source(&dir, "mixed.lyr", source);
    let err = run(&cli(path)).expect_err("resolver error");
    assert_eq!(err.exit_code(), 1);
}
