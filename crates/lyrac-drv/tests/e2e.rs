//! End-to-end tests against the `lyrac` binary.
//!
//! The compile-and-run scenarios need a working system linker; they skip
//! themselves when `cc` is unavailable.

use std::path::PathBuf;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn lyrac() -> Command {
    Command::new(PathBuf::from(env!("CARGO_BIN_EXE_lyrac")))
}

fn write_source(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).expect("write source");
    path
}

fn have_linker() -> bool {
    StdCommand::new("cc")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[test]
fn test_help_mentions_usage() {
    lyrac()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage").or(predicate::str::contains("lyrac")));
}

#[test]
fn test_lex_dump() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "t.lyr", "let x = 42; # answer\n");
    lyrac()
        .arg(&path)
        .arg("--lex")
        .assert()
        .success()
        .stdout(predicate::str::contains("keyword let"))
        .stdout(predicate::str::contains("int 42"))
        .stdout(predicate::str::contains("comment # answer"));
}

#[test]
fn test_parse_dump_shows_flat_sequence() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "t.lyr", "let x = 1 + 2 * 3;\n");
    lyrac()
        .arg(&path)
        .arg("--parse")
        .assert()
        .success()
        .stdout(predicate::str::contains("opseq"))
        .stdout(predicate::str::contains("op +"));
}

#[test]
fn test_dump_ast_shows_resolved_tree() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "t.lyr", "let x = 1 + 2 * 3;\n");
    lyrac()
        .arg(&path)
        .arg("--dump-ast")
        .assert()
        .success()
        .stdout(predicate::str::contains("binary +"))
        .stdout(predicate::str::contains("binary *"))
        .stdout(predicate::str::contains("opseq").not());
}

#[test]
fn test_dump_symbols_hide_prelude() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "t.lyr", "func double(n: i32): i32 { return n * 2; }\n");
    lyrac()
        .arg(&path)
        .arg("--dump-symbols")
        .arg("--hide-prelude")
        .assert()
        .success()
        .stdout(predicate::str::contains("double(i32): i32"))
        .stdout(predicate::str::contains("function double"))
        .stdout(predicate::str::contains("exit").not());
}

#[test]
fn test_emit_llvm_for_constant_program() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "t.lyr", "exit(42);\n");
    lyrac()
        .arg(&path)
        .arg("--emit-llvm")
        .assert()
        .success()
        .stdout(predicate::str::contains("__lyra_entry"))
        .stdout(predicate::str::contains("call void @exit(i32 42)"));
}

#[test]
fn test_type_error_renders_diagnostic_and_exits_one() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "t.lyr", "func f(): void { let x: i32 = 3.14; }\n");
    lyrac()
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("type error at"))
        .stderr(predicate::str::contains("i32"))
        .stderr(predicate::str::contains("f64"));
}

#[test]
fn test_syntax_error_points_at_previous_token_end() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "t.lyr", "let x = 1\nlet y = 2;\n");
    lyrac()
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(":1:10"));
}

#[test]
fn test_compile_emits_object_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "t.lyr", "exit(0);\n");
    let object = dir.path().join("t.o");
    lyrac()
        .arg(&path)
        .arg("--compile")
        .arg("-o")
        .arg(&object)
        .assert()
        .success();
    assert!(object.exists(), "object file should exist");
}

#[test]
fn test_run_constant_program_exits_42() {
    if !have_linker() {
        eprintln!("skipping: no system linker");
        return;
    }
    let dir = TempDir::new().expect("tempdir");
    let path = write_source(&dir, "answer.lyr", "exit(42);\n");
    let exe = dir.path().join("answer");
    lyrac()
        .arg(&path)
        .arg("--run")
        .arg("-o")
        .arg(&exe)
        .assert()
        .code(42);
}

#[test]
fn test_run_recursive_fib_exits_55() {
    if !have_linker() {
        eprintln!("skipping: no system linker");
        return;
    }
    let dir = TempDir::new().expect("tempdir");
    let source = "\
func fib(n: i32): i32 {
    if n <= 1 {
        return n;
    }
    return fib(n - 1) + fib(n - 2);
}
exit(fib(10));
";
    let path = write_source(&dir, "fib.lyr", source);
    let exe = dir.path().join("fib");
    lyrac()
        .arg(&path)
        .arg("--run")
        .arg("-o")
        .arg(&exe)
        .assert()
        .code(55);
}

#[test]
fn test_run_user_operator_program() {
    if !have_linker() {
        eprintln!("skipping: no system linker");
        return;
    }
    let dir = TempDir::new().expect("tempdir");
    let source = "\
operator infix ***(a: i32, b: i32): i32 prec 85 {
    return a * b + 1;
}
exit(3 *** 4);
";
    let path = write_source(&dir, "ops.lyr", source);
    let exe = dir.path().join("ops");
    lyrac()
        .arg(&path)
        .arg("--run")
        .arg("-o")
        .arg(&exe)
        .assert()
        .code(13);
}

#[test]
fn test_run_while_loop_program() {
    if !have_linker() {
        eprintln!("skipping: no system linker");
        return;
    }
    let dir = TempDir::new().expect("tempdir");
    let source = "\
let total = 0;
let i = 1;
while i <= 4 {
    total += i;
    i += 1;
}
exit(total);
";
    let path = write_source(&dir, "loop.lyr", source);
    let exe = dir.path().join("loop");
    lyrac()
        .arg(&path)
        .arg("--run")
        .arg("-o")
        .arg(&exe)
        .assert()
        .code(10);
}
