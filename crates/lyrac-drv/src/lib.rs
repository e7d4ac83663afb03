//! lyrac-drv - Compiler Driver
//!
//! Entry point and orchestrator for the pipeline:
//!
//! ```text
//! source → lex → parse → prelude + symbols → resolve → check → codegen
//!        → object file → executable
//! ```
//!
//! Each phase gate renders accumulated diagnostics and stops on errors.
//! Exit codes: 0 on success, 1 on any user-visible compile error, 2 for
//! system failures (missing file, missing linker, internal errors).
//! `--run` propagates the child process's exit code.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::anyhow;
use clap::Parser as ClapParser;
use inkwell::context::Context;
use lyrac_gen::{CodeGen, CodeGenError, Linker};
use lyrac_lex::Lexer;
use lyrac_par::dump::dump_program;
use lyrac_par::Parser;
use lyrac_sem::{
    load_prelude, OperatorResolver, Origin, SymbolTable, SymbolTableBuilder, TypeChecker,
    PRELUDE_PATH, PRELUDE_SOURCE,
};
use lyrac_util::{diagnostic, Handler};
use thiserror::Error;

/// Command-line surface of `lyrac`.
#[derive(ClapParser, Debug)]
#[command(name = "lyrac")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiler for the Lyra language", long_about = None)]
pub struct Cli {
    /// Input source file
    pub input: PathBuf,

    /// Print tokens and exit
    #[arg(long)]
    pub lex: bool,

    /// Print the unresolved AST and exit
    #[arg(long)]
    pub parse: bool,

    /// Print LLVM IR to stdout
    #[arg(long)]
    pub emit_llvm: bool,

    /// Emit an object file instead of an executable
    #[arg(long)]
    pub compile: bool,

    /// Compile, link, and run; the child's exit code is propagated
    #[arg(long)]
    pub run: bool,

    /// Output path (object file for --compile, executable otherwise)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the resolved AST
    #[arg(long)]
    pub dump_ast: bool,

    /// Print the hierarchical symbol table
    #[arg(long)]
    pub dump_symbols: bool,

    /// Omit prelude-origin symbols from --dump-symbols
    #[arg(long)]
    pub hide_prelude: bool,

    /// Print phase progress to stderr
    #[arg(long)]
    pub verbose: bool,
}

/// Driver failure modes, mapped onto process exit codes.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Diagnostics were already rendered to stderr.
    #[error("compilation failed")]
    CompileFailed,

    #[error(transparent)]
    System(#[from] anyhow::Error),
}

impl DriverError {
    /// 1 for user-visible compile errors, 2 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::CompileFailed => 1,
            _ => 2,
        }
    }
}

fn render_all(handler: &Handler, path: &str, source: &str) {
    for diag in handler.diagnostics() {
        eprintln!("{}", diagnostic::render(&diag, path, source));
    }
}

/// Renders diagnostics and fails the pipeline if the phase errored.
fn gate(handler: &Handler, path: &str, source: &str) -> Result<(), DriverError> {
    if handler.has_errors() {
        render_all(handler, path, source);
        return Err(DriverError::CompileFailed);
    }
    Ok(())
}

fn into_system(err: CodeGenError) -> DriverError {
    DriverError::System(anyhow!(err))
}

/// Runs the pipeline. On success returns the process exit code: zero,
/// except for `--run` which yields the child's code.
pub fn run(cli: &Cli) -> Result<i32, DriverError> {
    let source = fs::read_to_string(&cli.input).map_err(|e| DriverError::Io {
        path: cli.input.clone(),
        source: e,
    })?;
    let path = cli.input.display().to_string();
    let handler = Handler::new();

    if cli.verbose {
        eprintln!("lexing {}", path);
    }
    let tokens = Lexer::new(&source, &handler).tokenize();
    if cli.lex {
        for token in &tokens {
            println!("{}", token);
        }
        gate(&handler, &path, &source)?;
        return Ok(0);
    }
    gate(&handler, &path, &source)?;

    if cli.verbose {
        eprintln!("parsing");
    }
    let mut stmts = Parser::new(tokens, &handler).parse_program();
    if cli.parse {
        print!("{}", dump_program(&stmts));
        gate(&handler, &path, &source)?;
        return Ok(0);
    }
    gate(&handler, &path, &source)?;

    if cli.verbose {
        eprintln!("loading prelude");
    }
    let mut table = SymbolTable::new();
    load_prelude(&mut table, &handler);
    if handler.has_errors() {
        render_all(&handler, PRELUDE_PATH, PRELUDE_SOURCE);
        return Err(DriverError::System(anyhow!(
            "internal error: the prelude failed to load"
        )));
    }

    if cli.verbose {
        eprintln!("building symbol table");
    }
    SymbolTableBuilder::new(&mut table, &handler, Origin::User).build(&stmts);
    gate(&handler, &path, &source)?;

    if cli.verbose {
        eprintln!("resolving operators");
    }
    OperatorResolver::new(&table, &handler).resolve_program(&mut stmts);
    gate(&handler, &path, &source)?;

    if cli.verbose {
        eprintln!("type checking");
    }
    TypeChecker::new(&table, &handler).check_program(&mut stmts);
    gate(&handler, &path, &source)?;

    if cli.dump_ast {
        print!("{}", dump_program(&stmts));
    }
    if cli.dump_symbols {
        print!("{}", table.dump(cli.hide_prelude));
    }
    if (cli.dump_ast || cli.dump_symbols) && !(cli.emit_llvm || cli.compile || cli.run) {
        return Ok(0);
    }

    if cli.verbose {
        eprintln!("generating code");
    }
    let module_name = cli
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("program");
    let context = Context::create();
    let mut gen = CodeGen::new(&context, module_name, &table, &handler);
    gen.compile(&stmts).map_err(into_system)?;
    gate(&handler, &path, &source)?;

    if cli.emit_llvm {
        print!("{}", gen.print_ir());
        if !cli.compile && !cli.run {
            return Ok(0);
        }
    }

    if cli.compile {
        let object = cli
            .output
            .clone()
            .unwrap_or_else(|| cli.input.with_extension("o"));
        if cli.verbose {
            eprintln!("writing {}", object.display());
        }
        gen.write_object_file(&object).map_err(into_system)?;
        return Ok(0);
    }

    // Default mode and --run: object to a scratch path, then link.
    let executable = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(module_name));
    let object = std::env::temp_dir().join(format!("{}-{}.o", module_name, std::process::id()));
    gen.write_object_file(&object).map_err(into_system)?;
    if cli.verbose {
        eprintln!("linking {}", executable.display());
    }
    let linked = Linker::new().link(&object, &executable);
    let _ = fs::remove_file(&object);
    linked.map_err(into_system)?;

    if cli.run {
        // Bare output names need an explicit ./ to execute.
        let program = if executable.components().count() == 1 {
            PathBuf::from(".").join(&executable)
        } else {
            executable.clone()
        };
        if cli.verbose {
            eprintln!("running {}", program.display());
        }
        let status = Command::new(&program).status().map_err(|e| {
            DriverError::System(anyhow!("cannot run {}: {}", program.display(), e))
        })?;
        return Ok(status.code().unwrap_or(1));
    }

    Ok(0)
}
