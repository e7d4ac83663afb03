//! Prelude loader.
//!
//! The prelude is an embedded Lyra source file consisting solely of
//! bodyless function and operator declarations. Loading it reuses the
//! lexer, parser, and symbol-table builder with the builder switched to
//! prelude mode, so every inserted symbol carries [`Origin::Prelude`].

use lyrac_lex::Lexer;
use lyrac_par::Parser;
use lyrac_util::Handler;

use crate::builder::SymbolTableBuilder;
use crate::table::{Origin, SymbolTable};

/// The built-in declaration surface, in Lyra itself.
pub const PRELUDE_SOURCE: &str = include_str!("../prelude.lyr");

/// Path used when rendering diagnostics against the prelude.
pub const PRELUDE_PATH: &str = "<prelude>";

/// Parses the prelude and seeds `table` with its declarations.
///
/// Any diagnostics this produces indicate a broken prelude, which is an
/// internal error; the driver treats them as such.
pub fn load_prelude(table: &mut SymbolTable, handler: &Handler) {
    let tokens = Lexer::new(PRELUDE_SOURCE, handler).tokenize();
    let stmts = Parser::new(tokens, handler).parse_program();
    SymbolTableBuilder::new(table, handler, Origin::Prelude).build(&stmts);
}
