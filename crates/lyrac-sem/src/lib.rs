//! lyrac-sem - Semantic Analysis
//!
//! The middle of the pipeline: the hierarchical symbol table and its
//! builder, the operator resolver that turns flat operator sequences into
//! expression trees, the bottom-up type checker, and the prelude loader
//! that seeds the table with the built-in surface.

pub mod builder;
pub mod check;
pub mod prelude;
pub mod resolve;
pub mod table;

pub use builder::SymbolTableBuilder;
pub use check::TypeChecker;
pub use prelude::{load_prelude, PRELUDE_PATH, PRELUDE_SOURCE};
pub use resolve::OperatorResolver;
pub use table::{FnSig, OpSig, Origin, Scope, ScopeId, ScopeKind, SymbolTable, VarBinding};
