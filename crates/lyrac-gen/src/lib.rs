//! lyrac-gen - LLVM Code Generation
//!
//! Lowers the resolved, typed AST into an LLVM module via inkwell, emits
//! textual IR or native object files, and drives the system linker.

pub mod codegen;
pub mod error;
pub mod linker;
pub mod mangle;
pub mod types;

#[cfg(test)]
mod tests;

pub use codegen::CodeGen;
pub use error::{CodeGenError, Result};
pub use linker::Linker;
pub use mangle::{mangle_operator, ENTRY_SYMBOL};
pub use types::TypeMapper;
