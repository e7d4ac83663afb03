//! lyrac-util - Core Utilities and Foundation Types
//!
//! Shared vocabulary for every phase of the Lyra compiler: source spans,
//! diagnostics, string interning, typed index vectors, and the closed set
//! of Lyra type names.

pub mod diagnostic;
pub mod index_vec;
pub mod span;
pub mod symbol;
pub mod types;

pub use diagnostic::{Diagnostic, Handler, Level, Stage};
pub use index_vec::{Idx, IndexVec};
pub use span::Span;
pub use symbol::Symbol;
pub use types::Ty;

// Re-export commonly used hash types
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
