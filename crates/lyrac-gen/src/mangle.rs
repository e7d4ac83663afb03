//! Generated symbol names.
//!
//! User functions keep their source names. Operator overloads get a
//! deterministic mangling of symbol plus parameter type list, which is
//! all that distinguishes overloads at link level.

use lyrac_util::{Symbol, Ty};

/// Reserved name of the synthetic program entry function.
pub const ENTRY_SYMBOL: &str = "__lyra_entry";

/// Mangled linkage name for an operator overload: `SYMBOL$T1$T2…`.
pub fn mangle_operator(symbol: Symbol, params: &[Ty]) -> String {
    let mut out = String::from(symbol.as_str());
    for ty in params {
        out.push('$');
        out.push_str(ty.name());
    }
    out
}
