//! The Lyra type-name set.
//!
//! Types are tags compared by name; there is no subtyping or coercion.
//! Annotations outside the built-in set are carried as [`Ty::Named`] so
//! that earlier passes stay tolerant and code generation can reject them.

use std::fmt;

use crate::Symbol;

/// A Lyra type name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// 32-bit signed integer.
    I32,
    /// 64-bit float.
    F64,
    /// Boolean.
    Bool,
    /// String (opaque pointer at runtime).
    Str,
    /// No value.
    Void,
    /// A name outside the built-in set.
    Named(Symbol),
}

impl Ty {
    /// Resolve a source-level type name.
    pub fn from_name(name: Symbol) -> Ty {
        match name.as_str() {
            "i32" => Ty::I32,
            "f64" => Ty::F64,
            "bool" => Ty::Bool,
            "string" => Ty::Str,
            "void" => Ty::Void,
            _ => Ty::Named(name),
        }
    }

    /// The source-level name of this type.
    pub fn name(self) -> &'static str {
        match self {
            Ty::I32 => "i32",
            Ty::F64 => "f64",
            Ty::Bool => "bool",
            Ty::Str => "string",
            Ty::Void => "void",
            Ty::Named(sym) => sym.as_str(),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
