//! String interning.
//!
//! A [`Symbol`] is a 4-byte handle to a string stored in a global table.
//! Interning the same string twice yields the same handle, so equality and
//! hashing are integer operations. Identifiers, operator symbols, type
//! names, and decoded string literals are all interned.

use std::fmt;
use std::sync::{OnceLock, RwLock};

use rustc_hash::FxHashMap;

/// An interned string identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

struct Interner {
    /// Maps string contents to table index.
    map: FxHashMap<&'static str, u32>,
    /// Storage; strings are leaked once and live for the process.
    strings: Vec<&'static str>,
}

fn interner() -> &'static RwLock<Interner> {
    static INTERNER: OnceLock<RwLock<Interner>> = OnceLock::new();
    INTERNER.get_or_init(|| {
        RwLock::new(Interner {
            map: FxHashMap::default(),
            strings: Vec::new(),
        })
    })
}

impl Symbol {
    /// Intern a string, returning its symbol.
    pub fn intern(string: &str) -> Self {
        let lock = interner();
        if let Some(&index) = lock.read().unwrap().map.get(string) {
            return Symbol(index);
        }
        let mut table = lock.write().unwrap();
        // Another thread may have inserted between the read and write locks.
        if let Some(&index) = table.map.get(string) {
            return Symbol(index);
        }
        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = table.strings.len() as u32;
        table.strings.push(leaked);
        table.map.insert(leaked, index);
        Symbol(index)
    }

    /// Get the string this symbol refers to.
    pub fn as_str(self) -> &'static str {
        interner().read().unwrap().strings[self.0 as usize]
    }

    /// Raw index value, for debugging.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let a = Symbol::intern("hello");
        let b = Symbol::intern("hello");
        let c = Symbol::intern("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_as_str_roundtrip() {
        let sym = Symbol::intern("fib");
        assert_eq!(sym.as_str(), "fib");
    }

    #[test]
    fn test_empty_string() {
        let sym = Symbol::intern("");
        assert_eq!(sym.as_str(), "");
        assert_eq!(sym, Symbol::intern(""));
    }

    #[test]
    fn test_display() {
        let sym = Symbol::intern("+=");
        assert_eq!(format!("{}", sym), "+=");
    }
}
