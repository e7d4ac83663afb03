//! The hierarchical symbol table.
//!
//! A scope arena (global → function → block …) plus two global overload
//! tables: functions keyed by name, operators keyed by (symbol, position).
//! Overload lists preserve declaration order; lookups return all overloads
//! and the consumer filters by type.

use std::fmt::Write as _;

use indexmap::IndexMap;
use lyrac_par::ast::{Assoc, OpPosition};
use lyrac_util::{define_idx, FxHashMap, IndexVec, Span, Symbol, Ty};

define_idx!(
    /// Index of a scope in the table's arena.
    ScopeId
);

/// Where a symbol came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Prelude,
    User,
}

/// Scope kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
}

/// A variable binding within one scope.
#[derive(Clone, Debug)]
pub struct VarBinding {
    pub name: Symbol,
    /// Declared type; may stay empty for un-annotated bindings.
    pub ty: Option<Ty>,
    /// Definition span.
    pub span: Span,
    pub origin: Origin,
}

/// One scope level.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Human-readable description for dumps.
    pub description: String,
    /// Child scopes in encounter order.
    pub children: Vec<ScopeId>,
    /// Bindings at this level only.
    pub vars: FxHashMap<Symbol, VarBinding>,
    /// Names in insertion order, so dumps are deterministic.
    pub var_order: Vec<Symbol>,
}

/// A function overload.
#[derive(Clone, Debug)]
pub struct FnSig {
    pub name: Symbol,
    pub params: Vec<Ty>,
    pub ret: Ty,
    /// True for bodyless (external) declarations.
    pub declaration_only: bool,
    pub origin: Origin,
    pub span: Span,
}

/// An operator overload.
#[derive(Clone, Debug)]
pub struct OpSig {
    pub symbol: Symbol,
    pub position: OpPosition,
    pub params: Vec<Ty>,
    pub ret: Ty,
    /// Meaningful only for infix operators.
    pub prec: i64,
    pub assoc: Assoc,
    pub declaration_only: bool,
    pub origin: Origin,
    pub span: Span,
}

/// The symbol table: scope tree plus global overload tables.
pub struct SymbolTable {
    pub scopes: IndexVec<ScopeId, Scope>,
    pub root: ScopeId,
    pub functions: IndexMap<Symbol, Vec<FnSig>>,
    pub operators: IndexMap<(Symbol, OpPosition), Vec<OpSig>>,
}

impl SymbolTable {
    /// Creates a table with an empty global scope.
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        let root = scopes.push(Scope {
            kind: ScopeKind::Global,
            parent: None,
            description: "global".to_string(),
            children: Vec::new(),
            vars: FxHashMap::default(),
            var_order: Vec::new(),
        });
        Self {
            scopes,
            root,
            functions: IndexMap::new(),
            operators: IndexMap::new(),
        }
    }

    /// Appends a child scope under `parent` and returns its id.
    pub fn push_scope(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        description: String,
    ) -> ScopeId {
        let id = self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            description,
            children: Vec::new(),
            vars: FxHashMap::default(),
            var_order: Vec::new(),
        });
        self.scopes[parent].children.push(id);
        id
    }

    /// Inserts a binding into `scope`. Returns the previous binding's
    /// span if the name was already bound at this level.
    pub fn bind_var(&mut self, scope: ScopeId, binding: VarBinding) -> Result<(), Span> {
        let slot = &mut self.scopes[scope];
        if let Some(existing) = slot.vars.get(&binding.name) {
            return Err(existing.span);
        }
        slot.var_order.push(binding.name);
        slot.vars.insert(binding.name, binding);
        Ok(())
    }

    /// Innermost binding for `name`, walking parent scopes.
    pub fn lookup_var(&self, from: ScopeId, name: Symbol) -> Option<&VarBinding> {
        let mut scope = Some(from);
        while let Some(id) = scope {
            let s = &self.scopes[id];
            if let Some(binding) = s.vars.get(&name) {
                return Some(binding);
            }
            scope = s.parent;
        }
        None
    }

    /// Registers a function overload.
    pub fn add_function(&mut self, sig: FnSig) {
        self.functions.entry(sig.name).or_default().push(sig);
    }

    /// Registers an operator overload.
    pub fn add_operator(&mut self, sig: OpSig) {
        self.operators
            .entry((sig.symbol, sig.position))
            .or_default()
            .push(sig);
    }

    /// All overloads of a function name, declaration-ordered.
    pub fn functions_named(&self, name: Symbol) -> &[FnSig] {
        self.functions.get(&name).map_or(&[], Vec::as_slice)
    }

    /// All overloads of an operator in one position.
    pub fn operator_overloads(&self, symbol: Symbol, position: OpPosition) -> &[OpSig] {
        self.operators
            .get(&(symbol, position))
            .map_or(&[], Vec::as_slice)
    }

    /// True if the symbol is declared for the given position.
    pub fn has_operator(&self, symbol: Symbol, position: OpPosition) -> bool {
        !self.operator_overloads(symbol, position).is_empty()
    }

    /// True if the symbol is declared in any position.
    pub fn operator_declared(&self, symbol: Symbol) -> bool {
        [OpPosition::Prefix, OpPosition::Infix, OpPosition::Postfix]
            .into_iter()
            .any(|p| self.has_operator(symbol, p))
    }

    /// Precedence and associativity of an infix operator, taken from its
    /// first declared overload.
    pub fn infix_info(&self, symbol: Symbol) -> Option<(i64, Assoc)> {
        self.operator_overloads(symbol, OpPosition::Infix)
            .first()
            .map(|sig| (sig.prec, sig.assoc))
    }

    /// Renders functions, operators, and the scope tree.
    pub fn dump(&self, hide_prelude: bool) -> String {
        let mut out = String::new();
        out.push_str("functions:\n");
        for sigs in self.functions.values() {
            for sig in sigs {
                if hide_prelude && sig.origin == Origin::Prelude {
                    continue;
                }
                let _ = write!(out, "  {}(", sig.name);
                write_tys(&mut out, &sig.params);
                let _ = write!(out, "): {}", sig.ret);
                if sig.declaration_only {
                    out.push_str(" extern");
                }
                if sig.origin == Origin::Prelude {
                    out.push_str(" [prelude]");
                }
                out.push('\n');
            }
        }
        out.push_str("operators:\n");
        for sigs in self.operators.values() {
            for sig in sigs {
                if hide_prelude && sig.origin == Origin::Prelude {
                    continue;
                }
                let _ = write!(out, "  {} {}(", sig.position.as_str(), sig.symbol);
                write_tys(&mut out, &sig.params);
                let _ = write!(out, "): {}", sig.ret);
                if sig.position == OpPosition::Infix {
                    let _ = write!(out, " prec {}", sig.prec);
                    if sig.assoc == Assoc::Right {
                        out.push_str(" assoc_right");
                    }
                }
                if sig.declaration_only {
                    out.push_str(" extern");
                }
                if sig.origin == Origin::Prelude {
                    out.push_str(" [prelude]");
                }
                out.push('\n');
            }
        }
        out.push_str("scopes:\n");
        self.dump_scope(&mut out, self.root, 1, hide_prelude);
        out
    }

    fn dump_scope(&self, out: &mut String, id: ScopeId, depth: usize, hide_prelude: bool) {
        let scope = &self.scopes[id];
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(&scope.description);
        out.push('\n');
        for name in &scope.var_order {
            let binding = &scope.vars[name];
            if hide_prelude && binding.origin == Origin::Prelude {
                continue;
            }
            for _ in 0..=depth {
                out.push_str("  ");
            }
            let _ = write!(out, "{}", binding.name);
            if let Some(ty) = binding.ty {
                let _ = write!(out, ": {}", ty);
            }
            out.push('\n');
        }
        for &child in &scope.children {
            self.dump_scope(out, child, depth + 1, hide_prelude);
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

fn write_tys(out: &mut String, tys: &[Ty]) {
    for (i, ty) in tys.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}", ty);
    }
}
