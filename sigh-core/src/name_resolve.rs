//! Lexical scopes used while type checking.
//!
//! Each static scope corresponds to exactly one runtime environment, so the
//! position of a scope in the stack doubles as the `hops` count the
//! interpreter uses to find a binding.

use std::collections::{HashMap, HashSet};

use crate::builtins::{BuiltinDescriptor, find_builtin};
use crate::hir::FunId;
use crate::types::{StructId, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    Block,
    /// Parameters of a function; its body is a nested `Block`.
    Function(FunId),
    /// Fields and methods visible inside a struct's method bodies.
    Struct(StructId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Variable { slot: usize, ty: Type },
    Function(FunId),
    Struct(StructId),
    Field { index: usize, ty: Type },
    Method(FunId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Local { hops: usize, slot: usize, ty: Type },
    Function { hops: usize, id: FunId },
    Struct { hops: usize, id: StructId },
    ReceiverField { hops: usize, index: usize, ty: Type },
    ReceiverMethod { hops: usize, id: FunId },
    Builtin(&'static BuiltinDescriptor),
    /// Only declared later in an enclosing scope.
    UsedBeforeDeclaration,
    Unresolved,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    names: HashMap<String, Declaration>,
    /// Variables this scope will declare but has not reached yet.
    pending: HashSet<String>,
    slots: usize,
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

/// A name is already declared in the current scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeclaration;

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack { scopes: Vec::new() }
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            names: HashMap::new(),
            pending: HashSet::new(),
            slots: 0,
        });
    }

    /// Leave the innermost scope, returning how many slots it used.
    pub fn pop(&mut self) -> usize {
        self.scopes.pop().map_or(0, |scope| scope.slots)
    }

    /// Record variables the current scope declares further down.
    pub fn reserve<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.pending.extend(names.into_iter().map(str::to_string));
        }
    }

    /// Declare a variable or parameter, allocating a slot for it.
    pub fn declare_variable(&mut self, name: &str, ty: Type) -> Result<usize, Redeclaration> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(Redeclaration);
        };
        let slot = scope.slots;
        Self::insert(scope, name, Declaration::Variable { slot, ty })?;
        scope.slots += 1;
        Ok(slot)
    }

    /// Declare a function, struct, field or method (no slot needed).
    pub fn declare(&mut self, name: &str, decl: Declaration) -> Result<(), Redeclaration> {
        match self.scopes.last_mut() {
            Some(scope) => Self::insert(scope, name, decl),
            None => Err(Redeclaration),
        }
    }

    fn insert(scope: &mut Scope, name: &str, decl: Declaration) -> Result<(), Redeclaration> {
        if scope.names.contains_key(name) {
            return Err(Redeclaration);
        }
        scope.pending.remove(name);
        scope.names.insert(name.to_string(), decl);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Resolution {
        for (hops, scope) in self.scopes.iter().rev().enumerate() {
            let Some(decl) = scope.names.get(name) else {
                continue;
            };
            return match decl {
                Declaration::Variable { slot, ty } => Resolution::Local {
                    hops,
                    slot: *slot,
                    ty: ty.clone(),
                },
                Declaration::Function(id) => Resolution::Function { hops, id: *id },
                Declaration::Struct(id) => Resolution::Struct { hops, id: *id },
                Declaration::Field { index, ty } => Resolution::ReceiverField {
                    hops,
                    index: *index,
                    ty: ty.clone(),
                },
                Declaration::Method(id) => Resolution::ReceiverMethod { hops, id: *id },
            };
        }
        if let Some(builtin) = find_builtin(name) {
            return Resolution::Builtin(builtin);
        }
        if self.scopes.iter().any(|scope| scope.pending.contains(name)) {
            Resolution::UsedBeforeDeclaration
        } else {
            Resolution::Unresolved
        }
    }

    /// Innermost enclosing function, if any.
    pub fn current_function(&self) -> Option<FunId> {
        self.scopes.iter().rev().find_map(|scope| match scope.kind {
            ScopeKind::Function(id) => Some(id),
            _ => None,
        })
    }
}
