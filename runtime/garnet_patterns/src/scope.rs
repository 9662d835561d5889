//! Lexical scopes captured by closures.
//!
//! Method bodies get a fresh root scope. Block bodies get a child of the
//! scope the block literal was evaluated in, so assignments to names that
//! already exist outside update the outer binding, and new names stay local
//! to the block.

use crate::value::Value;
use garnet_ir::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One level of local variables.
#[derive(Default)]
pub struct Scope {
    vars: FxHashMap<Name, Value>,
    parent: Option<SharedScope>,
}

/// Reference-counted scope, shareable across threads with the closures that
/// capture it.
#[derive(Clone, Default)]
pub struct SharedScope(Arc<RwLock<Scope>>);

impl SharedScope {
    pub fn new_root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn child(&self) -> Self {
        SharedScope(Arc::new(RwLock::new(Scope {
            vars: FxHashMap::default(),
            parent: Some(self.clone()),
        })))
    }

    pub fn lookup(&self, name: Name) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let next = {
                let scope = current.0.read();
                if let Some(value) = scope.vars.get(&name) {
                    return Some(value.clone());
                }
                scope.parent.clone()
            };
            current = next?;
        }
    }

    /// Bind in this level, shadowing any outer binding.
    pub fn define(&self, name: Name, value: Value) {
        self.0.write().vars.insert(name, value);
    }

    /// Update the nearest existing binding, or define here.
    pub fn assign(&self, name: Name, value: Value) {
        let mut current = self.clone();
        loop {
            let next = {
                let mut scope = current.0.write();
                if let Some(slot) = scope.vars.get_mut(&name) {
                    *slot = value;
                    return;
                }
                scope.parent.clone()
            };
            match next {
                Some(parent) => current = parent,
                None => break,
            }
        }
        self.define(name, value);
    }
}

impl std::fmt::Debug for SharedScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scope = self.0.read();
        f.debug_struct("Scope")
            .field("vars", &scope.vars.len())
            .field("nested", &scope.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;
