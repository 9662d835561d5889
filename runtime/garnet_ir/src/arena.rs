//! Flat storage for compiled bodies.

use crate::{BlockId, BlockLiteral, ExprId, ExprKind, MethodDef, MethodId};
use std::sync::Arc;

/// Expressions, block literals and method definitions of one program.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    exprs: Vec<ExprKind>,
    blocks: Vec<BlockLiteral>,
    methods: Vec<MethodDef>,
}

fn next_index(len: usize) -> u32 {
    // Arenas beyond u32::MAX nodes are not a supported program size.
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId::new(next_index(self.exprs.len()));
        self.exprs.push(kind);
        id
    }

    pub fn alloc_block(&mut self, block: BlockLiteral) -> BlockId {
        let id = BlockId::new(next_index(self.blocks.len()));
        self.blocks.push(block);
        id
    }

    pub fn alloc_method(&mut self, method: MethodDef) -> MethodId {
        let id = MethodId::new(next_index(self.methods.len()));
        self.methods.push(method);
        id
    }

    /// # Panics
    /// Panics if `id` came from another arena.
    #[inline]
    pub fn expr(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &BlockLiteral {
        &self.blocks[id.index()]
    }

    #[inline]
    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }
}

/// Read-only arena shared by every closure and interpreter running the
/// program. Closures carry their own handle so they can run on any thread.
#[derive(Clone, Debug)]
pub struct SharedArena(Arc<ExprArena>);

impl SharedArena {
    pub fn new(arena: ExprArena) -> Self {
        SharedArena(Arc::new(arena))
    }
}

impl std::ops::Deref for SharedArena {
    type Target = ExprArena;

    fn deref(&self) -> &ExprArena {
        &self.0
    }
}
