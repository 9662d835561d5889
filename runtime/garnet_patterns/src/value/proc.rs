//! Closures and their first-class wrapper.
//!
//! A [`BlockClosure`] is created once per dynamic evaluation of a block
//! literal and never mutated afterwards. It refers to the activations it
//! cares about by [`FrameId`] only; whether they are still live is a question
//! for the frame registry, not for the closure.

use crate::arity::{arity, method_arity};
use crate::binder::SignatureFlags;
use crate::scope::SharedScope;
use crate::signal::FrameId;
use crate::value::{Heap, Value};
use garnet_ir::{BlockId, ExprId, MethodId, Name, ParamSpec, SharedArena};
use std::fmt;
use std::sync::Arc;

/// How a closure came to exist.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ClosureOrigin {
    /// A block literal attached to a call.
    Block,
    /// Reified by `proc` or a `&b` parameter.
    Proc,
    Lambda,
    MethodToProc,
    SymbolToProc,
}

/// A method bound to its receiver, as `method(:name)` returns.
#[derive(Clone)]
pub struct MethodValue {
    pub receiver: Value,
    pub name: Name,
    pub arena: SharedArena,
    pub def: MethodId,
}

impl MethodValue {
    pub fn params(&self) -> &ParamSpec {
        &self.arena.method(self.def).params
    }

    pub fn body(&self) -> ExprId {
        self.arena.method(self.def).body
    }

    pub fn arity(&self) -> i64 {
        method_arity(self.params())
    }
}

impl fmt::Debug for MethodValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodValue")
            .field("name", &self.name)
            .field("def", &self.def)
            .finish_non_exhaustive()
    }
}

/// What running a closure executes.
#[derive(Clone)]
pub enum BlockBody {
    /// A compiled block literal.
    Code { arena: SharedArena, block: BlockId },
    /// `Method#to_proc`: runs the method body as a fresh activation.
    Method(Heap<MethodValue>),
    /// `Symbol#to_proc`: sends the symbol to the first argument.
    Symbol(Name),
}

/// The environment a block literal captures when it is evaluated.
#[derive(Clone, Default)]
pub struct Captured {
    pub scope: SharedScope,
    pub self_value: Value,
    /// Activation a proc-style `return` targets.
    pub owner: Option<FrameId>,
    /// Method activation the block was attached to; `break` and `retry`
    /// target it.
    pub converter: Option<FrameId>,
    /// Block visible to `yield` inside the body.
    pub outer_block: Option<ProcValue>,
}

#[derive(Clone)]
pub struct BlockClosure {
    body: BlockBody,
    env: Captured,
    lambda: bool,
    origin: ClosureOrigin,
    flags: SignatureFlags,
}

impl BlockClosure {
    /// A fresh closure over a block literal; lenient until converted.
    pub fn literal(arena: SharedArena, block: BlockId, env: Captured) -> Self {
        let flags = SignatureFlags::of(&arena.block(block).params);
        BlockClosure {
            body: BlockBody::Code { arena, block },
            env,
            lambda: false,
            origin: ClosureOrigin::Block,
            flags,
        }
    }

    pub fn from_method(method: Heap<MethodValue>) -> Self {
        let flags = SignatureFlags::of(method.params());
        let env = Captured {
            self_value: method.receiver.clone(),
            ..Captured::default()
        };
        BlockClosure {
            body: BlockBody::Method(method),
            env,
            lambda: true,
            origin: ClosureOrigin::MethodToProc,
            flags,
        }
    }

    pub fn from_symbol(method: Name) -> Self {
        BlockClosure {
            body: BlockBody::Symbol(method),
            env: Captured::default(),
            lambda: true,
            origin: ClosureOrigin::SymbolToProc,
            flags: SignatureFlags::HAS_REST,
        }
    }

    pub fn body(&self) -> &BlockBody {
        &self.body
    }

    /// Declared parameters; symbol procs have none of their own.
    pub fn params(&self) -> Option<&ParamSpec> {
        match &self.body {
            BlockBody::Code { arena, block } => Some(&arena.block(*block).params),
            BlockBody::Method(method) => Some(method.params()),
            BlockBody::Symbol(_) => None,
        }
    }

    pub fn scope(&self) -> &SharedScope {
        &self.env.scope
    }

    pub fn self_value(&self) -> &Value {
        &self.env.self_value
    }

    pub fn is_lambda(&self) -> bool {
        self.lambda
    }

    pub fn owner(&self) -> Option<FrameId> {
        self.env.owner
    }

    pub fn converter(&self) -> Option<FrameId> {
        self.env.converter
    }

    pub fn outer_block(&self) -> Option<&ProcValue> {
        self.env.outer_block.as_ref()
    }

    pub fn flags(&self) -> SignatureFlags {
        self.flags
    }
}

/// The user-visible Proc object.
///
/// Binding mode follows the wrapped closure: lenient for procs, strict for
/// lambdas and converted methods and symbols.
#[derive(Clone)]
pub struct ProcValue(Arc<BlockClosure>);

impl ProcValue {
    pub fn new(closure: BlockClosure) -> Self {
        ProcValue(Arc::new(closure))
    }

    pub fn closure(&self) -> &BlockClosure {
        &self.0
    }

    pub fn is_lambda(&self) -> bool {
        self.0.lambda
    }

    /// Reified by `proc` or `&b`: same closure, new origin tag.
    #[must_use]
    pub fn reified(&self) -> ProcValue {
        if self.0.origin != ClosureOrigin::Block {
            return self.clone();
        }
        let mut closure = (*self.0).clone();
        closure.origin = ClosureOrigin::Proc;
        ProcValue::new(closure)
    }

    /// A strict copy, as `lambda { }` produces. Lambdas come back unchanged.
    #[must_use]
    pub fn to_lambda(&self) -> ProcValue {
        if self.0.lambda {
            return self.clone();
        }
        let mut closure = (*self.0).clone();
        closure.lambda = true;
        closure.origin = ClosureOrigin::Lambda;
        ProcValue::new(closure)
    }

    /// Reported arity; pure in the compiled parameter list.
    pub fn arity(&self) -> i64 {
        match &self.0.body {
            BlockBody::Code { .. } => self.0.params().map_or(0, arity),
            BlockBody::Method(method) => method.arity(),
            BlockBody::Symbol(_) => -2,
        }
    }

    pub fn ptr_eq(&self, other: &ProcValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ProcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcValue")
            .field("origin", &self.0.origin)
            .field("lambda", &self.0.lambda)
            .field("owner", &self.0.env.owner)
            .field("converter", &self.0.env.converter)
            .finish_non_exhaustive()
    }
}
