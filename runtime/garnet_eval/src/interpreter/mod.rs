//! Tree-walking interpreter for garnet block programs.
//!
//! # Architecture
//!
//! Evaluation of one expression yields an [`EvalResult`]: a value, or a
//! [`ControlAction`] that is either a control signal relayed by value or an
//! error. Each submodule owns one concern:
//!
//! - `expr` - expression dispatch, variables, operators
//! - `call` - the method-call adapter (frame push, block capture, retry)
//! - `dispatch` - the block invocation dispatcher (`invoke_block`)
//! - `control` - control operators, loops, `for`, `begin/rescue/ensure`
//! - `unwind` - promotion of signals to `UnwindSignal` at opaque boundaries
//! - `frame_guard` - RAII frame and context guards
//!
//! # Execution context
//!
//! `ExecContext` is everything that changes when control enters a method or
//! block body: the arena the body lives in, `self`, the scope chain, the block
//! visible to `yield`, the frame a proc-style `return` targets, and the
//! lexical jump contexts that decide what `break`/`next`/`redo`/`retry`
//! target. Entering a body swaps the context in; the guard swaps it back.

mod builder;
mod call;
mod control;
mod dispatch;
mod expr;
mod frame_guard;
mod interned_names;
mod unwind;

pub use builder::InterpreterBuilder;
pub use dispatch::CallerKind;

pub(crate) use call::MethodEntry;

use crate::diagnostics::EvalCounters;
use crate::eval_mode::EvalMode;
use crate::frames::{FrameKind, FrameRegistry};
use crate::natives::NativeRegistry;
use crate::print_handler::SharedPrintHandler;
use garnet_ir::{ExprId, Name, Program, SharedArena, SharedInterner};
use garnet_patterns::{
    local_jump, ArgumentBundle, ControlSignal, EvalError, FrameId, LocalJumpKind, ProcValue,
    SharedScope, Value,
};
use interned_names::KnownNames;
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};

/// Lexical construct that can honour a control operator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum JumpContext {
    /// A method body, or the top level.
    Method(FrameId),
    /// A block body being run by the dispatcher.
    Block {
        frame: FrameId,
        lambda: bool,
        owner: Option<FrameId>,
        converter: Option<FrameId>,
    },
    /// `while`/`until`.
    Loop(FrameId),
    For(FrameId),
    /// The body of a `rescue` clause.
    Rescue(FrameId),
}

/// State swapped on entry to a method or block body.
#[derive(Clone)]
pub(crate) struct ExecContext {
    pub(crate) arena: SharedArena,
    pub(crate) self_value: Value,
    pub(crate) scope: SharedScope,
    pub(crate) block: Option<ProcValue>,
    /// Target of a proc-style `return`: the method frame, or a lambda's own.
    pub(crate) return_scope: Option<FrameId>,
    /// Method the running body belongs to, for frame names.
    pub(crate) method_name: Name,
    pub(crate) jumps: SmallVec<[JumpContext; 4]>,
}

impl ExecContext {
    /// Context of code running outside any activation, e.g. a host `invoke`.
    fn detached(arena: SharedArena, method_name: Name) -> Self {
        ExecContext {
            arena,
            self_value: Value::Main,
            scope: SharedScope::new_root(),
            block: None,
            return_scope: None,
            method_name,
            jumps: SmallVec::new(),
        }
    }
}

/// Tree-walking interpreter.
///
/// Owns one activation-frame registry, so one interpreter is one logical
/// call chain. Closures it creates may be invoked by another interpreter,
/// on another thread; control operators targeting this interpreter's
/// frames then fail there with `LocalJumpError`.
pub struct Interpreter {
    pub(crate) interner: SharedInterner,
    arena: SharedArena,
    main: ExprId,
    pub(crate) frames: FrameRegistry,
    pub(crate) globals: FxHashMap<Name, Value>,
    pub(crate) methods: FxHashMap<Name, MethodEntry>,
    pub(crate) natives: NativeRegistry,
    pub(crate) print_handler: SharedPrintHandler,
    mode: EvalMode,
    pub(crate) counters: EvalCounters,
    pub(crate) names: KnownNames,
    pub(crate) ctx: ExecContext,
}

impl Interpreter {
    /// Interpreter for `program` with the default configuration.
    pub fn new(program: &Program) -> Self {
        InterpreterBuilder::new(program).build()
    }

    pub fn builder(program: &Program) -> InterpreterBuilder {
        InterpreterBuilder::new(program)
    }

    /// Run the program's top-level body.
    ///
    /// A `return` at the top level ends the program with its value. Any other
    /// control signal that escapes to here has no construct to honour it and
    /// becomes a `LocalJumpError`.
    pub fn run(&mut self) -> Result<Value, EvalError> {
        let main = self.main;
        let name = self.names.main;
        let arena = self.arena.clone();
        let mut frame = self.push_frame(FrameKind::Method, true, name)?;
        let id = frame.id();
        let ctx = ExecContext {
            return_scope: Some(id),
            jumps: smallvec![JumpContext::Method(id)],
            ..ExecContext::detached(arena, name)
        };
        let mut this = frame.with_context(ctx);
        let outcome = this.eval(main);
        match outcome {
            Ok(value) => Ok(value),
            Err(action) => match action.demote() {
                Ok(signal) if signal.targets(id) => Ok(signal.into_value()),
                Ok(signal) => {
                    tracing::debug!(reason = %signal.reason, "control signal escaped to top level");
                    Err(this.fail(local_jump(LocalJumpKind::orphaned(signal.reason))))
                }
                Err(err) => Err(err),
            },
        }
    }

    /// Invoke `proc` with `args` as `Proc#call` would, and hand back the raw
    /// outcome. A non-normal signal is returned, not acted on.
    pub fn invoke(&mut self, proc: &ProcValue, args: ArgumentBundle) -> Result<ControlSignal, EvalError> {
        self.invoke_block(proc, args, None, CallerKind::Call)
    }

    /// Reported arity of `proc`.
    pub fn arity(&self, proc: &ProcValue) -> i64 {
        proc.arity()
    }

    /// Whether `proc` may still run a proc-style `return`: lambdas always,
    /// procs while their owner activation is live on this call chain.
    pub fn is_valid(&self, proc: &ProcValue) -> bool {
        proc.is_lambda()
            || proc
                .closure()
                .owner()
                .is_some_and(|owner| self.frames.is_active(owner))
    }

    pub fn counters(&self) -> &EvalCounters {
        &self.counters
    }

    pub fn frames(&self) -> &FrameRegistry {
        &self.frames
    }

    pub fn mode(&self) -> &EvalMode {
        &self.mode
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    /// Captured guest output (buffer handlers only).
    pub fn output(&self) -> String {
        self.print_handler.output()
    }

    /// Value of global `name` (with its `$`), `nil` when unset.
    pub fn global(&self, name: &str) -> Value {
        let name = self.interner.intern(name);
        self.globals.get(&name).cloned().unwrap_or_default()
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        let name = self.interner.intern(name);
        self.globals.insert(name, value);
    }

    /// Attach a backtrace of the live frames to an error raised here.
    pub(crate) fn fail(&self, err: EvalError) -> EvalError {
        self.frames.attach_backtrace(err, &self.interner)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
