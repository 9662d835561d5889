//! Block invocation dispatcher.
//!
//! `invoke_block` pushes a `Block` frame, binds arguments (lenient for procs,
//! strict for lambdas), runs the body and settles what comes out of it:
//!
//! - `next` aimed at this frame becomes the normal result
//! - `redo` aimed at this frame re-runs the body with the same bindings
//! - `break`/`return` aimed at this frame (lambdas) become the normal result
//! - `break`, `return` and `retry` aimed elsewhere are handed back to the
//!   caller, once their target is known to be live
//!
//! Redo is a loop here, not recursion, so native stack depth does not grow
//! with the number of redone iterations.

use super::{ExecContext, Interpreter, JumpContext};
use crate::frames::FrameKind;
use garnet_ir::{BlockId, Name, SharedArena};
use garnet_patterns::{
    arity_error, local_jump, ArgumentBundle, ArityError, ArityRange, BindMode, BlockBody,
    BlockClosure, ControlAction, ControlSignal, EvalError, EvalResult, FrameId, LocalJumpKind,
    ProcValue, SignalReason, Value,
};
use smallvec::smallvec;

/// How a block is being run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CallerKind {
    /// `yield`, or a native iterator yielding to its block.
    Yield,
    /// `Proc#call` and friends, or a host `invoke`.
    Call,
}

/// What the dispatcher does after one run of the body.
enum BodyExit {
    Redo,
    Done(ControlSignal),
}

impl Interpreter {
    /// Run `proc` with `args`. `block` is bound to an explicit `&b`
    /// parameter.
    ///
    /// Returns the normal value as a `Normal` signal, or a `break`,
    /// `return` or `retry` aimed at a live frame further out. Argument
    /// errors, guest exceptions and signals whose target is gone are errors.
    #[tracing::instrument(level = "debug", skip_all, fields(lambda = proc.is_lambda(), ?caller))]
    pub(crate) fn invoke_block(
        &mut self,
        proc: &ProcValue,
        args: ArgumentBundle,
        block: Option<ProcValue>,
        caller: CallerKind,
    ) -> Result<ControlSignal, EvalError> {
        let closure = proc.closure();
        match closure.body() {
            BlockBody::Code { arena, block: id } => {
                self.invoke_code(closure, arena, *id, args, block, caller)
            }
            BlockBody::Method(method) => {
                let method = method.clone();
                settle(self.call_method_value(&method, args, block))
            }
            BlockBody::Symbol(name) => settle(self.invoke_symbol(*name, args, block)),
        }
    }

    /// Run a block for a native iterator: a normal result is the value,
    /// anything else is relayed.
    pub(crate) fn yield_to(&mut self, block: &ProcValue, args: ArgumentBundle) -> EvalResult {
        relay(self.invoke_block(block, args, None, CallerKind::Yield))
    }

    /// Run a block for `Proc#call`.
    pub(crate) fn call_proc(
        &mut self,
        proc: &ProcValue,
        args: ArgumentBundle,
        block: Option<ProcValue>,
    ) -> EvalResult {
        relay(self.invoke_block(proc, args, block, CallerKind::Call))
    }

    /// `yield args`.
    pub(crate) fn eval_yield(&mut self, args: &[garnet_ir::Arg]) -> EvalResult {
        let Some(block) = self.ctx.block.clone() else {
            return Err(self.fail(garnet_patterns::no_block_given()).into());
        };
        let args = self.eval_args(args)?;
        self.yield_to(&block, args)
    }

    fn invoke_code(
        &mut self,
        closure: &BlockClosure,
        arena: &SharedArena,
        id: BlockId,
        args: ArgumentBundle,
        block: Option<ProcValue>,
        caller: CallerKind,
    ) -> Result<ControlSignal, EvalError> {
        self.counters.count_block();
        let literal = arena.block(id);
        let lambda = closure.is_lambda();
        let name = self.ctx.method_name;

        let mut frame = self.push_frame(FrameKind::Block, true, name)?;
        let own = frame.id();
        let ctx = ExecContext {
            arena: arena.clone(),
            self_value: closure.self_value().clone(),
            scope: closure.scope().child(),
            block: closure.outer_block().cloned(),
            return_scope: if lambda { Some(own) } else { closure.owner() },
            method_name: name,
            jumps: smallvec![JumpContext::Block {
                frame: own,
                lambda,
                owner: closure.owner(),
                converter: closure.converter(),
            }],
        };
        let mut this = frame.with_context(ctx);

        let block_param = block.map(|block| Value::Proc(block.reified()));
        let mode = BindMode::for_lambda(lambda);
        if let Err(action) = this.bind_params(&literal.params, closure.flags(), mode, args, block_param) {
            match this.settle_body(action, own, caller)? {
                BodyExit::Done(signal) => return Ok(signal),
                BodyExit::Redo => this.counters.count_redo(),
            }
        }

        loop {
            match this.eval(literal.body) {
                Ok(value) => return Ok(ControlSignal::normal(value)),
                Err(action) => match this.settle_body(action, own, caller)? {
                    BodyExit::Done(signal) => return Ok(signal),
                    BodyExit::Redo => this.counters.count_redo(),
                },
            }
        }
    }

    fn settle_body(
        &self,
        action: ControlAction,
        own: FrameId,
        caller: CallerKind,
    ) -> Result<BodyExit, EvalError> {
        let signal = action.demote()?;
        tracing::trace!(frame = %own, reason = %signal.reason, target = ?signal.target, "block body signal");
        if signal.targets(own) {
            return Ok(match signal.reason {
                SignalReason::Redo => BodyExit::Redo,
                _ => BodyExit::Done(ControlSignal::normal(signal.into_value())),
            });
        }
        let live = signal.target.is_some_and(|target| self.frames.is_active(target));
        match signal.reason {
            SignalReason::Break | SignalReason::Return if !live => Err(self.fail(local_jump(
                LocalJumpKind::stale_target(signal.reason),
            ))),
            SignalReason::Retry if !live || caller != CallerKind::Yield => {
                Err(self.fail(local_jump(LocalJumpKind::RetryFromProcClosure)))
            }
            _ => Ok(BodyExit::Done(signal)),
        }
    }

    /// `Symbol#to_proc`: send the symbol to the first argument.
    fn invoke_symbol(&mut self, method: Name, args: ArgumentBundle, block: Option<ProcValue>) -> EvalResult {
        let mut values = args.into_values().into_iter();
        let Some(receiver) = values.next() else {
            let err = arity_error(ArityError {
                given: 0,
                expected: ArityRange { min: 1, max: None },
            });
            return Err(self.fail(err).into());
        };
        self.send(receiver, method, ArgumentBundle::from_values(values), block)
    }
}

/// Normal results become `Normal` signals; relayed signals and in-flight
/// unwinds are demoted.
fn settle(result: EvalResult) -> Result<ControlSignal, EvalError> {
    match result {
        Ok(value) => Ok(ControlSignal::normal(value)),
        Err(action) => action.demote(),
    }
}

/// Inverse of [`settle`].
fn relay(outcome: Result<ControlSignal, EvalError>) -> EvalResult {
    match outcome {
        Ok(signal) if signal.is_normal() => Ok(signal.into_value()),
        Ok(signal) => Err(signal.rethrow()),
        Err(err) => Err(err.into()),
    }
}
