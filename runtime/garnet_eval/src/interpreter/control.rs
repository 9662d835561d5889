//! Control operators and the constructs that consume them.
//!
//! `next`, `break`, `redo`, `retry` and `return` pick their target frame
//! from the lexical jump contexts when they are thrown, and fail right
//! there with a `LocalJumpError` when no construct can honour them. Loops,
//! `for` and `rescue` each consume the signals aimed at their own frame.

use super::{Interpreter, JumpContext};
use crate::frames::FrameKind;
use garnet_ir::{ExprId, Name, RescueClause};
use garnet_patterns::{
    local_jump, raised, type_mismatch, ControlAction, ControlSignal, EvalError, EvalResult,
    ExceptionClass, FrameId, LocalJumpKind, SignalReason, Value,
};

impl Interpreter {
    /// Innermost jump context `accept` takes.
    fn innermost_jump(&self, accept: impl Fn(&JumpContext) -> bool) -> Option<JumpContext> {
        self.ctx.jumps.iter().rev().copied().find(|jump| accept(jump))
    }

    fn jump_error(&self, kind: LocalJumpKind) -> ControlAction {
        self.fail(local_jump(kind)).into()
    }

    pub(crate) fn eval_next(&mut self, value: Option<ExprId>) -> EvalResult {
        let value = self.eval_or_nil(value)?;
        match self.innermost_jump(|jump| !matches!(jump, JumpContext::Rescue(_))) {
            Some(
                JumpContext::Loop(frame)
                | JumpContext::For(frame)
                | JumpContext::Block { frame, .. },
            ) => Err(ControlSignal::next(value, Some(frame)).rethrow()),
            _ => Err(self.jump_error(LocalJumpKind::UnexpectedNext)),
        }
    }

    pub(crate) fn eval_redo(&mut self) -> EvalResult {
        match self.innermost_jump(|jump| !matches!(jump, JumpContext::Rescue(_))) {
            Some(
                JumpContext::Loop(frame)
                | JumpContext::For(frame)
                | JumpContext::Block { frame, .. },
            ) => Err(ControlSignal::redo(Some(frame)).rethrow()),
            _ => Err(self.jump_error(LocalJumpKind::UnexpectedRedo)),
        }
    }

    /// `break` leaves a loop, or from a block, the call the block was
    /// attached to. A lambda's `break` leaves the lambda.
    pub(crate) fn eval_break(&mut self, value: Option<ExprId>) -> EvalResult {
        let value = self.eval_or_nil(value)?;
        let target = match self.innermost_jump(|jump| !matches!(jump, JumpContext::Rescue(_))) {
            Some(JumpContext::Loop(frame) | JumpContext::For(frame)) => frame,
            Some(JumpContext::Block {
                frame, lambda: true, ..
            }) => frame,
            Some(JumpContext::Block { converter, .. }) => match converter {
                Some(converter) if self.frames.is_active(converter) => converter,
                _ => return Err(self.jump_error(LocalJumpKind::BreakFromProcClosure)),
            },
            Some(JumpContext::Method(_) | JumpContext::Rescue(_)) | None => {
                return Err(self.jump_error(LocalJumpKind::UnexpectedBreak))
            }
        };
        Err(ControlSignal::break_to(value, Some(target)).rethrow())
    }

    /// `retry` restarts a `begin` from its rescue clause, a `for` loop, or
    /// from a block, the call the block was attached to. Whether the call
    /// can be restarted is decided where the block returns. In the body of
    /// a method that was given a block it restarts the call to the method.
    pub(crate) fn eval_retry(&mut self) -> EvalResult {
        match self.innermost_jump(|jump| !matches!(jump, JumpContext::Loop(_))) {
            Some(JumpContext::Rescue(frame) | JumpContext::For(frame)) => {
                Err(ControlSignal::retry(Some(frame)).rethrow())
            }
            Some(JumpContext::Block { converter, .. }) => {
                Err(ControlSignal::retry(converter).rethrow())
            }
            Some(JumpContext::Method(frame)) if self.ctx.block.is_some() => {
                Err(ControlSignal::retry(Some(frame)).rethrow())
            }
            _ => Err(self.jump_error(LocalJumpKind::RetryOutOfRescue)),
        }
    }

    /// `return` leaves the enclosing method; from a proc, the method the
    /// proc was created in, which must still be running.
    pub(crate) fn eval_return(&mut self, value: Option<ExprId>) -> EvalResult {
        let value = self.eval_or_nil(value)?;
        let target = match self.innermost_jump(|jump| {
            matches!(jump, JumpContext::Method(_) | JumpContext::Block { .. })
        }) {
            Some(JumpContext::Method(frame)) => frame,
            Some(JumpContext::Block {
                frame, lambda: true, ..
            }) => frame,
            Some(JumpContext::Block {
                owner: Some(owner), ..
            }) if self.frames.is_active(owner) => owner,
            _ => return Err(self.jump_error(LocalJumpKind::UnexpectedReturn)),
        };
        Err(ControlSignal::return_to(value, Some(target)).rethrow())
    }

    /// `while cond; body; end`, or `until` with the test inverted.
    pub(crate) fn eval_while(&mut self, cond: ExprId, body: ExprId, until: bool) -> EvalResult {
        let mut frame = self.push_construct(FrameKind::Loop, JumpContext::Loop)?;
        let id = frame.id();
        loop {
            if frame.eval(cond)?.is_truthy() == until {
                return Ok(Value::Nil);
            }
            loop {
                let Err(action) = frame.eval(body) else { break };
                let signal = claim(action, id)?;
                match signal.reason {
                    SignalReason::Next => break,
                    SignalReason::Redo => frame.counters.count_redo(),
                    _ => return Ok(signal.into_value()),
                }
            }
        }
    }

    /// `for var in iter`. The variable lives in the enclosing scope; the
    /// loop evaluates to the iterable. `retry` evaluates the iterable again
    /// and starts over.
    pub(crate) fn eval_for(&mut self, var: Name, iter: ExprId, body: ExprId) -> EvalResult {
        let mut frame = self.push_construct(FrameKind::Loop, JumpContext::For)?;
        let id = frame.id();
        'restart: loop {
            let iterable = frame.eval(iter)?;
            let items = frame.for_items(&iterable)?;
            let mut index = 0;
            while let Some(item) = items.get(index) {
                frame.ctx.scope.assign(var, item.clone());
                let Err(action) = frame.eval(body) else {
                    index += 1;
                    continue;
                };
                let signal = claim(action, id)?;
                match signal.reason {
                    SignalReason::Next => index += 1,
                    SignalReason::Redo => frame.counters.count_redo(),
                    SignalReason::Retry => {
                        frame.counters.count_retry();
                        continue 'restart;
                    }
                    _ => return Ok(signal.into_value()),
                }
            }
            return Ok(iterable);
        }
    }

    fn for_items(&self, iterable: &Value) -> Result<Vec<Value>, EvalError> {
        match iterable {
            Value::Array(items) => Ok(items.to_vec()),
            Value::Range(range) => Ok(range.iter().map(Value::int).collect()),
            other => Err(self.fail(type_mismatch("Array", other.class_name(&self.interner)))),
        }
    }

    /// `begin; body; rescue ...; else ...; ensure ...; end`.
    ///
    /// `ensure` runs on every exit, control signals included. If it fails,
    /// its failure replaces the outcome of the body.
    pub(crate) fn eval_begin(
        &mut self,
        body: ExprId,
        rescues: &[RescueClause],
        else_branch: Option<ExprId>,
        ensure: Option<ExprId>,
    ) -> EvalResult {
        let outcome = if rescues.is_empty() {
            self.eval(body).and_then(|value| match else_branch {
                Some(else_branch) => self.eval(else_branch),
                None => Ok(value),
            })
        } else {
            self.eval_rescued(body, rescues, else_branch)
        };
        if let Some(ensure) = ensure {
            self.eval(ensure)?;
        }
        outcome
    }

    fn eval_rescued(
        &mut self,
        body: ExprId,
        rescues: &[RescueClause],
        else_branch: Option<ExprId>,
    ) -> EvalResult {
        let name = self.ctx.method_name;
        let mut frame = self.push_frame(FrameKind::Rescue, true, name)?;
        let id = frame.id();
        loop {
            let err = match frame.eval(body) {
                Ok(value) => {
                    return match else_branch {
                        Some(else_branch) => frame.eval(else_branch),
                        None => Ok(value),
                    }
                }
                Err(ControlAction::Error(err)) if err.is_catchable() => err,
                Err(action) => return Err(action),
            };
            let Some(clause) = frame.matching_clause(&err, rescues) else {
                return Err(err.into());
            };
            tracing::trace!(frame = %id, error = %err, "rescued");
            let action = match frame.run_clause(id, clause, err) {
                Ok(value) => return Ok(value),
                Err(action) => action,
            };
            let signal = claim(action, id)?;
            match signal.reason {
                SignalReason::Retry => frame.counters.count_retry(),
                _ => return Ok(signal.into_value()),
            }
        }
    }

    fn matching_clause<'c>(
        &self,
        err: &EvalError,
        rescues: &'c [RescueClause],
    ) -> Option<&'c RescueClause> {
        let class = err.exception_class()?;
        rescues.iter().find(|clause| {
            if clause.classes.is_empty() {
                return class.is_a(ExceptionClass::StandardError);
            }
            clause
                .classes
                .iter()
                .any(|name| class.is_a(ExceptionClass::from_name(*name, &self.interner)))
        })
    }

    /// Run a rescue clause with `err` bound and `$!` set. `retry` inside the
    /// clause targets `frame`.
    fn run_clause(&mut self, frame: FrameId, clause: &RescueClause, err: EvalError) -> EvalResult {
        let exception = Value::exception(err);
        if let Some(binding) = clause.binding {
            self.ctx.scope.assign(binding, exception.clone());
        }
        let error_info = self.names.error_info;
        let previous = self.globals.insert(error_info, exception);
        self.ctx.jumps.push(JumpContext::Rescue(frame));
        let result = self.eval(clause.body);
        self.ctx.jumps.pop();
        match previous {
            Some(previous) => self.globals.insert(error_info, previous),
            None => self.globals.remove(&error_info),
        };
        result
    }

    /// `raise`, `raise message`, `raise Class`, `raise Class, message`, or
    /// `raise exception` to re-raise.
    pub(crate) fn eval_raise(&mut self, class: Option<Name>, message: Option<ExprId>) -> EvalResult {
        let message = self.eval_or_nil(message)?;
        let err = match (class, message) {
            (None, Value::Exception(existing)) => EvalError::clone(&existing),
            (None, Value::Nil) => match self.globals.get(&self.names.error_info) {
                Some(Value::Exception(current)) => EvalError::clone(current),
                _ => raised(ExceptionClass::RuntimeError, "unhandled exception"),
            },
            (class, message) => {
                let class = class.map_or(ExceptionClass::RuntimeError, |name| {
                    ExceptionClass::from_name(name, &self.interner)
                });
                let message = if message.is_nil() {
                    class.name(&self.interner).to_string()
                } else {
                    message.to_s(&self.interner)
                };
                raised(class, message)
            }
        };
        Err(self.fail(err).into())
    }
}

/// The signal in `action` if it is aimed at `frame`; anything else passes
/// through.
fn claim(action: ControlAction, frame: FrameId) -> Result<ControlSignal, ControlAction> {
    match action.demote() {
        Ok(signal) if signal.targets(frame) => Ok(signal),
        Ok(signal) => Err(signal.rethrow()),
        Err(err) => Err(err.into()),
    }
}
