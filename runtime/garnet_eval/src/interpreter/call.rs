//! Method-call adapter.
//!
//! Every call pushes a `Method` frame for the callee before the block
//! literal is captured, so the closure's converter (the target of `break`
//! and `retry`) is the callee activation. When the callee finishes, signals
//! aimed at its frame are consumed here:
//!
//! - `break` and `return` make the whole call evaluate to the payload
//! - `retry` re-runs the whole call expression, receiver and arguments
//!   included
//!
//! Other signals pass through. A callee entered with a block relays them by
//! value; one entered without a block, and any foreign method, is opaque and
//! promotes them to an `UnwindSignal`.

use super::{ExecContext, Interpreter, JumpContext};
use crate::frames::FrameKind;
use crate::natives::{Callee, ForeignCall, ForeignFn, NativeCall};
use garnet_ir::{Arg, BlockArg, BlockId, ExprId, MethodId, Name, ParamSpec, SharedArena};
use garnet_patterns::{
    type_mismatch, undefined_method, ArgumentBundle, BindMode, Binder, Bindings, BlockClosure,
    Captured, ControlAction, EvalError, EvalResult, FrameId, Heap, MethodValue, ProcValue,
    SharedScope, SignalReason, SignatureFlags, Value,
};
use smallvec::smallvec;

/// A user-defined method: where its body lives.
#[derive(Clone)]
pub(crate) struct MethodEntry {
    pub(crate) arena: SharedArena,
    pub(crate) def: MethodId,
}

/// The block handed to a call.
pub(crate) enum BlockSource {
    None,
    /// A literal, captured once the callee frame exists.
    Literal(BlockId),
    Proc(ProcValue),
}

impl From<Option<ProcValue>> for BlockSource {
    fn from(block: Option<ProcValue>) -> Self {
        block.map_or(BlockSource::None, BlockSource::Proc)
    }
}

/// How a call finished.
pub(crate) enum CallOutcome {
    Done(Value),
    /// A `retry` aimed at the callee: run the call expression again.
    Retry,
}

impl Interpreter {
    /// `receiver.method(args) { block }`.
    pub(crate) fn eval_call(
        &mut self,
        receiver: Option<ExprId>,
        method: Name,
        args: &[Arg],
        block: Option<BlockArg>,
    ) -> EvalResult {
        loop {
            let receiver = match receiver {
                Some(expr) => self.eval(expr)?,
                None => self.ctx.self_value.clone(),
            };
            let args = self.eval_args(args)?;
            let block = match block {
                None => BlockSource::None,
                Some(BlockArg::Literal(id)) => BlockSource::Literal(id),
                Some(BlockArg::Pass(expr)) => {
                    let value = self.eval(expr)?;
                    self.block_from_value(value)?.into()
                }
            };
            let callee = self.resolve_method(&receiver, method)?;
            match self.call_callee(callee, receiver, method, args, block)? {
                CallOutcome::Done(value) => return Ok(value),
                CallOutcome::Retry => {
                    self.counters.count_retry();
                    tracing::debug!(method = self.interner.lookup(method), "retrying call");
                }
            }
        }
    }

    /// Call `method` on `receiver` from host-side code (natives, symbol
    /// procs). A `retry` aimed at the call re-sends it with the same values.
    pub(crate) fn send(
        &mut self,
        receiver: Value,
        method: Name,
        args: ArgumentBundle,
        block: Option<ProcValue>,
    ) -> EvalResult {
        let callee = self.resolve_method(&receiver, method)?;
        self.send_callee(callee, receiver, method, args, block)
    }

    /// `Method#call`, and the body of a `Method#to_proc` closure.
    pub(crate) fn call_method_value(
        &mut self,
        method: &Heap<MethodValue>,
        args: ArgumentBundle,
        block: Option<ProcValue>,
    ) -> EvalResult {
        let callee = Callee::User(MethodEntry {
            arena: method.arena.clone(),
            def: method.def,
        });
        self.send_callee(callee, method.receiver.clone(), method.name, args, block)
    }

    fn send_callee(
        &mut self,
        callee: Callee,
        receiver: Value,
        method: Name,
        args: ArgumentBundle,
        block: Option<ProcValue>,
    ) -> EvalResult {
        loop {
            let outcome = self.call_callee(
                callee.clone(),
                receiver.clone(),
                method,
                args.clone(),
                block.clone().into(),
            )?;
            match outcome {
                CallOutcome::Done(value) => return Ok(value),
                CallOutcome::Retry => self.counters.count_retry(),
            }
        }
    }

    /// Run one activation of `callee` and settle the signals aimed at it.
    #[tracing::instrument(
        level = "trace",
        skip_all,
        fields(method = self.interner.lookup(method), block = !matches!(block, BlockSource::None))
    )]
    fn call_callee(
        &mut self,
        callee: Callee,
        receiver: Value,
        method: Name,
        args: ArgumentBundle,
        block: BlockSource,
    ) -> Result<CallOutcome, ControlAction> {
        let relays = !matches!(block, BlockSource::None) && !matches!(callee, Callee::Foreign(_));
        self.counters.count_method_call();

        let mut frame = self.push_frame(FrameKind::Method, relays, method)?;
        let id = frame.id();
        let block = match block {
            BlockSource::None => None,
            BlockSource::Literal(literal) => Some(frame.capture_block(literal, id)),
            BlockSource::Proc(proc) => Some(proc),
        };

        let result = match callee {
            Callee::User(entry) => frame.run_user_method(id, &entry, receiver, args, block),
            Callee::Native(native) => native(
                &mut frame,
                NativeCall {
                    receiver,
                    args,
                    block,
                },
            ),
            Callee::Foreign(foreign) => frame
                .run_foreign(&foreign, receiver, args, block)
                .map_err(ControlAction::from),
        };

        let action = match result {
            Ok(value) => return Ok(CallOutcome::Done(value)),
            Err(action) => action,
        };
        match action.demote() {
            Err(err) => Err(err.into()),
            Ok(signal) if signal.targets(id) => match signal.reason {
                SignalReason::Retry => Ok(CallOutcome::Retry),
                _ => Ok(CallOutcome::Done(signal.into_value())),
            },
            Ok(signal) if frame.frames.relays_signals(id) => Err(signal.rethrow()),
            Ok(signal) => Err(frame.promote(signal).into()),
        }
    }

    /// Capture a block literal attached to the call whose frame is
    /// `converter`.
    fn capture_block(&self, literal: BlockId, converter: FrameId) -> ProcValue {
        let env = Captured {
            scope: self.ctx.scope.clone(),
            self_value: self.ctx.self_value.clone(),
            owner: self.ctx.return_scope,
            converter: Some(converter),
            outer_block: self.ctx.block.clone(),
        };
        ProcValue::new(BlockClosure::literal(self.ctx.arena.clone(), literal, env))
    }

    /// `m(&value)`: Proc, Method, Symbol or nil.
    pub(crate) fn block_from_value(&self, value: Value) -> Result<Option<ProcValue>, EvalError> {
        match value {
            Value::Nil => Ok(None),
            Value::Proc(proc) => Ok(Some(proc)),
            Value::Method(method) => Ok(Some(ProcValue::new(BlockClosure::from_method(method)))),
            Value::Symbol(name) => Ok(Some(ProcValue::new(BlockClosure::from_symbol(name)))),
            other => Err(self.fail(type_mismatch("Proc", other.class_name(&self.interner)))),
        }
    }

    /// Receiver's class first, then `Exception` for errors, then user
    /// methods, then `Kernel`.
    pub(crate) fn resolve_method(&self, receiver: &Value, method: Name) -> Result<Callee, EvalError> {
        let class = receiver.class_name(&self.interner);
        if let Some(callee) = self.natives.lookup(class, method) {
            return Ok(callee);
        }
        if matches!(receiver, Value::Exception(_)) {
            if let Some(callee) = self.natives.lookup("Exception", method) {
                return Ok(callee);
            }
        }
        if let Some(entry) = self.methods.get(&method) {
            return Ok(Callee::User(entry.clone()));
        }
        if let Some(callee) = self.natives.lookup("Kernel", method) {
            return Ok(callee);
        }
        let target = format!("{}:{class}", receiver.inspect(&self.interner));
        Err(self.fail(undefined_method(self.interner.lookup(method), &target)))
    }

    /// Bind `args` strictly and run a user method body in a fresh scope.
    fn run_user_method(
        &mut self,
        frame: FrameId,
        entry: &MethodEntry,
        receiver: Value,
        args: ArgumentBundle,
        block: Option<ProcValue>,
    ) -> EvalResult {
        let def = entry.arena.method(entry.def);
        let ctx = ExecContext {
            arena: entry.arena.clone(),
            self_value: receiver,
            scope: SharedScope::new_root(),
            block: block.clone(),
            return_scope: Some(frame),
            method_name: def.name,
            jumps: smallvec![JumpContext::Method(frame)],
        };
        let mut this = self.with_context(ctx);
        let block_param = block.map(|block| Value::Proc(block.reified()));
        let flags = SignatureFlags::of(&def.params);
        this.bind_params(&def.params, flags, BindMode::Strict, args, block_param)?;
        this.eval(def.body)
    }

    /// Bind `args` onto `params` in the current scope. Default expressions
    /// run in that scope and see the parameters bound before them.
    pub(crate) fn bind_params(
        &mut self,
        params: &ParamSpec,
        flags: SignatureFlags,
        mode: BindMode,
        args: ArgumentBundle,
        block: Option<Value>,
    ) -> Result<(), ControlAction> {
        let scope = self.ctx.scope.clone();
        let binder = Binder::with_flags(params, flags, mode);
        let bound = binder.bind(args, block, |default, so_far: &Bindings| {
            for (name, value) in so_far.iter() {
                scope.define(*name, value.clone());
            }
            self.eval(default)
        });
        let bindings = bound.map_err(|action| match action {
            ControlAction::Error(err) => ControlAction::Error(self.fail(err)),
            signal => signal,
        })?;
        for (name, value) in bindings {
            scope.define(name, value);
        }
        Ok(())
    }

    fn run_foreign(
        &mut self,
        foreign: &ForeignFn,
        receiver: Value,
        args: ArgumentBundle,
        block: Option<ProcValue>,
    ) -> Result<Value, EvalError> {
        let mut call = ForeignCall::new(self, receiver, args.into_values().into_vec(), block);
        foreign(&mut call)
    }
}
