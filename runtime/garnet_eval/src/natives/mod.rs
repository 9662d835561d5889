//! Built-in methods and the host-method bridge.
//!
//! Natives are plain function pointers, registered once per interpreter by
//! `(class, method)`. They run inside the callee frame the call adapter
//! pushed and hand signals back by value, so blocks they yield to can
//! `break`, `next` and `return` without allocating.
//!
//! Foreign methods are host closures registered through
//! `InterpreterBuilder::foreign_method`. They see a [`ForeignCall`] and
//! return `Result<Value, EvalError>`, so a control signal from a block they
//! yield to can only cross them as an `UnwindSignal`.
//!
//! # Module Structure
//!
//! - `kernel`: `puts`, `print`, `p`, `lambda`, `proc`, `loop`, `method`
//! - `numeric`: `Integer` and `Range` iteration
//! - `array`: `Array` iteration and the foreign `sort`
//! - `procs`: `Proc`, `Method`, `Symbol` and `Exception` methods

mod array;
mod kernel;
mod numeric;
mod procs;

use std::sync::Arc;

use crate::interpreter::{CallerKind, Interpreter, MethodEntry};
use garnet_ir::{Name, StringInterner};
use garnet_patterns::{
    arity_error, no_block_given, ArgumentBundle, ArityError, ArityRange, EvalError, EvalResult,
    ProcValue, Value,
};
use rustc_hash::FxHashMap;

/// A built-in method.
pub(crate) type NativeFn = fn(&mut Interpreter, NativeCall) -> EvalResult;

/// A host-implemented method.
pub type ForeignFn = Arc<dyn Fn(&mut ForeignCall<'_>) -> Result<Value, EvalError> + Send + Sync>;

/// Receiver, arguments and block of a native call.
pub(crate) struct NativeCall {
    pub(crate) receiver: Value,
    pub(crate) args: ArgumentBundle,
    pub(crate) block: Option<ProcValue>,
}

impl NativeCall {
    pub(crate) fn arg(&self, index: usize) -> Option<&Value> {
        self.args.values().nth(index)
    }

    /// Fail with `ArgumentError` unless the argument count is in
    /// `min..=max`.
    pub(crate) fn check_arity(
        &self,
        interp: &Interpreter,
        min: usize,
        max: Option<usize>,
    ) -> Result<(), EvalError> {
        let expected = ArityRange { min, max };
        if expected.contains(self.args.len()) {
            return Ok(());
        }
        let err = ArityError {
            given: self.args.len(),
            expected,
        };
        Err(interp.fail(arity_error(err)))
    }

    /// The block, or `LocalJumpError` (no block given).
    pub(crate) fn require_block(&self, interp: &Interpreter) -> Result<ProcValue, EvalError> {
        self.block
            .clone()
            .ok_or_else(|| interp.fail(no_block_given()))
    }
}

/// What a method name resolved to.
#[derive(Clone)]
pub(crate) enum Callee {
    User(MethodEntry),
    Native(NativeFn),
    Foreign(ForeignFn),
}

/// Built-in and foreign methods by `(class, method)`.
#[derive(Default)]
pub(crate) struct NativeRegistry {
    methods: FxHashMap<(&'static str, Name), Callee>,
}

impl NativeRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register every built-in method.
    pub(crate) fn install(&mut self, interner: &StringInterner) {
        kernel::register(self, interner);
        numeric::register(self, interner);
        array::register(self, interner);
        procs::register(self, interner);
    }

    pub(crate) fn register_native(
        &mut self,
        interner: &StringInterner,
        class: &'static str,
        method: &str,
        native: NativeFn,
    ) {
        self.methods
            .insert((class, interner.intern(method)), Callee::Native(native));
    }

    /// Register a host method; replaces a built-in of the same name.
    pub(crate) fn register_foreign(
        &mut self,
        interner: &StringInterner,
        class: &str,
        method: &str,
        foreign: ForeignFn,
    ) {
        let class = interner.lookup(interner.intern(class));
        self.methods
            .insert((class, interner.intern(method)), Callee::Foreign(foreign));
    }

    pub(crate) fn lookup(&self, class: &'static str, method: Name) -> Option<Callee> {
        self.methods.get(&(class, method)).cloned()
    }
}

/// The view a foreign method has of its call.
pub struct ForeignCall<'a> {
    interp: &'a mut Interpreter,
    receiver: Value,
    args: Vec<Value>,
    block: Option<ProcValue>,
}

impl<'a> ForeignCall<'a> {
    pub(crate) fn new(
        interp: &'a mut Interpreter,
        receiver: Value,
        args: Vec<Value>,
        block: Option<ProcValue>,
    ) -> Self {
        Self {
            interp,
            receiver,
            args,
            block,
        }
    }

    pub fn receiver(&self) -> &Value {
        &self.receiver
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn has_block(&self) -> bool {
        self.block.is_some()
    }

    /// Yield `values` to the block.
    ///
    /// A `next` from the block comes back as its value. Any other signal
    /// leaves the block as an `EvalError::Unwind`; return it unchanged so it
    /// reaches the frame it targets.
    pub fn yield_values(&mut self, values: Vec<Value>) -> Result<Value, EvalError> {
        let Some(block) = self.block.clone() else {
            return Err(self.interp.fail(no_block_given()));
        };
        let args = ArgumentBundle::from_values(values);
        let signal = self
            .interp
            .invoke_block(&block, args, None, CallerKind::Yield)?;
        if signal.is_normal() {
            Ok(signal.into_value())
        } else {
            Err(self.interp.promote(signal))
        }
    }

    /// Whether `proc` may still `return` to its owner; see
    /// [`Interpreter::is_valid`].
    pub fn is_valid(&self, proc: &ProcValue) -> bool {
        self.interp.is_valid(proc)
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interp.interner
    }

    /// `inspect` of `value`, for error messages.
    pub fn inspect(&self, value: &Value) -> String {
        value.inspect(&self.interp.interner)
    }

    /// Attach the current backtrace to an error the host method raises.
    pub fn fail(&self, err: EvalError) -> EvalError {
        self.interp.fail(err)
    }
}
