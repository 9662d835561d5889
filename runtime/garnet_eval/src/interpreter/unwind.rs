//! Promotion of control signals to `UnwindSignal`.
//!
//! Signals normally travel by value through `EvalResult`. A frame that
//! cannot hand a returned signal back to its caller (a method entered
//! without a block, a foreign host method, dynamically evaluated code)
//! promotes it: the signal is wrapped in an `UnwindSignal` carried by
//! `EvalError::Unwind`, and demoted again where a frame consumes it.
//!
//! A transfer is promoted at most once. The signal remembers its
//! `UnwindSignal`, and crossing a second opaque frame reuses it, so
//! `unwind_signals_created` counts transfers, not crossings.

use super::Interpreter;
use garnet_ir::ExprId;
use garnet_patterns::{ControlSignal, EvalError, EvalResult};

impl Interpreter {
    /// Wrap `signal` for transport past an opaque frame.
    pub(crate) fn promote(&mut self, signal: ControlSignal) -> EvalError {
        let (unwinder, created) = signal.into_unwinder();
        if created {
            self.counters.count_unwind_signal();
            tracing::debug!(reason = %unwinder.reason, target = ?unwinder.target, "promoted control signal");
        } else {
            tracing::trace!(reason = %unwinder.reason, "reusing promoted control signal");
        }
        EvalError::unwind(unwinder)
    }

    /// `eval(code)`: the code runs in the current context, but signals
    /// leaving it always cross as exceptions.
    pub(crate) fn eval_dynamic(&mut self, code: ExprId) -> EvalResult {
        match self.eval(code) {
            Ok(value) => Ok(value),
            Err(action) => match action.demote() {
                Ok(signal) => Err(self.promote(signal).into()),
                Err(err) => Err(err.into()),
            },
        }
    }
}
