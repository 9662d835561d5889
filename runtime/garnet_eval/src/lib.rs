#![allow(
    clippy::result_large_err,
    reason = "EvalError travels by value through every evaluation step"
)]
//! Garnet Eval - the block invocation engine.
//!
//! This crate runs programs built with `garnet_ir` over the values and
//! signals of `garnet_patterns`.
//!
//! # Architecture
//!
//! - `Interpreter`: tree-walking evaluator; one interpreter is one call chain
//! - `FrameRegistry`: live activation frames, the liveness oracle for
//!   `break`, `return` and `retry` targets
//! - `invoke_block`: the dispatcher that binds arguments, runs a block and
//!   settles the control signals it produces
//! - Natives: `times`, `each`, `loop`, `lambda`, `Proc#call`, and a foreign
//!   `Array#sort` that control signals cross as `UnwindSignal`s
//!
//! # Re-exports
//!
//! Value, signal and error types are re-exported from `garnet_patterns`, and
//! `Program`/`ProgramBuilder` from `garnet_ir`, so hosts depend on this
//! crate alone.

mod diagnostics;
mod eval_mode;
mod frames;
mod interpreter;
mod natives;
mod print_handler;

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;

use std::sync::Once;

pub use diagnostics::EvalCounters;
pub use eval_mode::EvalMode;
pub use frames::{ActivationFrame, FrameKind, FrameRegistry};
pub use interpreter::{CallerKind, Interpreter, InterpreterBuilder};
pub use natives::{ForeignCall, ForeignFn};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandlerImpl, SharedPrintHandler,
};

pub use garnet_ir::{Program, ProgramBuilder};
pub use garnet_patterns::{
    ArgumentBundle, ControlSignal, EvalError, EvalErrorKind, EvalResult, ExceptionClass, FrameId,
    LocalJumpKind, ProcValue, SignalReason, Value,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `GARNET_LOG=garnet_eval=debug`; `RUST_LOG` is read when
/// `GARNET_LOG` is unset.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let directives = std::env::var("GARNET_LOG").or_else(|_| std::env::var("RUST_LOG"));
        // Only initialize if a filter is set
        if let Ok(directives) = directives {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::new(directives))
                .init();
        }
    });
}
