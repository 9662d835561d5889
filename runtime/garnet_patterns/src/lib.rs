#![allow(
    clippy::result_large_err,
    reason = "EvalError travels by value through every evaluation step"
)]
//! Garnet Patterns - the data half of the block runtime.
//!
//! This crate provides:
//! - Runtime values (`Value`, `Heap`, `ProcValue`, `BlockClosure`, `MethodValue`)
//! - Lexical scopes captured by closures (`SharedScope`)
//! - The parameter pattern matcher (`bind`, `Binder`, `ArgumentBundle`, `Bindings`)
//!   and arity reporting (`arity`, `method_arity`)
//! - Control signals (`ControlSignal`, `SignalReason`, `FrameId`) and the
//!   slow-path transport exception (`UnwindSignal`)
//! - The error taxonomy (`EvalError`, `EvalErrorKind`, `ArityError`, `LocalJumpKind`)
//!
//! Everything here is pure data plus algorithms over it. Frame bookkeeping and
//! body execution live in `garnet_eval`.

mod arity;
mod binder;
mod errors;
mod scope;
mod signal;
mod value;

pub use arity::{arity, method_arity};
pub use binder::{
    bind, ArgumentBundle, Argument, BindMode, Binder, Bindings, SignatureFlags,
};
pub use errors::{
    arity_error, division_by_zero, frame_ids_exhausted, invalid_binary_op, local_jump, no_block_given, raised,
    stack_overflow, type_mismatch, undefined_local, undefined_method, ArityError, ArityRange,
    BacktraceFrame, EvalBacktrace, EvalError, EvalErrorKind, ExceptionClass, LocalJumpKind,
};
pub use scope::{Scope, SharedScope};
pub use signal::{ChainId, ControlAction, ControlSignal, EvalResult, FrameId, SignalReason, UnwindSignal};
pub use value::{
    BlockBody, BlockClosure, Captured, Heap, MethodValue, ProcValue, RangeValue, Value,
};
