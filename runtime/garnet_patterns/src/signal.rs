//! Control signals: the value-returned outcome of running a block body.
//!
//! The fast path relays a [`ControlSignal`] through every protocol-aware
//! frame as an ordinary return value. Only when a signal must cross a frame
//! that cannot relay it is it wrapped in an [`UnwindSignal`] and carried as an
//! error. Once wrapped, the same instance is reused for the rest of the
//! transfer, even if a protocol-aware frame demotes it back to a plain signal
//! in between.

use crate::errors::{EvalError, EvalErrorKind};
use crate::value::Value;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Result of evaluating one expression.
pub type EvalResult = Result<Value, ControlAction>;

/// Why a block body stopped.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SignalReason {
    Normal,
    Next,
    Break,
    Redo,
    Retry,
    Return,
}

impl SignalReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalReason::Normal => "normal",
            SignalReason::Next => "next",
            SignalReason::Break => "break",
            SignalReason::Redo => "redo",
            SignalReason::Retry => "retry",
            SignalReason::Return => "return",
        }
    }
}

impl fmt::Display for SignalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one frame registry, i.e. one logical call chain.
///
/// Frame ids from different chains never compare equal, which is how a
/// closure handed to another thread fails its target checks.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChainId(u32);

static NEXT_CHAIN: AtomicU32 = AtomicU32::new(1);

impl ChainId {
    /// A chain id never handed out before in this process.
    pub fn fresh() -> Self {
        ChainId(NEXT_CHAIN.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Key into an activation-frame registry.
///
/// Indices grow monotonically within a chain and are never reused, so a
/// stack of live frames is always sorted by index.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FrameId {
    chain: ChainId,
    index: u64,
}

impl FrameId {
    pub const fn new(chain: ChainId, index: u64) -> Self {
        FrameId { chain, index }
    }

    pub const fn chain(self) -> ChainId {
        self.chain
    }

    pub const fn index(self) -> u64 {
        self.index
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.chain.0, self.index)
    }
}

/// Outcome of a block body, relayed by value.
#[derive(Clone, Debug)]
pub struct ControlSignal {
    pub reason: SignalReason,
    pub value: Value,
    pub target: Option<FrameId>,
    /// Set once this transfer has been promoted; reused on the next crossing.
    unwinder: Option<Arc<UnwindSignal>>,
}

impl ControlSignal {
    fn with(reason: SignalReason, value: Value, target: Option<FrameId>) -> Self {
        ControlSignal {
            reason,
            value,
            target,
            unwinder: None,
        }
    }

    pub fn normal(value: Value) -> Self {
        Self::with(SignalReason::Normal, value, None)
    }

    pub fn next(value: Value, target: Option<FrameId>) -> Self {
        Self::with(SignalReason::Next, value, target)
    }

    pub fn break_to(value: Value, target: Option<FrameId>) -> Self {
        Self::with(SignalReason::Break, value, target)
    }

    pub fn redo(target: Option<FrameId>) -> Self {
        Self::with(SignalReason::Redo, Value::Nil, target)
    }

    /// Retry carries no payload.
    pub fn retry(target: Option<FrameId>) -> Self {
        Self::with(SignalReason::Retry, Value::Nil, target)
    }

    pub fn return_to(value: Value, target: Option<FrameId>) -> Self {
        Self::with(SignalReason::Return, value, target)
    }

    pub fn is_normal(&self) -> bool {
        self.reason == SignalReason::Normal
    }

    pub fn targets(&self, frame: FrameId) -> bool {
        self.target == Some(frame)
    }

    /// The promoted instance carrying this transfer, if any.
    pub fn unwinder(&self) -> Option<&Arc<UnwindSignal>> {
        self.unwinder.as_ref()
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Wrap in a fresh `UnwindSignal`, or hand back the one this transfer
    /// already has. The flag reports whether an instance was created.
    pub fn into_unwinder(self) -> (Arc<UnwindSignal>, bool) {
        match self.unwinder {
            Some(existing) => (existing, false),
            None => (
                Arc::new(UnwindSignal {
                    reason: self.reason,
                    value: self.value,
                    target: self.target,
                }),
                true,
            ),
        }
    }

    /// Put the signal back on the value-return path.
    pub fn rethrow(self) -> ControlAction {
        ControlAction::Signal(self)
    }
}

impl PartialEq for ControlSignal {
    fn eq(&self, other: &Self) -> bool {
        self.reason == other.reason && self.target == other.target && self.value == other.value
    }
}

/// A control signal in exception form, for crossing frames that cannot relay
/// a returned signal: foreign host methods and dynamically evaluated code.
///
/// Never caught by guest `rescue` clauses.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{reason} in flight{}", .target.map(|t| format!(" toward frame {t}")).unwrap_or_default())]
pub struct UnwindSignal {
    pub reason: SignalReason,
    pub value: Value,
    pub target: Option<FrameId>,
}

impl UnwindSignal {
    /// Demote to a plain signal that remembers this instance.
    pub fn to_signal(self: &Arc<Self>) -> ControlSignal {
        ControlSignal {
            reason: self.reason,
            value: self.value.clone(),
            target: self.target,
            unwinder: Some(Arc::clone(self)),
        }
    }
}

/// Why evaluation of an expression did not produce a value.
#[derive(Clone, Debug)]
pub enum ControlAction {
    /// Fast path: a non-normal signal relayed by value.
    Signal(ControlSignal),
    /// A guest exception, or an `UnwindSignal` in flight.
    Error(EvalError),
}

impl ControlAction {
    /// View the action as a control transfer if it is one.
    ///
    /// In-flight `UnwindSignal`s are demoted back to plain signals; every
    /// other error comes back unchanged.
    pub fn demote(self) -> Result<ControlSignal, EvalError> {
        match self {
            ControlAction::Signal(signal) => Ok(signal),
            ControlAction::Error(err) => match &err.kind {
                EvalErrorKind::Unwind(unwinder) => Ok(unwinder.to_signal()),
                _ => Err(err),
            },
        }
    }
}

impl From<EvalError> for ControlAction {
    fn from(err: EvalError) -> Self {
        ControlAction::Error(err)
    }
}

impl From<crate::ArityError> for ControlAction {
    fn from(err: crate::ArityError) -> Self {
        ControlAction::Error(err.into())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
