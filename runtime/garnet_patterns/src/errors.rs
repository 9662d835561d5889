//! Error taxonomy of the block runtime.
//!
//! `EvalErrorKind` gives every failure a typed category; factory functions
//! (`local_jump`, `no_block_given`, ...) are the public construction API and
//! fill in both `kind` and `message`.
//!
//! Every kind except [`EvalErrorKind::Unwind`] is an ordinary guest exception
//! and can be rescued. `Unwind` is the slow-path carrier for control signals.

use crate::signal::{SignalReason, UnwindSignal};
use garnet_ir::{BinaryOp, Name, StringInterner};
use std::fmt;
use std::sync::Arc;

/// Accepted argument counts of a strict binding.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ArityRange {
    pub min: usize,
    /// `None` when a rest parameter accepts any surplus.
    pub max: Option<usize>,
}

impl ArityRange {
    pub fn contains(self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for ArityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", self.min),
            Some(max) => write!(f, "{}..{max}", self.min),
            None => write!(f, "{}+", self.min),
        }
    }
}

/// Strict binding received an argument count outside the accepted range.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("wrong number of arguments (given {given}, expected {expected})")]
pub struct ArityError {
    pub given: usize,
    pub expected: ArityRange,
}

/// Which LocalJumpError was raised.
///
/// The message is selected by the operator and the place the problem was
/// detected.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LocalJumpKind {
    /// `return` whose owner activation is gone, detected when thrown.
    UnexpectedReturn,
    ReturnFromProcClosure,
    BreakFromProcClosure,
    RetryFromProcClosure,
    /// `yield` with no block.
    NoBlockGiven,
    UnexpectedBreak,
    UnexpectedNext,
    UnexpectedRedo,
    /// `retry` with no rescue clause or iteration around it.
    RetryOutOfRescue,
}

impl LocalJumpKind {
    pub fn message(self) -> &'static str {
        match self {
            LocalJumpKind::UnexpectedReturn => "unexpected return",
            LocalJumpKind::ReturnFromProcClosure => "return from proc-closure",
            LocalJumpKind::BreakFromProcClosure => "break from proc-closure",
            LocalJumpKind::RetryFromProcClosure => "retry from proc-closure",
            LocalJumpKind::NoBlockGiven => "no block given (yield)",
            LocalJumpKind::UnexpectedBreak => "unexpected break",
            LocalJumpKind::UnexpectedNext => "unexpected next",
            LocalJumpKind::UnexpectedRedo => "unexpected redo",
            LocalJumpKind::RetryOutOfRescue => "retry used out of rescue",
        }
    }

    /// The guest-visible `LocalJumpError#reason` symbol.
    pub fn reason(self) -> &'static str {
        match self {
            LocalJumpKind::UnexpectedReturn | LocalJumpKind::ReturnFromProcClosure => "return",
            LocalJumpKind::BreakFromProcClosure | LocalJumpKind::UnexpectedBreak => "break",
            LocalJumpKind::RetryFromProcClosure | LocalJumpKind::RetryOutOfRescue => "retry",
            LocalJumpKind::UnexpectedNext => "next",
            LocalJumpKind::UnexpectedRedo => "redo",
            LocalJumpKind::NoBlockGiven => "noreason",
        }
    }

    /// A signal that reached a point where nothing can honour it.
    pub fn orphaned(reason: SignalReason) -> Self {
        match reason {
            SignalReason::Return | SignalReason::Normal => LocalJumpKind::UnexpectedReturn,
            SignalReason::Break => LocalJumpKind::UnexpectedBreak,
            SignalReason::Next => LocalJumpKind::UnexpectedNext,
            SignalReason::Redo => LocalJumpKind::UnexpectedRedo,
            SignalReason::Retry => LocalJumpKind::RetryOutOfRescue,
        }
    }

    /// A proc-closure's target activation is no longer live.
    pub fn stale_target(reason: SignalReason) -> Self {
        match reason {
            SignalReason::Break => LocalJumpKind::BreakFromProcClosure,
            SignalReason::Retry => LocalJumpKind::RetryFromProcClosure,
            _ => LocalJumpKind::ReturnFromProcClosure,
        }
    }
}

/// Guest exception classes the runtime knows by name.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ExceptionClass {
    Exception,
    StandardError,
    RuntimeError,
    ArgumentError,
    LocalJumpError,
    TypeError,
    NameError,
    NoMethodError,
    ZeroDivisionError,
    SystemStackError,
    /// A user-named class; treated as a `StandardError` subclass.
    Custom(Name),
}

impl ExceptionClass {
    const BUILTIN: [(&'static str, ExceptionClass); 10] = [
        ("Exception", ExceptionClass::Exception),
        ("StandardError", ExceptionClass::StandardError),
        ("RuntimeError", ExceptionClass::RuntimeError),
        ("ArgumentError", ExceptionClass::ArgumentError),
        ("LocalJumpError", ExceptionClass::LocalJumpError),
        ("TypeError", ExceptionClass::TypeError),
        ("NameError", ExceptionClass::NameError),
        ("NoMethodError", ExceptionClass::NoMethodError),
        ("ZeroDivisionError", ExceptionClass::ZeroDivisionError),
        ("SystemStackError", ExceptionClass::SystemStackError),
    ];

    pub fn from_name(name: Name, interner: &StringInterner) -> Self {
        let text = interner.lookup(name);
        Self::BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == text)
            .map_or(ExceptionClass::Custom(name), |(_, class)| *class)
    }

    pub fn name(self, interner: &StringInterner) -> &'static str {
        match self {
            ExceptionClass::Custom(name) => interner.lookup(name),
            builtin => Self::BUILTIN
                .iter()
                .find(|(_, class)| *class == builtin)
                .map_or("Exception", |(text, _)| text),
        }
    }

    fn parent(self) -> Option<ExceptionClass> {
        match self {
            ExceptionClass::Exception => None,
            ExceptionClass::StandardError | ExceptionClass::SystemStackError => {
                Some(ExceptionClass::Exception)
            }
            ExceptionClass::NoMethodError => Some(ExceptionClass::NameError),
            _ => Some(ExceptionClass::StandardError),
        }
    }

    /// `self <= ancestor` in the class hierarchy.
    pub fn is_a(self, ancestor: ExceptionClass) -> bool {
        let mut class = Some(self);
        while let Some(current) = class {
            if current == ancestor {
                return true;
            }
            class = current.parent();
        }
        false
    }
}

/// Typed error category.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalErrorKind {
    Arity(ArityError),
    LocalJump(LocalJumpKind),
    UndefinedLocal {
        name: String,
    },
    UndefinedMethod {
        method: String,
        receiver: String,
    },
    TypeMismatch {
        expected: String,
        got: String,
    },
    InvalidBinaryOp {
        op: BinaryOp,
        left: String,
        right: String,
    },
    DivisionByZero,
    StackOverflow {
        depth: usize,
    },
    /// The registry has handed out every frame index.
    FrameIdsExhausted,
    /// Raised by guest code; `message` lives on the error.
    Raised {
        class: ExceptionClass,
    },
    /// A control signal crossing an opaque frame.
    Unwind(Arc<UnwindSignal>),
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arity(err) => write!(f, "{err}"),
            Self::LocalJump(kind) => f.write_str(kind.message()),
            Self::UndefinedLocal { name } => {
                write!(f, "undefined local variable or method `{name}'")
            }
            Self::UndefinedMethod { method, receiver } => {
                write!(f, "undefined method `{method}' for {receiver}")
            }
            Self::TypeMismatch { expected, got } => {
                write!(f, "wrong argument type {got} (expected {expected})")
            }
            Self::InvalidBinaryOp { op, left, right } => write!(
                f,
                "undefined operator `{}' for {left} with {right}",
                op.as_symbol()
            ),
            Self::DivisionByZero => f.write_str("divided by 0"),
            Self::FrameIdsExhausted => f.write_str("activation frame ids exhausted"),
            Self::StackOverflow { depth } => {
                write!(f, "stack level too deep (limit: {depth})")
            }
            Self::Raised { class } => write!(f, "{class:?}"),
            Self::Unwind(unwinder) => write!(f, "{unwinder}"),
        }
    }
}

/// A single frame in a captured backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// `method`, `block in method`, `loop`, ...
    pub name: String,
}

/// Snapshot of the activation stack at an error site, innermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(f, "  {i}: {}", frame.name)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors.
    pub message: String,
    /// Activation stack where the error was raised, when captured.
    pub backtrace: Option<EvalBacktrace>,
}

impl EvalError {
    /// A `RuntimeError` with `message`, as `raise "message"` produces.
    pub fn new(message: impl Into<String>) -> Self {
        raised(ExceptionClass::RuntimeError, message)
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            backtrace: None,
        }
    }

    /// Carry a promoted control signal.
    pub fn unwind(unwinder: Arc<UnwindSignal>) -> Self {
        Self::from_kind(EvalErrorKind::Unwind(unwinder))
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    /// Guest `rescue` may intercept this error.
    pub fn is_catchable(&self) -> bool {
        !matches!(self.kind, EvalErrorKind::Unwind(_))
    }

    pub fn local_jump_kind(&self) -> Option<LocalJumpKind> {
        match self.kind {
            EvalErrorKind::LocalJump(kind) => Some(kind),
            _ => None,
        }
    }

    /// Guest class of this error; `None` for control-flow transport.
    pub fn exception_class(&self) -> Option<ExceptionClass> {
        Some(match &self.kind {
            EvalErrorKind::Arity(_) => ExceptionClass::ArgumentError,
            EvalErrorKind::LocalJump(_) => ExceptionClass::LocalJumpError,
            EvalErrorKind::UndefinedLocal { .. } => ExceptionClass::NameError,
            EvalErrorKind::UndefinedMethod { .. } => ExceptionClass::NoMethodError,
            EvalErrorKind::TypeMismatch { .. } | EvalErrorKind::InvalidBinaryOp { .. } => {
                ExceptionClass::TypeError
            }
            EvalErrorKind::DivisionByZero => ExceptionClass::ZeroDivisionError,
            EvalErrorKind::StackOverflow { .. } | EvalErrorKind::FrameIdsExhausted => {
                ExceptionClass::SystemStackError
            }
            EvalErrorKind::Raised { class } => *class,
            EvalErrorKind::Unwind(_) => return None,
        })
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

impl PartialEq for EvalError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl From<ArityError> for EvalError {
    fn from(err: ArityError) -> Self {
        arity_error(err)
    }
}

// Factories

#[cold]
pub fn arity_error(err: ArityError) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Arity(err))
}

#[cold]
pub fn local_jump(kind: LocalJumpKind) -> EvalError {
    EvalError::from_kind(EvalErrorKind::LocalJump(kind))
}

#[cold]
pub fn no_block_given() -> EvalError {
    local_jump(LocalJumpKind::NoBlockGiven)
}

#[cold]
pub fn undefined_local(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedLocal {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_method(method: &str, receiver: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMethod {
        method: method.to_string(),
        receiver: receiver.to_string(),
    })
}

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn invalid_binary_op(op: BinaryOp, left: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidBinaryOp {
        op,
        left: left.to_string(),
        right: right.to_string(),
    })
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn stack_overflow(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth })
}

#[cold]
pub fn frame_ids_exhausted() -> EvalError {
    EvalError::from_kind(EvalErrorKind::FrameIdsExhausted)
}

/// A guest `raise` of `class` with `message`.
#[cold]
pub fn raised(class: ExceptionClass, message: impl Into<String>) -> EvalError {
    EvalError {
        kind: EvalErrorKind::Raised { class },
        message: message.into(),
        backtrace: None,
    }
}
