//! RAII guards for activation frames and execution contexts.
//!
//! A [`FrameGuard`] pops its registry frame when dropped, on every exit path
//! including panics. A [`ContextGuard`] restores the caller's
//! `ExecContext`. Both hold `&mut Interpreter` and deref to it, so guarded
//! code calls interpreter methods directly. Guards nest: a block invocation
//! holds a context guard inside a frame guard, and drop order restores the
//! context before the frame goes away.

use std::ops::{Deref, DerefMut};

use super::{ExecContext, Interpreter, JumpContext};
use crate::frames::FrameKind;
use garnet_ir::Name;
use garnet_patterns::{EvalError, FrameId};

/// Keeps a registry frame live while held.
pub struct FrameGuard<'a> {
    interpreter: &'a mut Interpreter,
    frame: FrameId,
    /// Also pop the lexical jump context pushed with the frame.
    pops_jump: bool,
}

impl FrameGuard<'_> {
    pub fn id(&self) -> FrameId {
        self.frame
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if self.pops_jump {
            self.interpreter.ctx.jumps.pop();
        }
        self.interpreter.frames.pop(self.frame);
    }
}

impl Deref for FrameGuard<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Interpreter {
        self.interpreter
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Interpreter {
        self.interpreter
    }
}

/// Restores the saved execution context when dropped.
pub struct ContextGuard<'a> {
    interpreter: &'a mut Interpreter,
    saved: Option<ExecContext>,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.interpreter.ctx = saved;
        }
    }
}

impl Deref for ContextGuard<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Interpreter {
        self.interpreter
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut Interpreter {
        self.interpreter
    }
}

impl Interpreter {
    /// Push a frame that is popped when the guard drops.
    pub(crate) fn push_frame(
        &mut self,
        kind: FrameKind,
        relays_signals: bool,
        name: Name,
    ) -> Result<FrameGuard<'_>, EvalError> {
        let frame = self
            .frames
            .push(kind, relays_signals, name)
            .map_err(|err| self.fail(err))?;
        self.counters.count_frame();
        Ok(FrameGuard {
            interpreter: self,
            frame,
            pops_jump: false,
        })
    }

    /// Push a loop or `for` frame together with the jump context that makes
    /// it a target for `break`, `next`, `redo` and `retry`.
    pub(crate) fn push_construct(
        &mut self,
        kind: FrameKind,
        jump: fn(FrameId) -> JumpContext,
    ) -> Result<FrameGuard<'_>, EvalError> {
        let name = self.ctx.method_name;
        let mut guard = self.push_frame(kind, true, name)?;
        let frame = guard.frame;
        guard.ctx.jumps.push(jump(frame));
        guard.pops_jump = true;
        Ok(guard)
    }

    /// Swap in `ctx` until the guard drops.
    pub(crate) fn with_context(&mut self, ctx: ExecContext) -> ContextGuard<'_> {
        let saved = std::mem::replace(&mut self.ctx, ctx);
        ContextGuard {
            interpreter: self,
            saved: Some(saved),
        }
    }
}
