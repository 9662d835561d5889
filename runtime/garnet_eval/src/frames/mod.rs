//! Activation-frame registry.
//!
//! One registry per interpreter, i.e. per logical call chain. Frames are
//! pushed on entry to a method activation, a block invocation, a loop or a
//! `begin/rescue`, and popped on every exit. Liveness is stack membership:
//! there is no per-frame flag to keep in sync.
//!
//! Ids carry the registry's [`ChainId`], and indices grow monotonically, so
//! the live stack is sorted by index and `is_active` is a binary search. An
//! id minted by another registry (another thread's interpreter) is never
//! active here.

use garnet_ir::{Name, StringInterner};
use garnet_patterns::{
    frame_ids_exhausted, stack_overflow, BacktraceFrame, ChainId, EvalBacktrace, EvalError, FrameId,
};

/// What pushed a frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FrameKind {
    Method,
    Block,
    /// `while`/`until` and `for`.
    Loop,
    Rescue,
}

/// One live activation.
#[derive(Clone, Debug)]
pub struct ActivationFrame {
    pub id: FrameId,
    pub kind: FrameKind,
    /// Frame that was current when this one was pushed.
    pub parent: Option<FrameId>,
    /// Whether control signals escaping this frame travel by value.
    pub relays_signals: bool,
    /// Method name for method frames, enclosing method for blocks.
    pub name: Name,
}

/// Stack of live frames for one call chain.
#[derive(Debug)]
pub struct FrameRegistry {
    chain: ChainId,
    frames: Vec<ActivationFrame>,
    next_index: u64,
    max_depth: Option<usize>,
}

impl FrameRegistry {
    /// An empty registry on a fresh chain.
    pub fn new(max_depth: Option<usize>) -> Self {
        FrameRegistry {
            chain: ChainId::fresh(),
            frames: Vec::new(),
            next_index: 0,
            max_depth,
        }
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Push a frame whose parent is the current frame.
    ///
    /// Fails with `SystemStackError` past the depth limit or once every
    /// index has been handed out; nothing is pushed in either case.
    pub fn push(&mut self, kind: FrameKind, relays_signals: bool, name: Name) -> Result<FrameId, EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(stack_overflow(max));
            }
        }
        let id = FrameId::new(self.chain, self.next_index);
        self.next_index = self
            .next_index
            .checked_add(1)
            .ok_or_else(frame_ids_exhausted)?;
        self.frames.push(ActivationFrame {
            id,
            kind,
            parent: self.current(),
            relays_signals,
            name,
        });
        Ok(id)
    }

    /// Pop `id` and anything pushed after it.
    pub fn pop(&mut self, id: FrameId) {
        debug_assert_eq!(
            self.frames.last().map(|f| f.id),
            Some(id),
            "frames must be popped in push order"
        );
        if let Some(pos) = self.position(id) {
            self.frames.truncate(pos);
        }
    }

    pub fn is_active(&self, id: FrameId) -> bool {
        self.position(id).is_some()
    }

    pub fn current(&self) -> Option<FrameId> {
        self.frames.last().map(|f| f.id)
    }

    pub fn get(&self, id: FrameId) -> Option<&ActivationFrame> {
        self.position(id).map(|pos| &self.frames[pos])
    }

    /// Whether signals that pass through `id` travel on by value.
    pub fn relays_signals(&self, id: FrameId) -> bool {
        self.get(id).is_some_and(|f| f.relays_signals)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Snapshot of the live stack, innermost first.
    pub fn capture(&self, interner: &StringInterner) -> EvalBacktrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .map(|frame| {
                let name = interner.lookup(frame.name);
                BacktraceFrame {
                    name: match frame.kind {
                        FrameKind::Method => name.to_string(),
                        FrameKind::Block => format!("block in {name}"),
                        FrameKind::Loop => format!("loop in {name}"),
                        FrameKind::Rescue => format!("rescue in {name}"),
                    },
                }
            })
            .collect();
        EvalBacktrace::new(frames)
    }

    /// Attach a backtrace of the live stack to `err` unless it has one.
    pub fn attach_backtrace(&self, err: EvalError, interner: &StringInterner) -> EvalError {
        if err.backtrace.is_some() || self.frames.is_empty() {
            return err;
        }
        err.with_backtrace(self.capture(interner))
    }

    fn position(&self, id: FrameId) -> Option<usize> {
        if id.chain() != self.chain {
            return None;
        }
        self.frames
            .binary_search_by_key(&id.index(), |frame| frame.id.index())
            .ok()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
