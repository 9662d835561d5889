//! Native stack growth for the tree-walking evaluator.
//!
//! Guest programs nest blocks inside method calls inside blocks; every level
//! is a Rust recursion in the evaluator. `redo` and `retry` are already flat
//! loops, so the only unbounded recursion left is syntactic nesting and
//! guest-level method recursion, which the frame registry caps separately.
//!
//! Native targets grow the stack with `stacker`; wasm calls straight through.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each freshly allocated stack segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the native stack if it is close to exhausted.
///
/// Wrap every re-entrant evaluation step (expression dispatch, block body
/// execution) with this.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// wasm manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
