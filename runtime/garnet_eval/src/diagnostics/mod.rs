//! Evaluation counters.
//!
//! Always on: the counters are plain integers bumped with wrapping
//! arithmetic, and `unwind_signals_created` is how callers observe whether a
//! non-local transfer stayed on the value-return path.

/// Per-interpreter event counts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalCounters {
    pub blocks_invoked: u64,
    pub method_calls: u64,
    pub frames_pushed: u64,
    pub redo_iterations: u64,
    pub retries: u64,
    /// Distinct `UnwindSignal` instances created.
    pub unwind_signals_created: u64,
}

impl EvalCounters {
    #[inline]
    pub fn count_block(&mut self) {
        self.blocks_invoked = self.blocks_invoked.wrapping_add(1);
    }

    #[inline]
    pub fn count_method_call(&mut self) {
        self.method_calls = self.method_calls.wrapping_add(1);
    }

    #[inline]
    pub fn count_frame(&mut self) {
        self.frames_pushed = self.frames_pushed.wrapping_add(1);
    }

    #[inline]
    pub fn count_redo(&mut self) {
        self.redo_iterations = self.redo_iterations.wrapping_add(1);
    }

    #[inline]
    pub fn count_retry(&mut self) {
        self.retries = self.retries.wrapping_add(1);
    }

    #[inline]
    pub fn count_unwind_signal(&mut self) {
        self.unwind_signals_created = self.unwind_signals_created.wrapping_add(1);
    }

    /// Fold another interpreter's counts into these.
    pub fn merge(&mut self, other: &EvalCounters) {
        self.blocks_invoked = self.blocks_invoked.wrapping_add(other.blocks_invoked);
        self.method_calls = self.method_calls.wrapping_add(other.method_calls);
        self.frames_pushed = self.frames_pushed.wrapping_add(other.frames_pushed);
        self.redo_iterations = self.redo_iterations.wrapping_add(other.redo_iterations);
        self.retries = self.retries.wrapping_add(other.retries);
        self.unwind_signals_created = self
            .unwind_signals_created
            .wrapping_add(other.unwind_signals_created);
    }

    pub fn report(&self) -> String {
        format!(
            "Evaluation profile:\n  \
             Blocks invoked:         {}\n  \
             Method calls:           {}\n  \
             Frames pushed:          {}\n  \
             Redo iterations:        {}\n  \
             Retries:                {}\n  \
             Unwind signals created: {}",
            self.blocks_invoked,
            self.method_calls,
            self.frames_pushed,
            self.redo_iterations,
            self.retries,
            self.unwind_signals_created,
        )
    }
}
