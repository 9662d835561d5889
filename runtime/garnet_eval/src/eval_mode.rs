//! Evaluation modes for the garnet interpreter.
//!
//! Parameterizes the evaluator through an `EvalMode` enum so hosts and tests
//! can pick a frame-depth policy without generics.

/// Evaluation mode, determines interpreter limits via match dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvalMode {
    /// Standard mode, native stack growth through `stacker`.
    #[default]
    Interpret,
    /// Bounded mode for untrusted or test programs.
    Sandboxed {
        /// Maximum number of live activation frames.
        max_depth: usize,
    },
}

impl EvalMode {
    /// Maximum activation-frame depth, or `None` for unlimited.
    ///
    /// - `Interpret`: `None` on native (stacker grows the stack), 200 on WASM
    /// - `Sandboxed`: the configured limit
    #[inline]
    pub fn max_frame_depth(&self) -> Option<usize> {
        match self {
            Self::Interpret => {
                #[cfg(target_arch = "wasm32")]
                {
                    Some(200)
                }
                #[cfg(not(target_arch = "wasm32"))]
                {
                    None
                }
            }
            Self::Sandboxed { max_depth } => Some(*max_depth),
        }
    }

    /// Whether guest output may reach the process stdout by default.
    #[inline]
    pub fn allows_io(&self) -> bool {
        matches!(self, Self::Interpret)
    }
}
