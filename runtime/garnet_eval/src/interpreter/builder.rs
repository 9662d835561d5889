//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use std::sync::Arc;

use super::interned_names::KnownNames;
use super::{ExecContext, Interpreter};
use crate::diagnostics::EvalCounters;
use crate::eval_mode::EvalMode;
use crate::frames::FrameRegistry;
use crate::natives::{ForeignCall, ForeignFn, NativeRegistry};
use crate::print_handler::{silent_handler, stdout_handler, SharedPrintHandler};
use garnet_ir::Program;
use garnet_patterns::{EvalError, Value};
use rustc_hash::FxHashMap;

/// Builder for creating Interpreter instances with various configurations.
///
/// The default mode is `Interpret`, printing to stdout. Tests usually pick
/// `Sandboxed` with a buffer handler.
pub struct InterpreterBuilder {
    program: Program,
    mode: EvalMode,
    print_handler: Option<SharedPrintHandler>,
    foreign: Vec<(String, String, ForeignFn)>,
    globals: Vec<(String, Value)>,
}

impl InterpreterBuilder {
    pub fn new(program: &Program) -> Self {
        Self {
            program: program.clone(),
            mode: EvalMode::default(),
            print_handler: None,
            foreign: Vec::new(),
            globals: Vec::new(),
        }
    }

    /// Set the evaluation mode.
    ///
    /// Controls the frame-depth limit and whether output reaches stdout by
    /// default.
    #[must_use]
    pub fn mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the handler guest output goes to. Overrides the mode-based default.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Register a host method on `class`.
    ///
    /// Foreign methods are opaque to the runtime: control signals from
    /// blocks they yield to cross them as `UnwindSignal`s.
    #[must_use]
    pub fn foreign_method(
        mut self,
        class: &str,
        name: &str,
        method: impl Fn(&mut ForeignCall<'_>) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        self.foreign
            .push((class.to_owned(), name.to_owned(), Arc::new(method)));
        self
    }

    /// Preset global `name` (with its `$`).
    #[must_use]
    pub fn global(mut self, name: &str, value: Value) -> Self {
        self.globals.push((name.to_owned(), value));
        self
    }

    /// Build the interpreter.
    pub fn build(self) -> Interpreter {
        let Program {
            arena,
            interner,
            main,
        } = self.program;

        // Default print handler depends on mode if not explicitly set
        let print_handler = self.print_handler.unwrap_or_else(|| {
            if self.mode.allows_io() {
                stdout_handler()
            } else {
                silent_handler()
            }
        });

        let mut natives = NativeRegistry::new();
        natives.install(&interner);
        for (class, name, method) in self.foreign {
            natives.register_foreign(&interner, &class, &name, method);
        }

        let mut globals = FxHashMap::default();
        for (name, value) in self.globals {
            globals.insert(interner.intern(&name), value);
        }

        let names = KnownNames::new(&interner);
        let ctx = ExecContext::detached(arena.clone(), names.main);
        tracing::debug!(mode = ?self.mode, "interpreter built");

        Interpreter {
            frames: FrameRegistry::new(self.mode.max_frame_depth()),
            interner,
            arena,
            main,
            globals,
            methods: FxHashMap::default(),
            natives,
            print_handler,
            mode: self.mode,
            counters: EvalCounters::default(),
            names,
            ctx,
        }
    }
}
