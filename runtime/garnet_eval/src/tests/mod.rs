//! End-to-end scenarios.
//!
//! Each test builds a program with `ProgramBuilder`, runs it on an
//! interpreter with a buffered print handler, and checks the output, the
//! result and the counters.

mod natives_tests;
mod proc_tests;

use crate::{
    buffer_handler, EvalCounters, EvalError, EvalErrorKind, EvalMode, Interpreter,
    InterpreterBuilder, LocalJumpKind, Program, ProgramBuilder, Value,
};
use garnet_ir::{BinaryOp, ExprId};

/// Frame limit for scenario runs.
const MAX_DEPTH: usize = 512;

/// Outcome of running a program to completion.
pub(super) struct Run {
    pub result: Result<Value, EvalError>,
    pub output: String,
    pub counters: EvalCounters,
    pub program: Program,
}

impl Run {
    pub fn value(&self) -> Value {
        self.result.clone().unwrap()
    }

    pub fn error(&self) -> &EvalError {
        match &self.result {
            Ok(value) => panic!("expected an error, got {value:?}"),
            Err(err) => err,
        }
    }

    /// `inspect` of the result.
    pub fn inspect(&self) -> String {
        self.value().inspect(&self.program.interner)
    }

    pub fn lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }

    pub fn local_jump(&self) -> LocalJumpKind {
        match &self.error().kind {
            EvalErrorKind::LocalJump(kind) => *kind,
            other => panic!("expected LocalJumpError, got {other:?}"),
        }
    }
}

pub(super) fn program(build: impl FnOnce(&ProgramBuilder) -> ExprId) -> Program {
    let b = ProgramBuilder::new();
    let main = build(&b);
    b.finish(main)
}

pub(super) fn run(build: impl FnOnce(&ProgramBuilder) -> ExprId) -> Run {
    run_program(program(build), |builder| builder)
}

/// Run `program` on an interpreter `configure` has adjusted.
pub(super) fn run_program(
    program: Program,
    configure: impl FnOnce(InterpreterBuilder) -> InterpreterBuilder,
) -> Run {
    crate::init_tracing();
    let builder = Interpreter::builder(&program)
        .mode(EvalMode::Sandboxed {
            max_depth: MAX_DEPTH,
        })
        .print_handler(buffer_handler());
    let mut interp = configure(builder).build();
    let result = interp.run();
    Run {
        result,
        output: interp.output(),
        counters: interp.counters().clone(),
        program,
    }
}

// Shorthands for the expressions scenarios use most.

pub(super) fn puts(b: &ProgramBuilder, value: ExprId) -> ExprId {
    b.puts(vec![value])
}

pub(super) fn op(b: &ProgramBuilder, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
    b.binary(op, lhs, rhs)
}

/// `then_branch if cond`.
pub(super) fn when(b: &ProgramBuilder, cond: ExprId, then_branch: ExprId) -> ExprId {
    b.if_(cond, then_branch, None)
}

/// `begin body rescue Class => e; puts e.message end`.
pub(super) fn print_rescued(b: &ProgramBuilder, body: ExprId, class: &str) -> ExprId {
    let message = b.call(Some(b.local("e")), "message", vec![]);
    let clause = b.rescue_clause(&[class], Some("e"), puts(b, message));
    b.begin(body, vec![clause], None, None)
}
