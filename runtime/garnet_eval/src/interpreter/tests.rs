use super::*;
use crate::print_handler::buffer_handler;
use garnet_ir::{BinaryOp, ParamSpec, ProgramBuilder};
use garnet_patterns::{EvalErrorKind, LocalJumpKind};
use pretty_assertions::assert_eq;

fn program(build: impl FnOnce(&ProgramBuilder) -> ExprId) -> Program {
    let b = ProgramBuilder::new();
    let main = build(&b);
    b.finish(main)
}

fn interpreter(program: &Program) -> Interpreter {
    Interpreter::builder(program)
        .mode(EvalMode::Sandboxed { max_depth: 64 })
        .print_handler(buffer_handler())
        .build()
}

#[test]
fn run_yields_the_last_value() {
    let p = program(|b| b.seq(vec![b.int(1), b.binary(BinaryOp::Add, b.int(2), b.int(3))]));
    let mut interp = interpreter(&p);
    assert_eq!(interp.run().unwrap(), Value::int(5));
    assert!(interp.frames().is_empty());
}

#[test]
fn top_level_return_ends_the_program() {
    // puts 1; return 7; puts 2
    let p = program(|b| {
        b.seq(vec![
            b.puts(vec![b.int(1)]),
            b.return_(Some(b.int(7))),
            b.puts(vec![b.int(2)]),
        ])
    });
    let mut interp = interpreter(&p);
    assert_eq!(interp.run().unwrap(), Value::int(7));
    assert_eq!(interp.output(), "1\n");
}

#[test]
fn stray_break_at_top_level_is_rejected() {
    let p = program(|b| b.break_(None));
    let mut interp = interpreter(&p);
    let err = interp.run().unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::LocalJump(LocalJumpKind::UnexpectedBreak)
    ));
    let frames = err.backtrace.as_ref().map(|bt| bt.frames().len());
    assert_eq!(frames, Some(1));
    assert!(interp.frames().is_empty());
}

#[test]
fn globals_seeded_by_the_builder_are_visible() {
    // $x + 1
    let p = program(|b| b.binary(BinaryOp::Add, b.global("$x"), b.int(1)));
    let mut interp = Interpreter::builder(&p)
        .print_handler(buffer_handler())
        .global("$x", Value::int(41))
        .build();
    assert_eq!(interp.run().unwrap(), Value::int(42));
}

#[test]
fn globals_survive_the_run() {
    // $y = $x * 2
    let p = program(|b| b.assign_global("$y", b.binary(BinaryOp::Mul, b.global("$x"), b.int(2))));
    let mut interp = interpreter(&p);
    interp.set_global("$x", Value::int(4));
    interp.run().unwrap();
    assert_eq!(interp.global("$y"), Value::int(8));
    assert_eq!(interp.global("$unset"), Value::Nil);
}

#[test]
fn counters_track_calls_and_blocks() {
    // def m; yield; end; m { 1 }; m { 2 }
    let p = program(|b| {
        let call = |n| b.call_with_block(None, "m", vec![], b.simple_block(&[], b.int(n)));
        b.seq(vec![
            b.def("m", ParamSpec::empty(), b.yield_(vec![])),
            call(1),
            call(2),
        ])
    });
    let mut interp = interpreter(&p);
    assert_eq!(interp.run().unwrap(), Value::int(2));
    let counters = interp.counters();
    assert_eq!(counters.blocks_invoked, 2);
    assert!(counters.method_calls >= 2);
    assert_eq!(counters.unwind_signals_created, 0);
}

#[test]
fn methods_are_visible_only_after_definition() {
    let p = program(|b| b.fcall("later", vec![]));
    let mut interp = interpreter(&p);
    let err = interp.run().unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UndefinedMethod { .. }));
}
