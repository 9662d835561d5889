//! First-class procs and lambdas: orphaned closures, strictness, arity,
//! validity, and invocation from the host.

use super::{op, print_rescued, program, run, run_program};
use crate::{
    buffer_handler, ArgumentBundle, EvalErrorKind, EvalMode, Interpreter, LocalJumpKind,
    ProgramBuilder, Value,
};
use garnet_ir::{BinaryOp, ParamSpec};
use pretty_assertions::assert_eq;

fn run_interp(interp: &mut Interpreter) -> Value {
    interp.run().unwrap()
}

fn proc_global(interp: &Interpreter, name: &str) -> crate::ProcValue {
    match interp.global(name) {
        Value::Proc(proc) => proc,
        other => panic!("{name} is not a proc: {other:?}"),
    }
}

#[test]
fn return_from_an_escaped_proc_is_unexpected() {
    // def m; proc { return 1 }; end; m.call
    let r = run(|b| {
        let pr = b.call_with_block(None, "proc", vec![], b.simple_block(&[], b.return_(Some(b.int(1)))));
        b.seq(vec![
            b.def("m", ParamSpec::empty(), pr),
            b.call(Some(b.fcall("m", vec![])), "call", vec![]),
        ])
    });
    assert_eq!(r.local_jump(), LocalJumpKind::UnexpectedReturn);
}

#[test]
fn break_after_the_converting_call_has_returned() {
    // def proc_conv(&b); b; end
    // def call_it(pr); pr.call; end
    // call_it(proc_conv { break 5 })
    let r = run(|b| {
        let block_param = ParamSpec::builder().block(b.name("b")).build();
        let converted = b.call_with_block(
            None,
            "proc_conv",
            vec![],
            b.simple_block(&[], b.break_(Some(b.int(5)))),
        );
        b.seq(vec![
            b.def("proc_conv", block_param, b.local("b")),
            b.def(
                "call_it",
                b.simple_params(&["pr"]),
                b.call(Some(b.local("pr")), "call", vec![]),
            ),
            b.fcall("call_it", vec![converted]),
        ])
    });
    assert_eq!(r.local_jump(), LocalJumpKind::BreakFromProcClosure);
    assert_eq!(r.error().message, "break from proc-closure");
}

#[test]
fn return_in_a_lambda_ends_only_the_lambda() {
    // def m; l = lambda { |x| return x * 2 }; l.call(4) + 1; end; m
    let r = run(|b| {
        let body = b.return_(Some(op(b, BinaryOp::Mul, b.local("x"), b.int(2))));
        let lambda = b.call_with_block(None, "lambda", vec![], b.simple_block(&["x"], body));
        let call = b.call(Some(b.local("l")), "call", vec![b.int(4)]);
        let m = b.seq(vec![b.assign("l", lambda), op(b, BinaryOp::Add, call, b.int(1))]);
        b.seq(vec![b.def("m", ParamSpec::empty(), m), b.fcall("m", vec![])])
    });
    assert_eq!(r.value(), Value::int(9));
}

#[test]
fn break_in_a_lambda_returns_from_it() {
    // lambda { break 7 }.call
    let r = run(|b| {
        let lambda = b.call_with_block(None, "lambda", vec![], b.simple_block(&[], b.break_(Some(b.int(7)))));
        b.call(Some(lambda), "call", vec![])
    });
    assert_eq!(r.value(), Value::int(7));
}

#[test]
fn proc_return_reaches_a_live_owner() {
    // def m; pr = proc { return 10 }; pr.call; 20; end; m
    let r = run(|b| {
        let pr = b.call_with_block(None, "proc", vec![], b.simple_block(&[], b.return_(Some(b.int(10)))));
        let m = b.seq(vec![
            b.assign("pr", pr),
            b.call(Some(b.local("pr")), "call", vec![]),
            b.int(20),
        ]);
        b.seq(vec![b.def("m", ParamSpec::empty(), m), b.fcall("m", vec![])])
    });
    assert_eq!(r.value(), Value::int(10));
}

#[test]
fn lambda_arity_errors_can_be_rescued() {
    // begin; lambda { |x| x }.call; rescue ArgumentError => e; puts e.message; end
    let r = run(|b| {
        let lambda = b.call_with_block(None, "lambda", vec![], b.simple_block(&["x"], b.local("x")));
        print_rescued(b, b.call(Some(lambda), "call", vec![]), "ArgumentError")
    });
    assert_eq!(r.lines(), ["wrong number of arguments (given 0, expected 1)"]);
}

#[test]
fn arity_is_reported_through_the_proc_object() {
    // [proc { |x, *| }.arity, lambda { |x, y| }.arity, proc { |(a, b, c, *)| }.arity,
    //  proc { |x = 1| }.arity, method(:m).arity]   with def m(a, b = 1); end
    let r = run(|b| {
        let x_rest = ParamSpec::builder().required(b.name("x")).anonymous_rest().build();
        let inner = ParamSpec::builder()
            .required(b.name("a"))
            .required(b.name("b"))
            .required(b.name("c"))
            .anonymous_rest()
            .build();
        let destructured = ParamSpec::builder().nested(inner).build();
        let optional = ParamSpec::builder().optional(b.name("x"), b.int(1)).build();
        let method_params = ParamSpec::builder()
            .required(b.name("a"))
            .optional(b.name("b"), b.int(1))
            .build();

        let arity_of = |kernel: &str, params: ParamSpec| {
            let pr = b.call_with_block(None, kernel, vec![], b.block(params, b.nil()));
            b.call(Some(pr), "arity", vec![])
        };
        let method = b.fcall("method", vec![b.sym("m")]);
        b.seq(vec![
            b.def("m", method_params, b.nil()),
            b.array(vec![
                arity_of("proc", x_rest),
                arity_of("lambda", b.simple_params(&["x", "y"])),
                arity_of("proc", destructured),
                arity_of("proc", optional),
                b.call(Some(method), "arity", vec![]),
            ]),
        ])
    });
    assert_eq!(r.inspect(), "[-2, 2, -4, 0, -2]");
}

#[test]
fn conversions_produce_lambdas() {
    // def m; end
    // [proc {}.lambda?, lambda {}.lambda?, method(:m).to_proc.lambda?, :to_s.to_proc.lambda?]
    let r = run(|b| {
        let is_lambda = |receiver| b.call(Some(receiver), "lambda?", vec![]);
        let plain = b.call_with_block(None, "proc", vec![], b.simple_block(&[], b.nil()));
        let lambda = b.call_with_block(None, "lambda", vec![], b.simple_block(&[], b.nil()));
        let method = b.call(Some(b.fcall("method", vec![b.sym("m")])), "to_proc", vec![]);
        let symbol = b.call(Some(b.sym("to_s")), "to_proc", vec![]);
        b.seq(vec![
            b.def("m", ParamSpec::empty(), b.nil()),
            b.array(vec![
                is_lambda(plain),
                is_lambda(lambda),
                is_lambda(method),
                is_lambda(symbol),
            ]),
        ])
    });
    assert_eq!(r.inspect(), "[false, true, true, true]");
}

#[test]
fn validity_follows_the_owning_activation() {
    // def m; proc { 1 }; end; $pr = m; $l = lambda { 1 }
    let main = program(|b| {
        let pr = b.call_with_block(None, "proc", vec![], b.simple_block(&[], b.int(1)));
        let lambda = b.call_with_block(None, "lambda", vec![], b.simple_block(&[], b.int(1)));
        b.seq(vec![
            b.def("m", ParamSpec::empty(), pr),
            b.assign_global("$pr", b.fcall("m", vec![])),
            b.assign_global("$l", lambda),
        ])
    });
    let mut interp = Interpreter::builder(&main)
        .print_handler(buffer_handler())
        .build();
    run_interp(&mut interp);

    assert!(!interp.is_valid(&proc_global(&interp, "$pr")));
    assert!(interp.is_valid(&proc_global(&interp, "$l")));
    assert_eq!(interp.arity(&proc_global(&interp, "$l")), 0);
}

#[test]
fn host_methods_see_validity_while_the_owner_runs() {
    // def m; pr = proc { 1 }; $inside = pr.valid?; pr; end; $outside = m.valid?
    let main = program(|b| {
        let pr = b.call_with_block(None, "proc", vec![], b.simple_block(&[], b.int(1)));
        let m = b.seq(vec![
            b.assign("pr", pr),
            b.assign_global("$inside", b.call(Some(b.local("pr")), "valid?", vec![])),
            b.local("pr"),
        ]);
        b.seq(vec![
            b.def("m", ParamSpec::empty(), m),
            b.array(vec![
                b.call(Some(b.fcall("m", vec![])), "valid?", vec![]),
                b.global("$inside"),
            ]),
        ])
    });
    let r = run_program(main, |builder| {
        builder.foreign_method("Proc", "valid?", |call| {
            let valid = call
                .receiver()
                .as_proc()
                .is_some_and(|proc| call.is_valid(proc));
            Ok(Value::Bool(valid))
        })
    });
    assert_eq!(r.inspect(), "[false, true]");
}

#[test]
fn invoke_hands_back_the_raw_signal() {
    // $l = lambda { |x| x + 1 }; $n = proc { next 5; 6 }; $b = proc { break 1 }
    let main = program(|b| {
        let add = op(b, BinaryOp::Add, b.local("x"), b.int(1));
        let lambda = b.call_with_block(None, "lambda", vec![], b.simple_block(&["x"], add));
        let next = b.seq(vec![b.next(Some(b.int(5))), b.int(6)]);
        let nexting = b.call_with_block(None, "proc", vec![], b.simple_block(&[], next));
        let breaking = b.call_with_block(None, "proc", vec![], b.simple_block(&[], b.break_(Some(b.int(1)))));
        b.seq(vec![
            b.assign_global("$l", lambda),
            b.assign_global("$n", nexting),
            b.assign_global("$b", breaking),
        ])
    });
    let mut interp = Interpreter::builder(&main)
        .print_handler(buffer_handler())
        .build();
    run_interp(&mut interp);

    let lambda = proc_global(&interp, "$l");
    let signal = interp
        .invoke(&lambda, ArgumentBundle::from_values([Value::int(1)]))
        .unwrap();
    assert!(signal.is_normal());
    assert_eq!(signal.into_value(), Value::int(2));

    let nexting = proc_global(&interp, "$n");
    let signal = interp.invoke(&nexting, ArgumentBundle::new()).unwrap();
    assert!(signal.is_normal());
    assert_eq!(signal.into_value(), Value::int(5));

    let breaking = proc_global(&interp, "$b");
    let err = interp.invoke(&breaking, ArgumentBundle::new()).unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::LocalJump(LocalJumpKind::BreakFromProcClosure)
    ));
    assert_eq!(interp.frames().depth(), 0);
}

#[test]
fn closures_run_on_another_thread_cannot_return_home() {
    // Interpreter A: def m; $pr = proc { return 1 }; $pr.call; end; m
    // Interpreter B, on its own thread, with A's proc in $pr:
    //   begin; $pr.call; rescue LocalJumpError => e; puts e.message; end
    let home = ProgramBuilder::new();
    let pr = home.call_with_block(None, "proc", vec![], home.simple_block(&[], home.return_(Some(home.int(1)))));
    let m = home.seq(vec![
        home.assign_global("$pr", pr),
        home.call(Some(home.global("$pr")), "call", vec![]),
    ]);
    let main = home.seq(vec![home.def("m", ParamSpec::empty(), m), home.fcall("m", vec![])]);
    let interner = home.interner().clone();
    let home = home.finish(main);

    let mut a = Interpreter::builder(&home)
        .print_handler(buffer_handler())
        .build();
    assert_eq!(run_interp(&mut a), Value::int(1));
    let escaped = a.global("$pr");

    let away = ProgramBuilder::with_interner(interner);
    let call = away.call(Some(away.global("$pr")), "call", vec![]);
    let main = print_rescued(&away, call, "LocalJumpError");
    let away = away.finish(main);

    let output = std::thread::spawn(move || {
        let mut b = Interpreter::builder(&away)
            .mode(EvalMode::Sandboxed { max_depth: 64 })
            .print_handler(buffer_handler())
            .global("$pr", escaped)
            .build();
        b.run().unwrap();
        b.output()
    })
    .join()
    .unwrap();

    assert_eq!(output, "unexpected return\n");
}
