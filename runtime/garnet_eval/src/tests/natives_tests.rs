//! Built-in iterators, `method`/`Symbol` conversion, and host methods
//! registered through the builder.

use super::{op, print_rescued, program, puts, run, run_program};
use crate::{EvalErrorKind, EvalMode, Value};
use garnet_ir::{BinaryOp, ParamSpec};
use pretty_assertions::assert_eq;

#[test]
fn each_with_index_yields_item_and_index() {
    // [5, 6].each_with_index { |item, i| print item, i }
    let r = run(|b| {
        let body = b.print(vec![b.local("item"), b.local("i")]);
        let block = b.simple_block(&["item", "i"], body);
        let array = b.array(vec![b.int(5), b.int(6)]);
        b.call_with_block(Some(array), "each_with_index", vec![], block)
    });
    assert_eq!(r.output, "5061");
    assert_eq!(r.inspect(), "[5, 6]");
}

#[test]
fn map_accepts_a_symbol_block() {
    // [1, 2].map(&:to_s)
    let r = run(|b| {
        let array = b.array(vec![b.int(1), b.int(2)]);
        b.call_block_pass(Some(array), "map", vec![], b.sym("to_s"))
    });
    assert_eq!(r.inspect(), r#"["1", "2"]"#);
}

#[test]
fn map_accepts_a_method_object() {
    // def dbl(x); x * 2; end; [1, 2, 3].map(&method(:dbl))
    let r = run(|b| {
        let def = b.def(
            "dbl",
            b.simple_params(&["x"]),
            op(b, BinaryOp::Mul, b.local("x"), b.int(2)),
        );
        let array = b.array(vec![b.int(1), b.int(2), b.int(3)]);
        let method = b.fcall("method", vec![b.sym("dbl")]);
        b.seq(vec![def, b.call_block_pass(Some(array), "map", vec![], method)])
    });
    assert_eq!(r.inspect(), "[2, 4, 6]");
}

#[test]
fn symbol_block_without_arguments_is_an_arity_error() {
    // :to_s.to_proc.call
    let r = run(|b| {
        let pr = b.call(Some(b.sym("to_s")), "to_proc", vec![]);
        b.call(Some(pr), "call", vec![])
    });
    assert!(matches!(r.error().kind, EvalErrorKind::Arity(_)));
}

#[test]
fn loop_ends_on_break() {
    // i = 0; loop { i += 1; break i if i == 3 }
    let r = run(|b| {
        let body = b.seq(vec![
            b.increment("i", 1),
            b.if_(
                op(b, BinaryOp::Eq, b.local("i"), b.int(3)),
                b.break_(Some(b.local("i"))),
                None,
            ),
        ]);
        let block = b.simple_block(&[], body);
        b.seq(vec![
            b.assign("i", b.int(0)),
            b.call_with_block(None, "loop", vec![], block),
        ])
    });
    assert_eq!(r.value(), Value::int(3));
}

#[test]
fn upto_counts_inclusively() {
    // 1.upto(3) { |i| print i }
    let r = run(|b| {
        let block = b.simple_block(&["i"], b.print(vec![b.local("i")]));
        b.call_with_block(Some(b.int(1)), "upto", vec![b.int(3)], block)
    });
    assert_eq!(r.output, "123");
    assert_eq!(r.value(), Value::int(1));
}

#[test]
fn upto_rejects_a_non_integer_limit() {
    // 1.upto("3") { }
    let r = run(|b| {
        let block = b.simple_block(&[], b.nil());
        b.call_with_block(Some(b.int(1)), "upto", vec![b.str("3")], block)
    });
    assert!(matches!(r.error().kind, EvalErrorKind::TypeMismatch { .. }));
}

#[test]
fn ranges_iterate_and_convert() {
    // $r.each { |i| print i }; $r.to_a   with $r = 1...4
    let main = program(|b| {
        let block = b.simple_block(&["i"], b.print(vec![b.local("i")]));
        b.seq(vec![
            b.call_with_block(Some(b.global("$r")), "each", vec![], block),
            b.call(Some(b.global("$r")), "to_a", vec![]),
        ])
    });
    let r = run_program(main, |builder| {
        builder.global("$r", Value::range(1, 4, true))
    });
    assert_eq!(r.output, "123");
    assert_eq!(r.inspect(), "[1, 2, 3]");
}

#[test]
fn p_returns_its_argument() {
    // p "hi"
    let r = run(|b| b.fcall("p", vec![b.str("hi")]));
    assert_eq!(r.output, "\"hi\"\n");
    assert_eq!(r.inspect(), "\"hi\"");
}

#[test]
fn puts_flattens_arrays() {
    let r = run(|b| puts(b, b.array(vec![b.int(1), b.array(vec![b.int(2)])])));
    assert_eq!(r.lines(), ["1", "2"]);
}

#[test]
fn sort_without_a_block_uses_natural_order() {
    let r = run(|b| {
        let array = b.array(vec![b.int(3), b.int(1), b.int(2)]);
        b.call(Some(array), "sort", vec![])
    });
    assert_eq!(r.inspect(), "[1, 2, 3]");
}

#[test]
fn sort_with_a_block_uses_its_answer() {
    // [1, 3, 2].sort { |a, b| b - a }
    let r = run(|b| {
        let cmp = op(b, BinaryOp::Sub, b.local("y"), b.local("x"));
        let block = b.simple_block(&["x", "y"], cmp);
        let array = b.array(vec![b.int(1), b.int(3), b.int(2)]);
        b.call_with_block(Some(array), "sort", vec![], block)
    });
    assert_eq!(r.inspect(), "[3, 2, 1]");
    assert_eq!(r.counters.unwind_signals_created, 0);
}

#[test]
fn next_in_a_sort_block_answers_the_comparison() {
    // [2, 1].sort { |a, b| next a - b }
    let r = run(|b| {
        let cmp = op(b, BinaryOp::Sub, b.local("x"), b.local("y"));
        let block = b.simple_block(&["x", "y"], b.next(Some(cmp)));
        let array = b.array(vec![b.int(2), b.int(1)]);
        b.call_with_block(Some(array), "sort", vec![], block)
    });
    assert_eq!(r.inspect(), "[1, 2]");
    assert_eq!(r.counters.unwind_signals_created, 0);
}

#[test]
fn break_out_of_a_sort_block_crosses_the_host_frame() {
    // [2, 1].sort { |a, b| break :stopped }
    let r = run(|b| {
        let block = b.simple_block(&["x", "y"], b.break_(Some(b.sym("stopped"))));
        let array = b.array(vec![b.int(2), b.int(1)]);
        b.call_with_block(Some(array), "sort", vec![], block)
    });
    assert_eq!(r.inspect(), ":stopped");
    assert_eq!(r.counters.unwind_signals_created, 1);
}

#[test]
fn sort_reports_incomparable_elements() {
    let r = run(|b| {
        let array = b.array(vec![b.int(1), b.str("a")]);
        print_rescued(b, b.call(Some(array), "sort", vec![]), "TypeError")
    });
    assert_eq!(r.lines(), vec!["wrong argument type String (expected Integer)"]);
}

#[test]
fn sort_names_the_mismatched_operand_in_either_order() {
    // ["a", 1].sort, then ["a", nil].sort
    let r = run(|b| {
        let array = b.array(vec![b.str("a"), b.int(1)]);
        print_rescued(b, b.call(Some(array), "sort", vec![]), "TypeError")
    });
    assert_eq!(r.lines(), vec!["wrong argument type String (expected Integer)"]);

    let r = run(|b| {
        let array = b.array(vec![b.str("a"), b.nil()]);
        print_rescued(b, b.call(Some(array), "sort", vec![]), "TypeError")
    });
    assert_eq!(r.lines(), vec!["wrong argument type NilClass (expected String)"]);
}

#[test]
fn host_methods_registered_on_the_builder_are_callable() {
    // 21.twice
    let main = program(|b| b.call(Some(b.int(21)), "twice", vec![]));
    let r = run_program(main, |builder| {
        builder.foreign_method("Integer", "twice", |call| match call.receiver() {
            Value::Int(n) => Ok(Value::int(n * 2)),
            other => {
                let got = call.inspect(other);
                Err(call.fail(garnet_patterns::type_mismatch("Integer", &got)))
            }
        })
    });
    assert_eq!(r.value(), Value::int(42));
}

#[test]
fn host_methods_can_yield() {
    // 5.with_double { |x| x + 1 }
    let main = program(|b| {
        let block = b.simple_block(&["x"], op(b, BinaryOp::Add, b.local("x"), b.int(1)));
        b.call_with_block(Some(b.int(5)), "with_double", vec![], block)
    });
    let r = run_program(main, |builder| {
        builder.foreign_method("Integer", "with_double", |call| {
            let doubled = match call.receiver() {
                Value::Int(n) => Value::int(n * 2),
                _ => Value::Nil,
            };
            call.yield_values(vec![doubled])
        })
    });
    assert_eq!(r.value(), Value::int(11));
}

#[test]
fn unbounded_recursion_hits_the_frame_limit() {
    // def f; f; end; f
    let main = program(|b| {
        b.seq(vec![
            b.def("f", ParamSpec::empty(), b.fcall("f", vec![])),
            b.fcall("f", vec![]),
        ])
    });
    let r = run_program(main, |builder| {
        builder.mode(EvalMode::Sandboxed { max_depth: 16 })
    });
    assert!(matches!(
        r.error().kind,
        EvalErrorKind::StackOverflow { depth: 16 }
    ));
}
