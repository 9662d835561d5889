use super::*;
use crate::errors::{local_jump, LocalJumpKind};
use garnet_ir::ProgramBuilder;
use pretty_assertions::assert_eq;

fn sample_closure() -> (StringInterner, ProcValue) {
    let b = ProgramBuilder::new();
    let body = b.local("x");
    let block = b.simple_block(&["x", "y"], body);
    let program = b.finish(body);
    let interner = StringInterner::new();
    let closure = BlockClosure::literal(program.arena, block, Captured::default());
    (interner, ProcValue::new(closure))
}

#[test]
fn truthiness() {
    assert!(!Value::Nil.is_truthy());
    assert!(!Value::Bool(false).is_truthy());
    assert!(Value::int(0).is_truthy());
    assert!(Value::string("").is_truthy());
}

#[test]
fn inspect_and_to_s() {
    let names = StringInterner::new();
    let sym = names.intern("foo");
    let value = Value::array(vec![
        Value::int(1),
        Value::string("a"),
        Value::Nil,
        Value::Symbol(sym),
    ]);
    assert_eq!(value.inspect(&names), r#"[1, "a", nil, :foo]"#);
    assert_eq!(Value::string("a").to_s(&names), "a");
    assert_eq!(Value::Nil.to_s(&names), "");
    assert_eq!(Value::range(1, 3, true).inspect(&names), "1...3");
}

#[test]
fn exception_inspect_shows_class_and_message() {
    let names = StringInterner::new();
    let err = Value::exception(local_jump(LocalJumpKind::BreakFromProcClosure));
    assert_eq!(
        err.inspect(&names),
        "#<LocalJumpError: break from proc-closure>"
    );
    assert_eq!(err.to_s(&names), "break from proc-closure");
}

#[test]
fn arrays_compare_structurally() {
    let a = Value::array(vec![Value::int(1), Value::int(2)]);
    let b = Value::array(vec![Value::int(1), Value::int(2)]);
    assert_eq!(a, b);
    assert_ne!(a, Value::array(vec![Value::int(1)]));
}

#[test]
fn exclusive_range_iteration() {
    let items: Vec<i64> = RangeValue {
        start: 1,
        end: 4,
        exclusive: true,
    }
    .iter()
    .collect();
    assert_eq!(items, vec![1, 2, 3]);
}

#[test]
fn procs_compare_by_identity() {
    let (_, proc) = sample_closure();
    let same = proc.clone();
    assert_eq!(Value::Proc(proc.clone()), Value::Proc(same));
    assert_ne!(Value::Proc(proc.clone()), Value::Proc(proc.to_lambda()));
}

#[test]
fn to_lambda_makes_a_strict_copy() {
    let (names, proc) = sample_closure();
    assert!(!proc.is_lambda());
    let lambda = proc.to_lambda();
    assert!(lambda.is_lambda());
    assert!(!lambda.ptr_eq(&proc));
    assert!(lambda.to_lambda().ptr_eq(&lambda));
    assert_eq!(Value::Proc(lambda).inspect(&names), "#<Proc (lambda)>");
}

#[test]
fn reified_keeps_binding_mode() {
    let (_, proc) = sample_closure();
    let reified = proc.reified();
    assert!(!reified.ptr_eq(&proc));
    assert!(!reified.is_lambda());
    assert!(reified.reified().ptr_eq(&reified));
}

#[test]
fn arity_is_stable() {
    let (_, proc) = sample_closure();
    assert_eq!(proc.arity(), 2);
    assert_eq!(proc.arity(), proc.arity());
}

#[test]
fn symbol_proc_is_strict() {
    let names = StringInterner::new();
    let proc = ProcValue::new(BlockClosure::from_symbol(names.intern("to_s")));
    assert!(proc.is_lambda());
    assert_eq!(proc.arity(), -2);
    assert!(proc.closure().params().is_none());
}
