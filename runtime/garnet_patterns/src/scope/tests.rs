use super::*;
use garnet_ir::StringInterner;
use pretty_assertions::assert_eq;

#[test]
fn child_sees_parent_bindings() {
    let names = StringInterner::new();
    let x = names.intern("x");
    let root = SharedScope::new_root();
    root.define(x, Value::int(1));
    let child = root.child();
    assert_eq!(child.lookup(x), Some(Value::int(1)));
}

#[test]
fn assign_updates_outer_binding() {
    let names = StringInterner::new();
    let i = names.intern("i");
    let root = SharedScope::new_root();
    root.define(i, Value::int(0));
    let block = root.child();
    block.assign(i, Value::int(5));
    assert_eq!(root.lookup(i), Some(Value::int(5)));
}

#[test]
fn new_names_stay_in_the_block() {
    let names = StringInterner::new();
    let y = names.intern("y");
    let root = SharedScope::new_root();
    let block = root.child();
    block.assign(y, Value::int(2));
    assert_eq!(block.lookup(y), Some(Value::int(2)));
    assert_eq!(root.lookup(y), None);
}

#[test]
fn define_shadows() {
    let names = StringInterner::new();
    let x = names.intern("x");
    let root = SharedScope::new_root();
    root.define(x, Value::int(1));
    let block = root.child();
    block.define(x, Value::int(2));
    assert_eq!(block.lookup(x), Some(Value::int(2)));
    assert_eq!(root.lookup(x), Some(Value::int(1)));
}
