//! `Array` methods.
//!
//! `sort` is registered as a foreign method: it runs the comparison block
//! from inside `slice::sort_by`, which cannot relay a control signal, so
//! anything but a normal result from the block leaves as an `UnwindSignal`.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{ForeignCall, NativeCall, NativeRegistry};
use crate::interpreter::Interpreter;
use garnet_ir::StringInterner;
use garnet_patterns::{type_mismatch, ArgumentBundle, EvalError, EvalResult, Value};

pub(super) fn register(registry: &mut NativeRegistry, interner: &StringInterner) {
    registry.register_native(interner, "Array", "each", each);
    registry.register_native(interner, "Array", "each_with_index", each_with_index);
    registry.register_native(interner, "Array", "map", map);
    registry.register_native(interner, "Array", "size", size);
    registry.register_native(interner, "Array", "length", size);
    registry.register_native(interner, "Array", "first", first);
    registry.register_foreign(interner, "Array", "sort", Arc::new(sort));
}

fn elements(value: &Value) -> &[Value] {
    value.as_sequence().unwrap_or_default()
}

fn each(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let block = call.require_block(interp)?;
    for item in elements(&call.receiver) {
        interp.yield_to(&block, ArgumentBundle::from_values([item.clone()]))?;
    }
    Ok(call.receiver)
}

/// Yields `item, index` as two arguments.
fn each_with_index(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let block = call.require_block(interp)?;
    for (index, item) in elements(&call.receiver).iter().enumerate() {
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        let args = ArgumentBundle::from_values([item.clone(), Value::int(index)]);
        interp.yield_to(&block, args)?;
    }
    Ok(call.receiver)
}

fn map(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let block = call.require_block(interp)?;
    let items = elements(&call.receiver);
    let mut mapped = Vec::with_capacity(items.len());
    for item in items {
        mapped.push(interp.yield_to(&block, ArgumentBundle::from_values([item.clone()]))?);
    }
    Ok(Value::array(mapped))
}

fn size(_interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let len = elements(&call.receiver).len();
    Ok(Value::int(i64::try_from(len).unwrap_or(i64::MAX)))
}

fn first(_interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    Ok(elements(&call.receiver).first().cloned().unwrap_or_default())
}

/// Sorted copy of the receiver. With a block, the block compares two
/// elements and answers negative, zero or positive.
fn sort(call: &mut ForeignCall<'_>) -> Result<Value, EvalError> {
    let mut items = elements(call.receiver()).to_vec();
    let mut failure = None;
    items.sort_by(|a, b| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        compare(call, a, b).unwrap_or_else(|err| {
            failure = Some(err);
            Ordering::Equal
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(Value::array(items)),
    }
}

fn compare(call: &mut ForeignCall<'_>, a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    if call.has_block() {
        return match call.yield_values(vec![a.clone(), b.clone()])? {
            Value::Int(n) => Ok(n.cmp(&0)),
            other => {
                let got = other.class_name(call.interner());
                Err(call.fail(type_mismatch("Integer", got)))
            }
        };
    }
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.as_str().cmp(y.as_str())),
        // Name the operand that does not fit the other one.
        (Value::Int(_), other) | (other, Value::Int(_)) => {
            let got = other.class_name(call.interner());
            Err(call.fail(type_mismatch("Integer", got)))
        }
        (Value::Str(_), other) | (other, Value::Str(_)) => {
            let got = other.class_name(call.interner());
            Err(call.fail(type_mismatch("String", got)))
        }
        (other, _) => {
            let got = other.class_name(call.interner());
            Err(call.fail(type_mismatch("Integer", got)))
        }
    }
}
