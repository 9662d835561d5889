//! `Integer` and `Range` iteration.

use super::{NativeCall, NativeRegistry};
use crate::interpreter::Interpreter;
use garnet_ir::StringInterner;
use garnet_patterns::{type_mismatch, ArgumentBundle, EvalResult, Value};

pub(super) fn register(registry: &mut NativeRegistry, interner: &StringInterner) {
    registry.register_native(interner, "Integer", "times", times);
    registry.register_native(interner, "Integer", "upto", upto);
    registry.register_native(interner, "Integer", "to_s", to_s);
    registry.register_native(interner, "Range", "each", range_each);
    registry.register_native(interner, "Range", "to_a", range_to_a);
}

/// Yield `0..n`; evaluates to the receiver.
fn times(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let Value::Int(count) = call.receiver else {
        return Ok(Value::Nil);
    };
    let block = call.require_block(interp)?;
    for i in 0..count {
        interp.yield_to(&block, ArgumentBundle::from_values([Value::int(i)]))?;
    }
    Ok(call.receiver)
}

fn upto(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    call.check_arity(interp, 1, Some(1))?;
    let (Value::Int(start), Some(Value::Int(end))) = (&call.receiver, call.arg(0)) else {
        let got = call.arg(0).map_or("NilClass", |v| v.class_name(&interp.interner));
        return Err(interp.fail(type_mismatch("Integer", got)).into());
    };
    let block = call.require_block(interp)?;
    for i in *start..=*end {
        interp.yield_to(&block, ArgumentBundle::from_values([Value::int(i)]))?;
    }
    Ok(call.receiver)
}

fn to_s(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    Ok(Value::string(call.receiver.to_s(&interp.interner)))
}

fn range_each(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let Value::Range(range) = call.receiver else {
        return Ok(Value::Nil);
    };
    let block = call.require_block(interp)?;
    for i in range.iter() {
        interp.yield_to(&block, ArgumentBundle::from_values([Value::int(i)]))?;
    }
    Ok(call.receiver)
}

fn range_to_a(_interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let Value::Range(range) = call.receiver else {
        return Ok(Value::Nil);
    };
    Ok(Value::array(range.iter().map(Value::int).collect()))
}
