//! `Proc`, `Method`, `Symbol` and `Exception` methods.

use super::{NativeCall, NativeRegistry};
use crate::interpreter::Interpreter;
use garnet_ir::StringInterner;
use garnet_patterns::{BlockClosure, EvalResult, ProcValue, Value};

pub(super) fn register(registry: &mut NativeRegistry, interner: &StringInterner) {
    for name in ["call", "[]", "yield"] {
        registry.register_native(interner, "Proc", name, proc_call);
    }
    registry.register_native(interner, "Proc", "arity", proc_arity);
    registry.register_native(interner, "Proc", "lambda?", proc_is_lambda);
    registry.register_native(interner, "Proc", "to_proc", proc_to_proc);

    registry.register_native(interner, "Method", "call", method_call);
    registry.register_native(interner, "Method", "to_proc", method_to_proc);
    registry.register_native(interner, "Method", "arity", method_arity);

    registry.register_native(interner, "Symbol", "to_proc", symbol_to_proc);

    registry.register_native(interner, "Exception", "message", exception_message);
    registry.register_native(interner, "Exception", "reason", exception_reason);
}

fn proc_call(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let Value::Proc(proc) = &call.receiver else {
        return Ok(Value::Nil);
    };
    interp.call_proc(proc, call.args, call.block)
}

fn proc_arity(_interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    Ok(call.receiver.as_proc().map_or(Value::Nil, |proc| Value::int(proc.arity())))
}

fn proc_is_lambda(_interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    Ok(Value::Bool(call.receiver.as_proc().is_some_and(ProcValue::is_lambda)))
}

fn proc_to_proc(_interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    Ok(call.receiver)
}

fn method_call(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let Value::Method(method) = &call.receiver else {
        return Ok(Value::Nil);
    };
    interp.call_method_value(method, call.args, call.block)
}

fn method_to_proc(_interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let Value::Method(method) = call.receiver else {
        return Ok(Value::Nil);
    };
    Ok(Value::Proc(ProcValue::new(BlockClosure::from_method(method))))
}

fn method_arity(_interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let Value::Method(method) = &call.receiver else {
        return Ok(Value::Nil);
    };
    Ok(Value::int(method.arity()))
}

fn symbol_to_proc(_interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let Value::Symbol(name) = call.receiver else {
        return Ok(Value::Nil);
    };
    Ok(Value::Proc(ProcValue::new(BlockClosure::from_symbol(name))))
}

fn exception_message(_interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let Value::Exception(err) = &call.receiver else {
        return Ok(Value::Nil);
    };
    Ok(Value::string(err.message.as_str()))
}

/// `LocalJumpError#reason`: the operator that failed, as a symbol.
fn exception_reason(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let Value::Exception(err) = &call.receiver else {
        return Ok(Value::Nil);
    };
    Ok(err
        .local_jump_kind()
        .map_or(Value::Nil, |kind| Value::Symbol(interp.interner.intern(kind.reason()))))
}
