//! `Kernel` methods: output, closure constructors, `loop`, `method`.

use super::{NativeCall, NativeRegistry};
use crate::interpreter::Interpreter;
use garnet_ir::StringInterner;
use garnet_patterns::{
    type_mismatch, undefined_method, ArgumentBundle, EvalResult, MethodValue, Value,
};

pub(super) fn register(registry: &mut NativeRegistry, interner: &StringInterner) {
    registry.register_native(interner, "Kernel", "puts", puts);
    registry.register_native(interner, "Kernel", "print", print);
    registry.register_native(interner, "Kernel", "p", p);
    registry.register_native(interner, "Kernel", "lambda", lambda);
    registry.register_native(interner, "Kernel", "proc", proc);
    registry.register_native(interner, "Kernel", "loop", loop_);
    registry.register_native(interner, "Kernel", "method", method);
}

/// One line per argument; arrays print one line per element.
fn puts(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    if call.args.is_empty() {
        interp.print_handler.write("\n");
    }
    for value in call.args.values() {
        write_lines(interp, value);
    }
    Ok(Value::Nil)
}

fn write_lines(interp: &Interpreter, value: &Value) {
    match value {
        Value::Array(items) if !items.is_empty() => {
            for item in items.iter() {
                write_lines(interp, item);
            }
        }
        other => interp.print_handler.write_line(&other.to_s(&interp.interner)),
    }
}

fn print(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    for value in call.args.values() {
        interp.print_handler.write(&value.to_s(&interp.interner));
    }
    Ok(Value::Nil)
}

/// `inspect` of each argument; returns the argument, or all of them.
fn p(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    for value in call.args.values() {
        interp.print_handler.write_line(&value.inspect(&interp.interner));
    }
    let mut values = call.args.into_values();
    Ok(match values.len() {
        0 => Value::Nil,
        1 => values.remove(0),
        _ => Value::array(values.into_vec()),
    })
}

fn lambda(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let block = call.require_block(interp)?;
    Ok(Value::Proc(block.to_lambda()))
}

fn proc(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let block = call.require_block(interp)?;
    Ok(Value::Proc(block.reified()))
}

/// Yield until a `break` aimed at this call ends it.
fn loop_(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    let block = call.require_block(interp)?;
    loop {
        interp.yield_to(&block, ArgumentBundle::new())?;
    }
}

/// `method(:name)`: a user method bound to the receiver.
fn method(interp: &mut Interpreter, call: NativeCall) -> EvalResult {
    call.check_arity(interp, 1, Some(1))?;
    let name = match call.arg(0) {
        Some(Value::Symbol(name)) => *name,
        Some(other) => {
            let got = other.class_name(&interp.interner);
            return Err(interp.fail(type_mismatch("Symbol", got)).into());
        }
        None => return Ok(Value::Nil),
    };
    let Some(entry) = interp.methods.get(&name).cloned() else {
        let receiver = call.receiver.inspect(&interp.interner);
        return Err(interp
            .fail(undefined_method(interp.interner.lookup(name), &receiver))
            .into());
    };
    Ok(Value::method(MethodValue {
        receiver: call.receiver,
        name,
        arena: entry.arena,
        def: entry.def,
    }))
}
