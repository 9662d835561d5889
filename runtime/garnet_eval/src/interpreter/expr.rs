//! Expression dispatch.

use super::{Interpreter, MethodEntry};
use garnet_ir::{Arg, BinaryOp, ExprId, ExprKind, MethodId, Name, SharedArena};
use garnet_patterns::{
    division_by_zero, invalid_binary_op, undefined_local, ArgumentBundle, ControlAction, EvalError,
    EvalResult, Value,
};
use garnet_stack::ensure_sufficient_stack;

impl Interpreter {
    /// Evaluate `id` in the current context.
    pub(crate) fn eval(&mut self, id: ExprId) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_inner(id))
    }

    fn eval_inner(&mut self, id: ExprId) -> EvalResult {
        let arena = self.ctx.arena.clone();
        match arena.expr(id) {
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(n) => Ok(Value::int(*n)),
            ExprKind::Str(text) => Ok(Value::string(self.interner.lookup(*text))),
            ExprKind::Symbol(name) => Ok(Value::Symbol(*name)),
            ExprKind::SelfRef => Ok(self.ctx.self_value.clone()),

            ExprKind::Local(name) => self.eval_local(*name),
            ExprKind::AssignLocal(name, value) => {
                let value = self.eval(*value)?;
                self.ctx.scope.assign(*name, value.clone());
                Ok(value)
            }
            ExprKind::Global(name) => Ok(self.globals.get(name).cloned().unwrap_or_default()),
            ExprKind::AssignGlobal(name, value) => {
                let value = self.eval(*value)?;
                self.globals.insert(*name, value.clone());
                Ok(value)
            }

            ExprKind::Array(items) => {
                let items = self.eval_args(items)?;
                Ok(Value::array(items.into_values().into_vec()))
            }
            ExprKind::Interpolate(parts) => {
                let mut out = String::new();
                for part in parts {
                    let value = self.eval(*part)?;
                    out.push_str(&value.to_s(&self.interner));
                }
                Ok(Value::string(out))
            }
            ExprKind::Binary(op, left, right) => self.eval_binary(*op, *left, *right),
            ExprKind::Not(operand) => Ok(Value::Bool(!self.eval(*operand)?.is_truthy())),
            ExprKind::Seq(exprs) => {
                let mut last = Value::Nil;
                for expr in exprs {
                    last = self.eval(*expr)?;
                }
                Ok(last)
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(*cond)?.is_truthy() {
                    self.eval(*then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.eval(*else_branch)
                } else {
                    Ok(Value::Nil)
                }
            }

            ExprKind::While { cond, body, until } => self.eval_while(*cond, *body, *until),
            ExprKind::For { var, iter, body } => self.eval_for(*var, *iter, *body),
            ExprKind::Begin {
                body,
                rescues,
                else_branch,
                ensure,
            } => self.eval_begin(*body, rescues, *else_branch, *ensure),
            ExprKind::Raise { class, message } => self.eval_raise(*class, *message),

            ExprKind::Call {
                receiver,
                method,
                args,
                block,
            } => self.eval_call(*receiver, *method, args, *block),
            ExprKind::Yield(args) => self.eval_yield(args),
            ExprKind::BlockGiven => Ok(Value::Bool(self.ctx.block.is_some())),

            ExprKind::Next(value) => self.eval_next(*value),
            ExprKind::Break(value) => self.eval_break(*value),
            ExprKind::Redo => self.eval_redo(),
            ExprKind::Retry => self.eval_retry(),
            ExprKind::Return(value) => self.eval_return(*value),

            ExprKind::Def(method) => Ok(self.eval_def(&arena, *method)),
            ExprKind::Eval(code) => self.eval_dynamic(*code),
        }
    }

    fn eval_local(&self, name: Name) -> EvalResult {
        match self.ctx.scope.lookup(name) {
            Some(value) => Ok(value),
            None => Err(self.fail(undefined_local(self.interner.lookup(name))).into()),
        }
    }

    /// Evaluate an optional operand, `nil` when absent.
    pub(crate) fn eval_or_nil(&mut self, expr: Option<ExprId>) -> EvalResult {
        expr.map_or(Ok(Value::Nil), |expr| self.eval(expr))
    }

    /// Evaluate call or yield arguments, expanding `*splat`s.
    pub(crate) fn eval_args(&mut self, args: &[Arg]) -> Result<ArgumentBundle, ControlAction> {
        let mut bundle = ArgumentBundle::new();
        for arg in args {
            match *arg {
                Arg::Positional(expr) => {
                    let value = self.eval(expr)?;
                    bundle.push(value);
                }
                Arg::Splat(expr) => match self.eval(expr)? {
                    Value::Array(items) => bundle.extend_splatted(items.iter().cloned()),
                    Value::Range(range) => bundle.extend_splatted(range.iter().map(Value::int)),
                    Value::Nil => {}
                    other => bundle.extend_splatted([other]),
                },
            }
        }
        Ok(bundle)
    }

    /// `def name ... end`: registers the method, evaluates to its symbol.
    fn eval_def(&mut self, arena: &SharedArena, method: MethodId) -> Value {
        let name = arena.method(method).name;
        self.methods.insert(
            name,
            MethodEntry {
                arena: arena.clone(),
                def: method,
            },
        );
        tracing::trace!(method = self.interner.lookup(name), "method defined");
        Value::Symbol(name)
    }

    fn eval_binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> EvalResult {
        match op {
            BinaryOp::And => {
                let lhs = self.eval(left)?;
                return if lhs.is_truthy() { self.eval(right) } else { Ok(lhs) };
            }
            BinaryOp::Or => {
                let lhs = self.eval(left)?;
                return if lhs.is_truthy() { Ok(lhs) } else { self.eval(right) };
            }
            _ => {}
        }
        let lhs = self.eval(left)?;
        let rhs = self.eval(right)?;
        binary_values(op, &lhs, &rhs).map_err(|err| {
            let err = err.unwrap_or_else(|| {
                invalid_binary_op(
                    op,
                    lhs.class_name(&self.interner),
                    rhs.class_name(&self.interner),
                )
            });
            self.fail(err).into()
        })
    }
}

/// Apply a non-short-circuit operator. `Err(None)` means the operand types
/// do not support `op`.
fn binary_values(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, Option<EvalError>> {
    match (op, lhs, rhs) {
        (BinaryOp::Eq, _, _) => Ok(Value::Bool(lhs == rhs)),
        (BinaryOp::NotEq, _, _) => Ok(Value::Bool(lhs != rhs)),
        (_, Value::Int(a), Value::Int(b)) => int_op(op, *a, *b),
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            Ok(Value::string(format!("{}{}", a.as_str(), b.as_str())))
        }
        (BinaryOp::Add, Value::Array(a), Value::Array(b)) => {
            Ok(Value::array(a.iter().chain(b.iter()).cloned().collect()))
        }
        _ => Err(None),
    }
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> Result<Value, Option<EvalError>> {
    Ok(match op {
        BinaryOp::Add => Value::int(a.wrapping_add(b)),
        BinaryOp::Sub => Value::int(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::int(a.wrapping_mul(b)),
        BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err(Some(division_by_zero())),
        BinaryOp::Div => Value::int(floor_div(a, b)),
        BinaryOp::Mod => Value::int(a.wrapping_sub(b.wrapping_mul(floor_div(a, b)))),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::LtEq => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::GtEq => Value::Bool(a >= b),
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::And | BinaryOp::Or => return Err(None),
    })
}

/// Integer division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        q.wrapping_sub(1)
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_matches_guest_semantics() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(floor_div(-7, -2), 3);
    }

    #[test]
    fn modulo_takes_sign_of_divisor() {
        assert_eq!(int_op(BinaryOp::Mod, -7, 3), Ok(Value::int(2)));
        assert_eq!(int_op(BinaryOp::Mod, 7, -3), Ok(Value::int(-2)));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(matches!(int_op(BinaryOp::Div, 1, 0), Err(Some(_))));
    }

    #[test]
    fn mismatched_operands_are_unsupported() {
        assert_eq!(
            binary_values(BinaryOp::Add, &Value::int(1), &Value::Nil),
            Err(None)
        );
        assert_eq!(
            binary_values(BinaryOp::Eq, &Value::int(1), &Value::Nil),
            Ok(Value::Bool(false))
        );
    }
}
