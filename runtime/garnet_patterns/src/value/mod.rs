//! Runtime values.
//!
//! Heap-backed variants use [`Heap`], whose constructor is private to this
//! module; build them through the `Value::` factories. All values are
//! `Send + Sync` so closures can be handed to other threads.
//!
//! Names (symbols, method names, class names) are interned, so rendering a
//! value for guest output takes the program's [`StringInterner`].

mod heap;
mod proc;

use crate::errors::EvalError;
use garnet_ir::{Name, StringInterner};
use std::fmt::Write as _;

pub use heap::Heap;
pub use proc::{BlockBody, BlockClosure, Captured, MethodValue, ProcValue};

/// Integer range literal, `a..b` or `a...b`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
    pub exclusive: bool,
}

impl RangeValue {
    pub fn iter(self) -> impl Iterator<Item = i64> {
        let end = if self.exclusive {
            self.end.saturating_sub(1)
        } else {
            self.end
        };
        self.start..=end
    }
}

/// A guest value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Str(Heap<String>),
    Symbol(Name),
    Array(Heap<Vec<Value>>),
    Range(RangeValue),
    Proc(ProcValue),
    Method(Heap<MethodValue>),
    Exception(Heap<EvalError>),
    /// The top-level `self`.
    Main,
}

impl Value {
    // Factories

    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::Str(Heap::new(text.into()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Heap::new(items))
    }

    pub fn range(start: i64, end: i64, exclusive: bool) -> Self {
        Value::Range(RangeValue {
            start,
            end,
            exclusive,
        })
    }

    pub fn method(method: MethodValue) -> Self {
        Value::Method(Heap::new(method))
    }

    pub fn exception(err: EvalError) -> Self {
        Value::Exception(Heap::new(err))
    }

    // Queries

    /// Everything except `nil` and `false` is true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Elements of an ordered-sequence value.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_proc(&self) -> Option<&ProcValue> {
        match self {
            Value::Proc(proc) => Some(proc),
            _ => None,
        }
    }

    /// Class name for messages and `inspect`.
    pub fn class_name(&self, names: &StringInterner) -> &'static str {
        match self {
            Value::Nil => "NilClass",
            Value::Bool(true) => "TrueClass",
            Value::Bool(false) => "FalseClass",
            Value::Int(_) => "Integer",
            Value::Str(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Array(_) => "Array",
            Value::Range(_) => "Range",
            Value::Proc(_) => "Proc",
            Value::Method(_) => "Method",
            Value::Exception(err) => err
                .exception_class()
                .map_or("Exception", |class| class.name(names)),
            Value::Main => "Object",
        }
    }

    // Rendering

    /// `to_s`: the text `puts` and interpolation use.
    pub fn to_s(&self, names: &StringInterner) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Str(s) => s.as_str().to_owned(),
            Value::Symbol(name) => names.lookup(*name).to_string(),
            Value::Exception(err) => err.message.clone(),
            _ => self.inspect(names),
        }
    }

    /// `inspect`: the text `p` uses.
    pub fn inspect(&self, names: &StringInterner) -> String {
        let mut out = String::new();
        self.write_inspect(&mut out, names);
        out
    }

    fn write_inspect(&self, out: &mut String, names: &StringInterner) {
        match self {
            Value::Nil => out.push_str("nil"),
            Value::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Value::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Value::Str(s) => {
                let _ = write!(out, "{:?}", s.as_str());
            }
            Value::Symbol(name) => {
                out.push(':');
                out.push_str(names.lookup(*name));
            }
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_inspect(out, names);
                }
                out.push(']');
            }
            Value::Range(r) => {
                let dots = if r.exclusive { "..." } else { ".." };
                let _ = write!(out, "{}{dots}{}", r.start, r.end);
            }
            Value::Proc(proc) => {
                out.push_str(if proc.is_lambda() {
                    "#<Proc (lambda)>"
                } else {
                    "#<Proc>"
                });
            }
            Value::Method(method) => {
                let _ = write!(out, "#<Method: Object#{}>", names.lookup(method.name));
            }
            Value::Exception(err) => {
                let _ = write!(out, "#<{}: {}>", self.class_name(names), err.message);
            }
            Value::Main => out.push_str("main"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) | (Value::Main, Value::Main) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Proc(a), Value::Proc(b)) => a.ptr_eq(b),
            (Value::Method(a), Value::Method(b)) => Heap::ptr_eq(a, b),
            (Value::Exception(a), Value::Exception(b)) => Heap::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<ProcValue> for Value {
    fn from(proc: ProcValue) -> Self {
        Value::Proc(proc)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests;
