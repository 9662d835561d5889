//! Expression tree for block and method bodies.
//!
//! Nodes live in an [`ExprArena`](crate::ExprArena) and refer to each other by
//! id. The tree is deliberately small: enough surface to write iteration
//! methods, blocks, procs and lambdas, and every control operator.

use crate::{Name, ParamSpec};
use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

arena_id!(
    /// Index of an expression node.
    ExprId
);
arena_id!(
    /// Index of a block literal.
    BlockId
);
arena_id!(
    /// Index of a method definition.
    MethodId
);

/// Binary operators understood by the evaluator.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// One argument at a call or yield site.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Arg {
    Positional(ExprId),
    /// `*expr`: spreads a sequence into the argument list.
    Splat(ExprId),
}

/// The block attached to a call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlockArg {
    /// `m { ... }` / `m do ... end`.
    Literal(BlockId),
    /// `m(&expr)`.
    Pass(ExprId),
}

/// `rescue [Class, ...] [=> var]` clause.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RescueClause {
    /// Empty means `StandardError`.
    pub classes: Vec<Name>,
    pub binding: Option<Name>,
    pub body: ExprId,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockLiteral {
    pub params: ParamSpec,
    pub body: ExprId,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodDef {
    pub name: Name,
    pub params: ParamSpec,
    pub body: ExprId,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExprKind {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Name),
    Symbol(Name),
    SelfRef,

    Local(Name),
    AssignLocal(Name, ExprId),
    Global(Name),
    AssignGlobal(Name, ExprId),

    Array(Vec<Arg>),
    /// `"#{a}#{b}"`: concatenates `to_s` of each part.
    Interpolate(Vec<ExprId>),
    Binary(BinaryOp, ExprId, ExprId),
    Not(ExprId),
    Seq(Vec<ExprId>),
    If {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
    },

    /// `while cond` / `until cond`.
    While {
        cond: ExprId,
        body: ExprId,
        until: bool,
    },
    /// `for var in iter`; the variable lives in the enclosing scope.
    For {
        var: Name,
        iter: ExprId,
        body: ExprId,
    },
    Begin {
        body: ExprId,
        rescues: Vec<RescueClause>,
        else_branch: Option<ExprId>,
        ensure: Option<ExprId>,
    },
    /// `raise [Class,] [message]`.
    Raise {
        class: Option<Name>,
        message: Option<ExprId>,
    },

    Call {
        receiver: Option<ExprId>,
        method: Name,
        args: Vec<Arg>,
        block: Option<BlockArg>,
    },
    Yield(Vec<Arg>),
    BlockGiven,

    Next(Option<ExprId>),
    Break(Option<ExprId>),
    Redo,
    Retry,
    Return(Option<ExprId>),

    Def(MethodId),
    /// Code reached through late, dynamically compiled evaluation.
    Eval(ExprId),
}
