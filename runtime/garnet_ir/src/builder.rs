//! Programmatic construction of block-runtime programs.
//!
//! Every method takes `&self` so calls nest the way the source reads:
//!
//! ```text
//! let b = ProgramBuilder::new();
//! let x = b.name("x");
//! let body = b.puts(vec![b.local("x")]);
//! let block = b.block(ParamSpec::builder().required(x).build(), body);
//! let main = b.call_with_block(Some(b.int(3)), "times", vec![], block);
//! let program = b.finish(main);
//! ```

use crate::{
    Arg, BinaryOp, BlockArg, BlockId, BlockLiteral, ExprArena, ExprId, ExprKind, MethodDef, Name,
    ParamSpec, RescueClause, SharedArena, SharedInterner,
};
use std::cell::RefCell;

/// A finished program: its arena, its names and the top-level body.
#[derive(Clone)]
pub struct Program {
    pub arena: SharedArena,
    pub interner: SharedInterner,
    pub main: ExprId,
}

pub struct ProgramBuilder {
    arena: RefCell<ExprArena>,
    interner: SharedInterner,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::with_interner(SharedInterner::new())
    }

    pub fn with_interner(interner: SharedInterner) -> Self {
        ProgramBuilder {
            arena: RefCell::new(ExprArena::new()),
            interner,
        }
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn finish(self, main: ExprId) -> Program {
        Program {
            arena: SharedArena::new(self.arena.into_inner()),
            interner: self.interner,
            main,
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn expr(&self, kind: ExprKind) -> ExprId {
        self.arena.borrow_mut().alloc_expr(kind)
    }

    // Literals

    pub fn nil(&self) -> ExprId {
        self.expr(ExprKind::Nil)
    }

    pub fn bool(&self, value: bool) -> ExprId {
        self.expr(ExprKind::Bool(value))
    }

    pub fn int(&self, value: i64) -> ExprId {
        self.expr(ExprKind::Int(value))
    }

    pub fn str(&self, text: &str) -> ExprId {
        let name = self.name(text);
        self.expr(ExprKind::Str(name))
    }

    pub fn sym(&self, text: &str) -> ExprId {
        let name = self.name(text);
        self.expr(ExprKind::Symbol(name))
    }

    pub fn self_ref(&self) -> ExprId {
        self.expr(ExprKind::SelfRef)
    }

    pub fn array(&self, items: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Array(items.into_iter().map(Arg::Positional).collect()))
    }

    pub fn array_args(&self, items: Vec<Arg>) -> ExprId {
        self.expr(ExprKind::Array(items))
    }

    pub fn interpolate(&self, parts: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Interpolate(parts))
    }

    // Variables

    pub fn local(&self, name: &str) -> ExprId {
        let name = self.name(name);
        self.expr(ExprKind::Local(name))
    }

    pub fn assign(&self, name: &str, value: ExprId) -> ExprId {
        let name = self.name(name);
        self.expr(ExprKind::AssignLocal(name, value))
    }

    pub fn global(&self, name: &str) -> ExprId {
        let name = self.name(name);
        self.expr(ExprKind::Global(name))
    }

    pub fn assign_global(&self, name: &str, value: ExprId) -> ExprId {
        let name = self.name(name);
        self.expr(ExprKind::AssignGlobal(name, value))
    }

    /// `name += delta` on a local.
    pub fn increment(&self, name: &str, delta: i64) -> ExprId {
        let sum = self.binary(BinaryOp::Add, self.local(name), self.int(delta));
        self.assign(name, sum)
    }

    /// `$name += delta`.
    pub fn increment_global(&self, name: &str, delta: i64) -> ExprId {
        let sum = self.binary(BinaryOp::Add, self.global(name), self.int(delta));
        self.assign_global(name, sum)
    }

    // Operators and sequencing

    pub fn binary(&self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.expr(ExprKind::Binary(op, lhs, rhs))
    }

    pub fn not(&self, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Not(operand))
    }

    pub fn seq(&self, exprs: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Seq(exprs))
    }

    pub fn if_(&self, cond: ExprId, then_branch: ExprId, else_branch: Option<ExprId>) -> ExprId {
        self.expr(ExprKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn while_(&self, cond: ExprId, body: ExprId) -> ExprId {
        self.expr(ExprKind::While {
            cond,
            body,
            until: false,
        })
    }

    pub fn until_(&self, cond: ExprId, body: ExprId) -> ExprId {
        self.expr(ExprKind::While {
            cond,
            body,
            until: true,
        })
    }

    pub fn for_(&self, var: &str, iter: ExprId, body: ExprId) -> ExprId {
        let var = self.name(var);
        self.expr(ExprKind::For { var, iter, body })
    }

    // Exceptions

    pub fn rescue_clause(&self, classes: &[&str], binding: Option<&str>, body: ExprId) -> RescueClause {
        RescueClause {
            classes: classes.iter().map(|c| self.name(c)).collect(),
            binding: binding.map(|b| self.name(b)),
            body,
        }
    }

    pub fn begin(
        &self,
        body: ExprId,
        rescues: Vec<RescueClause>,
        else_branch: Option<ExprId>,
        ensure: Option<ExprId>,
    ) -> ExprId {
        self.expr(ExprKind::Begin {
            body,
            rescues,
            else_branch,
            ensure,
        })
    }

    /// `expr rescue fallback`.
    pub fn rescue_modifier(&self, body: ExprId, fallback: ExprId) -> ExprId {
        let clause = RescueClause {
            classes: Vec::new(),
            binding: None,
            body: fallback,
        };
        self.begin(body, vec![clause], None, None)
    }

    /// `begin body ensure cleanup end`.
    pub fn ensure(&self, body: ExprId, cleanup: ExprId) -> ExprId {
        self.begin(body, Vec::new(), None, Some(cleanup))
    }

    pub fn raise(&self, message: ExprId) -> ExprId {
        self.expr(ExprKind::Raise {
            class: None,
            message: Some(message),
        })
    }

    pub fn raise_class(&self, class: &str, message: Option<ExprId>) -> ExprId {
        let class = self.name(class);
        self.expr(ExprKind::Raise {
            class: Some(class),
            message,
        })
    }

    // Calls, blocks and methods

    pub fn call_full(
        &self,
        receiver: Option<ExprId>,
        method: &str,
        args: Vec<Arg>,
        block: Option<BlockArg>,
    ) -> ExprId {
        let method = self.name(method);
        self.expr(ExprKind::Call {
            receiver,
            method,
            args,
            block,
        })
    }

    pub fn call(&self, receiver: Option<ExprId>, method: &str, args: Vec<ExprId>) -> ExprId {
        self.call_full(receiver, method, positional(args), None)
    }

    pub fn call_with_block(
        &self,
        receiver: Option<ExprId>,
        method: &str,
        args: Vec<ExprId>,
        block: BlockId,
    ) -> ExprId {
        self.call_full(receiver, method, positional(args), Some(BlockArg::Literal(block)))
    }

    /// `receiver.method(args, &block_expr)`.
    pub fn call_block_pass(
        &self,
        receiver: Option<ExprId>,
        method: &str,
        args: Vec<ExprId>,
        block_expr: ExprId,
    ) -> ExprId {
        self.call_full(receiver, method, positional(args), Some(BlockArg::Pass(block_expr)))
    }

    /// Receiver-less call: `method(args)`.
    pub fn fcall(&self, method: &str, args: Vec<ExprId>) -> ExprId {
        self.call(None, method, args)
    }

    pub fn puts(&self, args: Vec<ExprId>) -> ExprId {
        self.fcall("puts", args)
    }

    pub fn print(&self, args: Vec<ExprId>) -> ExprId {
        self.fcall("print", args)
    }

    pub fn block(&self, params: ParamSpec, body: ExprId) -> BlockId {
        self.arena
            .borrow_mut()
            .alloc_block(BlockLiteral { params, body })
    }

    /// A block whose parameters are plain required names.
    pub fn simple_block(&self, params: &[&str], body: ExprId) -> BlockId {
        let spec = self.simple_params(params);
        self.block(spec, body)
    }

    pub fn simple_params(&self, params: &[&str]) -> ParamSpec {
        params
            .iter()
            .fold(ParamSpec::builder(), |b, p| b.required(self.name(p)))
            .build()
    }

    pub fn def(&self, name: &str, params: ParamSpec, body: ExprId) -> ExprId {
        let name = self.name(name);
        let id = self
            .arena
            .borrow_mut()
            .alloc_method(MethodDef { name, params, body });
        self.expr(ExprKind::Def(id))
    }

    pub fn yield_(&self, args: Vec<ExprId>) -> ExprId {
        self.expr(ExprKind::Yield(positional(args)))
    }

    pub fn yield_args(&self, args: Vec<Arg>) -> ExprId {
        self.expr(ExprKind::Yield(args))
    }

    pub fn block_given(&self) -> ExprId {
        self.expr(ExprKind::BlockGiven)
    }

    // Control operators

    pub fn next(&self, value: Option<ExprId>) -> ExprId {
        self.expr(ExprKind::Next(value))
    }

    pub fn break_(&self, value: Option<ExprId>) -> ExprId {
        self.expr(ExprKind::Break(value))
    }

    pub fn redo(&self) -> ExprId {
        self.expr(ExprKind::Redo)
    }

    pub fn retry(&self) -> ExprId {
        self.expr(ExprKind::Retry)
    }

    pub fn return_(&self, value: Option<ExprId>) -> ExprId {
        self.expr(ExprKind::Return(value))
    }

    pub fn eval(&self, code: ExprId) -> ExprId {
        self.expr(ExprKind::Eval(code))
    }
}

fn positional(args: Vec<ExprId>) -> Vec<Arg> {
    args.into_iter().map(Arg::Positional).collect()
}
