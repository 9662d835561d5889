//! Garnet IR - compiled shapes consumed by the block runtime.
//!
//! This crate provides:
//! - Interned identifiers (`Name`, `StringInterner`, `SharedInterner`)
//! - Compiled block and method parameter patterns (`ParamSpec`)
//! - A small arena-allocated expression tree for block and method bodies
//!   (`ExprArena`, `ExprId`, `BlockId`, `MethodId`)
//! - `ProgramBuilder`, the construction surface used by hosts and tests
//!
//! Parsing is not part of this workspace; front ends lower their syntax into
//! the arena through the builder.

mod arena;
mod builder;
mod expr;
mod interner;
mod name;
mod params;

pub use arena::{ExprArena, SharedArena};
pub use builder::{Program, ProgramBuilder};
pub use expr::{
    Arg, BinaryOp, BlockArg, BlockId, BlockLiteral, ExprId, ExprKind, MethodDef, MethodId,
    RescueClause,
};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use params::{OptionalParam, ParamSlot, ParamSpec, ParamSpecBuilder, RestParam};
