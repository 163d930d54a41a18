//! Regal IR - the typed AST handed to the safety analyzer.
//!
//! This crate contains the data structures the front end produces once
//! parsing, name resolution and type annotation are done:
//! - Spans for source locations
//! - Names for interned identifiers
//! - Types with region, nullability and mutability annotations
//! - Functions, statements and place paths
//! - A flat expression arena indexed by [`ExprId`]
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers are `Name(u32)`.
//! - **Flatten Expressions**: no `Box<Expr>`; operands are `ExprId` indices.
//! - **Resolve Up Front**: every identifier already points at a unique
//!   [`PlaceId`]; every declaration carries its region and nullability.
//!
//! Statements are numbered in program order ([`StmtId`]). The analyzer uses
//! these numbers as program points, so a front end must assign them in a
//! pre-order walk. [`ModuleBuilder`] does this automatically.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod arena;
pub mod ast;
pub mod builder;
mod ids;
mod interner;
mod span;
pub mod stack;
mod types;

pub use arena::ExprArena;
pub use ast::{
    BinaryOp, Block, ConstDef, Expr, ExprKind, Function, GlobalDecl, Module, PlaceDecl, PlaceKind,
    PlacePath, Projection, RegionDecl, Stmt, StmtKind, UnaryOp,
};
pub use builder::{FunctionBuilder, ModuleBuilder};
pub use ids::{BlockId, ExprId, FuncId, PlaceId, StmtId, StructId};
pub use interner::{InternError, Name, StringInterner};
pub use span::{Span, SpanError};
pub use types::{FieldDef, Mutability, Nullability, RefType, RegionRef, StructDef, Type};
