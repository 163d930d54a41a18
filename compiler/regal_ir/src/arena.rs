//! Flat expression storage.

use crate::{Expr, ExprId};

/// Contiguous storage for every expression of a module.
///
/// Expressions reference their operands by [`ExprId`], so the AST is a
/// DAG of indices rather than a tree of boxes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ExprArena {
    exprs: Vec<Expr>,
}

impl ExprArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        ExprArena { exprs: Vec::new() }
    }

    /// Store an expression and return its ID.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` expressions are allocated.
    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = u32::try_from(self.exprs.len())
            .unwrap_or_else(|_| panic!("expression arena overflow"));
        self.exprs.push(expr);
        ExprId::new(id)
    }

    /// Look up an expression. Returns `None` for IDs from another module.
    #[inline]
    pub fn get(&self, id: ExprId) -> Option<&Expr> {
        self.exprs.get(id.index())
    }

    /// Number of stored expressions.
    #[inline]
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// Returns `true` if no expression has been stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Iterate over `(id, expr)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ExprId, &Expr)> {
        self.exprs
            .iter()
            .enumerate()
            .map(|(i, e)| (ExprId::new(i as u32), e))
    }
}
