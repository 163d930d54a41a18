//! Nullability state and condition narrowing.
//!
//! A reference declared non-null is always safe to dereference. A nullable
//! one is safe only where a `null` comparison (or an assignment of a
//! non-null value) has narrowed it. The state is the set of nullable paths
//! currently known to be non-null; a join keeps only paths known on both
//! sides.

use rustc_hash::FxHashSet;

use regal_ir::stack::ensure_sufficient_stack;
use regal_ir::{BinaryOp, ExprId, ExprKind, Module, PlaceId, PlacePath, UnaryOp};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NullState {
    nonnull: FxHashSet<PlacePath>,
}

impl NullState {
    /// Whether dereferencing `path` is known safe.
    pub fn is_nonnull(&self, module: &Module, path: &PlacePath) -> bool {
        match module.path_type(path) {
            Some(ty) if ty.is_nullable() => self.nonnull.contains(path),
            _ => true,
        }
    }

    pub fn mark_nonnull(&mut self, path: PlacePath) {
        self.nonnull.insert(path);
    }

    /// Forget everything known about `path` and the paths below it.
    pub fn invalidate(&mut self, path: &PlacePath) {
        self.nonnull.retain(|known| !is_prefix(path, known));
    }

    /// Forget every fact that reads through a reference. Used after calls
    /// and writes through a dereference, either of which may change memory
    /// another path points at.
    pub fn invalidate_indirect(&mut self) {
        self.nonnull.retain(|known| !known.has_deref());
    }

    /// Forget facts rooted at `place` (it went out of scope).
    pub fn forget(&mut self, place: PlaceId) {
        self.nonnull.retain(|known| known.root != place);
    }

    /// Weaker of two states.
    pub fn join(&self, other: &NullState) -> NullState {
        NullState {
            nonnull: self.nonnull.intersection(&other.nonnull).cloned().collect(),
        }
    }
}

/// Whether `prefix` is `path` or one of its prefixes.
pub fn is_prefix(prefix: &PlacePath, path: &PlacePath) -> bool {
    prefix.root == path.root
        && prefix.projections.len() <= path.projections.len()
        && prefix
            .projections
            .iter()
            .zip(path.projections.iter())
            .all(|(a, b)| a == b)
}

/// Paths a branch condition proves non-null.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Narrowing {
    pub then_nonnull: Vec<PlacePath>,
    pub else_nonnull: Vec<PlacePath>,
}

impl Narrowing {
    fn swapped(self) -> Narrowing {
        Narrowing {
            then_nonnull: self.else_nonnull,
            else_nonnull: self.then_nonnull,
        }
    }
}

/// Derive narrowing facts from a condition.
///
/// Understands `p != null`, `p == null`, a bare reference used as a
/// condition, `!`, `&&` (then-branch) and `||` (else-branch).
pub fn narrowing(module: &Module, cond: ExprId) -> Narrowing {
    let Some(expr) = module.expr(cond) else {
        return Narrowing::default();
    };
    ensure_sufficient_stack(|| match &expr.kind {
        ExprKind::Place(path) if expr.ty.is_reference() => Narrowing {
            then_nonnull: vec![path.clone()],
            else_nonnull: Vec::new(),
        },
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => narrowing(module, *operand).swapped(),
        ExprKind::Binary { op, lhs, rhs } => match op {
            BinaryOp::Ne | BinaryOp::Eq => {
                let Some(path) = compared_with_null(module, *lhs, *rhs) else {
                    return Narrowing::default();
                };
                let ne = Narrowing {
                    then_nonnull: vec![path],
                    else_nonnull: Vec::new(),
                };
                if *op == BinaryOp::Ne {
                    ne
                } else {
                    ne.swapped()
                }
            }
            BinaryOp::And => {
                let mut then_nonnull = narrowing(module, *lhs).then_nonnull;
                then_nonnull.extend(narrowing(module, *rhs).then_nonnull);
                Narrowing {
                    then_nonnull,
                    else_nonnull: Vec::new(),
                }
            }
            BinaryOp::Or => {
                let mut else_nonnull = narrowing(module, *lhs).else_nonnull;
                else_nonnull.extend(narrowing(module, *rhs).else_nonnull);
                Narrowing {
                    then_nonnull: Vec::new(),
                    else_nonnull,
                }
            }
            _ => Narrowing::default(),
        },
        _ => Narrowing::default(),
    })
}

fn compared_with_null(module: &Module, lhs: ExprId, rhs: ExprId) -> Option<PlacePath> {
    let kind = |id| module.expr(id).map(|e| &e.kind);
    match (kind(lhs)?, kind(rhs)?) {
        (ExprKind::Place(path), ExprKind::Null) | (ExprKind::Null, ExprKind::Place(path)) => {
            Some(path.clone())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests;
