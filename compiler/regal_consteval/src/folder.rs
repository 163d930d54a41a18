use regal_ir::stack::ensure_sufficient_stack;
use regal_ir::{BinaryOp, ExprId, ExprKind, Module, UnaryOp};

use crate::{ConstFolder, FoldError, StepBudget};

/// Reference folder with a per-request step budget.
///
/// Every visited expression costs one step; named constants are expanded
/// in place, so a constant defined in terms of itself exhausts the budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetFolder {
    budget: u32,
}

impl BudgetFolder {
    pub const DEFAULT_BUDGET: u32 = 1024;

    pub fn new(budget: u32) -> Self {
        BudgetFolder { budget }
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }
}

impl Default for BudgetFolder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BUDGET)
    }
}

impl ConstFolder for BudgetFolder {
    fn fold_constant(&self, module: &Module, expr: ExprId) -> Result<Option<i64>, FoldError> {
        let mut folding = Folding {
            module,
            budget: StepBudget::new(self.budget),
        };
        let result = folding.fold(expr);
        if let Err(err) = &result {
            tracing::debug!(expr = expr.raw(), %err, "constant folding gave up");
        }
        result
    }
}

struct Folding<'m> {
    module: &'m Module,
    budget: StepBudget,
}

impl Folding<'_> {
    fn fold(&mut self, id: ExprId) -> Result<Option<i64>, FoldError> {
        self.budget.check()?;
        let module = self.module;
        let Some(expr) = module.expr(id) else {
            return Ok(None);
        };
        ensure_sufficient_stack(|| match &expr.kind {
            ExprKind::Int(v) => Ok(Some(*v)),
            ExprKind::Bool(b) => Ok(Some(i64::from(*b))),
            ExprKind::Const(name) => match module.const_def(*name) {
                Some(def) => self.fold(def.value),
                None => Ok(None),
            },
            ExprKind::Unary { op, operand } => {
                let Some(v) = self.fold(*operand)? else {
                    return Ok(None);
                };
                Ok(match op {
                    UnaryOp::Neg => v.checked_neg(),
                    UnaryOp::Not => Some(i64::from(v == 0)),
                    UnaryOp::BitNot => Some(!v),
                })
            }
            ExprKind::Binary { op, lhs, rhs } => self.fold_binary(*op, *lhs, *rhs),
            ExprKind::Null
            | ExprKind::Place(_)
            | ExprKind::AddrOf(_)
            | ExprKind::ArenaNew { .. }
            | ExprKind::HeapNew { .. }
            | ExprKind::Call { .. } => Ok(None),
        })
    }

    fn fold_binary(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    ) -> Result<Option<i64>, FoldError> {
        let Some(l) = self.fold(lhs)? else {
            return Ok(None);
        };

        // Short-circuit operators decide on the left operand alone.
        match op {
            BinaryOp::And if l == 0 => return Ok(Some(0)),
            BinaryOp::Or if l != 0 => return Ok(Some(1)),
            _ => {}
        }

        let Some(r) = self.fold(rhs)? else {
            return Ok(None);
        };

        let shift = || u32::try_from(r).ok();
        Ok(match op {
            BinaryOp::Add => l.checked_add(r),
            BinaryOp::Sub => l.checked_sub(r),
            BinaryOp::Mul => l.checked_mul(r),
            BinaryOp::Div => l.checked_div(r),
            BinaryOp::Rem => l.checked_rem(r),
            BinaryOp::Shl => shift().and_then(|s| l.checked_shl(s)),
            BinaryOp::Shr => shift().and_then(|s| l.checked_shr(s)),
            BinaryOp::BitAnd => Some(l & r),
            BinaryOp::BitOr => Some(l | r),
            BinaryOp::BitXor => Some(l ^ r),
            BinaryOp::Eq => Some(i64::from(l == r)),
            BinaryOp::Ne => Some(i64::from(l != r)),
            BinaryOp::Lt => Some(i64::from(l < r)),
            BinaryOp::Le => Some(i64::from(l <= r)),
            BinaryOp::Gt => Some(i64::from(l > r)),
            BinaryOp::Ge => Some(i64::from(l >= r)),
            BinaryOp::And | BinaryOp::Or => Some(i64::from(r != 0)),
        })
    }
}

#[cfg(test)]
mod tests;
