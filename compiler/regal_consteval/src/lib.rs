//! Integer constant folding for compile-time bounds decisions.
//!
//! The safety analyzer asks one question of constant evaluation: does this
//! index expression have a value known at compile time? [`ConstFolder`] is
//! that interface. [`BudgetFolder`] is the reference implementation: it
//! folds literals, named constants and integer arithmetic, and stops after
//! a fixed number of steps so that cyclic or pathological constant
//! definitions cannot hang the analysis.
//!
//! Folding is pure. Overflow and division by zero make an expression
//! non-constant (`Ok(None)`); only budget exhaustion is an error.

mod budget;
mod folder;

pub use budget::{FoldError, StepBudget};
pub use folder::BudgetFolder;

use regal_ir::{ExprId, Module};

/// Evaluates expressions to integer constants.
///
/// Implementations must be deterministic: the analyzer relies on folding
/// the same expression twice giving the same answer.
pub trait ConstFolder: Send + Sync {
    /// Fold `expr` to an integer.
    ///
    /// Returns `Ok(None)` when the expression is not a compile-time
    /// constant.
    fn fold_constant(&self, module: &Module, expr: ExprId) -> Result<Option<i64>, FoldError>;
}
