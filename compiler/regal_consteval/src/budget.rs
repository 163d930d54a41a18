use thiserror::Error;

/// Failure of constant folding.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldError {
    /// The step budget ran out before a value was found.
    #[error("constant evaluation exceeded its budget of {budget} steps")]
    BudgetExceeded {
        /// The configured budget.
        budget: u32,
        /// Steps taken when folding stopped.
        steps: usize,
    },
}

/// Step counter for one folding request.
#[derive(Debug)]
pub struct StepBudget {
    steps: usize,
    budget: u32,
}

impl StepBudget {
    pub fn new(budget: u32) -> Self {
        StepBudget { steps: 0, budget }
    }

    /// Count one step, failing once the budget is exceeded.
    #[inline]
    pub fn check(&mut self) -> Result<(), FoldError> {
        self.steps = self.steps.saturating_add(1);
        if self.steps > self.budget as usize {
            return Err(FoldError::BudgetExceeded {
                budget: self.budget,
                steps: self.steps,
            });
        }
        Ok(())
    }

    /// Steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }
}
