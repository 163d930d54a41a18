//! Analysis configuration.

use regal_diagnostic::DiagnosticConfig;

/// Knobs for one analysis run.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnalysisConfig {
    /// Steps the constant folder may take per index expression.
    pub const_eval_budget: u32,
    pub diagnostics: DiagnosticConfig,
}

impl AnalysisConfig {
    pub const DEFAULT_CONST_EVAL_BUDGET: u32 = regal_consteval::BudgetFolder::DEFAULT_BUDGET;

    #[must_use]
    pub fn with_const_eval_budget(mut self, budget: u32) -> Self {
        self.const_eval_budget = budget;
        self
    }

    #[must_use]
    pub fn with_error_limit(mut self, limit: usize) -> Self {
        self.diagnostics.error_limit = limit;
        self
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            const_eval_budget: Self::DEFAULT_CONST_EVAL_BUDGET,
            diagnostics: DiagnosticConfig::default(),
        }
    }
}
