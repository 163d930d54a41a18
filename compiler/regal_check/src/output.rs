//! Result of analyzing one unit.

use regal_diagnostic::{Diagnostic, DiagnosticConfig, DiagnosticQueue, ErrorGuaranteed, Severity};
use regal_ir::ExprId;
use regal_safety::{BoundsPolicy, Decorations, Finding, SafetyReport};

/// Decorations and diagnostics for one unit.
#[derive(Clone, Debug)]
pub struct AnalysisOutput {
    /// Bounds policy per index expression, for code generation.
    pub decorations: Decorations,
    /// Diagnostics sorted by source position.
    pub diagnostics: Vec<Diagnostic>,
    /// Violations silenced by `unsafe` blocks.
    pub suppressed: usize,
    /// Errors found, including any hidden by the error limit.
    error_count: usize,
}

impl AnalysisOutput {
    pub(crate) fn from_report(report: SafetyReport, config: &DiagnosticConfig) -> Self {
        let error_count = report.diagnostics.iter().filter(|d| d.is_error()).count();
        let mut queue = DiagnosticQueue::with_config(config.clone());
        for diag in report.diagnostics {
            queue.add(diag);
        }
        let diagnostics = queue.flush();
        tracing::debug!(
            errors = error_count,
            shown = diagnostics.len(),
            suppressed = report.suppressed,
            "analysis finished"
        );
        AnalysisOutput {
            decorations: report.decorations,
            diagnostics,
            suppressed: report.suppressed,
            error_count,
        }
    }

    /// `Ok` when the unit is accepted.
    pub fn verdict(&self) -> Result<(), ErrorGuaranteed> {
        match ErrorGuaranteed::from_error_count(self.error_count) {
            Some(guarantee) => Err(guarantee),
            None => Ok(()),
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn findings(&self) -> Vec<Finding> {
        self.diagnostics.iter().map(Finding::from_diagnostic).collect()
    }

    pub fn bounds_policy(&self, index: ExprId) -> Option<BoundsPolicy> {
        self.decorations.bounds_policy(index)
    }
}
