//! Diagnostic sink threaded through every pass.
//!
//! Passes never abort: each violation is pushed here and the walk goes on.
//! The sink applies the escape-hatch policy and drops repeats of the same
//! rule at the same span (loop bodies are walked more than once).

use rustc_hash::FxHashSet;

use regal_diagnostic::{Diagnostic, ErrorCode};
use regal_ir::Span;

/// The analysis that produced a finding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    ScopeRegion,
    DefiniteInit,
    Escape,
    Borrow,
    Invalidation,
    Nullability,
    Bounds,
}

impl Pass {
    /// The pass that reports `code`.
    pub fn of(code: ErrorCode) -> Pass {
        match code {
            ErrorCode::E0101 => Pass::ScopeRegion,
            ErrorCode::E0201 => Pass::DefiniteInit,
            ErrorCode::E0301 | ErrorCode::E0302 => Pass::Escape,
            ErrorCode::E0401 => Pass::Borrow,
            ErrorCode::E0501 => Pass::Invalidation,
            ErrorCode::E0601 => Pass::Nullability,
            ErrorCode::E0701 | ErrorCode::E0702 => Pass::Bounds,
        }
    }
}

/// A diagnostic reduced to what tests and summaries care about.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Finding {
    pub pass: Pass,
    pub rule: &'static str,
    pub span: Span,
    pub message: String,
}

impl Finding {
    pub fn from_diagnostic(diag: &Diagnostic) -> Self {
        Finding {
            pass: Pass::of(diag.code),
            rule: diag.code.rule(),
            span: diag.primary_span().unwrap_or(Span::DUMMY),
            message: diag.message.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    seen: FxHashSet<(ErrorCode, Span)>,
    suppressed: usize,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation found at a point that is (or is not) inside an
    /// escape hatch.
    pub fn report(&mut self, diag: Diagnostic, in_unsafe: bool) {
        if in_unsafe && diag.code.is_suppressible() {
            tracing::trace!(code = %diag.code, "suppressed inside unsafe block");
            self.suppressed += 1;
            return;
        }
        let span = diag.primary_span().unwrap_or(Span::DUMMY);
        if !self.seen.insert((diag.code, span)) {
            return;
        }
        tracing::debug!(code = %diag.code, %span, message = %diag.message, "violation");
        self.diagnostics.push(diag);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of findings silenced by escape hatches.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
