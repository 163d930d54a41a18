//! Compile-time memory and aliasing safety analysis for Regal.
//!
//! Analysis of one unit runs in two phases:
//!
//! 1. **Scope & region construction** ([`builder`]) builds the scope tree
//!    and the arena table, and reports duplicate region names.
//! 2. **Forward walk**: one traversal per function drives every
//!    flow-sensitive pass together: definite initialization ([`init`]),
//!    escape, borrows ([`borrow`], [`liveness`]), arena invalidation
//!    ([`invalidation`]), nullability ([`nullability`]) and bounds-check
//!    policy selection ([`bounds`]).
//!
//! No pass aborts: every violation is collected in a [`DiagnosticSink`],
//! which also applies the escape-hatch (`unsafe`) policy.
//!
//! # Example
//!
//! ```ignore
//! let report = regal_safety::check_module(&module, &interner, &BudgetFolder::default());
//! for finding in report.findings() {
//!     println!("{}: {}", finding.rule, finding.message);
//! }
//! ```

pub mod borrow;
pub mod bounds;
pub mod builder;
mod escape;
pub mod init;
pub mod invalidation;
pub mod liveness;
pub mod nullability;
pub mod region;
pub mod scope;
pub mod sink;
pub mod state;
mod walk;

#[cfg(test)]
mod test_helpers;

pub use bounds::{BoundsPolicy, Decorations};
pub use builder::{ScopeMap, ScopeRegionBuilder};
pub use region::{Region, RegionId};
pub use scope::{ScopeId, ScopeKind, ScopeTree};
pub use sink::{DiagnosticSink, Finding, Pass};

use regal_consteval::ConstFolder;
use regal_diagnostic::Diagnostic;
use regal_ir::{ExprId, FuncId, Module, StringInterner};

use crate::walk::{Checker, Context};

/// Everything the analysis produced for one unit.
#[derive(Clone, Debug)]
pub struct SafetyReport {
    /// Bounds policy per index expression.
    pub decorations: Decorations,
    /// Reported violations in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
    pub scopes: ScopeMap,
    /// Violations dropped because they occurred inside `unsafe`.
    pub suppressed: usize,
}

impl SafetyReport {
    /// `true` when no error was reported.
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn findings(&self) -> Vec<Finding> {
        self.diagnostics.iter().map(Finding::from_diagnostic).collect()
    }

    pub fn bounds_policy(&self, index: ExprId) -> Option<BoundsPolicy> {
        self.decorations.bounds_policy(index)
    }
}

/// Run every safety pass over `module`.
///
/// `interner` resolves names for messages; `folder` decides which index
/// expressions are constants.
pub fn check_module(
    module: &Module,
    interner: &StringInterner,
    folder: &dyn ConstFolder,
) -> SafetyReport {
    let _span = tracing::debug_span!("check_module", unit = interner.lookup(module.name)).entered();

    let mut sink = DiagnosticSink::new();
    let scopes = ScopeRegionBuilder::new(module, interner, &mut sink).build();
    let mut decorations = Decorations::default();

    let cx = Context {
        module,
        interner,
        scopes: &scopes,
        folder,
    };
    for (i, func) in module.functions.iter().enumerate() {
        let Some(body) = &func.body else {
            continue;
        };
        let id = FuncId::new(u32::try_from(i).unwrap_or(u32::MAX));
        let Some(func_scope) = scopes.func_scope(id) else {
            tracing::warn!(function = i, "function without scope");
            continue;
        };
        Checker::new(cx, &mut sink, &mut decorations, func, func_scope).run(id, body);
    }

    let suppressed = sink.suppressed();
    let diagnostics = sink.into_diagnostics();
    tracing::debug!(
        diagnostics = diagnostics.len(),
        suppressed,
        bounds = decorations.len(),
        "unit checked"
    );
    SafetyReport {
        decorations,
        diagnostics,
        scopes,
        suppressed,
    }
}
