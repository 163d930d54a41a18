//! Driver for the Regal safety analyzer.
//!
//! Wraps [`regal_safety::check_module`] with configuration, stable
//! diagnostic ordering, a verdict, plain-text reports, and parallel
//! analysis of independent units.
//!
//! # Example
//!
//! ```ignore
//! regal_check::init_tracing();
//! let output = regal_check::analyze_unit(&module, &interner, &AnalysisConfig::default());
//! if output.verdict().is_err() {
//!     eprint!("{}", regal_check::render_report(&output, &source));
//! }
//! ```

mod config;
mod output;
mod report;
mod telemetry;

#[cfg(feature = "cache")]
mod cache;

#[cfg(test)]
mod tests;

pub use config::AnalysisConfig;
pub use output::AnalysisOutput;
pub use report::render_report;
pub use telemetry::init_tracing;

#[cfg(feature = "cache")]
pub use cache::{encode_unit, load_unit, LoadError, LoadedUnit};

pub use regal_safety::{BoundsPolicy, Decorations, Finding, Pass};

use rayon::prelude::*;

use regal_consteval::BudgetFolder;
use regal_ir::{Module, StringInterner};

/// Analyze one unit.
pub fn analyze_unit(
    module: &Module,
    interner: &StringInterner,
    config: &AnalysisConfig,
) -> AnalysisOutput {
    let folder = BudgetFolder::new(config.const_eval_budget);
    let report = regal_safety::check_module(module, interner, &folder);
    AnalysisOutput::from_report(report, &config.diagnostics)
}

/// Analyze independent units in parallel. Results keep the input order.
pub fn analyze_units(
    units: &[Module],
    interner: &StringInterner,
    config: &AnalysisConfig,
) -> Vec<AnalysisOutput> {
    tracing::debug!(units = units.len(), "analyzing units");
    units
        .par_iter()
        .map(|module| analyze_unit(module, interner, config))
        .collect()
}
