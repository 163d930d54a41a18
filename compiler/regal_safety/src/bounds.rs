//! Bounds-check policy selection.
//!
//! Every index expression gets exactly one [`BoundsPolicy`]. A constant
//! index into a fixed-size array is decided at compile time; anything else
//! keeps a runtime guard, which an escape hatch turns off.

use std::fmt;

use rustc_hash::FxHashMap;

use regal_diagnostic::{Diagnostic, ErrorCode};
use regal_ir::{ExprId, PlacePath, Type};

use crate::walk::Checker;

/// How an index expression is compiled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoundsPolicy {
    /// Constant index, in range. No check emitted.
    ProvenSafe,
    /// Index checked at runtime.
    RuntimeGuard,
    /// Constant index, out of range. Reported as an error.
    CompileError,
    /// Inside an escape hatch. No check emitted.
    Unchecked,
}

impl BoundsPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            BoundsPolicy::ProvenSafe => "proven-safe",
            BoundsPolicy::RuntimeGuard => "runtime-guard",
            BoundsPolicy::CompileError => "compile-error",
            BoundsPolicy::Unchecked => "unchecked",
        }
    }

    /// Whether code generation emits a check for this index.
    pub fn needs_guard(self) -> bool {
        self == BoundsPolicy::RuntimeGuard
    }
}

impl fmt::Display for BoundsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-expression annotations consumed by code generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decorations {
    bounds: FxHashMap<ExprId, BoundsPolicy>,
}

impl Decorations {
    /// Policy of the index expression `index`.
    pub fn bounds_policy(&self, index: ExprId) -> Option<BoundsPolicy> {
        self.bounds.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// All decisions, ordered by expression.
    pub fn iter(&self) -> impl Iterator<Item = (ExprId, BoundsPolicy)> {
        let mut all: Vec<_> = self.bounds.iter().map(|(e, p)| (*e, *p)).collect();
        all.sort_by_key(|(e, _)| *e);
        all.into_iter()
    }

    pub(crate) fn record(&mut self, index: ExprId, policy: BoundsPolicy) {
        self.bounds.insert(index, policy);
    }
}

impl Checker<'_> {
    /// Decide the policy for indexing `base` with `index`.
    pub(crate) fn select_bounds_policy(&mut self, base: &PlacePath, index: ExprId) {
        let module = self.cx.module;
        let guard = if self.in_unsafe() {
            BoundsPolicy::Unchecked
        } else {
            BoundsPolicy::RuntimeGuard
        };
        let span = module.expr(index).map(|e| e.span).unwrap_or_default();

        let policy = match module.path_type(base) {
            Some(Type::Array { len, .. }) => match self.cx.folder.fold_constant(module, index) {
                Ok(Some(value)) if u64::try_from(value).is_ok_and(|v| v < *len) => {
                    BoundsPolicy::ProvenSafe
                }
                Ok(Some(value)) => {
                    let what = self.describe(base);
                    let diag = Diagnostic::error(ErrorCode::E0701)
                        .with_message(format!(
                            "index {value} is out of bounds for `{what}` of length {len}"
                        ))
                        .with_label(span, "index out of bounds")
                        .with_note(format!("valid indices are 0 to {}", len.saturating_sub(1)));
                    self.report(diag);
                    BoundsPolicy::CompileError
                }
                Ok(None) => guard,
                Err(err) => {
                    let diag = Diagnostic::error(ErrorCode::E0702)
                        .with_message(err.to_string())
                        .with_label(span, "index evaluated at runtime instead");
                    self.report(diag);
                    guard
                }
            },
            Some(Type::Slice { .. }) => guard,
            other => {
                tracing::warn!(index = index.raw(), ty = ?other, "index into a non-indexable type");
                guard
            }
        };
        tracing::trace!(index = index.raw(), %policy, "bounds policy");
        self.decorations.record(index, policy);
    }
}
