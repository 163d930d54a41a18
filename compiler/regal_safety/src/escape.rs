//! Escape analysis.
//!
//! A reference may only be stored where it cannot outlive its referent:
//! the target's annotated region must be outlived by the value's region,
//! and the target's storage must not outlive the scope the referent lives
//! in. Returns additionally reject anything pointing into the function's
//! own frame or into an arena the function declares.

use regal_diagnostic::{Diagnostic, ErrorCode};
use regal_ir::{PlacePath, RefType, Span};

use crate::region::Region;
use crate::state::{FlowState, RefValue};
use crate::walk::{Checker, Value};

impl Checker<'_> {
    /// Storing `value` into `target`, whose type is `target_ty`.
    pub(crate) fn check_store(
        &mut self,
        state: &FlowState,
        target: &PlacePath,
        target_ty: &RefType,
        value: &RefValue,
        span: Span,
    ) {
        let scopes = self.cx.scopes;
        let target_region = self.lower_region(target_ty);
        let target_scope = self.storage_scope(state, target);
        let what = self.describe(target);

        if !value.region.outlives(target_region, &scopes.regions, &scopes.tree) {
            let diag = Diagnostic::error(ErrorCode::E0301)
                .with_message(format!(
                    "reference into {} memory cannot be stored in `{what}`",
                    self.describe_region(value.region)
                ))
                .with_label(span, "stored here")
                .with_note(format!(
                    "`{what}` holds references into {}",
                    self.describe_region(target_region)
                ));
            self.report(diag);
            return;
        }

        if !scopes.tree.is_ancestor_or_equal(value.lifetime, target_scope) {
            let diag = Diagnostic::error(ErrorCode::E0301)
                .with_message(format!("`{what}` outlives the storage this reference points to"))
                .with_label(span, "stored here")
                .with_note("the referent goes out of scope before the reference does");
            self.report(diag);
        }
    }

    /// Passing `value` for a parameter of type `param_ty`.
    pub(crate) fn check_argument(&mut self, value: &RefValue, param_ty: &RefType, span: Span) {
        let scopes = self.cx.scopes;
        let param_region = self.lower_region(param_ty);
        if value.region.outlives(param_region, &scopes.regions, &scopes.tree) {
            return;
        }
        let diag = Diagnostic::error(ErrorCode::E0301)
            .with_message(format!(
                "reference into {} memory passed where {} is expected",
                self.describe_region(value.region),
                self.describe_region(param_region)
            ))
            .with_label(span, "argument");
        self.report(diag);
    }

    pub(crate) fn check_return(
        &mut self,
        state: &mut FlowState,
        value: &Value,
        span: Span,
        source: Option<&PlacePath>,
    ) {
        let Some(reference) = &value.reference else {
            return;
        };
        self.check_fresh(state, reference.stamp, span, source, "returned");

        let scopes = self.cx.scopes;
        let func_scope = self.func_scope;
        let local = move |scope| scopes.tree.is_ancestor_or_equal(func_scope, scope);
        match reference.region {
            Region::Stack if local(reference.lifetime) => {
                let diag = Diagnostic::error(ErrorCode::E0302)
                    .with_message("returning a reference to stack memory of this function")
                    .with_label(span, "returns a reference to a local")
                    .with_note("the local is destroyed when the function returns")
                    .with_suggestion("return the value, or allocate it with `new`");
                self.report(diag);
            }
            Region::Arena(id) if scopes.regions.get(id).is_some_and(|r| local(r.scope)) => {
                let diag = Diagnostic::error(ErrorCode::E0301)
                    .with_message(format!(
                        "reference into {} escapes the function that declares it",
                        self.describe_region(reference.region)
                    ))
                    .with_label(span, "returned here");
                self.report(diag);
            }
            region => {
                let Some(ret) = self.func.ret.as_ref_type() else {
                    return;
                };
                let expected = self.lower_region(ret);
                if !region.outlives(expected, &scopes.regions, &scopes.tree) {
                    let diag = Diagnostic::error(ErrorCode::E0301)
                        .with_message(format!(
                            "returning a reference into {} memory where {} is declared",
                            self.describe_region(region),
                            self.describe_region(expected)
                        ))
                        .with_label(span, "returned here");
                    self.report(diag);
                }
            }
        }
    }
}
