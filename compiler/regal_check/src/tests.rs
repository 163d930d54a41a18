use pretty_assertions::assert_eq;

use regal_ir::{
    BinaryOp, Module, ModuleBuilder, Mutability, Nullability, PlacePath, RegionRef, StringInterner,
    Type,
};

use crate::{analyze_unit, analyze_units, render_report, AnalysisConfig, BoundsPolicy};

fn stack_ref(mutability: Mutability) -> Type {
    Type::reference(RegionRef::Stack, Nullability::NonNull, mutability, Type::Int)
}

/// `int x = 10; &stack mut int a = &x; &stack mut int b = &x;`
fn aliasing(interner: &StringInterner, name: &str) -> Module {
    let n = |s: &str| interner.intern(s);
    let mut mb = ModuleBuilder::new(n(name));
    let mut fb = mb.function(n("f"), Type::Void);
    let ten = fb.int(10);
    let x = fb.local(n("x"), Type::Int, Some(ten));
    let first = fb.addr_of(PlacePath::new(x), RegionRef::Stack, Mutability::Mutable);
    fb.local(n("a"), stack_ref(Mutability::Mutable), Some(first));
    let second = fb.addr_of(PlacePath::new(x), RegionRef::Stack, Mutability::Mutable);
    fb.local(n("b"), stack_ref(Mutability::Mutable), Some(second));
    fb.finish();
    mb.finish()
}

fn clean(interner: &StringInterner, name: &str) -> Module {
    let n = |s: &str| interner.intern(s);
    let mut mb = ModuleBuilder::new(n(name));
    let mut fb = mb.function(n("f"), Type::Int);
    let one = fb.int(1);
    let x = fb.local(n("x"), Type::Int, Some(one));
    let read = fb.read(PlacePath::new(x));
    fb.ret(Some(read));
    fb.finish();
    mb.finish()
}

/// Reads of `count` distinct uninitialized locals.
fn uninitialized_reads(interner: &StringInterner, count: usize) -> Module {
    let n = |s: &str| interner.intern(s);
    let mut mb = ModuleBuilder::new(n("m"));
    let mut fb = mb.function(n("f"), Type::Void);
    for i in 0..count {
        let x = fb.local(n(&format!("x{i}")), Type::Int, None);
        let read = fb.read(PlacePath::new(x));
        fb.local(n(&format!("y{i}")), Type::Int, Some(read));
    }
    fb.finish();
    mb.finish()
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn default_config() {
    let config = AnalysisConfig::default();
    assert_eq!(config.const_eval_budget, 1024);
    assert_eq!(config.diagnostics.error_limit, 0);
    assert!(config.diagnostics.deduplicate);
}

#[test]
fn config_builders() {
    let config = AnalysisConfig::default()
        .with_const_eval_budget(8)
        .with_error_limit(3);
    assert_eq!(config.const_eval_budget, 8);
    assert_eq!(config.diagnostics.error_limit, 3);
}

// ── Verdict ─────────────────────────────────────────────────────────

#[test]
fn clean_unit_is_accepted() {
    let interner = StringInterner::new();
    let output = analyze_unit(&clean(&interner, "m"), &interner, &AnalysisConfig::default());
    assert!(output.verdict().is_ok());
    assert!(output.diagnostics.is_empty());
    assert_eq!(output.error_count(), 0);
}

#[test]
fn violating_unit_is_rejected() {
    let interner = StringInterner::new();
    let output = analyze_unit(
        &aliasing(&interner, "m"),
        &interner,
        &AnalysisConfig::default(),
    );
    assert!(output.verdict().is_err());
    assert_eq!(output.error_count(), 1);
    let rules: Vec<_> = output.findings().into_iter().map(|f| f.rule).collect();
    assert_eq!(rules, vec!["AliasConflict"]);
}

#[test]
fn error_limit_hides_diagnostics_but_not_the_count() {
    let interner = StringInterner::new();
    let module = uninitialized_reads(&interner, 3);
    let output = analyze_unit(
        &module,
        &interner,
        &AnalysisConfig::default().with_error_limit(1),
    );
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.error_count(), 3);
    assert!(output.verdict().is_err());
}

#[test]
fn diagnostics_are_sorted_by_position() {
    let interner = StringInterner::new();
    let output = analyze_unit(
        &uninitialized_reads(&interner, 4),
        &interner,
        &AnalysisConfig::default(),
    );
    let starts: Vec<_> = output
        .findings()
        .into_iter()
        .map(|f| f.span.start)
        .collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts.len(), 4);
    assert_eq!(starts, sorted);
}

#[test]
fn exhausted_budget_rejects_with_guard_fallback() {
    let interner = StringInterner::new();
    let n = |s: &str| interner.intern(s);
    let mut mb = ModuleBuilder::new(n("m"));
    let mut fb = mb.function(n("f"), Type::Void);
    let arr = fb.local(n("arr"), Type::array(Type::Int, 8), None);
    let two = fb.int(2);
    let three = fb.int(3);
    let index = fb.binary(BinaryOp::Add, two, three);
    let elem = fb.read(PlacePath::new(arr).index(index));
    fb.local(n("x"), Type::Int, Some(elem));
    fb.finish();
    let module = mb.finish();

    let generous = analyze_unit(&module, &interner, &AnalysisConfig::default());
    assert_eq!(generous.bounds_policy(index), Some(BoundsPolicy::ProvenSafe));
    assert!(generous.verdict().is_ok());

    let starved = analyze_unit(
        &module,
        &interner,
        &AnalysisConfig::default().with_const_eval_budget(1),
    );
    assert_eq!(starved.bounds_policy(index), Some(BoundsPolicy::RuntimeGuard));
    let rules: Vec<_> = starved.findings().into_iter().map(|f| f.rule).collect();
    assert_eq!(rules, vec!["ConstEvalBudgetExceeded"]);
    assert_eq!(starved.error_count(), 1);
    assert!(starved.verdict().is_err());
}

// ── Reports ─────────────────────────────────────────────────────────

#[test]
fn accepted_unit_renders_empty_report() {
    let interner = StringInterner::new();
    let output = analyze_unit(&clean(&interner, "m"), &interner, &AnalysisConfig::default());
    assert_eq!(render_report(&output, ""), "");
}

#[test]
fn report_lists_codes_and_summary() {
    let interner = StringInterner::new();
    let output = analyze_unit(
        &aliasing(&interner, "m"),
        &interner,
        &AnalysisConfig::default(),
    );
    let source = " ".repeat(64);
    let report = render_report(&output, &source);
    assert!(report.starts_with("error[E0401]: "), "{report}");
    assert!(report.contains("`x`"), "{report}");
    assert!(
        report.ends_with("error: aborting due to 1 previous error\n"),
        "{report}"
    );
    assert!(!report.contains('\x1b'));
}

// ── Parallel units ──────────────────────────────────────────────────

#[test]
fn parallel_results_keep_input_order() {
    let interner = StringInterner::new();
    let units = vec![
        clean(&interner, "a"),
        aliasing(&interner, "b"),
        clean(&interner, "c"),
        aliasing(&interner, "d"),
    ];
    let outputs = analyze_units(&units, &interner, &AnalysisConfig::default());
    let verdicts: Vec<bool> = outputs.iter().map(|o| o.verdict().is_ok()).collect();
    assert_eq!(verdicts, vec![true, false, true, false]);

    for (unit, output) in units.iter().zip(&outputs) {
        let alone = analyze_unit(unit, &interner, &AnalysisConfig::default());
        assert_eq!(alone.diagnostics, output.diagnostics);
    }
}
