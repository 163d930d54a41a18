use pretty_assertions::assert_eq;
use regal_ir::{ModuleBuilder, PlacePath, StringInterner, Type};

use super::*;

fn fold(mb: ModuleBuilder, expr: ExprId) -> Result<Option<i64>, FoldError> {
    BudgetFolder::default().fold_constant(&mb.finish(), expr)
}

#[test]
fn literal_folds_to_itself() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let ten = mb.int(10);
    assert_eq!(fold(mb, ten), Ok(Some(10)));
}

#[test]
fn arithmetic_over_named_constants() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let n = interner.intern("N");
    let four = mb.int(4);
    mb.constant(n, four);
    let use_n = mb.const_use(n);
    let one = mb.int(1);
    let n_plus_1 = mb.binary(BinaryOp::Add, use_n, one);
    let two = mb.int(2);
    let expr = mb.binary(BinaryOp::Mul, n_plus_1, two);
    assert_eq!(fold(mb, expr), Ok(Some(10)));
}

#[test]
fn unknown_constant_is_not_constant() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let expr = mb.const_use(interner.intern("MISSING"));
    assert_eq!(fold(mb, expr), Ok(None));
}

#[test]
fn place_read_is_not_constant() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let g = mb.global(interner.intern("g"), Type::Int, None);
    let read = mb.read(PlacePath::new(g));
    let one = mb.int(1);
    let sum = mb.binary(BinaryOp::Add, read, one);
    assert_eq!(fold(mb, sum), Ok(None));
}

#[test]
fn overflow_and_division_by_zero_are_not_constant() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let max = mb.int(i64::MAX);
    let one = mb.int(1);
    let zero = mb.int(0);
    let overflow = mb.binary(BinaryOp::Add, max, one);
    let div = mb.binary(BinaryOp::Div, one, zero);
    let big_shift = mb.int(64);
    let shl = mb.binary(BinaryOp::Shl, one, big_shift);
    let module = mb.finish();
    let folder = BudgetFolder::default();
    assert_eq!(folder.fold_constant(&module, overflow), Ok(None));
    assert_eq!(folder.fold_constant(&module, div), Ok(None));
    assert_eq!(folder.fold_constant(&module, shl), Ok(None));
}

#[test]
fn short_circuit_ignores_non_constant_rhs() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let g = mb.global(interner.intern("g"), Type::Bool, None);
    let f = mb.boolean(false);
    let read = mb.read(PlacePath::new(g));
    let and = mb.binary(BinaryOp::And, f, read);
    assert_eq!(fold(mb, and), Ok(Some(0)));
}

#[test]
fn unary_operators() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let five = mb.int(5);
    let neg = mb.unary(UnaryOp::Neg, five);
    let not = mb.unary(UnaryOp::Not, five);
    let module = mb.finish();
    let folder = BudgetFolder::default();
    assert_eq!(folder.fold_constant(&module, neg), Ok(Some(-5)));
    assert_eq!(folder.fold_constant(&module, not), Ok(Some(0)));
}

#[test]
fn cyclic_constants_exhaust_budget() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let a = interner.intern("A");
    let b = interner.intern("B");
    let use_b = mb.const_use(b);
    mb.constant(a, use_b);
    let use_a = mb.const_use(a);
    mb.constant(b, use_a);
    let root = mb.const_use(a);

    let result = BudgetFolder::new(32).fold_constant(&mb.finish(), root);
    assert_eq!(
        result,
        Err(FoldError::BudgetExceeded {
            budget: 32,
            steps: 33
        })
    );
}

#[test]
fn small_budget_rejects_large_expression() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let mut acc = mb.int(0);
    for i in 1..=10 {
        let v = mb.int(i);
        acc = mb.binary(BinaryOp::Add, acc, v);
    }
    let module = mb.finish();
    assert_eq!(BudgetFolder::default().fold_constant(&module, acc), Ok(Some(55)));
    assert!(BudgetFolder::new(5).fold_constant(&module, acc).is_err());
}
