use pretty_assertions::assert_eq;

use regal_ir::{ModuleBuilder, Mutability, Name, Nullability, RegionRef, StringInterner, Type};

use super::*;

struct Fixture {
    module: Module,
    p: PlaceId,
    q: PlaceId,
    count: PlaceId,
    conds: Conds,
}

struct Conds {
    p_ne_null: ExprId,
    null_eq_p: ExprId,
    not_p_ne_null: ExprId,
    bare_p: ExprId,
    both: ExprId,
    either_null: ExprId,
    int_compare: ExprId,
}

fn fixture() -> Fixture {
    let interner = StringInterner::new();
    let n = |s: &str| interner.intern(s);
    let ty = Type::reference(
        RegionRef::Heap,
        Nullability::Nullable,
        Mutability::Mutable,
        Type::Int,
    );
    let mut mb = ModuleBuilder::new(n("m"));
    let mut fb = mb.function(n("f"), Type::Void);
    let p = fb.param(n("p"), ty.clone());
    let q = fb.param(n("q"), ty.clone());
    let count = fb.param(n("count"), Type::Int);

    let compare = |fb: &mut ModuleBuilder, place: PlaceId, op: BinaryOp, null_first: bool| {
        let read = fb.read(PlacePath::new(place));
        let null = fb.null(ty.clone());
        if null_first {
            fb.binary(op, null, read)
        } else {
            fb.binary(op, read, null)
        }
    };
    let p_ne_null = compare(&mut *fb, p, BinaryOp::Ne, false);
    let null_eq_p = compare(&mut *fb, p, BinaryOp::Eq, true);
    let inner = compare(&mut *fb, p, BinaryOp::Ne, false);
    let not_p_ne_null = fb.unary(UnaryOp::Not, inner);
    let bare_p = fb.read(PlacePath::new(p));
    let left = compare(&mut *fb, p, BinaryOp::Ne, false);
    let right = compare(&mut *fb, q, BinaryOp::Ne, false);
    let both = fb.binary(BinaryOp::And, left, right);
    let left = compare(&mut *fb, p, BinaryOp::Eq, false);
    let right = compare(&mut *fb, q, BinaryOp::Eq, false);
    let either_null = fb.binary(BinaryOp::Or, left, right);
    let lhs = fb.read(PlacePath::new(count));
    let zero = fb.int(0);
    let int_compare = fb.binary(BinaryOp::Ne, lhs, zero);
    fb.finish();

    Fixture {
        module: mb.finish(),
        p,
        q,
        count,
        conds: Conds {
            p_ne_null,
            null_eq_p,
            not_p_ne_null,
            bare_p,
            both,
            either_null,
            int_compare,
        },
    }
}

fn path(place: PlaceId) -> PlacePath {
    PlacePath::new(place)
}

// ── NullState ───────────────────────────────────────────────────────

#[test]
fn non_reference_paths_are_always_safe() {
    let f = fixture();
    let state = NullState::default();
    assert!(state.is_nonnull(&f.module, &path(f.count)));
    assert!(!state.is_nonnull(&f.module, &path(f.p)));
}

#[test]
fn invalidate_drops_the_path_and_its_extensions() {
    let f = fixture();
    let field = Name::from_raw(9);
    let mut state = NullState::default();
    state.mark_nonnull(path(f.p));
    state.mark_nonnull(path(f.p).deref().field(field));
    state.mark_nonnull(path(f.q));

    state.invalidate(&path(f.p));
    assert!(!state.is_nonnull(&f.module, &path(f.p)));
    assert!(state.is_nonnull(&f.module, &path(f.q)));
    assert_eq!(state.nonnull.len(), 1);
}

#[test]
fn indirect_invalidation_keeps_bare_places() {
    let f = fixture();
    let field = Name::from_raw(9);
    let mut state = NullState::default();
    state.mark_nonnull(path(f.p));
    state.mark_nonnull(path(f.q).deref().field(field));

    state.invalidate_indirect();
    assert!(state.is_nonnull(&f.module, &path(f.p)));
    assert_eq!(state.nonnull.len(), 1);
}

#[test]
fn join_is_intersection() {
    let f = fixture();
    let mut left = NullState::default();
    left.mark_nonnull(path(f.p));
    left.mark_nonnull(path(f.q));
    let mut right = NullState::default();
    right.mark_nonnull(path(f.q));

    let joined = left.join(&right);
    assert!(!joined.is_nonnull(&f.module, &path(f.p)));
    assert!(joined.is_nonnull(&f.module, &path(f.q)));
}

#[test]
fn prefix_relation() {
    let field = Name::from_raw(9);
    let p = path(PlaceId::new(0));
    assert!(is_prefix(&p, &p));
    assert!(is_prefix(&p, &p.clone().deref().field(field)));
    assert!(!is_prefix(&p.clone().deref(), &p));
    assert!(!is_prefix(&p, &path(PlaceId::new(1))));
}

// ── Narrowing ───────────────────────────────────────────────────────

#[test]
fn not_equal_null_narrows_then_branch() {
    let f = fixture();
    let facts = narrowing(&f.module, f.conds.p_ne_null);
    assert_eq!(facts.then_nonnull, vec![path(f.p)]);
    assert!(facts.else_nonnull.is_empty());
}

#[test]
fn equal_null_narrows_else_branch_either_side() {
    let f = fixture();
    let facts = narrowing(&f.module, f.conds.null_eq_p);
    assert!(facts.then_nonnull.is_empty());
    assert_eq!(facts.else_nonnull, vec![path(f.p)]);
}

#[test]
fn negation_swaps_branches() {
    let f = fixture();
    let facts = narrowing(&f.module, f.conds.not_p_ne_null);
    assert_eq!(facts.else_nonnull, vec![path(f.p)]);
}

#[test]
fn bare_reference_condition() {
    let f = fixture();
    let facts = narrowing(&f.module, f.conds.bare_p);
    assert_eq!(facts.then_nonnull, vec![path(f.p)]);
}

#[test]
fn conjunction_and_disjunction() {
    let f = fixture();
    let both = narrowing(&f.module, f.conds.both);
    assert_eq!(both.then_nonnull, vec![path(f.p), path(f.q)]);
    assert!(both.else_nonnull.is_empty());

    let either = narrowing(&f.module, f.conds.either_null);
    assert!(either.then_nonnull.is_empty());
    assert_eq!(either.else_nonnull, vec![path(f.p), path(f.q)]);
}

#[test]
fn integer_comparison_narrows_nothing() {
    let f = fixture();
    assert_eq!(
        narrowing(&f.module, f.conds.int_compare),
        Narrowing::default()
    );
}
