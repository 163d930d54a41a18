use pretty_assertions::assert_eq;

use regal_ir::{ModuleBuilder, Mutability, Nullability, RegionRef, StringInterner, Type};

use super::*;

fn at(raw: u32) -> StmtId {
    StmtId::new(raw)
}

#[test]
fn last_use_is_the_final_reading_statement() {
    let interner = StringInterner::new();
    let n = |s: &str| interner.intern(s);
    let ref_ty = Type::reference(
        RegionRef::Stack,
        Nullability::NonNull,
        Mutability::Mutable,
        Type::Int,
    );
    let mut mb = ModuleBuilder::new(n("m"));
    let mut fb = mb.function(n("f"), Type::Void);
    let one = fb.int(1);
    let x = fb.local(n("x"), Type::Int, Some(one)); // 0
    let addr = fb.addr_of(PlacePath::new(x), RegionRef::Stack, Mutability::Mutable);
    let a = fb.local(n("a"), ref_ty, Some(addr)); // 1
    let read = fb.read(PlacePath::new(a).deref());
    fb.eval(read); // 2
    let unused = fb.local(n("unused"), Type::Int, None); // 3
    let five = fb.int(5);
    fb.assign(PlacePath::new(unused), five); // 4
    fb.finish();
    let module = mb.finish();
    let func = &module.functions[0];

    let uses = LastUse::compute(&module, func);
    assert_eq!(uses.get(x), Some(at(1)));
    assert_eq!(uses.get(a), Some(at(2)));
    assert_eq!(uses.get(unused), None);
}

#[test]
fn holder_keeps_loan_until_last_use() {
    let mut uses = LastUse::default();
    let holder = PlaceId::new(0);
    uses.record_use(holder, at(5));

    assert!(uses.holds(holder, at(2), at(4)));
    assert!(uses.holds(holder, at(2), at(5)));
    assert!(!uses.holds(holder, at(2), at(6)));
}

#[test]
fn holder_never_used_again_keeps_loan() {
    let mut uses = LastUse::default();
    let holder = PlaceId::new(0);
    uses.record_use(holder, at(3));

    assert!(uses.holds(holder, at(3), at(10)));
    assert!(uses.holds(PlaceId::new(1), at(0), at(10)));
}

#[test]
fn overwrite_ends_the_earlier_value() {
    let mut uses = LastUse::default();
    let holder = PlaceId::new(0);
    uses.record_use(holder, at(3));
    uses.record_use(holder, at(7));
    uses.record_overwrite(holder, at(6), at(0)..=at(7));

    assert!(uses.holds(holder, at(2), at(3)));
    assert!(!uses.holds(holder, at(2), at(4)));
    assert!(uses.holds(holder, at(6), at(7)));
}

#[test]
fn overwrite_in_a_branch_keeps_the_earlier_value() {
    let mut uses = LastUse::default();
    let holder = PlaceId::new(0);
    uses.record_use(holder, at(3));
    uses.record_use(holder, at(7));
    uses.record_overwrite(holder, at(5), at(5)..=at(5));

    assert!(uses.holds(holder, at(2), at(6)));
    assert!(uses.holds(holder, at(2), at(7)));
}

/// `x = 0; a = &x; *a = 1; b = &x; *b = 2; a = &y; *a = 3;`
#[test]
fn reassigned_holder_is_scanned_per_value() {
    let interner = StringInterner::new();
    let n = |s: &str| interner.intern(s);
    let ref_ty = Type::reference(
        RegionRef::Stack,
        Nullability::NonNull,
        Mutability::Mutable,
        Type::Int,
    );
    let mut mb = ModuleBuilder::new(n("m"));
    let mut fb = mb.function(n("f"), Type::Void);
    let zero = fb.int(0);
    let x = fb.local(n("x"), Type::Int, Some(zero)); // 0
    let zero = fb.int(0);
    let y = fb.local(n("y"), Type::Int, Some(zero)); // 1
    let addr = fb.addr_of(PlacePath::new(x), RegionRef::Stack, Mutability::Mutable);
    let a = fb.local(n("a"), ref_ty.clone(), Some(addr)); // 2
    let one = fb.int(1);
    fb.assign(PlacePath::new(a).deref(), one); // 3
    let addr = fb.addr_of(PlacePath::new(x), RegionRef::Stack, Mutability::Mutable);
    let b = fb.local(n("b"), ref_ty, Some(addr)); // 4
    let two = fb.int(2);
    fb.assign(PlacePath::new(b).deref(), two); // 5
    let addr = fb.addr_of(PlacePath::new(y), RegionRef::Stack, Mutability::Mutable);
    fb.assign(PlacePath::new(a), addr); // 6
    let three = fb.int(3);
    fb.assign(PlacePath::new(a).deref(), three); // 7
    fb.finish();
    let module = mb.finish();

    let uses = LastUse::compute(&module, &module.functions[0]);
    assert_eq!(uses.get(a), Some(at(7)));
    assert!(!uses.holds(a, at(2), at(4)));
    assert!(uses.holds(a, at(6), at(7)));
    assert!(uses.holds(b, at(4), at(5)));
}

#[test]
fn overwrite_inside_a_loop_bounds_nothing() {
    let interner = StringInterner::new();
    let n = |s: &str| interner.intern(s);
    let ref_ty = Type::reference(
        RegionRef::Stack,
        Nullability::NonNull,
        Mutability::Mutable,
        Type::Int,
    );
    let mut mb = ModuleBuilder::new(n("m"));
    let mut fb = mb.function(n("f"), Type::Void);
    let c = fb.param(n("c"), Type::Bool);
    let zero = fb.int(0);
    let x = fb.local(n("x"), Type::Int, Some(zero)); // 0
    let addr = fb.addr_of(PlacePath::new(x), RegionRef::Stack, Mutability::Mutable);
    let a = fb.local(n("a"), ref_ty, Some(addr)); // 1
    let cond = fb.read(PlacePath::new(c));
    fb.while_loop(cond, |fb| {
        // 2
        let one = fb.int(1);
        fb.assign(PlacePath::new(a).deref(), one); // 3
        let addr = fb.addr_of(PlacePath::new(x), RegionRef::Stack, Mutability::Mutable);
        fb.assign(PlacePath::new(a), addr); // 4
    });
    fb.finish();
    let module = mb.finish();

    let uses = LastUse::compute(&module, &module.functions[0]);
    assert!(uses.holds(a, at(1), at(4)));
    assert!(uses.holds(a, at(4), at(3)));
}

#[test]
fn write_through_reference_is_a_use() {
    let interner = StringInterner::new();
    let n = |s: &str| interner.intern(s);
    let ref_ty = Type::reference(
        RegionRef::Heap,
        Nullability::NonNull,
        Mutability::Mutable,
        Type::Int,
    );
    let mut mb = ModuleBuilder::new(n("m"));
    let mut fb = mb.function(n("f"), Type::Void);
    let r = fb.param(n("r"), ref_ty);
    let one = fb.int(1);
    fb.assign(PlacePath::new(r).deref(), one); // 0
    fb.finish();
    let module = mb.finish();

    let uses = LastUse::compute(&module, &module.functions[0]);
    assert_eq!(uses.get(r), Some(at(0)));
}

#[test]
fn uses_inside_loop_extend_to_its_end() {
    let interner = StringInterner::new();
    let n = |s: &str| interner.intern(s);
    let mut mb = ModuleBuilder::new(n("m"));
    let mut fb = mb.function(n("f"), Type::Void);
    let c = fb.param(n("c"), Type::Bool);
    let zero = fb.int(0);
    let x = fb.local(n("x"), Type::Int, Some(zero)); // 0
    let cond = fb.read(PlacePath::new(c));
    let mut inner = None;
    fb.while_loop(cond, |fb| {
        // 1
        let read_x = fb.read(PlacePath::new(x));
        let y = fb.local(n("y"), Type::Int, Some(read_x)); // 2
        let read_y = fb.read(PlacePath::new(y));
        fb.local(n("z"), Type::Int, Some(read_y)); // 3
        let two = fb.int(2);
        fb.eval(two); // 4
        inner = Some(y);
    });
    let done = fb.int(0);
    fb.eval(done); // 5
    fb.finish();
    let module = mb.finish();

    let uses = LastUse::compute(&module, &module.functions[0]);
    assert_eq!(uses.get(x), Some(at(4)));
    assert_eq!(uses.get(c), Some(at(4)));
    assert_eq!(uses.get(inner.unwrap_or(PlaceId::new(u32::MAX))), Some(at(3)));
}
