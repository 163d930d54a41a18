use pretty_assertions::assert_eq;

use super::*;
use crate::StringInterner;

fn stmt_ids(block: &Block, out: &mut Vec<u32>) {
    for stmt in &block.stmts {
        out.push(stmt.id.raw());
        match &stmt.kind {
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                stmt_ids(then_block, out);
                if let Some(b) = else_block {
                    stmt_ids(b, out);
                }
            }
            StmtKind::While { body, .. } | StmtKind::Block(body) | StmtKind::Unsafe(body) => {
                stmt_ids(body, out);
            }
            _ => {}
        }
    }
}

#[test]
fn statement_ids_are_preorder() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let mut fb = mb.function(interner.intern("f"), Type::Void);
    let x = fb.local(interner.intern("x"), Type::Int, None);
    let cond = fb.boolean(true);
    fb.if_else(
        cond,
        |fb| {
            let one = fb.int(1);
            fb.assign(PlacePath::new(x), one);
        },
        |fb| {
            let two = fb.int(2);
            fb.assign(PlacePath::new(x), two);
        },
    );
    let cond = fb.boolean(false);
    fb.while_loop(cond, |fb| {
        fb.brk();
    });
    fb.ret(None);
    let f = fb.finish();
    let module = mb.finish();

    let body = module.function(f).and_then(|f| f.body.as_ref()).unwrap();
    let mut ids = Vec::new();
    stmt_ids(body, &mut ids);
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6]);
}

#[test]
fn compound_span_covers_children() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let mut fb = mb.function(interner.intern("f"), Type::Void);
    fb.block(|fb| {
        fb.local(interner.intern("y"), Type::Int, None);
    });
    let f = fb.finish();
    let module = mb.finish();

    let body = module.function(f).and_then(|f| f.body.as_ref()).unwrap();
    let outer = &body.stmts[0];
    let StmtKind::Block(inner) = &outer.kind else {
        panic!("expected block statement");
    };
    let child = &inner.stmts[0];
    assert!(outer.span.contains(child.span.start));
    assert!(body.span.contains(outer.span.start));
}

#[test]
fn params_are_recorded_on_finish() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let mut fb = mb.function(interner.intern("f"), Type::Int);
    let a = fb.param(interner.intern("a"), Type::Int);
    let b = fb.param(interner.intern("b"), Type::Bool);
    let f = fb.finish();
    let module = mb.finish();

    let func = module.function(f).unwrap();
    assert_eq!(func.params, vec![a, b]);
    assert_eq!(module.place(a).map(|p| p.kind), Some(PlaceKind::Param));
}

#[test]
fn call_takes_callee_return_type() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let ret = Type::reference(
        RegionRef::Heap,
        Nullability::Nullable,
        Mutability::Mutable,
        Type::Int,
    );
    let alloc = mb.extern_fn(interner.intern("alloc"), vec![], ret.clone());
    let call = mb.call(alloc, vec![]);
    let module = mb.finish();
    assert_eq!(module.expr(call).map(|e| &e.ty), Some(&ret));
    assert!(module.function(alloc).is_some_and(|f| f.body.is_none()));
}

#[test]
fn addr_of_builds_reference_to_path_type() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let g = mb.global(interner.intern("g"), Type::Bool, None);
    let e = mb.addr_of(PlacePath::new(g), RegionRef::Static, Mutability::Immutable);
    let module = mb.finish();

    let ty = module.expr(e).map(|e| e.ty.clone()).unwrap();
    assert_eq!(
        ty,
        Type::reference(
            RegionRef::Static,
            Nullability::NonNull,
            Mutability::Immutable,
            Type::Bool
        )
    );
}

#[test]
fn comparison_is_boolean() {
    let interner = StringInterner::new();
    let mut mb = ModuleBuilder::new(interner.intern("m"));
    let a = mb.int(1);
    let b = mb.int(2);
    let lt = mb.binary(BinaryOp::Lt, a, b);
    let add = mb.binary(BinaryOp::Add, a, b);
    let module = mb.finish();
    assert_eq!(module.expr(lt).map(|e| &e.ty), Some(&Type::Bool));
    assert_eq!(module.expr(add).map(|e| &e.ty), Some(&Type::Int));
}
