use pretty_assertions::assert_eq;

use regal_ir::{ModuleBuilder, Mutability, Nullability, PlacePath, RegionRef, StringInterner, Type};

use super::{encode_unit, load_unit, LoadError};
use crate::{analyze_unit, AnalysisConfig};

fn conflicting_unit(interner: &StringInterner) -> regal_ir::Module {
    let n = |s: &str| interner.intern(s);
    let ty = Type::reference(
        RegionRef::Stack,
        Nullability::NonNull,
        Mutability::Mutable,
        Type::Int,
    );
    let mut mb = ModuleBuilder::new(n("unit"));
    let mut fb = mb.function(n("f"), Type::Void);
    let zero = fb.int(0);
    let x = fb.local(n("x"), Type::Int, Some(zero));
    let first = fb.addr_of(PlacePath::new(x), RegionRef::Stack, Mutability::Mutable);
    fb.local(n("a"), ty.clone(), Some(first));
    let second = fb.addr_of(PlacePath::new(x), RegionRef::Stack, Mutability::Mutable);
    fb.local(n("b"), ty, Some(second));
    fb.finish();
    mb.finish()
}

#[test]
fn loaded_unit_analyzes_like_the_original() {
    let interner = StringInterner::new();
    let module = conflicting_unit(&interner);
    let bytes = encode_unit(&module, &interner).unwrap();

    let loaded = load_unit(&bytes).unwrap();
    assert_eq!(loaded.module, module);
    assert_eq!(loaded.interner.len(), interner.len());
    assert_eq!(loaded.interner.lookup(module.name), "unit");

    let config = AnalysisConfig::default();
    let before = analyze_unit(&module, &interner, &config);
    let after = analyze_unit(&loaded.module, &loaded.interner, &config);
    assert_eq!(before.diagnostics, after.diagnostics);
}

#[test]
fn truncated_bytes_are_rejected() {
    let interner = StringInterner::new();
    let module = conflicting_unit(&interner);
    let bytes = encode_unit(&module, &interner).unwrap();

    let result = load_unit(&bytes[..bytes.len() / 2]);
    assert!(matches!(result, Err(LoadError::Codec(_))));
}
