//! Shared helpers for building small units in tests.

use regal_consteval::BudgetFolder;
use regal_ir::{Module, Mutability, Nullability, RegionRef, StringInterner, Type};

use crate::{check_module, SafetyReport};

pub(crate) fn check(module: &Module, interner: &StringInterner) -> SafetyReport {
    check_module(module, interner, &BudgetFolder::default())
}

/// Rule names of every reported violation, in report order.
pub(crate) fn rules(report: &SafetyReport) -> Vec<&'static str> {
    report.findings().into_iter().map(|f| f.rule).collect()
}

pub(crate) fn stack_ref(pointee: Type, mutability: Mutability) -> Type {
    Type::reference(RegionRef::Stack, Nullability::NonNull, mutability, pointee)
}

pub(crate) fn static_ref(pointee: Type) -> Type {
    Type::reference(
        RegionRef::Static,
        Nullability::NonNull,
        Mutability::Mutable,
        pointee,
    )
}

pub(crate) fn heap_ref(pointee: Type, nullability: Nullability) -> Type {
    Type::reference(RegionRef::Heap, nullability, Mutability::Mutable, pointee)
}

pub(crate) fn arena_ref(region: &str, interner: &StringInterner, pointee: Type) -> Type {
    Type::reference(
        RegionRef::Arena(interner.intern(region)),
        Nullability::NonNull,
        Mutability::Mutable,
        pointee,
    )
}
