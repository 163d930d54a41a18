//! Concrete types as annotated by the front end.
//!
//! Generic instantiation has already happened, so the analyzer only ever
//! sees these closed shapes. Reference types carry the three facts the
//! safety passes care about: which region the referent lives in, whether
//! the reference may be null, and whether it may be written through.

use crate::{Name, StructId};

/// Region annotation on a reference type, as written in source.
///
/// Arena regions are named; the analyzer resolves the name against the
/// region declarations visible from the use site.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionRef {
    /// `&stack T`: storage bound to a lexical scope.
    Stack,
    /// `&static T`: storage that lives for the whole program.
    Static,
    /// `&heap T`: storage with no compiler-tracked end.
    Heap,
    /// `&arena<P> T`: storage inside the named arena `P`.
    Arena(Name),
}

/// Whether a reference may hold the null value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Nullability {
    #[default]
    NonNull,
    Nullable,
}

/// Whether a reference may be written through.
///
/// `const &stack int` is `Immutable`; a bare `&stack int` is `Mutable`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Mutability {
    #[default]
    Mutable,
    Immutable,
}

/// A reference type: `[const] &region T` with optional `?` nullability.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct RefType {
    pub region: RegionRef,
    pub nullability: Nullability,
    pub mutability: Mutability,
    pub pointee: Type,
}

/// A fully concrete type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    Int,
    Bool,
    Void,
    Struct(StructId),
    /// Stack array with a length known at compile time.
    Array { elem: Box<Type>, len: u64 },
    /// Slice whose length is runtime data.
    Slice { elem: Box<Type> },
    Ref(Box<RefType>),
}

impl Type {
    /// Build a reference type.
    pub fn reference(
        region: RegionRef,
        nullability: Nullability,
        mutability: Mutability,
        pointee: Type,
    ) -> Type {
        Type::Ref(Box::new(RefType {
            region,
            nullability,
            mutability,
            pointee,
        }))
    }

    /// Build a fixed-length array type.
    pub fn array(elem: Type, len: u64) -> Type {
        Type::Array {
            elem: Box::new(elem),
            len,
        }
    }

    /// Build a slice type.
    pub fn slice(elem: Type) -> Type {
        Type::Slice {
            elem: Box::new(elem),
        }
    }

    /// The reference shape of this type, if it is a reference.
    #[inline]
    pub fn as_ref_type(&self) -> Option<&RefType> {
        match self {
            Type::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Returns `true` for reference types.
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Ref(_))
    }

    /// Returns `true` for nullable reference types.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.as_ref_type()
            .is_some_and(|r| r.nullability == Nullability::Nullable)
    }

    /// Element type of an array or slice.
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array { elem, .. } | Type::Slice { elem } => Some(elem),
            _ => None,
        }
    }
}

/// A struct field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDef {
    pub name: Name,
    pub ty: Type,
}

/// A struct definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct StructDef {
    pub name: Name,
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    /// Position of a field by name.
    pub fn field_index(&self, name: Name) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
