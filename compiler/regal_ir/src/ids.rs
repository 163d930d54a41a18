//! Index newtypes for the flat AST.
//!
//! All IDs are `u32` indices into a `Vec` owned by the [`Module`](crate::Module)
//! (or, for [`StmtId`] and [`BlockId`], dense program-order numbers assigned
//! by the front end).

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an ID from a raw index.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw `u32` value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into `Vec`s).
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Index into the module's [`ExprArena`](crate::ExprArena).
    ExprId
);

define_id!(
    /// Program-order statement number. Doubles as the analyzer's program point.
    StmtId
);

define_id!(
    /// Program-order block number; the scope builder maps each block to a scope.
    BlockId
);

define_id!(
    /// A resolved storage location (local, parameter, or global).
    PlaceId
);

define_id!(
    /// Index into [`Module::structs`](crate::Module::structs).
    StructId
);

define_id!(
    /// Index into [`Module::functions`](crate::Module::functions).
    FuncId
);
