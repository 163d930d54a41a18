//! Typed, name-resolved AST for one translation unit.
//!
//! The front end hands the analyzer a [`Module`]. Every identifier has been
//! resolved to a [`PlaceId`], every expression carries its [`Type`], and every
//! statement has a program-order [`StmtId`].

use smallvec::SmallVec;

use crate::{
    BlockId, ExprArena, ExprId, FuncId, Name, PlaceId, Span, StmtId, StructDef, StructId, Type,
};

// ── Places ──────────────────────────────────────────────────────────

/// Where a place is declared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum PlaceKind {
    /// Block-local variable, introduced by [`StmtKind::Let`].
    Local,
    /// Function parameter.
    Param,
    /// Module-level variable with static storage.
    Global,
}

/// A named storage location.
///
/// The type (and with it the region and nullability of a reference-typed
/// place) is fixed at declaration; assignments change the value only.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceDecl {
    pub name: Name,
    pub ty: Type,
    pub kind: PlaceKind,
    pub span: Span,
}

/// One step from a place to a sub-location.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Projection {
    /// `.field`
    Field(Name),
    /// `*` (also the implicit deref of `->`)
    Deref,
    /// `[index]`; the ID is the index operand.
    Index(ExprId),
}

/// A place followed by projections: `s.f`, `*p`, `p->next->val`, `a[i]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct PlacePath {
    pub root: PlaceId,
    pub projections: SmallVec<[Projection; 2]>,
}

impl PlacePath {
    /// The bare place.
    pub fn new(root: PlaceId) -> Self {
        PlacePath {
            root,
            projections: SmallVec::new(),
        }
    }

    /// Append a field projection.
    #[must_use]
    pub fn field(mut self, name: Name) -> Self {
        self.projections.push(Projection::Field(name));
        self
    }

    /// Append a dereference.
    #[must_use]
    pub fn deref(mut self) -> Self {
        self.projections.push(Projection::Deref);
        self
    }

    /// Append an index projection.
    #[must_use]
    pub fn index(mut self, index: ExprId) -> Self {
        self.projections.push(Projection::Index(index));
        self
    }

    /// Returns `true` if the path names the root place itself.
    #[inline]
    pub fn is_bare(&self) -> bool {
        self.projections.is_empty()
    }

    /// Returns `true` if any projection dereferences.
    #[inline]
    pub fn has_deref(&self) -> bool {
        self.projections.iter().any(|p| matches!(p, Projection::Deref))
    }

    /// The path truncated to its first `len` projections.
    pub fn prefix(&self, len: usize) -> PlacePath {
        PlacePath {
            root: self.root,
            projections: self.projections.iter().take(len).copied().collect(),
        }
    }
}

// ── Expressions ─────────────────────────────────────────────────────

/// Binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Unary operators. Dereference is a [`Projection`], not an operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

/// Expression node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    Int(i64),
    Bool(bool),
    /// The null literal. Its type is the reference type it is used at.
    Null,
    /// A named compile-time constant.
    Const(Name),
    /// Read of a place path.
    Place(PlacePath),
    /// `&path`; the expression type records region and mutability.
    AddrOf(PlacePath),
    /// `new<P> T`: allocate inside arena `P`.
    ArenaNew {
        region: Name,
        init: Option<ExprId>,
    },
    /// `new T`: heap allocation.
    HeapNew { init: Option<ExprId> },
    Call {
        callee: FuncId,
        args: Vec<ExprId>,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
}

/// An expression with its type and source span.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub span: Span,
}

// ── Statements ──────────────────────────────────────────────────────

/// `region P { capacity: N }`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionDecl {
    pub name: Name,
    pub capacity: u64,
    pub span: Span,
}

/// A braced statement list. Each block opens a lexical scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub id: BlockId,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Statement node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum StmtKind {
    /// Local declaration, optionally initialized.
    Let {
        place: PlaceId,
        init: Option<ExprId>,
    },
    Assign {
        target: PlacePath,
        value: ExprId,
    },
    Expr(ExprId),
    Return(Option<ExprId>),
    If {
        cond: ExprId,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        cond: ExprId,
        body: Block,
    },
    Block(Block),
    /// Escape hatch: safety rules that depend on runtime behavior are
    /// not enforced inside.
    Unsafe(Block),
    Region(RegionDecl),
    /// `arena_reset<P>()`: bulk-free every allocation in `P`.
    ArenaReset {
        region: Name,
    },
    Break,
    Continue,
}

/// A statement with its program-order ID.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Stmt {
    pub id: StmtId,
    pub kind: StmtKind,
    pub span: Span,
}

// ── Items ───────────────────────────────────────────────────────────

/// A function. `body` is `None` for external declarations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub name: Name,
    pub params: Vec<PlaceId>,
    pub ret: Type,
    pub body: Option<Block>,
    pub span: Span,
}

/// A module-level variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalDecl {
    pub place: PlaceId,
    pub init: Option<ExprId>,
}

/// A named integer constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstDef {
    pub name: Name,
    pub value: ExprId,
    pub span: Span,
}

/// One translation unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Module {
    pub name: Name,
    pub structs: Vec<StructDef>,
    pub places: Vec<PlaceDecl>,
    pub globals: Vec<GlobalDecl>,
    pub regions: Vec<RegionDecl>,
    pub consts: Vec<ConstDef>,
    pub functions: Vec<Function>,
    pub exprs: ExprArena,
}

impl Module {
    /// Look up an expression.
    #[inline]
    pub fn expr(&self, id: ExprId) -> Option<&Expr> {
        self.exprs.get(id)
    }

    /// Look up a place declaration.
    #[inline]
    pub fn place(&self, id: PlaceId) -> Option<&PlaceDecl> {
        self.places.get(id.index())
    }

    /// Look up a function.
    #[inline]
    pub fn function(&self, id: FuncId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    /// Look up a struct definition.
    #[inline]
    pub fn struct_def(&self, id: StructId) -> Option<&StructDef> {
        self.structs.get(id.index())
    }

    /// Look up a named constant.
    pub fn const_def(&self, name: Name) -> Option<&ConstDef> {
        self.consts.iter().find(|c| c.name == name)
    }

    /// Type of the storage a path designates.
    ///
    /// Returns `None` when a projection does not fit the type it is
    /// applied to (the front end should have rejected such programs).
    pub fn path_type(&self, path: &PlacePath) -> Option<&Type> {
        let mut ty = &self.place(path.root)?.ty;
        for proj in &path.projections {
            ty = self.project_type(ty, *proj)?;
        }
        Some(ty)
    }

    /// Type reached by applying one projection to `ty`.
    pub fn project_type<'a>(&'a self, ty: &'a Type, proj: Projection) -> Option<&'a Type> {
        match (proj, ty) {
            (Projection::Field(name), Type::Struct(id)) => {
                let def = self.struct_def(*id)?;
                def.fields.iter().find(|f| f.name == name).map(|f| &f.ty)
            }
            (Projection::Deref, Type::Ref(r)) => Some(&r.pointee),
            (Projection::Index(_), Type::Array { elem, .. } | Type::Slice { elem }) => Some(elem),
            _ => None,
        }
    }
}
