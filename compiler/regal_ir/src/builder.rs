//! Programmatic construction of [`Module`]s.
//!
//! Front ends (and tests) build units through [`ModuleBuilder`] so that the
//! numbering invariants the analyzer relies on hold by construction:
//! statement and block IDs are dense and assigned in pre-order, and every
//! node receives a distinct, increasing span.

use std::ops::{Deref, DerefMut};

use crate::{
    BinaryOp, Block, BlockId, ConstDef, Expr, ExprId, ExprKind, FieldDef, FuncId, Function,
    GlobalDecl, Module, Mutability, Name, Nullability, PlaceDecl, PlaceId, PlaceKind, PlacePath,
    RegionDecl, RegionRef, Span, Stmt, StmtId, StmtKind, StructDef, StructId, Type, UnaryOp,
};

/// Incremental builder for a translation unit.
pub struct ModuleBuilder {
    module: Module,
    next_stmt: u32,
    next_block: u32,
    next_offset: u32,
}

impl ModuleBuilder {
    /// Start an empty module.
    pub fn new(name: Name) -> Self {
        ModuleBuilder {
            module: Module {
                name,
                ..Module::default()
            },
            next_stmt: 0,
            next_block: 0,
            next_offset: 1,
        }
    }

    /// The module built so far.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Finish building.
    pub fn finish(self) -> Module {
        self.module
    }

    fn fresh_span(&mut self) -> Span {
        let span = Span::new(self.next_offset, self.next_offset + 1);
        self.next_offset += 2;
        span
    }

    fn alloc_stmt(&mut self) -> StmtId {
        let id = StmtId::new(self.next_stmt);
        self.next_stmt += 1;
        id
    }

    fn alloc_block(&mut self) -> BlockId {
        let id = BlockId::new(self.next_block);
        self.next_block += 1;
        id
    }

    fn add_place(&mut self, name: Name, ty: Type, kind: PlaceKind) -> PlaceId {
        let span = self.fresh_span();
        let id = PlaceId::new(self.module.places.len() as u32);
        self.module.places.push(PlaceDecl {
            name,
            ty,
            kind,
            span,
        });
        id
    }

    // ── Items ───────────────────────────────────────────────────────

    /// Define a struct.
    pub fn add_struct(&mut self, name: Name, fields: Vec<(Name, Type)>) -> StructId {
        let id = StructId::new(self.module.structs.len() as u32);
        self.module.structs.push(StructDef {
            name,
            fields: fields
                .into_iter()
                .map(|(name, ty)| FieldDef { name, ty })
                .collect(),
        });
        id
    }

    /// Declare a module-level variable.
    pub fn global(&mut self, name: Name, ty: Type, init: Option<ExprId>) -> PlaceId {
        let place = self.add_place(name, ty, PlaceKind::Global);
        self.module.globals.push(GlobalDecl { place, init });
        place
    }

    /// Declare a module-level arena region.
    pub fn region(&mut self, name: Name, capacity: u64) -> Span {
        let span = self.fresh_span();
        self.module.regions.push(RegionDecl {
            name,
            capacity,
            span,
        });
        span
    }

    /// Define a named integer constant.
    pub fn constant(&mut self, name: Name, value: ExprId) {
        let span = self.fresh_span();
        self.module.consts.push(ConstDef { name, value, span });
    }

    /// Declare an external function (no body).
    pub fn extern_fn(&mut self, name: Name, params: Vec<(Name, Type)>, ret: Type) -> FuncId {
        let params = params
            .into_iter()
            .map(|(n, ty)| self.add_place(n, ty, PlaceKind::Param))
            .collect();
        let span = self.fresh_span();
        let id = FuncId::new(self.module.functions.len() as u32);
        self.module.functions.push(Function {
            name,
            params,
            ret,
            body: None,
            span,
        });
        id
    }

    /// Start a function with a body.
    pub fn function(&mut self, name: Name, ret: Type) -> FunctionBuilder<'_> {
        let span = self.fresh_span();
        let id = FuncId::new(self.module.functions.len() as u32);
        self.module.functions.push(Function {
            name,
            params: Vec::new(),
            ret,
            body: None,
            span,
        });
        let body_id = self.alloc_block();
        let start = self.next_offset;
        FunctionBuilder {
            mb: self,
            id,
            params: Vec::new(),
            open: vec![OpenBlock {
                id: body_id,
                stmts: Vec::new(),
                start,
            }],
        }
    }

    // ── Expressions ─────────────────────────────────────────────────

    /// Allocate an expression with an explicit type.
    pub fn expr(&mut self, kind: ExprKind, ty: Type) -> ExprId {
        let span = self.fresh_span();
        self.module.exprs.alloc(Expr { kind, ty, span })
    }

    /// Integer literal.
    pub fn int(&mut self, value: i64) -> ExprId {
        self.expr(ExprKind::Int(value), Type::Int)
    }

    /// Boolean literal.
    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::Bool(value), Type::Bool)
    }

    /// The null literal at reference type `ty`.
    pub fn null(&mut self, ty: Type) -> ExprId {
        self.expr(ExprKind::Null, ty)
    }

    /// Use of a named constant.
    pub fn const_use(&mut self, name: Name) -> ExprId {
        self.expr(ExprKind::Const(name), Type::Int)
    }

    /// Read a place path. The type is taken from the path.
    pub fn read(&mut self, path: PlacePath) -> ExprId {
        let ty = self.module.path_type(&path).cloned().unwrap_or(Type::Void);
        self.expr(ExprKind::Place(path), ty)
    }

    /// `&path` producing a non-null reference into `region`.
    pub fn addr_of(&mut self, path: PlacePath, region: RegionRef, mutability: Mutability) -> ExprId {
        let pointee = self.module.path_type(&path).cloned().unwrap_or(Type::Void);
        let ty = Type::reference(region, Nullability::NonNull, mutability, pointee);
        self.expr(ExprKind::AddrOf(path), ty)
    }

    /// `new<region> T`.
    pub fn arena_new(&mut self, region: Name, pointee: Type, init: Option<ExprId>) -> ExprId {
        let ty = Type::reference(
            RegionRef::Arena(region),
            Nullability::NonNull,
            Mutability::Mutable,
            pointee,
        );
        self.expr(ExprKind::ArenaNew { region, init }, ty)
    }

    /// `new T` on the heap.
    pub fn heap_new(&mut self, pointee: Type, init: Option<ExprId>) -> ExprId {
        let ty = Type::reference(
            RegionRef::Heap,
            Nullability::NonNull,
            Mutability::Mutable,
            pointee,
        );
        self.expr(ExprKind::HeapNew { init }, ty)
    }

    /// Function call. The type is the callee's return type.
    pub fn call(&mut self, callee: FuncId, args: Vec<ExprId>) -> ExprId {
        let ty = self
            .module
            .function(callee)
            .map_or(Type::Void, |f| f.ret.clone());
        self.expr(ExprKind::Call { callee, args }, ty)
    }

    /// Binary operation.
    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        let ty = match op {
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::And
            | BinaryOp::Or => Type::Bool,
            _ => Type::Int,
        };
        self.expr(ExprKind::Binary { op, lhs, rhs }, ty)
    }

    /// Unary operation.
    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        let ty = if op == UnaryOp::Not {
            Type::Bool
        } else {
            Type::Int
        };
        self.expr(ExprKind::Unary { op, operand }, ty)
    }
}

struct OpenBlock {
    id: BlockId,
    stmts: Vec<Stmt>,
    start: u32,
}

/// Builder for one function body.
///
/// Dereferences to [`ModuleBuilder`], so expression helpers are available
/// directly: `fb.int(1)`, `fb.read(path)`.
pub struct FunctionBuilder<'m> {
    mb: &'m mut ModuleBuilder,
    id: FuncId,
    params: Vec<PlaceId>,
    open: Vec<OpenBlock>,
}

impl FunctionBuilder<'_> {
    /// The ID this function will have in the module.
    pub fn id(&self) -> FuncId {
        self.id
    }

    /// Add a parameter.
    pub fn param(&mut self, name: Name, ty: Type) -> PlaceId {
        let place = self.mb.add_place(name, ty, PlaceKind::Param);
        self.params.push(place);
        place
    }

    fn push(&mut self, stmt: Stmt) {
        if let Some(block) = self.open.last_mut() {
            block.stmts.push(stmt);
        }
    }

    fn simple(&mut self, kind: StmtKind) -> StmtId {
        let id = self.mb.alloc_stmt();
        let span = self.mb.fresh_span();
        self.push(Stmt { id, kind, span });
        id
    }

    /// Allocate the statement ID before building children so IDs stay in
    /// pre-order.
    fn compound(&mut self, build: impl FnOnce(&mut Self) -> StmtKind) -> StmtId {
        let id = self.mb.alloc_stmt();
        let start = self.mb.next_offset;
        self.mb.next_offset += 2;
        let kind = build(self);
        let span = Span::new(start, self.mb.next_offset);
        self.push(Stmt { id, kind, span });
        id
    }

    fn nested(&mut self, body: impl FnOnce(&mut Self)) -> Block {
        let id = self.mb.alloc_block();
        let start = self.mb.next_offset;
        self.open.push(OpenBlock {
            id,
            stmts: Vec::new(),
            start,
        });
        body(self);
        let stmts = self.open.pop().map(|b| b.stmts).unwrap_or_default();
        Block {
            id,
            stmts,
            span: Span::new(start, self.mb.next_offset),
        }
    }

    /// `T name = init;` (or uninitialized when `init` is `None`).
    pub fn local(&mut self, name: Name, ty: Type, init: Option<ExprId>) -> PlaceId {
        let place = self.mb.add_place(name, ty, PlaceKind::Local);
        self.simple(StmtKind::Let { place, init });
        place
    }

    /// `target = value;`
    pub fn assign(&mut self, target: PlacePath, value: ExprId) -> StmtId {
        self.simple(StmtKind::Assign { target, value })
    }

    /// Expression statement.
    pub fn eval(&mut self, expr: ExprId) -> StmtId {
        self.simple(StmtKind::Expr(expr))
    }

    /// `return value;`
    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.simple(StmtKind::Return(value))
    }

    /// `region name { capacity: N }` inside the body.
    pub fn region(&mut self, name: Name, capacity: u64) -> StmtId {
        let id = self.mb.alloc_stmt();
        let span = self.mb.fresh_span();
        self.push(Stmt {
            id,
            kind: StmtKind::Region(RegionDecl {
                name,
                capacity,
                span,
            }),
            span,
        });
        id
    }

    /// `arena_reset<name>();`
    pub fn arena_reset(&mut self, region: Name) -> StmtId {
        self.simple(StmtKind::ArenaReset { region })
    }

    /// `break;`
    pub fn brk(&mut self) -> StmtId {
        self.simple(StmtKind::Break)
    }

    /// `continue;`
    pub fn cont(&mut self) -> StmtId {
        self.simple(StmtKind::Continue)
    }

    /// `if (cond) { then }`
    pub fn if_then(&mut self, cond: ExprId, then: impl FnOnce(&mut Self)) -> StmtId {
        self.compound(|fb| StmtKind::If {
            cond,
            then_block: fb.nested(then),
            else_block: None,
        })
    }

    /// `if (cond) { then } else { otherwise }`
    pub fn if_else(
        &mut self,
        cond: ExprId,
        then: impl FnOnce(&mut Self),
        otherwise: impl FnOnce(&mut Self),
    ) -> StmtId {
        self.compound(|fb| {
            let then_block = fb.nested(then);
            let else_block = Some(fb.nested(otherwise));
            StmtKind::If {
                cond,
                then_block,
                else_block,
            }
        })
    }

    /// `while (cond) { body }`
    pub fn while_loop(&mut self, cond: ExprId, body: impl FnOnce(&mut Self)) -> StmtId {
        self.compound(|fb| StmtKind::While {
            cond,
            body: fb.nested(body),
        })
    }

    /// `{ body }`
    pub fn block(&mut self, body: impl FnOnce(&mut Self)) -> StmtId {
        self.compound(|fb| StmtKind::Block(fb.nested(body)))
    }

    /// `unsafe { body }`
    pub fn unsafe_block(&mut self, body: impl FnOnce(&mut Self)) -> StmtId {
        self.compound(|fb| StmtKind::Unsafe(fb.nested(body)))
    }

    /// Close the body and store the function in the module.
    pub fn finish(mut self) -> FuncId {
        let root = self.open.pop();
        let end = self.mb.next_offset;
        let id = self.id;
        let params = std::mem::take(&mut self.params);
        if let Some(func) = self.mb.module.functions.get_mut(id.index()) {
            func.params = params;
            func.body = root.map(|b| Block {
                id: b.id,
                stmts: b.stmts,
                span: Span::new(b.start, end),
            });
        }
        id
    }
}

impl Deref for FunctionBuilder<'_> {
    type Target = ModuleBuilder;

    fn deref(&self) -> &ModuleBuilder {
        self.mb
    }
}

impl DerefMut for FunctionBuilder<'_> {
    fn deref_mut(&mut self) -> &mut ModuleBuilder {
        self.mb
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
