//! Scope and region construction (phase A).
//!
//! One top-down walk over the unit builds the [`ScopeTree`], registers
//! every arena in the [`RegionTable`], and records which scope each
//! statement, block, expression and place belongs to. Region names must be
//! unique among visible scopes; a redeclaration is reported and ignored.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use regal_diagnostic::{Diagnostic, ErrorCode};
use regal_ir::stack::ensure_sufficient_stack;
use regal_ir::{
    Block, BlockId, ExprId, ExprKind, FuncId, Module, Name, PlaceId, PlacePath, Projection,
    Span, StmtId, StmtKind, StringInterner,
};

use crate::region::{RegionId, RegionInfo, RegionTable};
use crate::scope::{ScopeId, ScopeKind, ScopeTree};
use crate::sink::DiagnosticSink;

/// Output of phase A, shared read-only by every pass of phase B.
#[derive(Clone, Debug, Default)]
pub struct ScopeMap {
    pub tree: ScopeTree,
    pub regions: RegionTable,
    stmt_scope: FxHashMap<StmtId, ScopeId>,
    block_scope: FxHashMap<BlockId, ScopeId>,
    expr_scope: FxHashMap<ExprId, ScopeId>,
    place_scope: FxHashMap<PlaceId, ScopeId>,
    func_scope: FxHashMap<FuncId, ScopeId>,
    stmt_region: FxHashMap<StmtId, RegionId>,
    scope_places: FxHashMap<ScopeId, SmallVec<[PlaceId; 4]>>,
}

impl ScopeMap {
    pub fn stmt_scope(&self, id: StmtId) -> Option<ScopeId> {
        self.stmt_scope.get(&id).copied()
    }

    pub fn block_scope(&self, id: BlockId) -> Option<ScopeId> {
        self.block_scope.get(&id).copied()
    }

    pub fn expr_scope(&self, id: ExprId) -> Option<ScopeId> {
        self.expr_scope.get(&id).copied()
    }

    /// Declaring scope of a place. Unknown places are treated as globals.
    pub fn place_scope(&self, id: PlaceId) -> ScopeId {
        self.place_scope.get(&id).copied().unwrap_or(ScopeId::MODULE)
    }

    pub fn func_scope(&self, id: FuncId) -> Option<ScopeId> {
        self.func_scope.get(&id).copied()
    }

    /// The arena introduced by a `region` statement, unless it was a
    /// rejected redeclaration.
    pub fn stmt_region(&self, id: StmtId) -> Option<RegionId> {
        self.stmt_region.get(&id).copied()
    }

    /// Places declared directly in `scope`.
    pub fn places_in(&self, scope: ScopeId) -> &[PlaceId] {
        self.scope_places.get(&scope).map_or(&[], |v| v.as_slice())
    }
}

/// Builds a [`ScopeMap`] for one unit.
pub struct ScopeRegionBuilder<'a> {
    module: &'a Module,
    interner: &'a StringInterner,
    sink: &'a mut DiagnosticSink,
    map: ScopeMap,
    current: ScopeId,
}

impl<'a> ScopeRegionBuilder<'a> {
    pub fn new(module: &'a Module, interner: &'a StringInterner, sink: &'a mut DiagnosticSink) -> Self {
        ScopeRegionBuilder {
            module,
            interner,
            sink,
            map: ScopeMap::default(),
            current: ScopeId::MODULE,
        }
    }

    /// Walk the whole unit.
    pub fn build(mut self) -> ScopeMap {
        let module = self.module;
        for decl in &module.regions {
            self.declare_region(decl.name, decl.capacity, decl.span);
        }
        for global in &module.globals {
            self.declare_place(global.place);
            if let Some(init) = global.init {
                self.record_expr(init);
            }
        }
        for def in &module.consts {
            self.record_expr(def.value);
        }
        for (i, func) in module.functions.iter().enumerate() {
            let id = FuncId::new(u32::try_from(i).unwrap_or(u32::MAX));
            let scope = self.enter_block(ScopeKind::Function, func.span);
            self.map.func_scope.insert(id, scope);
            for param in &func.params {
                self.declare_place(*param);
            }
            if let Some(body) = &func.body {
                self.map.block_scope.insert(body.id, scope);
                self.walk_stmts(body);
            }
            self.exit_block();
        }
        tracing::debug!(
            scopes = self.map.tree.len(),
            regions = self.map.regions.len(),
            "scope tree built"
        );
        self.map
    }

    /// The scope new declarations go into.
    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Open a child of the current scope.
    pub fn enter_block(&mut self, kind: ScopeKind, span: Span) -> ScopeId {
        self.current = self.map.tree.push(self.current, kind, span);
        self.current
    }

    /// Seal the current scope and return to its parent.
    pub fn exit_block(&mut self) {
        self.map.tree.seal(self.current);
        self.current = self.map.tree.parent(self.current).unwrap_or(ScopeId::MODULE);
    }

    /// Register an arena bound to the current scope.
    ///
    /// Returns `None` and reports `DuplicateRegion` when an arena with the
    /// same name is already visible here.
    pub fn declare_region(&mut self, name: Name, capacity: u64, span: Span) -> Option<RegionId> {
        if let Some(existing) = self.map.regions.resolve(name, self.current, &self.map.tree) {
            let previous = self.map.regions.get(existing).map_or(Span::DUMMY, |r| r.span);
            let text = self.interner.lookup(name);
            let diag = Diagnostic::error(ErrorCode::E0101)
                .with_message(format!("region `{text}` is already declared"))
                .with_label(span, "redeclared here")
                .with_secondary_label(previous, "previous declaration visible here")
                .with_suggestion("give the inner region a different name");
            let in_unsafe = self.map.tree.in_unsafe(self.current);
            self.sink.report(diag, in_unsafe);
            return None;
        }
        Some(self.map.regions.insert(RegionInfo {
            name,
            scope: self.current,
            capacity,
            span,
        }))
    }

    fn declare_place(&mut self, place: PlaceId) {
        self.map.place_scope.insert(place, self.current);
        self.map
            .scope_places
            .entry(self.current)
            .or_default()
            .push(place);
    }

    fn walk_stmts(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.map.stmt_scope.insert(stmt.id, self.current);
            match &stmt.kind {
                StmtKind::Let { place, init } => {
                    if let Some(init) = init {
                        self.record_expr(*init);
                    }
                    self.declare_place(*place);
                }
                StmtKind::Assign { target, value } => {
                    self.record_path(target);
                    self.record_expr(*value);
                }
                StmtKind::Expr(e) | StmtKind::Return(Some(e)) => self.record_expr(*e),
                StmtKind::If {
                    cond,
                    then_block,
                    else_block,
                } => {
                    self.record_expr(*cond);
                    self.nested(then_block, ScopeKind::Block);
                    if let Some(else_block) = else_block {
                        self.nested(else_block, ScopeKind::Block);
                    }
                }
                StmtKind::While { cond, body } => {
                    self.record_expr(*cond);
                    self.nested(body, ScopeKind::Loop);
                }
                StmtKind::Block(body) => self.nested(body, ScopeKind::Block),
                StmtKind::Unsafe(body) => self.nested(body, ScopeKind::Unsafe),
                StmtKind::Region(decl) => {
                    if let Some(id) = self.declare_region(decl.name, decl.capacity, decl.span) {
                        self.map.stmt_region.insert(stmt.id, id);
                    }
                }
                StmtKind::Return(None)
                | StmtKind::ArenaReset { .. }
                | StmtKind::Break
                | StmtKind::Continue => {}
            }
        }
    }

    fn nested(&mut self, block: &Block, kind: ScopeKind) {
        let scope = self.enter_block(kind, block.span);
        self.map.block_scope.insert(block.id, scope);
        self.walk_stmts(block);
        self.exit_block();
    }

    fn record_path(&mut self, path: &PlacePath) {
        for proj in &path.projections {
            if let Projection::Index(e) = proj {
                self.record_expr(*e);
            }
        }
    }

    fn record_expr(&mut self, id: ExprId) {
        self.map.expr_scope.insert(id, self.current);
        let module = self.module;
        let Some(expr) = module.expr(id) else {
            tracing::warn!(expr = id.raw(), "dangling expression id");
            return;
        };
        ensure_sufficient_stack(|| match &expr.kind {
            ExprKind::Place(path) | ExprKind::AddrOf(path) => self.record_path(path),
            ExprKind::ArenaNew { init, .. } | ExprKind::HeapNew { init } => {
                if let Some(init) = init {
                    self.record_expr(*init);
                }
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    self.record_expr(*arg);
                }
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.record_expr(*lhs);
                self.record_expr(*rhs);
            }
            ExprKind::Unary { operand, .. } => self.record_expr(*operand),
            ExprKind::Int(_) | ExprKind::Bool(_) | ExprKind::Null | ExprKind::Const(_) => {}
        });
    }
}
