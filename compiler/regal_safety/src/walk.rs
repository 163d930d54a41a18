//! The shared forward walk (phase B).
//!
//! One traversal per function runs every flow-sensitive pass. Each
//! statement is processed in a fixed order: expressions are evaluated
//! (reads, dereferences, index policies, new loans collected), the store
//! is escape-checked, the target's old reference facts are killed, the
//! statement's loans are checked for conflicts and committed, and finally
//! the target takes the new facts.
//!
//! Branches are walked on cloned states and joined. A loop body is walked
//! twice: once from the entry state and once from the join of the entry
//! state with the end of the first walk, which covers everything carried
//! across the back-edge.

use smallvec::{smallvec, SmallVec};

use regal_diagnostic::{Diagnostic, ErrorCode};
use regal_ir::stack::ensure_sufficient_stack;
use regal_ir::{
    BinaryOp, Block, Expr, ExprId, ExprKind, FuncId, Function, Module, Mutability, Nullability,
    PlaceId, PlaceKind, PlacePath, Projection, RefType, Span, Stmt, StmtId, StmtKind,
    StringInterner, Type,
};
use regal_consteval::ConstFolder;

use crate::bounds::Decorations;
use crate::borrow::{Loan, LoanId, LoanTable};
use crate::builder::ScopeMap;
use crate::invalidation::Stamp;
use crate::liveness::LastUse;
use crate::nullability::narrowing;
use crate::region::Region;
use crate::scope::ScopeId;
use crate::sink::DiagnosticSink;
use crate::state::{fact_key, FlowState, RefFact, RefValue};

/// Read-only inputs shared by every function of a unit.
#[derive(Copy, Clone)]
pub(crate) struct Context<'a> {
    pub module: &'a Module,
    pub interner: &'a StringInterner,
    pub scopes: &'a ScopeMap,
    pub folder: &'a dyn ConstFolder,
}

/// Result of evaluating an expression.
#[derive(Clone, Debug, Default)]
pub(crate) struct Value {
    /// Present for reference-typed values other than `null`.
    pub reference: Option<RefValue>,
    pub nonnull: bool,
}

struct LoopFrame {
    scope: ScopeId,
    breaks: Vec<FlowState>,
    continues: Vec<FlowState>,
}

pub(crate) struct Checker<'a> {
    pub(crate) cx: Context<'a>,
    pub(crate) sink: &'a mut DiagnosticSink,
    pub(crate) decorations: &'a mut Decorations,
    pub(crate) func: &'a Function,
    pub(crate) func_scope: ScopeId,
    last_use: LastUse,
    loans: LoanTable,
    /// Loans created by the current statement and not yet checked.
    pending: SmallVec<[LoanId; 4]>,
    /// Checked loans of the current statement. They live until it ends.
    temps: SmallVec<[LoanId; 4]>,
    pub(crate) stmt: StmtId,
    pub(crate) scope: ScopeId,
    loops: Vec<LoopFrame>,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(
        cx: Context<'a>,
        sink: &'a mut DiagnosticSink,
        decorations: &'a mut Decorations,
        func: &'a Function,
        func_scope: ScopeId,
    ) -> Self {
        Checker {
            cx,
            sink,
            decorations,
            func,
            func_scope,
            last_use: LastUse::compute(cx.module, func),
            loans: LoanTable::default(),
            pending: SmallVec::new(),
            temps: SmallVec::new(),
            stmt: StmtId::new(0),
            scope: func_scope,
            loops: Vec::new(),
        }
    }

    /// Check the function body.
    pub(crate) fn run(&mut self, id: FuncId, body: &Block) {
        tracing::debug!(
            function = id.raw(),
            name = self.cx.interner.lookup(self.func.name),
            "checking function"
        );
        let mut state = FlowState::entry();
        let globals = self.cx.module.globals.iter().map(|g| g.place);
        for place in globals.chain(self.func.params.iter().copied()) {
            self.seed_fact(&mut state, place);
        }
        self.walk_stmts(body, state);
        tracing::debug!(
            function = id.raw(),
            loans = self.loans.len(),
            "function checked"
        );
    }

    // ── Helpers ─────────────────────────────────────────────────────

    pub(crate) fn in_unsafe(&self) -> bool {
        self.cx.scopes.tree.in_unsafe(self.scope)
    }

    pub(crate) fn report(&mut self, diag: Diagnostic) {
        let in_unsafe = self.in_unsafe();
        self.sink.report(diag, in_unsafe);
    }

    /// Source-like rendering of a path: `x`, `s.f`, `*p`, `p->next`, `a[_]`.
    pub(crate) fn describe(&self, path: &PlacePath) -> String {
        let root = self
            .cx
            .module
            .place(path.root)
            .map_or("<unknown>", |p| self.cx.interner.lookup(p.name));
        let mut text = root.to_owned();
        let mut deref_pending = false;
        for proj in &path.projections {
            match proj {
                Projection::Field(name) => {
                    let sep = if deref_pending { "->" } else { "." };
                    deref_pending = false;
                    text = format!("{text}{sep}{}", self.cx.interner.lookup(*name));
                }
                Projection::Deref => {
                    if deref_pending {
                        text = format!("*{text}");
                    }
                    deref_pending = true;
                }
                Projection::Index(_) => {
                    if deref_pending {
                        text = format!("(*{text})");
                        deref_pending = false;
                    }
                    text.push_str("[_]");
                }
            }
        }
        if deref_pending {
            text = format!("*{text}");
        }
        text
    }

    pub(crate) fn describe_region(&self, region: Region) -> String {
        match region {
            Region::Stack => "stack".to_owned(),
            Region::Static => "static".to_owned(),
            Region::Heap => "heap".to_owned(),
            Region::Arena(id) => {
                let name = self
                    .cx
                    .scopes
                    .regions
                    .get(id)
                    .map_or("<unknown>", |r| self.cx.interner.lookup(r.name));
                format!("region `{name}`")
            }
        }
    }

    fn expr_span(&self, id: ExprId) -> Span {
        self.cx.module.expr(id).map_or(Span::DUMMY, |e| e.span)
    }

    /// Region named by a type annotation, seen from the current scope.
    pub(crate) fn lower_region(&self, ty: &RefType) -> Region {
        let scopes = self.cx.scopes;
        scopes
            .regions
            .lower(ty.region, self.scope, &scopes.tree)
            .unwrap_or_else(|| {
                tracing::warn!(region = ?ty.region, "unresolved region annotation");
                Region::Heap
            })
    }

    /// What is known about a reference read from storage without a
    /// tracked fact: the annotation says where it points, and the referent
    /// is assumed to outlive the function.
    fn annotated_ref(&self, state: &FlowState, ty: &RefType) -> RefValue {
        let region = self.lower_region(ty);
        let (lifetime, stamp) = match region {
            Region::Arena(id) => (
                self.cx
                    .scopes
                    .regions
                    .get(id)
                    .map_or(ScopeId::MODULE, |r| r.scope),
                Some(state.generations.stamp(id)),
            ),
            _ => (ScopeId::MODULE, None),
        };
        RefValue {
            region,
            lifetime,
            stamp,
            loans: SmallVec::new(),
        }
    }

    fn seed_fact(&self, state: &mut FlowState, place: PlaceId) {
        let Some(ty) = self
            .cx
            .module
            .place(place)
            .and_then(|p| p.ty.as_ref_type())
        else {
            return;
        };
        let value = self.annotated_ref(state, ty);
        state.facts.insert(
            PlacePath::new(place),
            RefFact {
                value,
                acquired: StmtId::new(0),
            },
        );
    }

    /// The reference stored at `path`.
    pub(crate) fn ref_at(&self, state: &FlowState, path: &PlacePath) -> Option<RefValue> {
        let ty = self.cx.module.path_type(path)?.as_ref_type()?;
        let fact = fact_key(path).and_then(|(key, _)| state.facts.get(&key));
        Some(match fact {
            Some(fact) => fact.value.clone(),
            None => self.annotated_ref(state, ty),
        })
    }

    /// Scope whose lifetime bounds the storage `path` designates.
    pub(crate) fn storage_scope(&self, state: &FlowState, path: &PlacePath) -> ScopeId {
        let last_deref = path
            .projections
            .iter()
            .rposition(|p| matches!(p, Projection::Deref));
        match last_deref {
            Some(i) => self
                .ref_at(state, &path.prefix(i))
                .map_or(ScopeId::MODULE, |r| r.lifetime),
            None => match self.cx.module.place(path.root).map(|p| p.kind) {
                Some(PlaceKind::Global) | None => ScopeId::MODULE,
                Some(PlaceKind::Local | PlaceKind::Param) => self.cx.scopes.place_scope(path.root),
            },
        }
    }

    // ── Statements ──────────────────────────────────────────────────

    fn walk_stmts(&mut self, block: &Block, mut state: FlowState) -> FlowState {
        for stmt in &block.stmts {
            if !state.reachable {
                tracing::trace!(stmt = stmt.id.raw(), "unreachable statement skipped");
                break;
            }
            state = self.walk_stmt(stmt, state);
        }
        state
    }

    fn walk_nested(&mut self, block: &Block, state: FlowState) -> FlowState {
        let Some(scope) = self.cx.scopes.block_scope(block.id) else {
            tracing::warn!(block = block.id.raw(), "block without scope");
            return self.walk_stmts(block, state);
        };
        let outer = std::mem::replace(&mut self.scope, scope);
        let mut state = self.walk_stmts(block, state);
        self.exit_scope(scope, &mut state);
        self.scope = outer;
        state
    }

    /// Retire everything declared in `scope`: its places stop holding
    /// loans and their facts are dropped.
    fn exit_scope(&self, scope: ScopeId, state: &mut FlowState) {
        for place in self.cx.scopes.places_in(scope) {
            state.forget_place(*place);
        }
    }

    /// State leaving the current scope chain up to (and including) the
    /// innermost loop body.
    fn loop_exit_state(&self, mut state: FlowState, loop_scope: ScopeId) -> FlowState {
        for scope in self.cx.scopes.tree.ancestors(self.scope) {
            self.exit_scope(scope, &mut state);
            if scope == loop_scope {
                break;
            }
        }
        state
    }

    fn walk_stmt(&mut self, stmt: &Stmt, mut state: FlowState) -> FlowState {
        self.stmt = stmt.id;
        match &stmt.kind {
            StmtKind::Let { place, init } => {
                let path = PlacePath::new(*place);
                match init {
                    Some(init) => {
                        let value = self.eval(*init, &mut state);
                        self.store(&mut state, &path, value, self.expr_span(*init));
                    }
                    None => {
                        state.kill_facts(&path);
                        state.nulls.invalidate(&path);
                        state.init.declare(*place, false);
                    }
                }
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval(*value, &mut state);
                self.check_access(&mut state, target, stmt.span);
                self.store(&mut state, target, value, stmt.span);
            }
            StmtKind::Expr(e) => {
                self.eval(*e, &mut state);
            }
            StmtKind::Return(value) => {
                if let Some(e) = value {
                    let result = self.eval(*e, &mut state);
                    let source = self.place_source(*e);
                    self.check_return(&mut state, &result, self.expr_span(*e), source.as_ref());
                }
                state.reachable = false;
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.eval(*cond, &mut state);
                self.end_statement(&mut state);
                let facts = narrowing(self.cx.module, *cond);
                let mut then_in = state.clone();
                for path in facts.then_nonnull {
                    then_in.nulls.mark_nonnull(path);
                }
                let mut else_in = state;
                for path in facts.else_nonnull {
                    else_in.nulls.mark_nonnull(path);
                }
                let then_out = self.walk_nested(then_block, then_in);
                let else_out = match else_block {
                    Some(block) => self.walk_nested(block, else_in),
                    None => else_in,
                };
                return then_out.join(&else_out, self.cx.module, self.cx.scopes);
            }
            StmtKind::While { cond, body } => return self.walk_loop(stmt.id, *cond, body, state),
            StmtKind::Block(body) | StmtKind::Unsafe(body) => return self.walk_nested(body, state),
            StmtKind::Region(_) => {
                if let Some(id) = self.cx.scopes.stmt_region(stmt.id) {
                    state.generations.declare(id);
                }
            }
            StmtKind::ArenaReset { region } => {
                let scopes = self.cx.scopes;
                match scopes.regions.resolve(*region, self.scope, &scopes.tree) {
                    Some(id) => {
                        let generation = state.generations.reset(id);
                        tracing::debug!(region = id.raw(), generation, "arena reset");
                    }
                    None => tracing::warn!(
                        region = self.cx.interner.lookup(*region),
                        "reset of unknown region"
                    ),
                }
            }
            StmtKind::Break | StmtKind::Continue => {
                let is_break = matches!(stmt.kind, StmtKind::Break);
                match self.loops.last().map(|f| f.scope) {
                    Some(loop_scope) => {
                        let exit = self.loop_exit_state(state.clone(), loop_scope);
                        if let Some(frame) = self.loops.last_mut() {
                            if is_break {
                                frame.breaks.push(exit);
                            } else {
                                frame.continues.push(exit);
                            }
                        }
                    }
                    None => tracing::warn!(stmt = stmt.id.raw(), "break or continue outside a loop"),
                }
                state.reachable = false;
            }
        }
        self.end_statement(&mut state);
        state
    }

    fn walk_loop(
        &mut self,
        id: StmtId,
        cond: ExprId,
        body: &Block,
        entry: FlowState,
    ) -> FlowState {
        let Some(body_scope) = self.cx.scopes.block_scope(body.id) else {
            tracing::warn!(block = body.id.raw(), "loop body without scope");
            return entry;
        };
        let facts = narrowing(self.cx.module, cond);
        let mut head = entry.clone();
        let mut exit = FlowState::unreachable();

        for iteration in 0..2 {
            tracing::trace!(stmt = id.raw(), iteration, "walking loop body");
            self.stmt = id;
            self.eval(cond, &mut head);
            self.end_statement(&mut head);

            let mut leave = head.clone();
            for path in &facts.else_nonnull {
                leave.nulls.mark_nonnull(path.clone());
            }
            exit = exit.join(&leave, self.cx.module, self.cx.scopes);

            let mut body_in = head.clone();
            for path in &facts.then_nonnull {
                body_in.nulls.mark_nonnull(path.clone());
            }
            self.loops.push(LoopFrame {
                scope: body_scope,
                breaks: Vec::new(),
                continues: Vec::new(),
            });
            let body_out = self.walk_nested(body, body_in);
            let Some(frame) = self.loops.pop() else {
                break;
            };
            for state in &frame.breaks {
                exit = exit.join(state, self.cx.module, self.cx.scopes);
            }
            let mut next = entry.join(&body_out, self.cx.module, self.cx.scopes);
            for state in &frame.continues {
                next = next.join(state, self.cx.module, self.cx.scopes);
            }
            head = next;
        }

        // Condition false after the last iteration.
        for path in &facts.else_nonnull {
            head.nulls.mark_nonnull(path.clone());
        }
        exit.join(&head, self.cx.module, self.cx.scopes)
    }

    // ── Stores and loans ────────────────────────────────────────────

    /// Write `value` to `target`.
    fn store(&mut self, state: &mut FlowState, target: &PlacePath, value: Value, span: Span) {
        let module = self.cx.module;
        let target_ref = module.path_type(target).and_then(Type::as_ref_type);

        if let (Some(target_ty), Some(reference)) = (target_ref, &value.reference) {
            self.check_store(state, target, target_ty, reference, span);
        }

        let key = fact_key(target);
        if let Some((key, true)) = &key {
            state.kill_facts(key);
        }

        self.commit_pending(state);

        if let (Some(_), Some(reference), Some((key, strong))) = (target_ref, value.reference, key)
        {
            let fact = RefFact {
                value: reference,
                acquired: self.stmt,
            };
            state.set_fact(key, fact, strong, self.cx.scopes);
        }

        state.nulls.invalidate(target);
        let last_deref = target
            .projections
            .iter()
            .rposition(|p| matches!(p, Projection::Deref));
        if let Some(i) = last_deref {
            state.nulls.invalidate_indirect();
            if let Some(reference) = self.ref_at(state, &target.prefix(i)) {
                self.invalidate_borrowed(state, &reference.loans);
            }
        }
        let indexed = target
            .projections
            .iter()
            .any(|p| matches!(p, Projection::Index(_)));
        if target_ref.is_some() && value.nonnull && !indexed {
            state.nulls.mark_nonnull(target.clone());
        }

        state.init.write(module, target);
    }

    /// Check the current statement's new loans against every live loan,
    /// then make them live for the rest of the statement.
    fn commit_pending(&mut self, state: &FlowState) {
        let pending = std::mem::take(&mut self.pending);
        for id in pending {
            if let Some(conflict) = self.find_conflict(state, id) {
                self.report_conflict(id, conflict);
            }
            // Recovery: the loan exists either way.
            self.temps.push(id);
        }
    }

    /// A write through a reference changes the places it borrows, so
    /// whatever was known about them directly no longer holds.
    fn invalidate_borrowed(&self, state: &mut FlowState, loans: &[LoanId]) {
        for loan in loans.iter().filter_map(|id| self.loans.get(*id)) {
            state.nulls.invalidate(&loan.path);
        }
    }

    fn end_statement(&mut self, state: &mut FlowState) {
        self.commit_pending(state);
        self.temps.clear();
    }

    fn live_loans<'s>(&'s self, state: &'s FlowState) -> impl Iterator<Item = LoanId> + 's {
        let held = state
            .facts
            .iter()
            .filter(|(key, fact)| self.last_use.holds(key.root, fact.acquired, self.stmt))
            .flat_map(|(_, fact)| fact.value.loans.iter().copied());
        held.chain(self.temps.iter().copied())
    }

    fn find_conflict(&self, state: &FlowState, id: LoanId) -> Option<LoanId> {
        let loan = self.loans.get(id)?;
        self.live_loans(state)
            .filter(|other| *other != id)
            .find(|other| {
                self.loans
                    .get(*other)
                    .is_some_and(|other| loan.conflicts_with(other))
            })
    }

    fn report_conflict(&mut self, new: LoanId, existing: LoanId) {
        let (Some(new), Some(existing)) = (self.loans.get(new), self.loans.get(existing)) else {
            return;
        };
        let how = |loan: &Loan| {
            if loan.is_mutable() {
                "mutable"
            } else {
                "immutable"
            }
        };
        let what = self.describe(&new.path);
        let diag = Diagnostic::error(ErrorCode::E0401)
            .with_message(format!(
                "cannot borrow `{what}` as {} because it is also borrowed as {}",
                how(new),
                how(existing)
            ))
            .with_label(new.span, format!("{} borrow occurs here", how(new)))
            .with_secondary_label(
                existing.span,
                format!(
                    "{} borrow of `{}` is still live",
                    how(existing),
                    self.describe(&existing.path)
                ),
            )
            .with_suggestion("declare both references `const` or end the first borrow earlier");
        self.report(diag);
    }

    // ── Expressions ─────────────────────────────────────────────────

    /// The place an expression reads, if it is a plain read.
    fn place_source(&self, id: ExprId) -> Option<PlacePath> {
        match &self.cx.module.expr(id)?.kind {
            ExprKind::Place(path) => Some(path.clone()),
            _ => None,
        }
    }

    pub(crate) fn eval(&mut self, id: ExprId, state: &mut FlowState) -> Value {
        let module = self.cx.module;
        let Some(expr) = module.expr(id) else {
            tracing::warn!(expr = id.raw(), "dangling expression id");
            return Value::default();
        };
        ensure_sufficient_stack(|| match &expr.kind {
            ExprKind::Int(_) | ExprKind::Bool(_) | ExprKind::Const(_) | ExprKind::Null => {
                Value::default()
            }
            ExprKind::Place(path) => self.read(state, path, expr.span),
            ExprKind::AddrOf(path) => self.address_of(state, path, expr),
            ExprKind::ArenaNew { region, init } => {
                if let Some(init) = init {
                    self.eval(*init, state);
                }
                self.arena_allocation(state, *region)
            }
            ExprKind::HeapNew { init } => {
                if let Some(init) = init {
                    self.eval(*init, state);
                }
                Value {
                    reference: Some(RefValue {
                        region: Region::Heap,
                        lifetime: ScopeId::MODULE,
                        stamp: None,
                        loans: SmallVec::new(),
                    }),
                    nonnull: true,
                }
            }
            ExprKind::Call { callee, args } => self.call(state, *callee, args, expr),
            ExprKind::Binary { op, lhs, rhs } => {
                self.eval(*lhs, state);
                match op {
                    BinaryOp::And | BinaryOp::Or => self.eval_short_circuit(*op, *lhs, *rhs, state),
                    _ => {
                        self.eval(*rhs, state);
                    }
                }
                Value::default()
            }
            ExprKind::Unary { operand, .. } => {
                self.eval(*operand, state);
                Value::default()
            }
        })
    }

    /// The right operand of `&&` / `||` only runs when the left one
    /// decided nothing, so it sees the left operand's narrowing.
    fn eval_short_circuit(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId, state: &mut FlowState) {
        let facts = narrowing(self.cx.module, lhs);
        let narrowed = if op == BinaryOp::And {
            facts.then_nonnull
        } else {
            facts.else_nonnull
        };
        let before = state.nulls.clone();
        for path in narrowed {
            state.nulls.mark_nonnull(path);
        }
        self.eval(rhs, state);
        state.nulls = state.nulls.join(&before);
    }

    /// Checks on the projections of a path: every dereferenced prefix must
    /// be initialized, non-null and fresh; every index gets a policy.
    pub(crate) fn check_access(&mut self, state: &mut FlowState, path: &PlacePath, span: Span) {
        for (i, proj) in path.projections.iter().enumerate() {
            match proj {
                Projection::Field(_) => {}
                Projection::Deref => self.check_deref(state, &path.prefix(i), span),
                Projection::Index(index) => {
                    self.eval(*index, state);
                    self.select_bounds_policy(&path.prefix(i), *index);
                }
            }
        }
    }

    fn check_deref(&mut self, state: &mut FlowState, reference: &PlacePath, span: Span) {
        let module = self.cx.module;
        if !state.init.is_readable(module, reference) {
            self.report_uninit(reference, span, "dereference of");
            state.init.write(module, reference);
        }
        if !state.nulls.is_nonnull(module, reference) {
            let what = self.describe(reference);
            let diag = Diagnostic::error(ErrorCode::E0601)
                .with_message(format!("dereference of possibly-null reference `{what}`"))
                .with_label(span, "dereferenced here")
                .with_suggestion(format!("check `{what} != null` before dereferencing"));
            self.report(diag);
            state.nulls.mark_nonnull(reference.clone());
        }
        let stamp = self.ref_at(state, reference).and_then(|r| r.stamp);
        self.check_fresh(state, stamp, span, Some(reference), "dereferenced");
    }

    pub(crate) fn report_uninit(&mut self, path: &PlacePath, span: Span, action: &str) {
        let what = self.describe(path);
        let diag = Diagnostic::error(ErrorCode::E0201)
            .with_message(format!("{action} possibly uninitialized `{what}`"))
            .with_label(span, format!("`{what}` may be uninitialized here"))
            .with_note("every path to this point must assign it first");
        self.report(diag);
    }

    /// Report a reference whose arena was reset after it was created.
    /// The source fact is refreshed so one stale reference is reported once.
    pub(crate) fn check_fresh(
        &mut self,
        state: &mut FlowState,
        stamp: Option<Stamp>,
        span: Span,
        source: Option<&PlacePath>,
        action: &str,
    ) {
        let Some(stamp) = stamp else {
            return;
        };
        if !state.generations.is_stale(stamp) {
            return;
        }
        let region = self.describe_region(Region::Arena(stamp.region));
        let what = source.map_or_else(|| "reference".to_owned(), |p| format!("`{}`", self.describe(p)));
        let diag = Diagnostic::error(ErrorCode::E0501)
            .with_message(format!("{what} into {region} is {action} after the region was reset"))
            .with_label(span, format!("{action} here"))
            .with_note(format!(
                "{region} is at generation {}, the reference was created in generation {}",
                state.generations.get(stamp.region),
                stamp.generation
            ));
        self.report(diag);

        let fresh = state.generations.stamp(stamp.region);
        if let Some((key, _)) = source.and_then(fact_key) {
            if let Some(fact) = state.facts.get_mut(&key) {
                fact.value.stamp = Some(fresh);
            }
        }
    }

    fn read(&mut self, state: &mut FlowState, path: &PlacePath, span: Span) -> Value {
        self.check_access(state, path, span);
        let module = self.cx.module;
        if !state.init.is_readable(module, path) {
            self.report_uninit(path, span, "use of");
            state.init.write(module, path);
        }
        match self.ref_at(state, path) {
            Some(reference) => Value {
                reference: Some(reference),
                nonnull: state.nulls.is_nonnull(module, path),
            },
            None => Value::default(),
        }
    }

    fn address_of(&mut self, state: &mut FlowState, path: &PlacePath, expr: &Expr) -> Value {
        self.check_access(state, path, expr.span);
        let module = self.cx.module;
        let kind = expr
            .ty
            .as_ref_type()
            .map_or(Mutability::Mutable, |r| r.mutability);

        if !state.init.is_readable(module, path) {
            // A mutable borrow of uninitialized storage is an out-parameter.
            if kind == Mutability::Immutable {
                self.report_uninit(path, expr.span, "immutable borrow of");
            }
            state.init.write(module, path);
        }

        let loan = self.loans.insert(Loan {
            path: path.clone(),
            kind,
            span: expr.span,
            issued: self.stmt,
        });
        self.pending.push(loan);

        let last_deref = path
            .projections
            .iter()
            .rposition(|p| matches!(p, Projection::Deref));
        let reference = match last_deref {
            Some(i) => {
                let mut base = self
                    .ref_at(state, &path.prefix(i))
                    .unwrap_or_else(|| RefValue {
                        region: Region::Heap,
                        lifetime: ScopeId::MODULE,
                        stamp: None,
                        loans: SmallVec::new(),
                    });
                // A reborrow keeps the original borrow alive.
                base.loans.insert(0, loan);
                base
            }
            None => {
                let (region, lifetime) = match module.place(path.root).map(|p| p.kind) {
                    Some(PlaceKind::Global) | None => (Region::Static, ScopeId::MODULE),
                    Some(PlaceKind::Local | PlaceKind::Param) => {
                        (Region::Stack, self.cx.scopes.place_scope(path.root))
                    }
                };
                RefValue {
                    region,
                    lifetime,
                    stamp: None,
                    loans: smallvec![loan],
                }
            }
        };
        Value {
            reference: Some(reference),
            nonnull: true,
        }
    }

    fn arena_allocation(&self, state: &FlowState, region: regal_ir::Name) -> Value {
        let scopes = self.cx.scopes;
        let reference = match scopes.regions.resolve(region, self.scope, &scopes.tree) {
            Some(id) => RefValue {
                region: Region::Arena(id),
                lifetime: scopes.regions.get(id).map_or(ScopeId::MODULE, |r| r.scope),
                stamp: Some(state.generations.stamp(id)),
                loans: SmallVec::new(),
            },
            None => {
                tracing::warn!(
                    region = self.cx.interner.lookup(region),
                    "allocation in unknown region"
                );
                RefValue {
                    region: Region::Heap,
                    lifetime: ScopeId::MODULE,
                    stamp: None,
                    loans: SmallVec::new(),
                }
            }
        };
        Value {
            reference: Some(reference),
            nonnull: true,
        }
    }

    fn call(&mut self, state: &mut FlowState, callee: FuncId, args: &[ExprId], expr: &Expr) -> Value {
        let module = self.cx.module;
        let params = module.function(callee).map(|f| f.params.as_slice()).unwrap_or(&[]);
        let mut ref_args: SmallVec<[RefValue; 2]> = SmallVec::new();
        let mut written: SmallVec<[LoanId; 4]> = SmallVec::new();

        for (i, arg) in args.iter().enumerate() {
            let value = self.eval(*arg, state);
            let Some(reference) = value.reference else {
                continue;
            };
            let writable = module
                .expr(*arg)
                .and_then(|e| e.ty.as_ref_type())
                .is_some_and(|r| r.mutability == Mutability::Mutable);
            if writable {
                written.extend(reference.loans.iter().copied());
            }
            let span = self.expr_span(*arg);
            let source = self.place_source(*arg);
            self.check_fresh(state, reference.stamp, span, source.as_ref(), "passed to a call");
            let param_ty = params
                .get(i)
                .and_then(|p| module.place(*p))
                .and_then(|p| p.ty.as_ref_type());
            if let Some(param_ty) = param_ty {
                self.check_argument(&reference, param_ty, span);
            }
            ref_args.push(reference);
        }

        // The callee may write through any reference it can reach.
        state.nulls.invalidate_indirect();
        self.invalidate_borrowed(state, &written);

        let Some(ret) = expr.ty.as_ref_type() else {
            return Value::default();
        };
        let region = self.lower_region(ret);
        let scopes = self.cx.scopes;
        let lifetime = match region {
            Region::Static | Region::Heap => ScopeId::MODULE,
            Region::Arena(id) => scopes.regions.get(id).map_or(ScopeId::MODULE, |r| r.scope),
            Region::Stack => ref_args
                .iter()
                .map(|r| r.lifetime)
                .reduce(|a, b| scopes.tree.deeper(a, b))
                .unwrap_or(self.scope),
        };
        let stamp = region.arena().map(|id| {
            ref_args
                .iter()
                .filter_map(|r| r.stamp)
                .filter(|s| s.region == id)
                .fold(state.generations.stamp(id), Stamp::min)
        });
        let mut loans: SmallVec<[LoanId; 2]> = SmallVec::new();
        for loan in ref_args.iter().flat_map(|r| r.loans.iter()) {
            if !loans.contains(loan) {
                loans.push(*loan);
            }
        }
        Value {
            reference: Some(RefValue {
                region,
                lifetime,
                stamp,
                loans,
            }),
            nonnull: ret.nullability == Nullability::NonNull,
        }
    }
}
