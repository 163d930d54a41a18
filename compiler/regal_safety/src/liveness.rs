//! Use-point pre-scan for non-lexical borrow liveness.
//!
//! For every place, records the statements of the function that use it
//! and the statements that overwrite it outright. A value stored in a
//! place stays live until the last use before the next overwrite; the
//! borrow checker consults this map instead of computing interval
//! liveness.
//!
//! Uses are reads (including reads through projections), address-of,
//! and writes through a dereference. Overwriting a place is not a use.
//!
//! Only overwrites of the whole place that every path from the earlier
//! store must pass bound a value: the overwrite's block encloses the
//! store. Overwrites in a branch leave the old value alive on the other
//! path.
//!
//! # Loops
//!
//! A use inside a loop of a place declared outside that loop counts as a
//! use at the loop's last statement. A loan that may be live across the
//! back-edge is therefore live for the whole body. Overwrites inside such
//! a loop bound nothing.

use std::ops::RangeInclusive;

use rustc_hash::{FxHashMap, FxHashSet};

use regal_ir::stack::ensure_sufficient_stack;
use regal_ir::{Block, ExprId, ExprKind, Function, Module, PlaceId, PlacePath, Projection, StmtId, StmtKind};

/// Overwrite of a whole place.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Overwrite {
    at: StmtId,
    /// Statements of the block the overwrite sits in, nested ones included.
    block: RangeInclusive<StmtId>,
}

/// Use and overwrite points of each place in one function.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LastUse {
    uses: FxHashMap<PlaceId, Vec<StmtId>>,
    overwrites: FxHashMap<PlaceId, Vec<Overwrite>>,
}

impl LastUse {
    /// Scan a function body.
    pub fn compute(module: &Module, func: &Function) -> Self {
        let mut scan = Scan {
            module,
            current: StmtId::new(0),
            loops: Vec::new(),
            blocks: Vec::new(),
            uses: LastUse::default(),
        };
        if let Some(body) = &func.body {
            scan.block(body);
        }
        let mut uses = scan.uses;
        for points in uses.uses.values_mut() {
            points.sort_unstable();
            points.dedup();
        }
        uses
    }

    /// Statement of the last use, or `None` if the place is never used.
    pub fn get(&self, place: PlaceId) -> Option<StmtId> {
        self.uses.get(&place).and_then(|points| points.last().copied())
    }

    /// First overwrite of `holder` after `acquired` that every path from
    /// `acquired` reaches.
    fn next_overwrite(&self, holder: PlaceId, acquired: StmtId) -> Option<StmtId> {
        self.overwrites
            .get(&holder)?
            .iter()
            .find(|w| w.at > acquired && w.block.contains(&acquired))
            .map(|w| w.at)
    }

    /// Whether a value acquired by `holder` at `acquired` is still needed
    /// at `point`.
    ///
    /// The value is needed until the holder's last use before it is
    /// overwritten. A use in the overwriting statement itself reads the
    /// old value. A value never used after the acquisition is kept until
    /// the holder goes out of scope.
    pub fn holds(&self, holder: PlaceId, acquired: StmtId, point: StmtId) -> bool {
        let next = self.next_overwrite(holder, acquired);
        let last = self.uses.get(&holder).and_then(|points| {
            points
                .iter()
                .rev()
                .copied()
                .find(|&u| u > acquired && next.is_none_or(|w| u <= w))
        });
        last.is_none_or(|last| point <= last)
    }

    fn record_use(&mut self, place: PlaceId, at: StmtId) {
        self.uses.entry(place).or_default().push(at);
    }

    fn record_overwrite(&mut self, place: PlaceId, at: StmtId, block: RangeInclusive<StmtId>) {
        self.overwrites
            .entry(place)
            .or_default()
            .push(Overwrite { at, block });
    }
}

struct LoopFrame {
    last: StmtId,
    declared: FxHashSet<PlaceId>,
}

struct Scan<'m> {
    module: &'m Module,
    current: StmtId,
    loops: Vec<LoopFrame>,
    /// Statement ranges of the enclosing blocks, innermost last.
    blocks: Vec<RangeInclusive<StmtId>>,
    uses: LastUse,
}

/// Highest statement ID in a block, nested statements included.
fn last_stmt(block: &Block) -> Option<StmtId> {
    block.stmts.last().map(|stmt| {
        let nested = match &stmt.kind {
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => else_block
                .as_ref()
                .and_then(last_stmt)
                .or_else(|| last_stmt(then_block)),
            StmtKind::While { body, .. } | StmtKind::Block(body) | StmtKind::Unsafe(body) => {
                last_stmt(body)
            }
            _ => None,
        };
        nested.map_or(stmt.id, |n| n.max(stmt.id))
    })
}

impl Scan<'_> {
    fn use_place(&mut self, place: PlaceId) {
        let mut at = self.current;
        for frame in &self.loops {
            if !frame.declared.contains(&place) {
                at = at.max(frame.last);
            }
        }
        self.uses.record_use(place, at);
    }

    /// Record an overwrite of the whole place, unless it sits in a loop
    /// the place was declared outside of.
    fn overwrite(&mut self, place: PlaceId) {
        if self.loops.iter().any(|frame| !frame.declared.contains(&place)) {
            return;
        }
        if let Some(block) = self.blocks.last() {
            self.uses.record_overwrite(place, self.current, block.clone());
        }
    }

    fn block(&mut self, block: &Block) {
        let range = block
            .stmts
            .first()
            .zip(last_stmt(block))
            .map(|(first, last)| first.id..=last);
        let Some(range) = range else {
            return;
        };
        self.blocks.push(range);
        self.stmts(block);
        self.blocks.pop();
    }

    fn stmts(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.current = stmt.id;
            match &stmt.kind {
                StmtKind::Let { place, init } => {
                    for frame in &mut self.loops {
                        frame.declared.insert(*place);
                    }
                    if let Some(init) = init {
                        self.expr(*init);
                        self.overwrite(*place);
                    }
                }
                StmtKind::Assign { target, value } => {
                    self.expr(*value);
                    self.path_indices(target);
                    if target.has_deref() {
                        self.use_place(target.root);
                    } else if target.projections.is_empty() {
                        self.overwrite(target.root);
                    }
                }
                StmtKind::Expr(e) | StmtKind::Return(Some(e)) => self.expr(*e),
                StmtKind::If {
                    cond,
                    then_block,
                    else_block,
                } => {
                    self.expr(*cond);
                    self.block(then_block);
                    if let Some(else_block) = else_block {
                        self.block(else_block);
                    }
                }
                StmtKind::While { cond, body } => {
                    let last = last_stmt(body).map_or(stmt.id, |l| l.max(stmt.id));
                    self.loops.push(LoopFrame {
                        last,
                        declared: FxHashSet::default(),
                    });
                    // The condition is re-evaluated on every iteration.
                    self.expr(*cond);
                    self.block(body);
                    self.loops.pop();
                }
                StmtKind::Block(body) | StmtKind::Unsafe(body) => self.block(body),
                StmtKind::Return(None)
                | StmtKind::Region(_)
                | StmtKind::ArenaReset { .. }
                | StmtKind::Break
                | StmtKind::Continue => {}
            }
        }
    }

    fn path_indices(&mut self, path: &PlacePath) {
        for proj in &path.projections {
            if let Projection::Index(e) = proj {
                self.expr(*e);
            }
        }
    }

    fn expr(&mut self, id: ExprId) {
        let module = self.module;
        let Some(expr) = module.expr(id) else {
            return;
        };
        ensure_sufficient_stack(|| match &expr.kind {
            ExprKind::Place(path) | ExprKind::AddrOf(path) => {
                self.use_place(path.root);
                self.path_indices(path);
            }
            ExprKind::ArenaNew { init, .. } | ExprKind::HeapNew { init } => {
                if let Some(init) = init {
                    self.expr(*init);
                }
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    self.expr(*arg);
                }
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                self.expr(*lhs);
                self.expr(*rhs);
            }
            ExprKind::Unary { operand, .. } => self.expr(*operand),
            ExprKind::Int(_) | ExprKind::Bool(_) | ExprKind::Null | ExprKind::Const(_) => {}
        });
    }
}

#[cfg(test)]
mod tests;
