//! Per-path analysis state for the forward walk.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use regal_ir::{Module, PlaceId, PlacePath, Projection, StmtId};

use crate::borrow::LoanId;
use crate::builder::ScopeMap;
use crate::init::InitState;
use crate::invalidation::{Generations, Stamp};
use crate::nullability::{is_prefix, NullState};
use crate::region::Region;
use crate::scope::ScopeId;

/// What is known about a reference value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefValue {
    pub region: Region,
    /// Innermost scope the referent is guaranteed to live for.
    pub lifetime: ScopeId,
    pub stamp: Option<Stamp>,
    /// Loans this value keeps alive.
    pub loans: SmallVec<[LoanId; 2]>,
}

impl RefValue {
    /// A reference that is valid on both paths.
    fn join(&self, other: &RefValue, scopes: &ScopeMap) -> RefValue {
        let region = if self.region.outlives(other.region, &scopes.regions, &scopes.tree) {
            other.region
        } else {
            self.region
        };
        let stamp = match (self.stamp, other.stamp) {
            (Some(a), Some(b)) if a.region == b.region => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let mut loans = self.loans.clone();
        for loan in &other.loans {
            if !loans.contains(loan) {
                loans.push(*loan);
            }
        }
        RefValue {
            region,
            lifetime: scopes.tree.deeper(self.lifetime, other.lifetime),
            stamp,
            loans,
        }
    }
}

/// A reference value stored in a place, and when it was stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefFact {
    pub value: RefValue,
    pub acquired: StmtId,
}

/// Storage key for a reference fact.
///
/// Facts are tracked for places and their fields. Paths through a
/// dereference are not tracked. An index collapses onto the array, which
/// is then only weakly updated.
pub fn fact_key(path: &PlacePath) -> Option<(PlacePath, bool)> {
    let mut key = PlacePath::new(path.root);
    for proj in &path.projections {
        match proj {
            Projection::Field(_) => key.projections.push(*proj),
            Projection::Index(_) => return Some((key, false)),
            Projection::Deref => return None,
        }
    }
    Some((key, true))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowState {
    /// `false` after `return`, `break` or `continue`.
    pub reachable: bool,
    pub init: InitState,
    pub nulls: NullState,
    pub generations: Generations,
    pub facts: FxHashMap<PlacePath, RefFact>,
}

impl FlowState {
    pub fn entry() -> Self {
        FlowState {
            reachable: true,
            init: InitState::default(),
            nulls: NullState::default(),
            generations: Generations::default(),
            facts: FxHashMap::default(),
        }
    }

    /// A state no execution reaches; the identity of [`FlowState::join`].
    pub fn unreachable() -> Self {
        FlowState {
            reachable: false,
            ..Self::entry()
        }
    }

    /// Store a reference fact. `strong` replaces; a weak update (array
    /// element) merges with what was there.
    pub fn set_fact(&mut self, key: PlacePath, fact: RefFact, strong: bool, scopes: &ScopeMap) {
        let fact = match self.facts.get(&key) {
            Some(old) if !strong => RefFact {
                value: old.value.join(&fact.value, scopes),
                acquired: old.acquired.max(fact.acquired),
            },
            _ => fact,
        };
        self.facts.insert(key, fact);
    }

    /// Drop facts stored at `key` or below it.
    pub fn kill_facts(&mut self, key: &PlacePath) {
        self.facts.retain(|k, _| !is_prefix(key, k));
    }

    /// `place` went out of scope.
    pub fn forget_place(&mut self, place: PlaceId) {
        self.init.forget(place);
        self.nulls.forget(place);
        self.facts.retain(|k, _| k.root != place);
    }

    pub fn join(&self, other: &FlowState, module: &Module, scopes: &ScopeMap) -> FlowState {
        if !other.reachable {
            return self.clone();
        }
        if !self.reachable {
            return other.clone();
        }
        let mut facts = self.facts.clone();
        for (key, fact) in &other.facts {
            let merged = match facts.get(key) {
                Some(mine) => RefFact {
                    value: mine.value.join(&fact.value, scopes),
                    acquired: mine.acquired.max(fact.acquired),
                },
                None => fact.clone(),
            };
            facts.insert(key.clone(), merged);
        }
        FlowState {
            reachable: true,
            init: self.init.join(&other.init, module),
            nulls: self.nulls.join(&other.nulls),
            generations: self.generations.join(&other.generations),
            facts,
        }
    }
}
