//! Regions and their partial order.
//!
//! A region is where a reference points: the stack, static storage, the
//! heap, or a named arena. Regions are never destroyed; arenas are only
//! reset (see [`crate::invalidation`]).

use std::fmt;

use regal_ir::{Name, RegionRef, Span};

use crate::scope::{ScopeId, ScopeTree};

/// Index of an arena in a [`RegionTable`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u32);

impl RegionId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        RegionId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionId({})", self.0)
    }
}

/// The memory a reference points into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    Stack,
    Static,
    Heap,
    Arena(RegionId),
}

impl Region {
    /// Whether memory in `self` lives at least as long as memory in `other`.
    ///
    /// `Static` outlives everything. `Heap` outlives everything except
    /// `Static`. An arena outlives stack memory and any arena declared in
    /// the same or a nested scope. Stack memory only outlives stack memory;
    /// which stack frame is decided by lifetime scopes, not regions.
    pub fn outlives(self, other: Region, regions: &RegionTable, scopes: &ScopeTree) -> bool {
        match (self, other) {
            (Region::Static, _) => true,
            (_, Region::Static) => false,
            (Region::Heap, _) => true,
            (_, Region::Heap) => false,
            (Region::Arena(a), Region::Arena(b)) => {
                a == b
                    || match (regions.get(a), regions.get(b)) {
                        (Some(ra), Some(rb)) => scopes.is_ancestor_or_equal(ra.scope, rb.scope),
                        _ => false,
                    }
            }
            (Region::Arena(_) | Region::Stack, Region::Stack) => true,
            (Region::Stack, Region::Arena(_)) => false,
        }
    }

    /// The arena this region names, if any.
    pub fn arena(self) -> Option<RegionId> {
        match self {
            Region::Arena(id) => Some(id),
            _ => None,
        }
    }
}

/// A declared arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionInfo {
    pub name: Name,
    /// Scope the arena is bound to.
    pub scope: ScopeId,
    pub capacity: u64,
    pub span: Span,
}

/// Every arena declared in a unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionTable {
    regions: Vec<RegionInfo>,
}

impl RegionTable {
    pub fn insert(&mut self, info: RegionInfo) -> RegionId {
        let id = RegionId::new(u32::try_from(self.regions.len()).unwrap_or(u32::MAX));
        self.regions.push(info);
        id
    }

    #[inline]
    pub fn get(&self, id: RegionId) -> Option<&RegionInfo> {
        self.regions.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &RegionInfo)> {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, r)| (RegionId::new(i as u32), r))
    }

    /// The arena called `name` visible from `from`: declared in `from` or
    /// an enclosing scope, innermost first.
    pub fn resolve(&self, name: Name, from: ScopeId, scopes: &ScopeTree) -> Option<RegionId> {
        self.iter()
            .filter(|(_, r)| r.name == name && scopes.is_ancestor_or_equal(r.scope, from))
            .max_by_key(|(_, r)| scopes.depth(r.scope))
            .map(|(id, _)| id)
    }

    /// Translate a type annotation into a region, resolving arena names
    /// from `from`.
    pub fn lower(&self, region: RegionRef, from: ScopeId, scopes: &ScopeTree) -> Option<Region> {
        Some(match region {
            RegionRef::Stack => Region::Stack,
            RegionRef::Static => Region::Static,
            RegionRef::Heap => Region::Heap,
            RegionRef::Arena(name) => Region::Arena(self.resolve(name, from, scopes)?),
        })
    }
}
