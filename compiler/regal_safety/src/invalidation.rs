//! Arena generations.
//!
//! Every arena has a generation counter, bumped by `arena_reset` (and by
//! re-executing its `region` declaration). A reference into an arena
//! carries the generation it was created in; using it after the counter
//! moved is a stale-reference error. No runtime tag is involved.
//!
//! At a join the counter takes the maximum over incoming paths while
//! reference stamps take the minimum, so a reference is stale after a join
//! if any path reset its arena.

use rustc_hash::FxHashMap;

use crate::region::RegionId;

/// Generation a reference was created in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Stamp {
    pub region: RegionId,
    pub generation: u32,
}

impl Stamp {
    /// Older of two stamps on the same arena.
    pub fn min(self, other: Stamp) -> Stamp {
        if other.generation < self.generation {
            other
        } else {
            self
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Generations {
    current: FxHashMap<RegionId, u32>,
}

impl Generations {
    pub fn get(&self, region: RegionId) -> u32 {
        self.current.get(&region).copied().unwrap_or(0)
    }

    /// Stamp for a reference created now.
    pub fn stamp(&self, region: RegionId) -> Stamp {
        Stamp {
            region,
            generation: self.get(region),
        }
    }

    /// `arena_reset`: invalidate every reference into `region`.
    pub fn reset(&mut self, region: RegionId) -> u32 {
        let generation = self.current.entry(region).or_insert(0);
        *generation = generation.saturating_add(1);
        *generation
    }

    /// A `region` declaration executes. The first execution starts at
    /// generation 0; a later one (a loop iteration) is a fresh arena.
    pub fn declare(&mut self, region: RegionId) {
        self.current
            .entry(region)
            .and_modify(|g| *g = g.saturating_add(1))
            .or_insert(0);
    }

    pub fn is_stale(&self, stamp: Stamp) -> bool {
        self.get(stamp.region) != stamp.generation
    }

    pub fn join(&self, other: &Generations) -> Generations {
        let mut current = self.current.clone();
        for (region, generation) in &other.current {
            let entry = current.entry(*region).or_insert(0);
            *entry = (*entry).max(*generation);
        }
        Generations { current }
    }
}
