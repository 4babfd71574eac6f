//! Name lookup over a caller-owned journey pool.
//!
//! Maps display names to pool positions once per `apply`, so scenarios resolve
//! with a single hash lookup each.

use rustc_hash::FxHashMap;

use crate::models::Journey;

/// Index into the journey pool.
pub type PoolIndex = usize;

/// Borrowed view of a journey pool with a display-name index.
#[derive(Debug)]
pub struct JourneyPool<'a, J> {
    journeys: &'a [J],
    by_name: FxHashMap<&'a str, PoolIndex>,
}

impl<'a, J: Journey> JourneyPool<'a, J> {
    /// Index `journeys` by display name. When names repeat, the first occurrence wins.
    pub fn new(journeys: &'a [J]) -> Self {
        let mut by_name: FxHashMap<&'a str, PoolIndex> =
            FxHashMap::with_capacity_and_hasher(journeys.len(), Default::default());
        for (idx, journey) in journeys.iter().enumerate() {
            by_name.entry(journey.display_name()).or_insert(idx);
        }
        Self { journeys, by_name }
    }

    /// Pool position of the journey named `name`, if present.
    #[inline]
    pub fn position(&self, name: &str) -> Option<PoolIndex> {
        self.by_name.get(name).copied()
    }

    /// Look up a journey by display name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&'a J> {
        self.position(name).map(|idx| &self.journeys[idx])
    }

    /// Journey at a pool position.
    #[inline]
    pub fn at(&self, idx: PoolIndex) -> Option<&'a J> {
        self.journeys.get(idx)
    }

    pub fn journeys(&self) -> &'a [J] {
        self.journeys
    }

    /// Number of journeys in the pool (duplicates included).
    pub fn len(&self) -> usize {
        self.journeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }
}
