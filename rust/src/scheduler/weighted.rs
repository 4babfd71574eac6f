//! Weighted random selection for open-ended profiles.
//!
//! Weights are normalized once per plan into a cumulative table; each draw is a
//! uniform variate over `[0, total)` located with a binary search.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use crate::config::ProfileOptions;
use crate::log_debug;
use crate::models::{Configuration, Journey};
use crate::pool::{JourneyPool, PoolIndex};
use crate::validation::WeightedScenario;

/// Cumulative weight table for discrete sampling.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedSampler {
    cumulative: Vec<f64>,
    total: f64,
}

impl WeightedSampler {
    /// Build a sampler. Returns `None` unless the weights are finite, non-negative
    /// and sum to a positive, finite total.
    pub fn new(weights: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut cumulative = Vec::new();
        let mut total = 0.0;
        for weight in weights {
            if !weight.is_finite() || weight < 0.0 {
                return None;
            }
            total += weight;
            cumulative.push(total);
        }
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        Some(Self { cumulative, total })
    }

    /// Draw an index with probability `weight / total`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let x = rng.gen_range(0.0..self.total);
        // Zero-weight entries share their predecessor's cumulative value and are skipped.
        self.cumulative
            .partition_point(|&c| c <= x)
            .min(self.cumulative.len() - 1)
    }

    /// Normalized probability of index `idx`.
    pub fn probability(&self, idx: usize) -> f64 {
        let Some(&upper) = self.cumulative.get(idx) else {
            return 0.0;
        };
        let lower = match idx {
            0 => 0.0,
            _ => self.cumulative[idx - 1],
        };
        (upper - lower) / self.total
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }
}

/// RNG for a new stream: seeded when a seed is configured, OS entropy otherwise.
pub fn stream_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// One selectable scenario of a weighted plan.
#[derive(Debug)]
pub struct WeightedEntry<'a, J> {
    pub journey: &'a J,
    pub pool_index: PoolIndex,
    pub scenario_index: usize,
    pub weight: f64,
    pub extras: BTreeMap<String, String>,
}

/// Probability-driven plan. Each call to [`WeightedPlan::stream`] starts a fresh
/// unbounded sequence over the same distribution.
#[derive(Debug)]
pub struct WeightedPlan<'a, J> {
    entries: Vec<WeightedEntry<'a, J>>,
    sampler: WeightedSampler,
    seed: Option<u64>,
    verbosity: u8,
}

impl<'a, J: Journey> WeightedPlan<'a, J> {
    /// Build from validated scenarios. `None` only if the weights are unusable,
    /// which validation already rules out.
    pub fn new(
        weighted: Vec<WeightedScenario>,
        pool: &JourneyPool<'a, J>,
        config: &Configuration,
        options: &ProfileOptions,
    ) -> Option<Self> {
        let sampler = WeightedSampler::new(weighted.iter().map(|s| s.weight))?;
        let journeys = pool.journeys();
        let entries = weighted
            .into_iter()
            .map(|scenario| WeightedEntry {
                journey: &journeys[scenario.journey],
                pool_index: scenario.journey,
                scenario_index: scenario.index,
                weight: scenario.weight,
                extras: config.scenarios[scenario.index].extras.clone(),
            })
            .collect();
        Some(Self {
            entries,
            sampler,
            seed: options.seed,
            verbosity: options.verbosity,
        })
    }

    pub fn entries(&self) -> &[WeightedEntry<'a, J>] {
        &self.entries
    }

    pub fn sampler(&self) -> &WeightedSampler {
        &self.sampler
    }

    /// Normalized selection probability per entry, in declaration order.
    pub fn probabilities(&self) -> Vec<(&'a J, f64)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.journey, self.sampler.probability(idx)))
            .collect()
    }

    /// Start a new stream. With a configured seed every stream yields the same values.
    pub fn stream(&self) -> WeightedStream<'_, 'a, J> {
        WeightedStream {
            plan: self,
            rng: stream_rng(self.seed),
            drawn: 0,
        }
    }
}

/// Unbounded sequence of weighted draws. Single consumer.
#[derive(Debug)]
pub struct WeightedStream<'p, 'a, J> {
    plan: &'p WeightedPlan<'a, J>,
    rng: StdRng,
    drawn: u64,
}

impl<'p, 'a, J: Journey> WeightedStream<'p, 'a, J> {
    /// Draw the next entry, extras included.
    pub fn next_entry(&mut self) -> &'p WeightedEntry<'a, J> {
        let plan = self.plan;
        let idx = plan.sampler.sample(&mut self.rng);
        self.drawn += 1;
        let entry = &plan.entries[idx];
        log_debug!(
            plan.verbosity,
            "Draw {}: {}",
            self.drawn,
            entry.journey.display_name()
        );
        entry
    }

    /// Number of draws made so far.
    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl<'p, 'a, J: Journey> Iterator for WeightedStream<'p, 'a, J> {
    type Item = &'a J;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_entry().journey)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
