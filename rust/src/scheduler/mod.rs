//! Plan construction for the two scheduling modes.
//!
//! Timestamped profiles become an [`OrderedPlan`]; weighted profiles become a
//! [`WeightedPlan`] that hands out unbounded streams.

mod deterministic;
mod weighted;

pub use deterministic::{OrderedPlan, PlannedStep};
pub use weighted::{stream_rng, WeightedEntry, WeightedPlan, WeightedSampler, WeightedStream};
