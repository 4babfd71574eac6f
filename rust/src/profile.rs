//! Profile entry point: validate, pick a scheduler, return the plan.

use crate::config::ProfileOptions;
use crate::log_changes;
use crate::models::{Configuration, Journey};
use crate::pool::JourneyPool;
use crate::scheduler::{OrderedPlan, WeightedPlan};
use crate::validation::{resolve, ProfileError, Resolved};

/// Result of applying a profile to a journey pool.
#[derive(Debug)]
pub enum Plan<'a, J> {
    /// Timestamped profile, sorted by timestamp. Carries the boundary policy if
    /// the profile declared one.
    Ordered(OrderedPlan<'a, J>),
    /// Weighted profile, consumed as an unbounded stream.
    Weighted(WeightedPlan<'a, J>),
}

impl<'a, J> Plan<'a, J> {
    pub fn as_ordered(&self) -> Option<&OrderedPlan<'a, J>> {
        match self {
            Self::Ordered(plan) => Some(plan),
            Self::Weighted(_) => None,
        }
    }

    pub fn as_weighted(&self) -> Option<&WeightedPlan<'a, J>> {
        match self {
            Self::Ordered(_) => None,
            Self::Weighted(plan) => Some(plan),
        }
    }

    pub fn into_ordered(self) -> Option<OrderedPlan<'a, J>> {
        match self {
            Self::Ordered(plan) => Some(plan),
            Self::Weighted(_) => None,
        }
    }

    pub fn into_weighted(self) -> Option<WeightedPlan<'a, J>> {
        match self {
            Self::Ordered(_) => None,
            Self::Weighted(plan) => Some(plan),
        }
    }
}

/// Validate `config` against `journeys` and build its plan.
///
/// Validation errors are returned unchanged and no plan is produced.
pub fn apply<'a, J: Journey>(
    config: &Configuration,
    journeys: &'a [J],
    options: &ProfileOptions,
) -> Result<Plan<'a, J>, ProfileError> {
    let pool = JourneyPool::new(journeys);
    match resolve(config, &pool)? {
        Resolved::Timed(timed) => {
            let plan = OrderedPlan::new(timed, &pool, config, options);
            log_changes!(
                options.verbosity,
                "Ordered plan: {} steps, policy {:?}",
                plan.len(),
                plan.policy()
            );
            Ok(Plan::Ordered(plan))
        }
        Resolved::Weighted(weighted) => {
            let plan = WeightedPlan::new(weighted, &pool, config, options)
                .ok_or(ProfileError::ZeroTotalWeight)?;
            log_changes!(
                options.verbosity,
                "Weighted plan: {} scenarios, seed {:?}",
                plan.entries().len(),
                options.seed
            );
            Ok(Plan::Weighted(plan))
        }
    }
}

/// A configuration bundled with the options it is applied with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    configuration: Configuration,
    options: ProfileOptions,
}

impl Profile {
    pub fn new(configuration: Configuration) -> Self {
        Self::with_options(configuration, ProfileOptions::default())
    }

    pub fn with_options(configuration: Configuration, options: ProfileOptions) -> Self {
        Self {
            configuration,
            options,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn options(&self) -> &ProfileOptions {
        &self.options
    }

    /// Check the configuration without building a plan.
    pub fn validate<J: Journey>(&self, journeys: &[J]) -> Result<(), ProfileError> {
        crate::validation::validate(&self.configuration, journeys)
    }

    pub fn apply<'a, J: Journey>(&self, journeys: &'a [J]) -> Result<Plan<'a, J>, ProfileError> {
        apply(&self.configuration, journeys, &self.options)
    }
}
