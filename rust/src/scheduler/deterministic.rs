//! Timestamp ordering for scheduled profiles.

use chrono::Duration;
use std::collections::BTreeMap;

use crate::config::ProfileOptions;
use crate::models::{Configuration, Journey, Scheduled};
use crate::policy::{CancelToken, Clock, ScheduledRun};
use crate::pool::{JourneyPool, PoolIndex};
use crate::validation::TimedScenario;

/// One step of an ordered plan.
#[derive(Debug)]
pub struct PlannedStep<'a, J> {
    pub journey: &'a J,
    pub pool_index: PoolIndex,
    /// Position of the originating scenario in the configuration.
    pub scenario_index: usize,
    /// Offset from run start at which the step is due.
    pub at: Duration,
    /// Time until the next step is due; `None` for the last step.
    pub window: Option<Duration>,
    pub extras: BTreeMap<String, String>,
}

/// Time-ordered plan, optionally governed by a boundary policy when run.
#[derive(Debug)]
pub struct OrderedPlan<'a, J> {
    steps: Vec<PlannedStep<'a, J>>,
    policy: Option<Scheduled>,
    late_tolerance: Duration,
    verbosity: u8,
}

impl<'a, J: Journey> OrderedPlan<'a, J> {
    /// Order `timed` by ascending timestamp. Equal timestamps keep declaration order.
    pub fn new(
        mut timed: Vec<TimedScenario>,
        pool: &JourneyPool<'a, J>,
        config: &Configuration,
        options: &ProfileOptions,
    ) -> Self {
        timed.sort_by_key(|scenario| scenario.at);

        let journeys = pool.journeys();
        let next_offsets: Vec<Option<Duration>> = timed
            .iter()
            .skip(1)
            .map(|next| Some(next.at))
            .chain(std::iter::once(None))
            .collect();

        let steps = timed
            .into_iter()
            .zip(next_offsets)
            .map(|(scenario, next_at)| PlannedStep {
                journey: &journeys[scenario.journey],
                pool_index: scenario.journey,
                scenario_index: scenario.index,
                at: scenario.at,
                window: next_at.map(|next| next - scenario.at),
                extras: config.scenarios[scenario.index].extras.clone(),
            })
            .collect();

        Self {
            steps,
            policy: config.scheduled,
            late_tolerance: options.late_tolerance(),
            verbosity: options.verbosity,
        }
    }

    pub fn steps(&self) -> &[PlannedStep<'a, J>] {
        &self.steps
    }

    /// Journeys in execution order.
    pub fn journeys(&self) -> impl Iterator<Item = &'a J> + '_ {
        self.steps.iter().map(|step| step.journey)
    }

    /// Display names in execution order.
    pub fn names(&self) -> Vec<String> {
        self.journeys()
            .map(|journey| journey.display_name().to_string())
            .collect()
    }

    pub fn policy(&self) -> Option<Scheduled> {
        self.policy
    }

    pub fn late_tolerance(&self) -> Duration {
        self.late_tolerance
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Execute the plan against `clock`, applying the boundary policy before each step.
    ///
    /// Plans without a policy yield their steps back-to-back. `cancel` aborts the run
    /// at the next step boundary or during a pending sleep.
    pub fn run<'p, C: Clock>(
        &'p self,
        clock: &'p C,
        cancel: &CancelToken,
    ) -> ScheduledRun<'p, 'a, J, C> {
        ScheduledRun::new(
            &self.steps,
            self.policy,
            self.late_tolerance,
            clock,
            cancel.clone(),
            self.verbosity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scenario;
    use crate::validation::{resolve, Resolved};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn plan<'a>(config: &Configuration, journeys: &'a [String]) -> OrderedPlan<'a, String> {
        let pool = JourneyPool::new(journeys);
        let Resolved::Timed(timed) = resolve(config, &pool).unwrap() else {
            panic!("expected timed scenarios");
        };
        OrderedPlan::new(timed, &pool, config, &ProfileOptions::default())
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sorted_by_timestamp() {
        let journeys = names(&["a", "b", "c"]);
        let config = Configuration::new(
            Some(Scheduled::default()),
            vec![
                Scenario::at("a", "00:01:00"),
                Scenario::at("b", "00:04:00"),
                Scenario::at("a", "00:02:00"),
            ],
        );
        let plan = plan(&config, &journeys);
        assert_eq!(plan.names(), names(&["a", "a", "b"]));
        assert_eq!(
            plan.steps().iter().map(|s| s.scenario_index).collect::<Vec<_>>(),
            vec![0, 2, 1]
        );
        assert_eq!(plan.policy(), Some(Scheduled::default()));
    }

    #[test]
    fn test_windows() {
        let journeys = names(&["a", "b"]);
        let config = Configuration::new(
            None,
            vec![
                Scenario::at("b", "00:05:00"),
                Scenario::at("a", "00:00:30"),
                Scenario::at("a", "00:02:00"),
            ],
        );
        let plan = plan(&config, &journeys);
        let windows: Vec<Option<Duration>> = plan.steps().iter().map(|s| s.window).collect();
        assert_eq!(
            windows,
            vec![
                Some(Duration::seconds(90)),
                Some(Duration::minutes(3)),
                None
            ]
        );
        assert_eq!(plan.policy(), None);
    }

    #[test]
    fn test_ties_keep_declaration_order() {
        let journeys = names(&["a", "b", "c"]);
        let config = Configuration::new(
            None,
            vec![
                Scenario::at("c", "00:01:00"),
                Scenario::at("a", "00:00:00"),
                Scenario::at("b", "00:01:00"),
                Scenario::at("a", "00:01:00"),
            ],
        );
        let plan = plan(&config, &journeys);
        assert_eq!(plan.names(), names(&["a", "c", "b", "a"]));
        assert_eq!(plan.steps()[1].window, Some(Duration::zero()));
    }

    #[test]
    fn test_extras_carried() {
        let journeys = names(&["a"]);
        let config = Configuration::new(
            None,
            vec![Scenario::at("a", "00:00:10").with_extra("orientation", "landscape")],
        );
        let plan = plan(&config, &journeys);
        assert_eq!(
            plan.steps()[0].extras.get("orientation").map(String::as_str),
            Some("landscape")
        );
    }

    #[test]
    fn test_empty_plan() {
        let journeys = names(&["a"]);
        let plan = plan(&Configuration::default(), &journeys);
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
    }

    #[test]
    fn test_ordering_property_randomized() {
        let journeys = names(&["a", "b", "c", "d"]);
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let count = rng.gen_range(0..20);
            let scenarios: Vec<Scenario> = (0..count)
                .map(|_| {
                    let journey = &journeys[rng.gen_range(0..journeys.len())];
                    // Few distinct minutes so ties are common
                    let at = format!("00:{:02}:00", rng.gen_range(0..5));
                    Scenario::at(journey.as_str(), at)
                })
                .collect();
            let config = Configuration::new(Some(Scheduled::default()), scenarios);
            let plan = plan(&config, &journeys);

            assert_eq!(plan.len(), config.scenarios.len());
            for pair in plan.steps().windows(2) {
                assert!(pair[0].at <= pair[1].at);
                if pair[0].at == pair[1].at {
                    assert!(pair[0].scenario_index < pair[1].scenario_index);
                }
            }
        }
    }
}
