//! Profile validation against the available journey pool.
//!
//! Validation is fail-fast: the first violation aborts and nothing is planned.
//! A successful pass produces [`Resolved`] scenarios that the schedulers consume
//! without re-checking anything.

use chrono::Duration;
use thiserror::Error;

use crate::models::{Configuration, Journey, Timing};
use crate::pool::{JourneyPool, PoolIndex};
use crate::timestamp::{parse_timestamp, TimestampError};

/// Errors that reject a profile before any plan is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Journey {journey} not found in the available journeys")]
    UnknownJourney { journey: String },
    #[error(
        "Scenario {index} ({journey}) has no timestamp; all scenarios in scheduled profiles must have timestamps"
    )]
    MissingTimestamps { index: usize, journey: String },
    #[error(
        "Scenario {index} ({journey}) has neither a timestamp nor a weight; unscheduled profiles must use weights or timestamps throughout"
    )]
    MissingSchedule { index: usize, journey: String },
    #[error("Profile mixes timestamped and weighted scenarios; use one or the other")]
    MixedSchedulingModes,
    #[error("Scenario {index} ({journey}) has an invalid timestamp: {source}")]
    InvalidTimestamp {
        index: usize,
        journey: String,
        #[source]
        source: TimestampError,
    },
    #[error("Scenario {index} ({journey}) has invalid weight {weight}; weights must be finite and non-negative")]
    InvalidWeight {
        index: usize,
        journey: String,
        weight: f64,
    },
    #[error("Weighted profile has a total weight of zero")]
    ZeroTotalWeight,
    #[error("Weighted profile's total weight is not finite")]
    TotalWeightOverflow,
}

/// A scenario with a parsed timestamp and its journey resolved in the pool.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedScenario {
    /// Position in the configuration's scenario list.
    pub index: usize,
    pub journey: PoolIndex,
    pub at: Duration,
}

/// A scenario with a validated weight and its journey resolved in the pool.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedScenario {
    pub index: usize,
    pub journey: PoolIndex,
    pub weight: f64,
}

/// Validated scenarios, split by scheduling mode.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    Timed(Vec<TimedScenario>),
    Weighted(Vec<WeightedScenario>),
}

/// Which mode the profile uses, decided from its scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Timed,
    Weighted,
}

/// Check a configuration against the journey pool.
pub fn validate<J: Journey>(config: &Configuration, journeys: &[J]) -> Result<(), ProfileError> {
    resolve(config, &JourneyPool::new(journeys)).map(|_| ())
}

fn select_mode(config: &Configuration) -> Result<Mode, ProfileError> {
    if config.scheduled.is_some() {
        if let Some((index, scenario)) = config
            .scenarios
            .iter()
            .enumerate()
            .find(|(_, s)| !matches!(s.timing, Some(Timing::At(_))))
        {
            return Err(ProfileError::MissingTimestamps {
                index,
                journey: scenario.journey.clone(),
            });
        }
        return Ok(Mode::Timed);
    }

    let mut timed = 0;
    let mut weighted = 0;
    for (index, scenario) in config.scenarios.iter().enumerate() {
        match scenario.timing {
            Some(Timing::At(_)) => timed += 1,
            Some(Timing::Weight(_)) => weighted += 1,
            None => {
                return Err(ProfileError::MissingSchedule {
                    index,
                    journey: scenario.journey.clone(),
                })
            }
        }
    }

    match (timed, weighted) {
        (_, 0) => Ok(Mode::Timed),
        (0, _) => Ok(Mode::Weighted),
        _ => Err(ProfileError::MixedSchedulingModes),
    }
}

/// Validate `config` and resolve every scenario against `pool`.
///
/// Journeys are checked first, in declaration order, then scheduling fields.
pub fn resolve<J: Journey>(
    config: &Configuration,
    pool: &JourneyPool<'_, J>,
) -> Result<Resolved, ProfileError> {
    let positions = config
        .scenarios
        .iter()
        .map(|scenario| {
            pool.position(&scenario.journey)
                .ok_or_else(|| ProfileError::UnknownJourney {
                    journey: scenario.journey.clone(),
                })
        })
        .collect::<Result<Vec<PoolIndex>, ProfileError>>()?;

    match select_mode(config)? {
        Mode::Timed => {
            let mut timed = Vec::with_capacity(config.scenarios.len());
            for (index, (scenario, journey)) in config.scenarios.iter().zip(positions).enumerate() {
                let Some(Timing::At(raw)) = &scenario.timing else {
                    continue;
                };
                let at = parse_timestamp(raw).map_err(|source| ProfileError::InvalidTimestamp {
                    index,
                    journey: scenario.journey.clone(),
                    source,
                })?;
                timed.push(TimedScenario { index, journey, at });
            }
            Ok(Resolved::Timed(timed))
        }
        Mode::Weighted => {
            let mut weighted = Vec::with_capacity(config.scenarios.len());
            let mut total = 0.0;
            for (index, (scenario, journey)) in config.scenarios.iter().zip(positions).enumerate() {
                let Some(Timing::Weight(weight)) = scenario.timing else {
                    continue;
                };
                if !weight.is_finite() || weight < 0.0 {
                    return Err(ProfileError::InvalidWeight {
                        index,
                        journey: scenario.journey.clone(),
                        weight,
                    });
                }
                total += weight;
                weighted.push(WeightedScenario {
                    index,
                    journey,
                    weight,
                });
            }
            if !total.is_finite() {
                return Err(ProfileError::TotalWeightOverflow);
            }
            if total <= 0.0 {
                return Err(ProfileError::ZeroTotalWeight);
            }
            Ok(Resolved::Weighted(weighted))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Scenario, Scheduled};

    const WEEK: &str = "android.platform.test.scenario.calendar.FlingWeekPage";
    const DAY: &str = "android.platform.test.scenario.calendar.FlingDayPage";
    const SCHEDULE: &str = "android.platform.test.scenario.calendar.FlingSchedulePage";

    fn pool() -> Vec<String> {
        vec![WEEK.to_string(), DAY.to_string(), SCHEDULE.to_string()]
    }

    #[test]
    fn test_valid_scheduled_profile() {
        let config = Configuration::new(
            Some(Scheduled::default()),
            vec![
                Scenario::at(WEEK, "00:01:00"),
                Scenario::at(DAY, "00:04:00"),
                Scenario::at(WEEK, "00:02:00"),
            ],
        );
        assert!(validate(&config, &pool()).is_ok());

        let journeys = pool();
        let resolved = resolve(&config, &JourneyPool::new(&journeys)).unwrap();
        let Resolved::Timed(timed) = resolved else {
            panic!("expected timed scenarios");
        };
        assert_eq!(timed.len(), 3);
        assert_eq!(timed[1].journey, 1);
        assert_eq!(timed[1].at, Duration::minutes(4));
    }

    #[test]
    fn test_unknown_journey() {
        let config = Configuration::new(
            Some(Scheduled::default()),
            vec![Scenario::at(WEEK, "00:01:00"), Scenario::at("invalid", "00:02:00")],
        );
        let err = validate(&config, &pool()).unwrap_err();
        assert_eq!(
            err,
            ProfileError::UnknownJourney {
                journey: "invalid".to_string()
            }
        );
        let message = err.to_string();
        assert!(message.contains("not found"));
        assert!(message.contains("invalid"));
    }

    #[test]
    fn test_unknown_journey_reported_before_mode_errors() {
        let config = Configuration::new(
            Some(Scheduled::default()),
            vec![Scenario::weighted("invalid", 1.0)],
        );
        assert!(matches!(
            validate(&config, &pool()),
            Err(ProfileError::UnknownJourney { .. })
        ));
    }

    #[test]
    fn test_scheduled_requires_timestamps() {
        let config = Configuration::new(
            Some(Scheduled::default()),
            vec![Scenario::at(WEEK, "00:01:00"), Scenario::weighted(DAY, 0.1)],
        );
        let err = validate(&config, &pool()).unwrap_err();
        assert_eq!(
            err,
            ProfileError::MissingTimestamps {
                index: 1,
                journey: DAY.to_string()
            }
        );
        let message = err.to_string();
        assert!(message.contains("must have timestamps"));
        assert!(message.contains("scheduled"));
    }

    #[test]
    fn test_scheduled_rejects_untimed() {
        let config = Configuration::new(Some(Scheduled::default()), vec![Scenario::untimed(WEEK)]);
        assert!(matches!(
            validate(&config, &pool()),
            Err(ProfileError::MissingTimestamps { index: 0, .. })
        ));
    }

    #[test]
    fn test_unscheduled_mixing_rejected() {
        let config = Configuration::new(
            None,
            vec![Scenario::at(WEEK, "00:01:00"), Scenario::weighted(DAY, 1.0)],
        );
        assert_eq!(
            validate(&config, &pool()),
            Err(ProfileError::MixedSchedulingModes)
        );
    }

    #[test]
    fn test_unscheduled_missing_schedule() {
        let config = Configuration::new(
            None,
            vec![Scenario::weighted(WEEK, 1.0), Scenario::untimed(DAY)],
        );
        assert!(matches!(
            validate(&config, &pool()),
            Err(ProfileError::MissingSchedule { index: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_timestamp_has_context() {
        let config = Configuration::new(
            Some(Scheduled::default()),
            vec![Scenario::at(WEEK, "00:01:00"), Scenario::at(DAY, "4 minutes")],
        );
        let err = validate(&config, &pool()).unwrap_err();
        assert!(matches!(
            &err,
            ProfileError::InvalidTimestamp {
                index: 1,
                source: TimestampError::WrongSegmentCount(_),
                ..
            }
        ));
        assert!(err.to_string().contains(DAY));
    }

    #[test]
    fn test_weights() {
        let config = Configuration::new(
            None,
            vec![Scenario::weighted(WEEK, 3.0), Scenario::weighted(DAY, 0.0)],
        );
        let journeys = pool();
        let resolved = resolve(&config, &JourneyPool::new(&journeys)).unwrap();
        assert_eq!(
            resolved,
            Resolved::Weighted(vec![
                WeightedScenario {
                    index: 0,
                    journey: 0,
                    weight: 3.0
                },
                WeightedScenario {
                    index: 1,
                    journey: 1,
                    weight: 0.0
                },
            ])
        );
    }

    #[test]
    fn test_invalid_weights() {
        for weight in [-1.0, f64::NAN, f64::INFINITY] {
            let config = Configuration::new(None, vec![Scenario::weighted(WEEK, weight)]);
            assert!(
                matches!(
                    validate(&config, &pool()),
                    Err(ProfileError::InvalidWeight { index: 0, .. })
                ),
                "weight {}",
                weight
            );
        }

        let zero = Configuration::new(
            None,
            vec![Scenario::weighted(WEEK, 0.0), Scenario::weighted(DAY, 0.0)],
        );
        assert_eq!(validate(&zero, &pool()), Err(ProfileError::ZeroTotalWeight));

        let huge = Configuration::new(
            None,
            vec![Scenario::weighted(WEEK, f64::MAX), Scenario::weighted(DAY, f64::MAX)],
        );
        assert_eq!(
            validate(&huge, &pool()),
            Err(ProfileError::TotalWeightOverflow)
        );
    }

    #[test]
    fn test_empty_profile_is_timed() {
        let journeys = pool();
        let config = Configuration::default();
        assert_eq!(
            resolve(&config, &JourneyPool::new(&journeys)),
            Ok(Resolved::Timed(Vec::new()))
        );
    }
}
