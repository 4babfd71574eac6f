//! Core data types for profiles.

use pyo3::prelude::*;
use std::collections::BTreeMap;

/// An executable unit that can be referenced from a profile by its display name.
pub trait Journey {
    fn display_name(&self) -> &str;
}

impl Journey for str {
    fn display_name(&self) -> &str {
        self
    }
}

impl Journey for String {
    fn display_name(&self) -> &str {
        self.as_str()
    }
}

impl<J: Journey + ?Sized> Journey for &J {
    fn display_name(&self) -> &str {
        (**self).display_name()
    }
}

/// What to do when a scheduled step comes up before its timestamp.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IfEarly {
    /// Block until the timestamp is reached, then run the step.
    #[pyo3(name = "SLEEP")]
    Sleep,
}

/// What to do when a scheduled step comes up after its timestamp.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IfLate {
    /// Terminate the run, discarding the remaining steps.
    #[pyo3(name = "END")]
    End,
}

/// Boundary policy for timestamped profiles.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduled {
    #[pyo3(get, set)]
    pub if_early: IfEarly,
    #[pyo3(get, set)]
    pub if_late: IfLate,
}

#[pymethods]
impl Scheduled {
    #[new]
    #[pyo3(signature = (if_early=IfEarly::Sleep, if_late=IfLate::End))]
    pub fn new(if_early: IfEarly, if_late: IfLate) -> Self {
        Self { if_early, if_late }
    }

    fn __repr__(&self) -> String {
        format!(
            "Scheduled(if_early={:?}, if_late={:?})",
            self.if_early, self.if_late
        )
    }
}

impl Default for Scheduled {
    fn default() -> Self {
        Self::new(IfEarly::Sleep, IfLate::End)
    }
}

/// How a scenario is placed in a run.
#[derive(Clone, Debug, PartialEq)]
pub enum Timing {
    /// `HH:MM:SS` offset from run start, kept unparsed until validation.
    At(String),
    /// Relative selection weight.
    Weight(f64),
}

/// One profile entry: a journey plus its timestamp or weight.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Scenario {
    #[pyo3(get, set)]
    pub journey: String,
    pub timing: Option<Timing>,
    #[pyo3(get, set)]
    pub extras: BTreeMap<String, String>,
}

impl Scenario {
    /// Scenario that runs `journey` at the `HH:MM:SS` offset `at`.
    pub fn at(journey: impl Into<String>, at: impl Into<String>) -> Self {
        Self {
            journey: journey.into(),
            timing: Some(Timing::At(at.into())),
            extras: BTreeMap::new(),
        }
    }

    /// Scenario that draws `journey` with relative weight `weight`.
    pub fn weighted(journey: impl Into<String>, weight: f64) -> Self {
        Self {
            journey: journey.into(),
            timing: Some(Timing::Weight(weight)),
            extras: BTreeMap::new(),
        }
    }

    /// Scenario with neither a timestamp nor a weight. Only useful to build invalid input.
    pub fn untimed(journey: impl Into<String>) -> Self {
        Self {
            journey: journey.into(),
            timing: None,
            extras: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn timestamp(&self) -> Option<&str> {
        match &self.timing {
            Some(Timing::At(at)) => Some(at.as_str()),
            _ => None,
        }
    }

    pub fn weight_value(&self) -> Option<f64> {
        match self.timing {
            Some(Timing::Weight(w)) => Some(w),
            _ => None,
        }
    }
}

#[pymethods]
impl Scenario {
    #[new]
    #[pyo3(signature = (journey, at=None, weight=None, extras=None))]
    fn py_new(
        journey: String,
        at: Option<String>,
        weight: Option<f64>,
        extras: Option<BTreeMap<String, String>>,
    ) -> PyResult<Self> {
        let timing = match (at, weight) {
            (Some(_), Some(_)) => {
                return Err(pyo3::exceptions::PyValueError::new_err(format!(
                    "Scenario for {} cannot have both a timestamp and a weight",
                    journey
                )))
            }
            (Some(at), None) => Some(Timing::At(at)),
            (None, Some(weight)) => Some(Timing::Weight(weight)),
            (None, None) => None,
        };
        Ok(Self {
            journey,
            timing,
            extras: extras.unwrap_or_default(),
        })
    }

    #[getter(at)]
    fn py_at(&self) -> Option<String> {
        self.timestamp().map(str::to_string)
    }

    #[getter(weight)]
    fn py_weight(&self) -> Option<f64> {
        self.weight_value()
    }

    fn __repr__(&self) -> String {
        match &self.timing {
            Some(Timing::At(at)) => format!("Scenario(journey={:?}, at={:?})", self.journey, at),
            Some(Timing::Weight(w)) => {
                format!("Scenario(journey={:?}, weight={})", self.journey, w)
            }
            None => format!("Scenario(journey={:?})", self.journey),
        }
    }
}

/// A declarative profile: an optional boundary policy plus ordered scenarios.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Configuration {
    #[pyo3(get, set)]
    pub scheduled: Option<Scheduled>,
    #[pyo3(get, set)]
    pub scenarios: Vec<Scenario>,
}

impl Configuration {
    pub fn new(scheduled: Option<Scheduled>, scenarios: Vec<Scenario>) -> Self {
        Self {
            scheduled,
            scenarios,
        }
    }
}

#[pymethods]
impl Configuration {
    #[new]
    #[pyo3(signature = (scenarios, scheduled=None))]
    fn py_new(scenarios: Vec<Scenario>, scheduled: Option<Scheduled>) -> Self {
        Self::new(scheduled, scenarios)
    }

    fn __repr__(&self) -> String {
        format!(
            "Configuration(scheduled={}, scenarios={})",
            self.scheduled.is_some(),
            self.scenarios.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unit {
        name: &'static str,
    }

    impl Journey for Unit {
        fn display_name(&self) -> &str {
            self.name
        }
    }

    #[test]
    fn test_journey_impls() {
        let owned = "a".to_string();
        assert_eq!(owned.display_name(), "a");
        assert_eq!("b".display_name(), "b");
        let unit = Unit { name: "c" };
        assert_eq!((&unit).display_name(), "c");
    }

    #[test]
    fn test_scenario_accessors() {
        let timed = Scenario::at("a", "00:01:00").with_extra("iterations", "3");
        assert_eq!(timed.timestamp(), Some("00:01:00"));
        assert_eq!(timed.weight_value(), None);
        assert_eq!(timed.extras.get("iterations").map(String::as_str), Some("3"));

        let weighted = Scenario::weighted("b", 0.5);
        assert_eq!(weighted.timestamp(), None);
        assert_eq!(weighted.weight_value(), Some(0.5));

        let untimed = Scenario::untimed("c");
        assert!(untimed.timing.is_none());
    }

    #[test]
    fn test_scheduled_default() {
        let scheduled = Scheduled::default();
        assert_eq!(scheduled.if_early, IfEarly::Sleep);
        assert_eq!(scheduled.if_late, IfLate::End);
    }
}
