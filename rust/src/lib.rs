//! Profile scheduling for test journeys.
//!
//! A profile lists scenarios that bind journeys to either fixed timestamps or
//! relative weights. Applying a profile to a pool of available journeys validates
//! it and produces either a time-ordered plan, run under an early/late boundary
//! policy, or an unbounded weighted stream.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::Duration;
use pyo3::prelude::*;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

mod config;
pub mod logging;
mod models;
pub mod policy;
pub mod pool;
mod profile;
pub mod scheduler;
pub mod timestamp;
pub mod validation;

pub use config::ProfileOptions;
pub use models::{Configuration, IfEarly, IfLate, Journey, Scenario, Scheduled, Timing};
pub use policy::{CancelToken, Clock, ManualClock, RunOutcome, ScheduledRun, SystemClock};
pub use profile::{apply, Plan, Profile};
pub use scheduler::{OrderedPlan, PlannedStep, WeightedPlan, WeightedSampler, WeightedStream};
pub use timestamp::{format_timestamp, parse_timestamp, TimestampError};
pub use validation::{validate, ProfileError};

fn value_error(err: impl std::fmt::Display) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

/// One step of a timestamped plan (PyO3 view).
#[pyclass(name = "PlannedStep")]
#[derive(Clone, Debug)]
pub struct PyPlannedStep {
    #[pyo3(get)]
    pub journey: String,
    #[pyo3(get)]
    pub at: Duration,
    #[pyo3(get)]
    pub window: Option<Duration>,
    #[pyo3(get)]
    pub extras: BTreeMap<String, String>,
}

#[pymethods]
impl PyPlannedStep {
    fn __repr__(&self) -> String {
        format!(
            "PlannedStep(journey={:?}, at={})",
            self.journey,
            format_timestamp(self.at).unwrap_or_default()
        )
    }
}

/// Unbounded iterator of journey names drawn from a weighted profile.
#[pyclass(name = "WeightedJourneys")]
pub struct PyWeightedJourneys {
    names: Vec<String>,
    sampler: WeightedSampler,
    rng: StdRng,
}

#[pymethods]
impl PyWeightedJourneys {
    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__(mut slf: PyRefMut<'_, Self>) -> Option<String> {
        let this = &mut *slf;
        let idx = this.sampler.sample(&mut this.rng);
        this.names.get(idx).cloned()
    }

    fn __repr__(&self) -> String {
        format!("WeightedJourneys(scenarios={})", self.names.len())
    }
}

/// Apply a profile to the available journey names.
///
/// # Returns
/// * list of journey names in execution order for timestamped profiles
/// * an endless `WeightedJourneys` iterator for weighted profiles
///
/// # Raises
/// * ValueError if a journey is not found or scheduling modes are inconsistent
#[pyfunction]
#[pyo3(name = "apply", signature = (configuration, journeys, options=None))]
fn py_apply(
    py: Python<'_>,
    configuration: Configuration,
    journeys: Vec<String>,
    options: Option<ProfileOptions>,
) -> PyResult<PyObject> {
    let options = options.unwrap_or_default();
    match apply(&configuration, &journeys, &options).map_err(value_error)? {
        Plan::Ordered(plan) => Ok(plan.names().into_py(py)),
        Plan::Weighted(plan) => {
            let stream = PyWeightedJourneys {
                names: plan
                    .entries()
                    .iter()
                    .map(|entry| entry.journey.clone())
                    .collect(),
                sampler: plan.sampler().clone(),
                rng: scheduler::stream_rng(options.seed),
            };
            Ok(Py::new(py, stream)?.into_py(py))
        }
    }
}

/// Timestamped plan with offsets, windows and extras.
///
/// # Raises
/// * ValueError if the profile is invalid or weighted
#[pyfunction]
#[pyo3(name = "plan_steps", signature = (configuration, journeys, options=None))]
fn py_plan_steps(
    configuration: Configuration,
    journeys: Vec<String>,
    options: Option<ProfileOptions>,
) -> PyResult<Vec<PyPlannedStep>> {
    let options = options.unwrap_or_default();
    let plan = apply(&configuration, &journeys, &options)
        .map_err(value_error)?
        .into_ordered()
        .ok_or_else(|| value_error("Weighted profiles have no timestamped steps"))?;
    Ok(plan
        .steps()
        .iter()
        .map(|step| PyPlannedStep {
            journey: step.journey.clone(),
            at: step.at,
            window: step.window,
            extras: step.extras.clone(),
        })
        .collect())
}

/// Check a profile against the available journey names.
#[pyfunction]
#[pyo3(name = "validate")]
fn py_validate(configuration: Configuration, journeys: Vec<String>) -> PyResult<()> {
    validate(&configuration, &journeys).map_err(value_error)
}

/// Parse `HH:MM:SS` into a timedelta.
#[pyfunction]
#[pyo3(name = "parse_timestamp")]
fn py_parse_timestamp(timestamp: &str) -> PyResult<Duration> {
    parse_timestamp(timestamp).map_err(value_error)
}

/// Format a timedelta as `HH:MM:SS`.
#[pyfunction]
#[pyo3(name = "format_timestamp")]
fn py_format_timestamp(offset: Duration) -> PyResult<String> {
    format_timestamp(offset).map_err(value_error)
}

/// The journey_profile Python module.
#[pymodule]
fn journey_profile(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Profile types
    m.add_class::<IfEarly>()?;
    m.add_class::<IfLate>()?;
    m.add_class::<Scheduled>()?;
    m.add_class::<Scenario>()?;
    m.add_class::<Configuration>()?;
    m.add_class::<ProfileOptions>()?;

    // Plan types
    m.add_class::<PyPlannedStep>()?;
    m.add_class::<PyWeightedJourneys>()?;

    // Functions
    m.add_function(wrap_pyfunction!(py_apply, m)?)?;
    m.add_function(wrap_pyfunction!(py_plan_steps, m)?)?;
    m.add_function(wrap_pyfunction!(py_validate, m)?)?;
    m.add_function(wrap_pyfunction!(py_parse_timestamp, m)?)?;
    m.add_function(wrap_pyfunction!(py_format_timestamp, m)?)?;

    Ok(())
}
