//! Options that control how a profile is planned and run.

use chrono::Duration;
use pyo3::prelude::*;

/// Planning and execution options.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileOptions {
    /// Seed for weighted streams. `None` draws a fresh seed from the OS per stream.
    #[pyo3(get, set)]
    pub seed: Option<u64>,
    /// How far past its timestamp a step may start before it counts as late.
    /// Zero by default: any delay past the timestamp ends a run under `END`.
    #[pyo3(get, set)]
    pub late_tolerance_ms: u64,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            seed: None,
            late_tolerance_ms: 0,
            verbosity: 0,
        }
    }
}

impl ProfileOptions {
    pub fn late_tolerance(&self) -> Duration {
        let ms = i64::try_from(self.late_tolerance_ms).unwrap_or(i64::MAX);
        Duration::try_milliseconds(ms).unwrap_or_else(Duration::max_value)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_late_tolerance_ms(mut self, late_tolerance_ms: u64) -> Self {
        self.late_tolerance_ms = late_tolerance_ms;
        self
    }
}

#[pymethods]
impl ProfileOptions {
    #[new]
    #[pyo3(signature = (seed=None, late_tolerance_ms=None, verbosity=None))]
    fn new(seed: Option<u64>, late_tolerance_ms: Option<u64>, verbosity: Option<u8>) -> Self {
        let defaults = Self::default();
        Self {
            seed,
            late_tolerance_ms: late_tolerance_ms.unwrap_or(defaults.late_tolerance_ms),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ProfileOptions(seed={:?}, late_tolerance_ms={}, verbosity={})",
            self.seed, self.late_tolerance_ms, self.verbosity
        )
    }
}
