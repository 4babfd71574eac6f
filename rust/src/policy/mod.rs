//! Boundary policy engine.
//!
//! Governs execution of timestamped plans: before each step the run's elapsed
//! time is compared with the step's timestamp and the profile's `Scheduled`
//! policy decides whether to wait, proceed or stop. Weighted plans have no
//! timestamps and never pass through here.

mod boundary;
mod clock;
mod run;

pub use boundary::{position, Action, Position};
pub use clock::{CancelToken, Clock, ManualClock, SystemClock};
pub use run::{RunOutcome, ScheduledRun};
