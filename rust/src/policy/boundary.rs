//! Early/late decisions for timestamped steps.

use chrono::Duration;

use crate::models::{IfEarly, IfLate, Scheduled};

/// Where the run stands relative to a step's timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    /// The step is due in `wait`.
    Early { wait: Duration },
    /// Elapsed time is within tolerance of the timestamp.
    OnTime,
    /// The timestamp passed `overdue` ago, beyond tolerance.
    Late { overdue: Duration },
}

/// What the run should do before starting a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Proceed,
    /// Block until the step's timestamp.
    SleepUntil(Duration),
    /// Stop the run and drop the remaining steps.
    EndRun,
}

/// Compare `elapsed` against a step due at `due`.
///
/// Starting up to `tolerance` after `due` still counts as on time.
pub fn position(elapsed: Duration, due: Duration, tolerance: Duration) -> Position {
    if elapsed < due {
        return Position::Early {
            wait: due - elapsed,
        };
    }
    let overdue = elapsed - due;
    if overdue > tolerance {
        Position::Late { overdue }
    } else {
        Position::OnTime
    }
}

impl Scheduled {
    /// Action this policy takes at `position` for a step due at `due`.
    pub fn action(&self, position: Position, due: Duration) -> Action {
        match position {
            Position::OnTime => Action::Proceed,
            Position::Early { .. } => match self.if_early {
                IfEarly::Sleep => Action::SleepUntil(due),
            },
            Position::Late { .. } => match self.if_late {
                IfLate::End => Action::EndRun,
            },
        }
    }

    /// Shorthand for [`position`] followed by [`Scheduled::action`].
    pub fn decide(&self, elapsed: Duration, due: Duration, tolerance: Duration) -> Action {
        self.action(position(elapsed, due, tolerance), due)
    }
}
