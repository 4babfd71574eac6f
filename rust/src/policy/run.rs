//! Execution of an ordered plan under a boundary policy.

use chrono::Duration;

use crate::models::{Journey, Scheduled};
use crate::scheduler::PlannedStep;
use crate::timestamp::format_timestamp;
use crate::{log_changes, log_checks};

use super::boundary::{position, Action, Position};
use super::clock::{CancelToken, Clock};

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Steps remain to be handed out.
    InProgress,
    /// Every step was handed out.
    Completed,
    /// Step `step` came up `overdue` past its timestamp and the policy ended the run.
    EndedLate { step: usize, overdue: Duration },
    /// Cancellation arrived before step `step` started.
    Cancelled { step: usize },
}

fn fmt_offset(offset: Duration) -> String {
    format_timestamp(offset).unwrap_or_else(|_| offset.to_string())
}

/// Iterator over the steps of an ordered plan that enforces the boundary policy.
///
/// Each call to `next` checks the clock against the upcoming step: early steps
/// wait for their timestamp, late steps end the run. The caller runs the
/// returned step before asking for the next one.
pub struct ScheduledRun<'p, 'a, J, C> {
    steps: &'p [PlannedStep<'a, J>],
    next: usize,
    policy: Option<Scheduled>,
    tolerance: Duration,
    clock: &'p C,
    cancel: CancelToken,
    outcome: RunOutcome,
    verbosity: u8,
}

impl<'p, 'a, J: Journey, C: Clock> ScheduledRun<'p, 'a, J, C> {
    pub(crate) fn new(
        steps: &'p [PlannedStep<'a, J>],
        policy: Option<Scheduled>,
        tolerance: Duration,
        clock: &'p C,
        cancel: CancelToken,
        verbosity: u8,
    ) -> Self {
        Self {
            steps,
            next: 0,
            policy,
            tolerance,
            clock,
            cancel,
            outcome: RunOutcome::InProgress,
            verbosity,
        }
    }

    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    /// Steps not yet handed out. After an early end these are the discarded steps.
    pub fn remaining(&self) -> &'p [PlannedStep<'a, J>] {
        &self.steps[self.next..]
    }

    /// Run every step through `run_step` until the plan completes, ends early,
    /// or `run_step` fails.
    pub fn execute<E>(
        mut self,
        mut run_step: impl FnMut(&'p PlannedStep<'a, J>) -> Result<(), E>,
    ) -> Result<RunOutcome, E> {
        while let Some(step) = self.next() {
            run_step(step)?;
        }
        Ok(self.outcome)
    }

    fn finish(&mut self, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Completed => {
                log_changes!(self.verbosity, "Run completed: {} steps", self.steps.len())
            }
            RunOutcome::EndedLate { step, overdue } => log_changes!(
                self.verbosity,
                "Step {} is {} late; ending run, discarding {} steps",
                step,
                fmt_offset(overdue),
                self.steps.len() - step
            ),
            RunOutcome::Cancelled { step } => {
                log_changes!(self.verbosity, "Run cancelled before step {}", step)
            }
            RunOutcome::InProgress => {}
        }
        self.outcome = outcome;
    }

    /// Apply the policy to the upcoming step. Returns `false` if the run ended.
    fn enforce(&mut self, policy: Scheduled, step: &PlannedStep<'a, J>) -> bool {
        let elapsed = self.clock.elapsed();
        let position = position(elapsed, step.at, self.tolerance);
        log_checks!(
            self.verbosity,
            "Step {} ({}) due {} at elapsed {}: {:?}",
            self.next,
            step.journey.display_name(),
            fmt_offset(step.at),
            fmt_offset(elapsed),
            position
        );

        match policy.action(position, step.at) {
            Action::Proceed => true,
            Action::SleepUntil(due) => {
                log_changes!(
                    self.verbosity,
                    "Sleeping until {} for {}",
                    fmt_offset(due),
                    step.journey.display_name()
                );
                if self.clock.sleep_until(due, &self.cancel) {
                    true
                } else {
                    self.finish(RunOutcome::Cancelled { step: self.next });
                    false
                }
            }
            Action::EndRun => {
                let overdue = match position {
                    Position::Late { overdue } => overdue,
                    _ => Duration::zero(),
                };
                self.finish(RunOutcome::EndedLate {
                    step: self.next,
                    overdue,
                });
                false
            }
        }
    }
}

impl<'p, 'a, J: Journey, C: Clock> Iterator for ScheduledRun<'p, 'a, J, C> {
    type Item = &'p PlannedStep<'a, J>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.outcome != RunOutcome::InProgress {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.finish(RunOutcome::Cancelled { step: self.next });
            return None;
        }
        let steps = self.steps;
        let Some(step) = steps.get(self.next) else {
            self.finish(RunOutcome::Completed);
            return None;
        };
        if let Some(policy) = self.policy {
            if !self.enforce(policy, step) {
                return None;
            }
        }
        self.next += 1;
        Some(step)
    }
}
