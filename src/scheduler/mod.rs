//! Fixed-period scheduler.
//!
//! A change never triggers a save by itself; it only arms the next tick.
mod scheduler;

pub(crate) use scheduler::*;


use crate::Outcome;

/// What a tick decided to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickDecision {
    /// Nothing changed since the last successful save
    Idle,
    /// The last save failed and retrying is disabled
    Latched,
    /// Hand over to the submitter
    Attempt,
}

/// Evaluated in order: dirty first, then the failure latch.
///
/// With `retry_on_error` disabled a failure is sticky: only a successful
/// submission resets `last_outcome`, and none will be attempted again.
pub(crate) fn tick_decision(
    dirty: bool,
    last_outcome: Outcome,
    retry_on_error: bool,
) -> TickDecision {
    if !dirty {
        return TickDecision::Idle;
    }
    if last_outcome == Outcome::Failure && !retry_on_error {
        return TickDecision::Latched;
    }
    TickDecision::Attempt
}
