use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::interval_at;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;

use super::tick_decision;
use super::TickDecision;
use crate::session::SessionState;
use crate::submit::Submitter;

pub(crate) struct Scheduler {
    interval: Duration,
    first_tick: Instant,
    retry_on_error: bool,
    state: Arc<Mutex<SessionState>>,
    submitter: Submitter,
    shutdown_signal: CancellationToken,
}

impl Scheduler {
    pub(crate) fn new(
        interval: Duration,
        retry_on_error: bool,
        state: Arc<Mutex<SessionState>>,
        submitter: Submitter,
        shutdown_signal: CancellationToken,
    ) -> Self {
        Self {
            interval,
            first_tick: Instant::now() + interval,
            retry_on_error,
            state,
            submitter,
            shutdown_signal,
        }
    }

    /// Ticks every `interval` until the shutdown signal fires.
    ///
    /// The first tick comes one full period after the scheduler was created,
    /// not after the task is first polled. A stalled runtime skips missed
    /// ticks instead of bursting them.
    pub(crate) async fn run(self) {
        let mut ticker = interval_at(self.first_tick, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Use biased to ensure branch order
                biased;
                // P0: shutdown received;
                _ = self.shutdown_signal.cancelled() => {
                    info!("autosave scheduler stopped.");
                    return;
                }
                // P1: tick
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
    }

    pub(crate) fn tick(&self) -> TickDecision {
        let decision = {
            let state = self.state.lock();
            tick_decision(state.dirty, state.last_outcome, self.retry_on_error)
        };

        match decision {
            TickDecision::Idle => trace!("tick: idle"),
            TickDecision::Latched => trace!("tick: last save failed and retry is disabled"),
            TickDecision::Attempt => {
                let result = self.submitter.attempt_save();
                debug!("tick: {:?}", result);
            }
        }
        decision
    }
}
