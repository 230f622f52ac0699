//! Handle of a running autosave session.
//!
//! ## Key Responsibilities
//! - Owns the session state, the change subscriptions and the scheduler task
//! - Exposes the manual trigger and read-only diagnostics
//! - Tears everything down on [`Autosave::stop`] or drop
//!
//! ## Example Usage
//! ```ignore
//! let autosave = AutosaveBuilder::new(config, resolver, transport)
//!     .on_response(|outcome| println!("{outcome:?}"))
//!     .start()?;
//! // ...
//! autosave.stop();
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::scheduler::Scheduler;
use crate::session::SessionState;
use crate::submit::Submitter;
use crate::watch::ChangeDetector;
use crate::AttemptResult;
use crate::AutosaveConfig;
use crate::AutosaveStats;
use crate::Result;

pub struct Autosave {
    pub(super) config: Arc<AutosaveConfig>,
    pub(super) state: Arc<Mutex<SessionState>>,
    pub(super) submitter: Submitter,
    pub(super) detector: Mutex<Option<ChangeDetector>>,
    /// Replaced on every `resume`; cancelled while stopped
    pub(super) shutdown_signal: Mutex<CancellationToken>,
    pub(super) scheduler_handle: Mutex<Option<JoinHandle<()>>>,
    pub(super) runtime: Handle,
}

impl Autosave {
    /// Spawns a scheduler under a fresh shutdown signal
    pub(super) fn arm(&self) {
        let shutdown_signal = CancellationToken::new();
        let scheduler = Scheduler::new(
            self.config.interval(),
            self.config.retry_on_error,
            self.state.clone(),
            self.submitter.clone(),
            shutdown_signal.clone(),
        );

        *self.shutdown_signal.lock() = shutdown_signal;
        *self.scheduler_handle.lock() = Some(self.runtime.spawn(scheduler.run()));
    }

    /// Cancels the timer and detaches every change subscription.
    ///
    /// An outstanding submission is not aborted: its completion still updates
    /// the counters and invokes the response callback. Calling `stop` again is
    /// a no-op.
    pub fn stop(&self) {
        {
            let shutdown_signal = self.shutdown_signal.lock();
            if shutdown_signal.is_cancelled() {
                return;
            }
            shutdown_signal.cancel();
        }

        if let Some(mut detector) = self.detector.lock().take() {
            detector.detach();
        }
        // the scheduler exits on the signal
        self.scheduler_handle.lock().take();

        let mut state = self.state.lock();
        state.stopped = true;
        info!(
            "autosave stopped: {} attempts, {} succeeded, {} failed",
            state.attempt_count, state.success_count, state.failure_count
        );
    }

    /// Restarts a stopped session.
    ///
    /// The current field values become the new baselines, change subscriptions
    /// are attached again and the timer is re-armed, its first tick one full
    /// interval from now. Flags, counters and extra params carry over. A
    /// running session is left untouched.
    ///
    /// # Errors
    /// [`crate::Error::Field`] when a field refuses the change subscription;
    /// the session then stays stopped.
    pub fn resume(&self) -> Result<()> {
        if !self.is_stopped() {
            return Ok(());
        }

        self.state.lock().watch_set.rebaseline();
        let detector = ChangeDetector::attach(&self.state)?;
        *self.detector.lock() = Some(detector);
        self.state.lock().stopped = false;
        self.arm();

        info!("autosave resumed every {:?}", self.config.interval());
        Ok(())
    }

    /// Runs one save attempt right away, regardless of the dirty flag and
    /// the failure latch.
    ///
    /// The length gate and the single in-flight guard still apply. Works after
    /// `stop` as well, since only automatic attempts are cancelled.
    pub fn save_now(&self) -> AttemptResult {
        self.submitter.attempt_save()
    }

    pub fn stats(&self) -> AutosaveStats {
        self.state.lock().stats()
    }

    /// Extra params that the next submission will carry
    pub fn extra_params(&self) -> BTreeMap<String, serde_json::Value> {
        self.state.lock().extra_params.clone()
    }

    /// Last saved value of `key`; `None` when `key` is not watched
    pub fn snapshot(
        &self,
        key: &str,
    ) -> Option<Option<String>> {
        self.state
            .lock()
            .watch_set
            .snapshot(key)
            .map(|value| value.map(str::to_string))
    }

    /// Whether any watched field currently differs from its snapshot
    pub fn has_unsaved_changes(&self) -> bool {
        let state = self.state.lock();
        let changed = state.watch_set.iter().any(|w| w.is_changed());
        changed
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown_signal.lock().is_cancelled()
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.stop();
    }
}
