//! Mutable state of one autosave session and the shapes it reports.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::WatchSet;

/// Outcome of the most recently completed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Outcome {
    #[default]
    Success,
    Failure,
}

/// Opaque reason handed to the response callback on failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureIndicator {
    /// The endpoint answered with a non-success status
    Status(u16),
    /// The transport could not complete the request
    Transport(String),
    /// The submission outlived `submit_timeout_in_ms`
    Timeout,
}

impl FailureIndicator {
    /// HTTP-style status code, `0` when no response was received
    pub fn status_code(&self) -> u16 {
        match self {
            FailureIndicator::Status(code) => *code,
            FailureIndicator::Transport(_) | FailureIndicator::Timeout => 0,
        }
    }
}

/// What the response callback receives, exactly once per dispatched submission
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Success(serde_json::Value),
    Failure(FailureIndicator),
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::Success(_))
    }
}

/// Callback receiving every submission outcome; its return value is ignored
pub type ResponseCallback = std::sync::Arc<dyn Fn(SaveOutcome) + Send + Sync>;

/// Point-in-time copy of the session flags and counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutosaveStats {
    pub dirty: bool,
    pub in_flight: bool,
    pub last_outcome: Outcome,
    pub success_count: u64,
    pub failure_count: u64,
    pub attempt_count: u64,
    pub stopped: bool,
}

/// State owned by one autosave instance.
///
/// Every mutation happens with the session lock held, so tick handling,
/// change notifications and submission completion never interleave.
pub(crate) struct SessionState {
    pub(crate) dirty: bool,
    pub(crate) in_flight: bool,
    pub(crate) last_outcome: Outcome,
    pub(crate) success_count: u64,
    pub(crate) failure_count: u64,
    pub(crate) attempt_count: u64,
    /// Aggregate result of the minimum length gate; the last checked field wins
    pub(crate) length_gate_open: bool,
    pub(crate) stopped: bool,
    pub(crate) watch_set: WatchSet,
    pub(crate) extra_params: BTreeMap<String, serde_json::Value>,
}

impl SessionState {
    pub(crate) fn new(
        watch_set: WatchSet,
        extra_params: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            dirty: false,
            in_flight: false,
            last_outcome: Outcome::Success,
            success_count: 0,
            failure_count: 0,
            attempt_count: 0,
            length_gate_open: true,
            stopped: false,
            watch_set,
            extra_params,
        }
    }

    pub(crate) fn stats(&self) -> AutosaveStats {
        AutosaveStats {
            dirty: self.dirty,
            in_flight: self.in_flight,
            last_outcome: self.last_outcome,
            success_count: self.success_count,
            failure_count: self.failure_count,
            attempt_count: self.attempt_count,
            stopped: self.stopped,
        }
    }

    /// Replaces configured extra params with the values echoed by the server.
    ///
    /// Only keys already known are touched; absent or `null` values keep the
    /// previous value.
    pub(crate) fn absorb_extra_params(
        &mut self,
        body: &serde_json::Value,
    ) -> usize {
        let Some(response) = body.as_object() else {
            return 0;
        };

        let mut updated = 0;
        for (key, value) in self.extra_params.iter_mut() {
            match response.get(key) {
                Some(echoed) if !echoed.is_null() => {
                    *value = echoed.clone();
                    updated += 1;
                }
                _ => {}
            }
        }
        updated
    }
}
