use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::timeout;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::build_batch;
use super::SaveBatch;
use crate::session::SessionState;
use crate::FailureIndicator;
use crate::Outcome;
use crate::ResponseCallback;
use crate::SaveOutcome;
use crate::Transport;
use crate::TransportError;
use crate::TransportResponse;

/// What a save attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    /// A submission is now outstanding
    Dispatched,
    /// The minimum length gate is closed; nothing was sent
    Ineligible,
    /// Another submission is still outstanding; nothing was sent
    AlreadyInFlight,
}

/// Builds payloads and owns the single outstanding submission.
#[derive(Clone)]
pub(crate) struct Submitter {
    state: Arc<Mutex<SessionState>>,
    transport: Arc<dyn Transport>,
    endpoint: Arc<str>,
    min_content_length: usize,
    submit_timeout: Option<Duration>,
    on_response: ResponseCallback,
    runtime: Handle,
}

impl Submitter {
    pub(crate) fn new(
        state: Arc<Mutex<SessionState>>,
        transport: Arc<dyn Transport>,
        endpoint: &str,
        min_content_length: usize,
        submit_timeout: Option<Duration>,
        on_response: ResponseCallback,
        runtime: Handle,
    ) -> Self {
        Self {
            state,
            transport,
            endpoint: Arc::from(endpoint),
            min_content_length,
            submit_timeout,
            on_response,
            runtime,
        }
    }

    /// Attempts one save.
    ///
    /// Fields are read and the length gate folded before the in-flight check,
    /// so a skipped attempt still refreshes the gate. Skips are silent: no
    /// counter moves and the callback is not invoked.
    pub(crate) fn attempt_save(&self) -> AttemptResult {
        let batch = {
            let mut state = self.state.lock();
            let batch = build_batch(&mut state, self.min_content_length);

            if !state.length_gate_open {
                trace!("attempt skipped: content below minimum length");
                return AttemptResult::Ineligible;
            }
            if state.in_flight {
                trace!("attempt skipped: submission already in flight");
                return AttemptResult::AlreadyInFlight;
            }

            state.in_flight = true;
            state.attempt_count += 1;
            debug!(
                "dispatching attempt #{} to {} ({} params)",
                state.attempt_count,
                self.endpoint,
                batch.payload.len()
            );
            batch
        };

        let this = self.clone();
        self.runtime.spawn(async move {
            let result = this.submit(&batch).await;
            this.complete(batch, result);
        });

        AttemptResult::Dispatched
    }

    async fn submit(
        &self,
        batch: &SaveBatch,
    ) -> std::result::Result<serde_json::Value, FailureIndicator> {
        let request = self.transport.submit(&self.endpoint, batch.payload.clone());

        let response = match self.submit_timeout {
            Some(limit) => match timeout(limit, request).await {
                Ok(response) => response,
                Err(_) => {
                    warn!("submission to {} timed out after {:?}", self.endpoint, limit);
                    Err(TransportError::Timeout(limit))
                }
            },
            None => request.await,
        };

        classify(response)
    }

    /// Applies the outcome of the outstanding submission and reports it.
    ///
    /// Runs even when the session was stopped meanwhile; the state stays
    /// consistent and the callback still fires once.
    ///
    /// Success clears `dirty` unconditionally. An edit made while the
    /// submission was in flight stays visible through the snapshot comparison
    /// but is only submitted once a later change notification re-arms `dirty`.
    pub(crate) fn complete(
        &self,
        batch: SaveBatch,
        result: std::result::Result<serde_json::Value, FailureIndicator>,
    ) {
        let outcome = {
            let mut state = self.state.lock();
            if state.stopped {
                debug!("submission completed after stop");
            }
            state.in_flight = false;

            match result {
                Ok(body) => {
                    state.dirty = false;
                    for (key, value) in batch.sent {
                        state.watch_set.update_snapshot(&key, value);
                    }
                    let echoed = state.absorb_extra_params(&body);
                    state.last_outcome = Outcome::Success;
                    state.success_count += 1;
                    debug!(
                        "save #{} succeeded, {} extra params updated",
                        state.success_count, echoed
                    );
                    SaveOutcome::Success(body)
                }
                Err(indicator) => {
                    state.dirty = true;
                    state.last_outcome = Outcome::Failure;
                    state.failure_count += 1;
                    warn!("save failed ({} failures so far): {:?}", state.failure_count, indicator);
                    SaveOutcome::Failure(indicator)
                }
            }
        };

        (self.on_response)(outcome);
    }
}

fn classify(
    response: std::result::Result<TransportResponse, TransportError>
) -> std::result::Result<serde_json::Value, FailureIndicator> {
    match response {
        Ok(response) if response.is_success() => Ok(response.body),
        Ok(response) => Err(FailureIndicator::Status(response.status)),
        Err(TransportError::Timeout(_)) => Err(FailureIndicator::Timeout),
        Err(e) => Err(FailureIndicator::Transport(e.to_string())),
    }
}
