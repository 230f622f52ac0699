use serde_json::Value;

use crate::session::SessionState;
use crate::Payload;

/// Everything one attempt needs after the session lock is released
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SaveBatch {
    pub(crate) payload: Payload,
    /// Fields that passed the length gate with the exact value sent; these
    /// become the new snapshots if the submission succeeds
    pub(crate) sent: Vec<(String, Option<String>)>,
}

/// Reads every watched field and folds the minimum length gate.
///
/// The gate is a single flag: each field holding a value overwrites it with
/// its own check, so the last checked field decides eligibility for the whole
/// batch. A field without value is not checked and leaves the flag as it was,
/// including the value left behind by the previous attempt.
///
/// All fields are placed in the payload whatever the gate says; extra params
/// are merged last and win over a field with the same key.
pub(crate) fn build_batch(
    state: &mut SessionState,
    min_content_length: usize,
) -> SaveBatch {
    let mut payload = Payload::new();
    let mut sent = Vec::with_capacity(state.watch_set.len());
    let mut gate_open = state.length_gate_open;

    for watched in state.watch_set.iter() {
        let value = watched.current();

        let passed = match &value {
            Some(text) => {
                gate_open = content_length(text) > min_content_length;
                gate_open
            }
            None => true,
        };

        payload.insert(
            watched.key.clone(),
            value.clone().map(Value::String).unwrap_or(Value::Null),
        );
        if passed {
            sent.push((watched.key.clone(), value));
        }
    }
    state.length_gate_open = gate_open;

    for (key, value) in &state.extra_params {
        payload.insert(key.clone(), value.clone());
    }

    SaveBatch { payload, sent }
}

pub(crate) fn content_length(text: &str) -> usize {
    text.chars().count()
}
