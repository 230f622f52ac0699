use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::Payload;
use crate::Transport;
use crate::TransportError;
use crate::TransportResponse;

type Reply = std::result::Result<TransportResponse, TransportError>;

/// Transport answering from a queue of scripted replies.
///
/// Records every submission and the highest number of submissions that were
/// outstanding at once. When built with [`ScriptedTransport::gated`] each
/// submission waits for [`ScriptedTransport::release`] before replying.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    calls: Mutex<Vec<(String, Payload)>>,
    replies: Mutex<VecDeque<Reply>>,
    gate: Option<Arc<Semaphore>>,
    outstanding: AtomicUsize,
    max_outstanding: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn gated() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Default::default()
        })
    }

    pub(crate) fn push_reply(
        &self,
        reply: Reply,
    ) {
        self.replies.lock().push_back(reply);
    }

    /// Lets one held submission reply
    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Payload)> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub(crate) fn last_payload(&self) -> Option<Payload> {
        self.calls.lock().last().map(|(_, payload)| payload.clone())
    }

    pub(crate) fn max_outstanding(&self) -> usize {
        self.max_outstanding.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn submit(
        &self,
        endpoint: &str,
        payload: Payload,
    ) -> std::result::Result<TransportResponse, TransportError> {
        self.calls.lock().push((endpoint.to_string(), payload));
        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_outstanding.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::ok(serde_json::json!({}))))
    }
}
