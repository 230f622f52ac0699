//! In-memory host doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use autosave_engine::ChangeHandler;
use autosave_engine::Field;
use autosave_engine::FieldError;
use autosave_engine::FieldResolver;
use autosave_engine::Payload;
use autosave_engine::ResponseCallback;
use autosave_engine::SaveOutcome;
use autosave_engine::SubscriptionId;
use autosave_engine::Transport;
use autosave_engine::TransportError;
use autosave_engine::TransportResponse;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// Lets spawned submissions run to completion without moving the clock
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Text input standing in for a form widget
#[derive(Default)]
pub struct TextInput {
    value: Mutex<Option<String>>,
    handlers: Mutex<HashMap<u64, ChangeHandler>>,
    next_id: AtomicU64,
}

impl TextInput {
    pub fn new(value: &str) -> Arc<Self> {
        let input = Self::default();
        *input.value.lock() = Some(value.to_string());
        Arc::new(input)
    }

    /// Simulates a user edit: updates the value and fires the change event
    pub fn type_text(
        &self,
        value: &str,
    ) {
        *self.value.lock() = Some(value.to_string());
        let handlers: Vec<ChangeHandler> = self.handlers.lock().values().cloned().collect();
        for handler in handlers {
            handler();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

impl Field for TextInput {
    fn read(&self) -> Option<String> {
        self.value.lock().clone()
    }

    fn on_change(
        &self,
        handler: ChangeHandler,
    ) -> Result<SubscriptionId, FieldError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handlers.lock().insert(id, handler);
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(
        &self,
        id: SubscriptionId,
    ) {
        self.handlers.lock().remove(&id.0);
    }
}

/// Resolves locators against a fixed page of inputs
#[derive(Default)]
pub struct Page {
    inputs: Mutex<HashMap<String, Arc<TextInput>>>,
}

impl Page {
    pub fn with_inputs(inputs: &[(&str, &Arc<TextInput>)]) -> Arc<Self> {
        let page = Self::default();
        for (locator, input) in inputs {
            page.inputs.lock().insert(locator.to_string(), (*input).clone());
        }
        Arc::new(page)
    }
}

impl FieldResolver for Page {
    fn resolve(
        &self,
        key: &str,
        locator: &str,
    ) -> Result<Arc<dyn Field>, FieldError> {
        match self.inputs.lock().get(locator) {
            Some(input) => Ok(input.clone() as Arc<dyn Field>),
            None => Err(FieldError::Unresolved {
                key: key.to_string(),
                locator: locator.to_string(),
            }),
        }
    }
}

type Reply = Result<TransportResponse, TransportError>;

/// Records submissions and answers from a queue, `200 {}` when empty.
///
/// A held server keeps every submission pending until [`FakeServer::release`].
#[derive(Default)]
pub struct FakeServer {
    requests: Mutex<Vec<(String, Payload)>>,
    replies: Mutex<VecDeque<Reply>>,
    gate: Option<Arc<Semaphore>>,
    outstanding: AtomicUsize,
    max_outstanding: AtomicUsize,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn held() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Default::default()
        })
    }

    pub fn reply_with(
        &self,
        reply: Reply,
    ) {
        self.replies.lock().push_back(reply);
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn requests(&self) -> Vec<(String, Payload)> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<serde_json::Value> {
        self.requests
            .lock()
            .last()
            .map(|(_, payload)| serde_json::Value::Object(payload.clone()))
    }

    pub fn max_outstanding(&self) -> usize {
        self.max_outstanding.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn submit(
        &self,
        endpoint: &str,
        payload: Payload,
    ) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push((endpoint.to_string(), payload));
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

/// Collects every outcome handed to the response callback
#[derive(Clone, Default)]
pub struct Outcomes {
    inner: Arc<Mutex<Vec<SaveOutcome>>>,
}

impl Outcomes {
    pub fn callback(&self) -> ResponseCallback {
        let inner = self.inner.clone();
        Arc::new(move |outcome| inner.lock().push(outcome))
    }

    pub fn all(&self) -> Vec<SaveOutcome> {
        self.inner.lock().clone()
    }
}
