use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ChangeHandler;
use crate::Field;
use crate::FieldError;
use crate::FieldResolver;
use crate::SubscriptionId;

/// In-memory field that notifies its subscribers on every `set`
#[derive(Default)]
pub(crate) struct TestField {
    value: Mutex<Option<String>>,
    handlers: Mutex<BTreeMap<u64, ChangeHandler>>,
    next_id: AtomicU64,
}

impl TestField {
    pub(crate) fn new(value: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value.map(str::to_string)),
            ..Default::default()
        })
    }

    pub(crate) fn with_value(value: &str) -> Arc<Self> {
        Self::new(Some(value))
    }

    /// Changes the value and fires every change handler
    pub(crate) fn set(
        &self,
        value: Option<&str>,
    ) {
        *self.value.lock() = value.map(str::to_string);
        self.notify();
    }

    /// Changes the value without notifying anyone
    pub(crate) fn set_silently(
        &self,
        value: Option<&str>,
    ) {
        *self.value.lock() = value.map(str::to_string);
    }

    pub(crate) fn notify(&self) {
        let handlers: Vec<ChangeHandler> = self.handlers.lock().values().cloned().collect();
        for handler in handlers {
            handler();
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

impl Field for TestField {
    fn read(&self) -> Option<String> {
        self.value.lock().clone()
    }

    fn on_change(
        &self,
        handler: ChangeHandler,
    ) -> std::result::Result<SubscriptionId, FieldError> {
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

/// Resolves locators registered up front
#[derive(Default)]
pub(crate) struct TestResolver {
    fields: Mutex<HashMap<String, Arc<TestField>>>,
}

impl TestResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(
        &self,
        locator: &str,
        field: Arc<TestField>,
    ) {
        self.fields.lock().insert(locator.to_string(), field);
    }
}

impl FieldResolver for TestResolver {
    fn resolve(
        &self,
        key: &str,
        locator: &str,
    ) -> std::result::Result<Arc<dyn Field>, FieldError> {
        match self.fields.lock().get(locator) {
            Some(field) => Ok(field.clone() as Arc<dyn Field>),
            None => Err(FieldError::Unresolved {
                key: key.to_string(),
                locator: locator.to_string(),
            }),
        }
    }
}
