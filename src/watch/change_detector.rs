use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Mutex;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::session::SessionState;
use crate::ChangeHandler;
use crate::Field;
use crate::Result;
use crate::SubscriptionId;

/// Change subscriptions of one session.
///
/// Each watched field gets one handler that marks the session dirty when the
/// live value differs from the field's snapshot. Handlers only hold a weak
/// reference to the session, so a field outliving the session cannot keep it
/// alive. Dropping the detector removes every subscription.
pub(crate) struct ChangeDetector {
    subscriptions: Vec<(Arc<dyn Field>, SubscriptionId)>,
}

impl ChangeDetector {
    pub(crate) fn attach(state: &Arc<Mutex<SessionState>>) -> Result<Self> {
        let targets: Vec<(String, Arc<dyn Field>)> = state
            .lock()
            .watch_set
            .iter()
            .map(|w| (w.key.clone(), w.field.clone()))
            .collect();

        let mut detector = ChangeDetector {
            subscriptions: Vec::with_capacity(targets.len()),
        };

        for (key, field) in targets {
            let handler = change_handler(key.clone(), Arc::downgrade(state));
            // on error the partially attached detector is dropped, which detaches it
            let id = field.on_change(handler)?;
            trace!("watching {} ({:?})", key, id);
            detector.subscriptions.push((field, id));
        }

        debug!("change detector attached to {} fields", detector.subscriptions.len());
        Ok(detector)
    }

    pub(crate) fn detach(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        for (field, id) in self.subscriptions.drain(..) {
            field.unsubscribe(id);
        }
        debug!("change detector detached");
    }

    #[cfg(test)]
    pub(crate) fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl Drop for ChangeDetector {
    fn drop(&mut self) {
        self.detach();
    }
}

fn change_handler(
    key: String,
    state: Weak<Mutex<SessionState>>,
) -> ChangeHandler {
    Arc::new(move || {
        let Some(state) = state.upgrade() else {
            warn!("change notification for {} after session was dropped", key);
            return;
        };
        let mut state = state.lock();
        if state.watch_set.is_changed(&key) {
            trace!("{} differs from its snapshot", key);
            state.dirty = true;
        }
    })
}
