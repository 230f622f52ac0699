//! Boundary with the host UI layer.
//!
//! The engine never touches widgets directly. A host resolves each configured
//! locator into a [`Field`] and delivers change notifications through the
//! handler registered with [`Field::on_change`].

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::FieldError;

/// Handler invoked by the host whenever a field may have changed
pub type ChangeHandler = Arc<dyn Fn() + Send + Sync>;

/// Identifies one change subscription on one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

#[cfg_attr(test, automock)]
pub trait Field: Send + Sync + 'static {
    /// Current serialized value, `None` when the field holds no value
    fn read(&self) -> Option<String>;

    /// Registers `handler` for change notifications (edits, key presses).
    ///
    /// Notifications may be spurious; the engine compares values itself.
    fn on_change(
        &self,
        handler: ChangeHandler,
    ) -> std::result::Result<SubscriptionId, FieldError>;

    /// Removes a subscription previously returned by [`Field::on_change`]
    fn unsubscribe(
        &self,
        id: SubscriptionId,
    );
}

#[cfg_attr(test, automock)]
pub trait FieldResolver: Send + Sync {
    /// Turns a configured locator into a live field reference
    fn resolve(
        &self,
        key: &str,
        locator: &str,
    ) -> std::result::Result<Arc<dyn Field>, FieldError>;
}
