//! Autosave Error Hierarchy
//!
//! Only construction can fail: an invalid configuration or a watch locator the
//! host cannot resolve. Submission failures never surface here; they are
//! reported through the response callback and the session counters.

use std::time::Duration;

pub use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Watched field binding failures
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Unrecoverable failures
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The host UI layer has no field behind this locator
    #[error("Watched field `{key}` could not be resolved from locator `{locator}`")]
    Unresolved { key: String, locator: String },

    /// The host UI layer refused the change subscription
    #[error("Subscribing to changes of `{0}` failed")]
    SubscribeFailed(String),
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Peer could not be reached at all
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    /// Outstanding submission exceeded its time bound; reported to the
    /// response callback as [`crate::FailureIndicator::Timeout`]
    #[error("Submission timeout after {0:?}")]
    Timeout(Duration),
}
