//! Submission transport abstraction.
//!
//! The engine hands a complete payload to a [`Transport`] and waits for one
//! response. Framing, connection reuse and network-level retries belong to the
//! implementation; the engine only distinguishes success (2xx) from failure.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::TransportError;

/// Parameters of one submission, field keys and extra params merged
pub type Payload = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP-style status code
    pub status: u16,
    /// Decoded response body, `Value::Null` when empty
    pub body: serde_json::Value,
}

impl TransportResponse {
    pub fn new(
        status: u16,
        body: serde_json::Value,
    ) -> Self {
        Self { status, body }
    }

    /// 200 response carrying `body`
    pub fn ok(body: serde_json::Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Delivers `payload` to `endpoint` and returns the decoded response.
    ///
    /// # Errors
    /// Any error means the submission did not reach a usable response. A
    /// response with a non-success status is returned as `Ok` and classified
    /// by the caller.
    async fn submit(
        &self,
        endpoint: &str,
        payload: Payload,
    ) -> std::result::Result<TransportResponse, TransportError>;
}
