//! Interval-driven autosave engine.
//!
//! Watches a set of host fields, and every `interval` submits their content
//! to an endpoint when something changed since the last successful save. At
//! most one submission is outstanding at a time; failures are reported, never
//! returned, and optionally latch further automatic attempts off. Extra params
//! travel with every submission and can be patched by the server's response.
//!
//! The UI layer ([`Field`], [`FieldResolver`]) and the network
//! ([`Transport`]) are supplied by the host.

mod autosave;
mod config;
mod errors;
mod field;
mod scheduler;
mod session;
mod submit;
mod transport;
mod watch;

pub use autosave::*;
pub use config::*;
pub use errors::*;
pub use field::*;
pub use session::AutosaveStats;
pub use session::FailureIndicator;
pub use session::Outcome;
pub use session::ResponseCallback;
pub use session::SaveOutcome;
pub use submit::AttemptResult;
pub use transport::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils
