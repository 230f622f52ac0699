//! Submitter: payload building, the single in-flight submission and its
//! completion bookkeeping.
mod payload;
mod submitter;

pub(crate) use payload::*;
pub use submitter::AttemptResult;
pub(crate) use submitter::Submitter;
