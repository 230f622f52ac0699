//! Watch Set Manager and Change Detector.
//!
//! [`WatchSet`] keeps the last submitted value of each monitored field;
//! the change detector turns host notifications into the session dirty flag.
mod change_detector;
mod watch_set;

pub(crate) use change_detector::*;
pub use watch_set::*;
