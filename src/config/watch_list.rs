use std::collections::HashSet;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// One monitored field: the payload key and where the host finds the field
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    /// Name of the parameter in the submitted payload
    pub key: String,

    /// Opaque reference resolved by the host UI layer (e.g. `#article_title`)
    pub locator: String,
}

impl WatchEntry {
    pub fn new(
        key: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            locator: locator.into(),
        }
    }
}

pub(super) fn validate_watch_list(entries: &[WatchEntry]) -> Result<()> {
    let mut seen = HashSet::with_capacity(entries.len());

    for entry in entries {
        if entry.key.is_empty() {
            return Err(Error::Config(ConfigError::Message(format!(
                "watch key for locator `{}` cannot be empty",
                entry.locator
            ))));
        }

        if entry.locator.is_empty() {
            return Err(Error::Config(ConfigError::Message(format!(
                "locator of watch key `{}` cannot be empty",
                entry.key
            ))));
        }

        if !seen.insert(entry.key.as_str()) {
            return Err(Error::Config(ConfigError::Message(format!(
                "duplicate watch key `{}`",
                entry.key
            ))));
        }
    }

    Ok(())
}
