//! Configuration management for an autosave session.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Validation before a session is started
mod watch_list;
pub use watch_list::*;


use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Error;
use crate::Result;

/// Environment variable naming an optional configuration file
pub const CONFIG_PATH_ENV: &str = "AUTOSAVE_CONFIG_PATH";

/// Prefix of environment variable overrides (`AUTOSAVE__INTERVAL_IN_MS=...`)
pub const ENV_PREFIX: &str = "AUTOSAVE";

/// Settings of one autosave session
///
/// Combines all options with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `AUTOSAVE_CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AutosaveConfig {
    /// Period of the scheduler tick in milliseconds
    #[serde(default = "default_interval_in_ms")]
    pub interval_in_ms: u64,

    /// Submission target handed to the transport
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Monitored fields, in payload order
    #[serde(default)]
    pub watch_list: Vec<WatchEntry>,

    /// Auxiliary values merged into every payload
    ///
    /// A successful response carrying one of these keys replaces the value
    /// sent on the next submission.
    #[serde(default)]
    pub extra_params: BTreeMap<String, serde_json::Value>,

    /// A field value must be strictly longer than this to be submitted
    #[serde(default)]
    pub min_content_length: usize,

    /// Keep attempting after a failed submission
    #[serde(default)]
    pub retry_on_error: bool,

    /// Upper bound on one outstanding submission (0 disables the bound)
    #[serde(default)]
    pub submit_timeout_in_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            interval_in_ms: default_interval_in_ms(),
            endpoint: default_endpoint(),
            watch_list: Vec::new(),
            extra_params: BTreeMap::new(),
            min_content_length: 0,
            retry_on_error: false,
            submit_timeout_in_ms: 0,
        }
    }
}

impl AutosaveConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `AUTOSAVE_CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `AUTOSAVE__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so that further overrides can be applied with
    /// `with_override_config()`. The builder validates before starting.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.extra_params =
            layered_extra_params(BTreeMap::new(), env::var(CONFIG_PATH_ENV).ok().as_deref())?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    ///
    /// # Example
    /// ```ignore
    /// let cfg = AutosaveConfig::new()?
    ///     .with_override_config("article_editor.toml")?
    ///     .validate()?;
    /// ```
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let mut config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        config.extra_params = layered_extra_params(self.extra_params.clone(), Some(path))?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    ///
    /// # Errors
    /// - zero tick interval
    /// - empty endpoint
    /// - empty, duplicated keys or empty locators in the watch list
    pub fn validate(self) -> Result<Self> {
        if self.interval_in_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "interval_in_ms must be greater than 0".into(),
            )));
        }

        if self.endpoint.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "endpoint cannot be empty".into(),
            )));
        }

        validate_watch_list(&self.watch_list)?;

        if self.watch_list.is_empty() {
            warn!("autosave configured without watched fields; nothing will ever be submitted");
        }

        Ok(self)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_in_ms)
    }

    pub fn submit_timeout(&self) -> Option<Duration> {
        (self.submit_timeout_in_ms > 0).then(|| Duration::from_millis(self.submit_timeout_in_ms))
    }
}

/// Layers extra params over `base`: the `[extra_params]` table of `file`, then
/// `AUTOSAVE__EXTRA_PARAMS__<key>` variables.
///
/// `config` lowercases every map key, but extra params are matched verbatim
/// against response bodies (`docId` must stay `docId`), so they bypass it.
fn layered_extra_params(
    mut params: BTreeMap<String, serde_json::Value>,
    file: Option<&str>,
) -> Result<BTreeMap<String, serde_json::Value>> {
    if let Some(path) = file {
        params.extend(file_extra_params(path)?);
    }
    params.extend(env_extra_params());
    Ok(params)
}

fn file_extra_params(path: &str) -> Result<BTreeMap<String, serde_json::Value>> {
    // same lookup as `File::with_name`: the name as given, then with `.toml`
    let candidates = [path.to_string(), format!("{path}.toml")];
    let Some(found) = candidates.iter().find(|c| Path::new(c).is_file()) else {
        return Ok(BTreeMap::new());
    };

    let text = std::fs::read_to_string(found).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
    let table: toml::Table = toml::from_str(&text).map_err(|e| ConfigError::Foreign(Box::new(e)))?;

    let mut params = BTreeMap::new();
    if let Some(extra) = table.get("extra_params").and_then(toml::Value::as_table) {
        for (key, value) in extra {
            let value =
                serde_json::to_value(value).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
            params.insert(key.clone(), value);
        }
    }
    Ok(params)
}

fn env_extra_params() -> BTreeMap<String, serde_json::Value> {
    let prefix = format!("{ENV_PREFIX}__EXTRA_PARAMS__");
    env::vars()
        .filter_map(|(name, raw)| {
            let key = name.strip_prefix(&prefix)?;
            if key.is_empty() || raw.is_empty() {
                return None;
            }
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            Some((key.to_string(), value))
        })
        .collect()
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

fn default_interval_in_ms() -> u64 {
    30_000
}
fn default_endpoint() -> String {
    "/".to_string()
}
