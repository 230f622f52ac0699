//! A builder for starting an [`Autosave`] session.
//!
//! The host supplies the two boundary collaborators, a [`FieldResolver`] for
//! the watched fields and a [`Transport`] for submissions, plus an optional
//! response callback.
//!
//! ## Lifecycle
//! `start()` validates the configuration, binds every watched field (recording
//! its baseline snapshot), subscribes to change notifications and spawns the
//! scheduler on the current tokio runtime. Nothing is armed if any step fails.
//!
//! ## Example
//! ```ignore
//! let autosave = AutosaveBuilder::from_env(resolver, transport)?
//!     .on_response(|outcome| tracing::info!("autosave: {:?}", outcome))
//!     .start()?;
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::Autosave;
use crate::session::SessionState;
use crate::submit::Submitter;
use crate::watch::ChangeDetector;
use crate::AutosaveConfig;
use crate::Error;
use crate::FieldResolver;
use crate::ResponseCallback;
use crate::Result;
use crate::SaveOutcome;
use crate::Transport;
use crate::WatchSet;

pub struct AutosaveBuilder {
    pub(super) config: AutosaveConfig,
    pub(super) resolver: Arc<dyn FieldResolver>,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) on_response: ResponseCallback,
}

impl AutosaveBuilder {
    pub fn new(
        config: AutosaveConfig,
        resolver: Arc<dyn FieldResolver>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            resolver,
            transport,
            on_response: Arc::new(|_| {}),
        }
    }

    /// Starts from [`AutosaveConfig::new`]: defaults, `AUTOSAVE_CONFIG_PATH`
    /// file, then `AUTOSAVE__*` environment variables
    pub fn from_env(
        resolver: Arc<dyn FieldResolver>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self::new(AutosaveConfig::new()?, resolver, transport))
    }

    /// Layers one more configuration file over the current settings
    pub fn with_override_config(
        mut self,
        path: &str,
    ) -> Result<Self> {
        info!("with_override_config from: {}", path);
        self.config = self.config.with_override_config(path)?;
        Ok(self)
    }

    pub fn config(
        mut self,
        config: AutosaveConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn on_response<F>(
        mut self,
        callback: F,
    ) -> Self
    where
        F: Fn(SaveOutcome) + Send + Sync + 'static,
    {
        self.on_response = Arc::new(callback);
        self
    }

    pub fn response_callback(
        mut self,
        callback: ResponseCallback,
    ) -> Self {
        self.on_response = callback;
        self
    }

    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// - [`Error::Config`] when validation fails
    /// - [`Error::Field`] when a locator cannot be resolved or subscribed
    /// - [`Error::Fatal`] outside a tokio runtime
    pub fn start(self) -> Result<Autosave> {
        let config = Arc::new(self.config.validate()?);

        let runtime = Handle::try_current()
            .map_err(|e| Error::Fatal(format!("autosave must start inside a tokio runtime: {}", e)))?;

        let watch_set = WatchSet::bind(&config.watch_list, self.resolver.as_ref())?;
        let state = Arc::new(Mutex::new(SessionState::new(
            watch_set,
            config.extra_params.clone(),
        )));

        let detector = ChangeDetector::attach(&state)?;

        let submitter = Submitter::new(
            state.clone(),
            self.transport,
            &config.endpoint,
            config.min_content_length,
            config.submit_timeout(),
            self.on_response,
            runtime.clone(),
        );

        let autosave = Autosave {
            config,
            state,
            submitter,
            detector: Mutex::new(Some(detector)),
            shutdown_signal: Mutex::new(CancellationToken::new()),
            scheduler_handle: Mutex::new(None),
            runtime,
        };
        autosave.arm();

        info!(
            "autosave started: {} field(s) -> {} every {:?}",
            autosave.config.watch_list.len(),
            autosave.config.endpoint,
            autosave.config.interval()
        );

        Ok(autosave)
    }
}
